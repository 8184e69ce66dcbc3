//! Minimal command surface over `worklog_core`.
//!
//! # Responsibility
//! - Map argv verbs onto the core façade and print plain-text results.
//! - Keep all formatting/exit-code concerns out of the core crate.

use chrono::TimeDelta;
use std::process::ExitCode;
use worklog_core::{default_log_level, init_logging, Config, Tracker, TrackerError};

fn main() -> ExitCode {
    setup_logging(std::env::var("WORKLOG_LOG_DIR").ok().as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        // Expected conditions render as friendly no-ops.
        Err(TrackerError::Continue(task)) => {
            println!("already tracking: {}", task.description);
            ExitCode::SUCCESS
        }
        Err(TrackerError::NoCurrentTask) => {
            println!("no task is running");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("worklog: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Starts file logging when a log directory is configured. The core
/// emits structured events either way; without a directory they go nowhere.
/// A broken logging setup must not block tracking, so failures only warn.
fn setup_logging(log_dir: Option<&str>) {
    let Some(log_dir) = log_dir else {
        return;
    };

    if let Err(err) = init_logging(default_log_level(), log_dir) {
        eprintln!("worklog: logging disabled: {err}");
    }
}

fn run(args: &[String]) -> Result<(), TrackerError> {
    let db_path =
        std::env::var("WORKLOG_DB").unwrap_or_else(|_| "worklog.db".to_string());
    let mut tracker = Tracker::open(&db_path)?;

    match args.split_first().map(|(verb, rest)| (verb.as_str(), rest)) {
        Some(("start", rest)) => {
            let (previous, next) = tracker.start(&rest.join(" "))?;
            if let Some(previous) = previous.filter(|p| !p.is_running()) {
                println!("stopped: {}", previous.description);
            }
            println!("tracking: {} {}", next.description, next.tags.join(" "));
        }
        Some(("stop", _)) => {
            let stopped = tracker.stop()?;
            println!("stopped: {}", stopped.description);
        }
        Some(("tasks", _)) => {
            for task in tracker.get_tasks()? {
                let state = if task.is_running() { "running" } else { "done" };
                println!(
                    "#{} [{state}] {} {}",
                    task.id.unwrap_or_default(),
                    task.description,
                    task.tags.join(" ")
                );
            }
        }
        Some(("report", _)) => {
            let report = tracker.get_report()?;
            for week in &report.weeks {
                println!(
                    "week of {}: worked {} overtime {} in-lieu {} taken {}",
                    week.week_start,
                    hours(week.totals.work_duration),
                    hours(week.totals.overtime),
                    hours(week.totals.in_lieu),
                    hours(week.totals.taken),
                );
            }
            println!(
                "total: worked {} overtime {} in-lieu {} taken {}",
                hours(report.total.work_duration),
                hours(report.total.overtime),
                hours(report.total.in_lieu),
                hours(report.total.taken),
            );
        }
        Some(("config", rest)) => {
            let weekly: i64 = rest
                .first()
                .and_then(|value| value.parse().ok())
                .ok_or_else(|| {
                    TrackerError::InvalidInput("usage: config <weekly-hours>".to_string())
                })?;
            tracker.set_config(Config {
                weekly_hours: TimeDelta::hours(weekly),
                ..tracker.get_config()
            })?;
            println!("weekly hours set to {weekly}");
        }
        _ => {
            eprintln!(
                "usage: worklog start <description> [@tags...] | stop | tasks | report | config <hours>"
            );
        }
    }

    Ok(())
}

fn hours(duration: TimeDelta) -> String {
    let minutes = duration.num_minutes();
    format!("{}h{:02}m", minutes / 60, (minutes % 60).abs())
}

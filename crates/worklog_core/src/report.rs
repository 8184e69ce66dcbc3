//! Rules-driven report aggregation engine.
//!
//! # Responsibility
//! - Turn the task history into daily, weekly and total compensation
//!   figures under the time-varying policy.
//!
//! # Invariants
//! - One entry is built per calendar day and only combined through the
//!   associative `add` fold afterwards.
//! - Duration classification is rule-independent; overtime, in-lieu and
//!   taken are derived from the day's rule snapshot.
//! - A day without tasks is a valid empty entry, not an error.

use crate::model::task::Task;
use crate::repo::task_repo::{StoreResult, TaskStore};
use crate::rules::{RuleSnapshot, RulesTimeline};
use crate::timeutil::{day_start, is_off_day, scale, start_of_week};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::collections::BTreeMap;

/// Aggregated figures for one calendar day, or a fold of several days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportEntry {
    pub day: NaiveDate,
    /// Earliest activity start that day, for display.
    pub work_start: Option<DateTime<Utc>>,
    /// Latest activity end that day, for display.
    pub work_end: Option<DateTime<Utc>>,
    /// Raw worked time, rule-independent.
    pub work_duration: TimeDelta,
    /// Raw on-call time, rule-independent.
    pub on_call_duration: TimeDelta,
    /// Work beyond the daily quota on a regular day.
    pub overtime: TimeDelta,
    /// Non-monetary time owed back to the worker.
    pub in_lieu: TimeDelta,
    /// Shortfall below the daily quota, debited from the balance.
    pub taken: TimeDelta,
}

impl ReportEntry {
    /// An empty entry for the given day.
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            work_start: None,
            work_end: None,
            work_duration: TimeDelta::zero(),
            on_call_duration: TimeDelta::zero(),
            overtime: TimeDelta::zero(),
            in_lieu: TimeDelta::zero(),
            taken: TimeDelta::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.work_start.is_none()
            && self.work_duration == TimeDelta::zero()
            && self.on_call_duration == TimeDelta::zero()
    }

    /// Associative fold: numeric fields sum, `day` and `work_start` take
    /// the minimum, `work_end` takes the maximum.
    pub fn add(&mut self, other: &ReportEntry) {
        self.day = self.day.min(other.day);
        self.work_start = match (self.work_start, other.work_start) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.work_end = match (self.work_end, other.work_end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.work_duration = self.work_duration + other.work_duration;
        self.on_call_duration = self.on_call_duration + other.on_call_duration;
        self.overtime = self.overtime + other.overtime;
        self.in_lieu = self.in_lieu + other.in_lieu;
        self.taken = self.taken + other.taken;
    }
}

/// Weekly rollup of daily entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSummary {
    /// Monday of the week.
    pub week_start: NaiveDate,
    pub totals: ReportEntry,
}

/// Full report over the task history: one entry per day, weekly rollups and
/// a grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub days: Vec<ReportEntry>,
    pub weeks: Vec<WeekSummary>,
    pub total: ReportEntry,
}

/// Builds the report by scanning calendar days from the earliest task
/// through `now`, inclusive.
///
/// The caller holds the read transaction for the whole scan, so the history
/// is one consistent snapshot. Fails `NoTasks` on an empty store.
pub fn generate(
    store: &dyn TaskStore,
    timeline: &RulesTimeline,
    now: DateTime<Utc>,
) -> StoreResult<Report> {
    let first = store.first_task()?;

    let first_day = first.started_at.date_naive();
    let last_day = now.date_naive();

    let mut days = Vec::new();
    let mut weeks: BTreeMap<NaiveDate, ReportEntry> = BTreeMap::new();
    let mut total = ReportEntry::new(first_day);

    // Pull one day at a time; the history is never materialized as a whole.
    for day in first_day.iter_days().take_while(|day| *day <= last_day) {
        let snapshot = timeline.for_day(day);
        let entry = build_day_entry(store, &snapshot, day, now)?;

        weeks
            .entry(start_of_week(day))
            .or_insert_with(|| ReportEntry::new(day))
            .add(&entry);
        total.add(&entry);
        days.push(entry);
    }

    let weeks = weeks
        .into_iter()
        .map(|(week_start, totals)| WeekSummary { week_start, totals })
        .collect();

    Ok(Report { days, weeks, total })
}

fn build_day_entry(
    store: &dyn TaskStore,
    snapshot: &RuleSnapshot,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> StoreResult<ReportEntry> {
    let day_begin = day_start(day);
    let day_end = day_begin + TimeDelta::days(1);

    let mut entry = ReportEntry::new(day);
    let mut off_time = TimeDelta::zero();

    for task in store.tasks_in_range(day_begin, day_end)? {
        let Some((start, end)) = clamp_to_day(&task, day_begin, day_end, now) else {
            continue;
        };
        let duration = end - start;

        // Mutually exclusive classification, @off taking priority.
        if task.has_tag("@off") {
            off_time = off_time + duration;
        } else if task.has_tag("@oncall") {
            entry.on_call_duration = entry.on_call_duration + duration;
        } else {
            entry.work_duration = entry.work_duration + duration;
        }

        entry.work_start = Some(entry.work_start.map_or(start, |s| s.min(start)));
        entry.work_end = Some(entry.work_end.map_or(end, |e| e.max(end)));
    }

    if is_off_day(day) {
        // Weekend work converts entirely to in-lieu, never overtime.
        entry.in_lieu = entry.in_lieu + scale(entry.work_duration, snapshot.holiday_factor);
    } else if entry.work_duration > TimeDelta::zero() && snapshot.weekly_hours > 0.0 {
        // Time off participates in quota satisfaction without counting as
        // worked time. A zero weekly quota disables the tracking entirely.
        let delta = (entry.work_duration + off_time) - snapshot.daily_quota();
        if delta > TimeDelta::zero() {
            entry.overtime = entry.overtime + delta;
        } else {
            entry.taken = entry.taken - delta;
        }
    }

    entry.in_lieu = entry.in_lieu + scale(entry.on_call_duration, snapshot.on_call_factor);

    Ok(entry)
}

/// Clamps the task's effective interval to the day bounds, treating an
/// unset stop as "now" for duration purposes only.
fn clamp_to_day(
    task: &Task,
    day_begin: DateTime<Utc>,
    day_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = task.started_at.max(day_begin);
    let end = task.end_or(now).min(day_end);

    (end > start).then_some((start, end))
}

//! Task lifecycle manager and report façade.
//!
//! # Responsibility
//! - Decide, from free-text input, whether to continue, retag or switch the
//!   running task.
//! - Wire the report engine to the store and the rules timeline.
//!
//! # Invariants
//! - Each read-decide-write sequence runs in one transaction: commit on
//!   success, rollback (drop) on any failure.
//! - "Now" is sampled once per logical operation and reused for every
//!   timestamp within it.
//! - At most one task is running at any observation point.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::config::Config;
use crate::model::task::{Task, TaskId};
use crate::parse::parse_raw;
use crate::repo::task_repo::{SqliteTaskStore, StoreError, TaskStore};
use crate::report::{self, Report};
use crate::rules::RulesTimeline;
use crate::timeutil::{start_of_day, start_of_week};
use chrono::{DateTime, TimeDelta, Utc};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Service-level error carrying the tracker taxonomy.
///
/// `Continue` and `NoCurrentTask` are expected conditions the presentation
/// layer renders as friendly no-ops; the rest are real failures.
#[derive(Debug)]
pub enum TrackerError {
    /// The running task already matches the request; nothing was mutated.
    /// Carries a copy of the current task.
    Continue(Box<Task>),
    /// Stop was requested while no task is running.
    NoCurrentTask,
    InvalidInput(String),
    /// An operation needs a weekly quota and none is configured.
    NotConfigured,
    Store(StoreError),
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue(task) => {
                write!(f, "continuing identical running task: {}", task.description)
            }
            Self::NoCurrentTask => write!(f, "there is no running task"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotConfigured => write!(f, "weekly hours are not configured"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DbError> for TrackerError {
    fn from(value: DbError) -> Self {
        Self::Store(StoreError::Db(value))
    }
}

/// Façade over one store handle: lifecycle state machine, configuration and
/// report generation.
///
/// The loaded policy is scoped to this handle; separate handles (e.g. in
/// tests) never interfere.
pub struct Tracker {
    conn: Connection,
    config: Config,
    timeline: RulesTimeline,
}

impl Tracker {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> TrackerResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a fresh in-memory store, mainly for tests and dry runs.
    pub fn open_in_memory() -> TrackerResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    fn from_connection(conn: Connection) -> TrackerResult<Self> {
        let config = SqliteTaskStore::new(&conn).load_config()?;
        let timeline = RulesTimeline::from_config(&config);

        Ok(Self {
            conn,
            config,
            timeline,
        })
    }

    /// Starts, retags or continues a task from raw user input.
    ///
    /// Returns `(previous, next)` as two independent copies:
    /// - fresh start: `(None, new)`;
    /// - tag update: `(Some(before), updated)` with the same id;
    /// - switch: `(Some(stopped), new)` with a new id, inheriting the
    ///   stopped task's tags when the input carries none.
    ///
    /// # Errors
    /// - `Continue` when the running task already matches input exactly.
    /// - `InvalidInput` when starting fresh without a description.
    pub fn start(&mut self, raw: &str) -> TrackerResult<(Option<Task>, Task)> {
        let now = Utc::now();
        let (description, tags) = parse_raw(raw);

        let result = self.with_tx(move |store| {
            let current = store.current_task()?;

            let Some(current) = current else {
                if description.is_empty() {
                    return Err(TrackerError::InvalidInput(
                        "cannot start a task without a description".to_string(),
                    ));
                }

                let mut next = Task::new(description, tags, now);
                store.insert_task(&mut next)?;
                return Ok((None, next));
            };

            // Same logical task: continue or retag in place.
            if current.description == description || description.is_empty() {
                if current.tags == tags {
                    return Err(TrackerError::Continue(Box::new(current)));
                }

                let mut next = current.clone();
                next.tags = tags;
                store.update_task(&next)?;
                return Ok((Some(current), next));
            }

            // Task switch: stop the current one, inherit tags if none given.
            let id = current.id.ok_or(StoreError::InvalidTaskId)?;
            store.stop_task(id, now)?;

            let tags = if tags.is_empty() {
                current.tags.clone()
            } else {
                tags
            };

            let mut stopped = current;
            stopped.stopped_at = Some(now);

            let mut next = Task::new(description, tags, now);
            store.insert_task(&mut next)?;
            Ok((Some(stopped), next))
        });

        if let Ok((previous, next)) = &result {
            info!(
                "event=task_start module=service status=ok id={} switched={}",
                next.id.unwrap_or_default(),
                previous.as_ref().map_or(false, |p| !p.is_running()),
            );
        }

        result
    }

    /// Stops the running task and returns a copy of it.
    ///
    /// # Errors
    /// `NoCurrentTask` when nothing is running; the store is untouched.
    pub fn stop(&mut self) -> TrackerResult<Task> {
        let now = Utc::now();

        let stopped = self.with_tx(|store| {
            let mut current = store.current_task()?.ok_or(TrackerError::NoCurrentTask)?;
            let id = current.id.ok_or(StoreError::InvalidTaskId)?;

            store.stop_task(id, now)?;
            current.stopped_at = Some(now);
            Ok(current)
        })?;

        info!(
            "event=task_stop module=service status=ok id={}",
            stopped.id.unwrap_or_default()
        );
        Ok(stopped)
    }

    /// Returns the running task, if any.
    pub fn current_task(&mut self) -> TrackerResult<Option<Task>> {
        self.with_tx(|store| Ok(store.current_task()?))
    }

    /// Returns every recorded task, newest first.
    pub fn get_tasks(&mut self) -> TrackerResult<Vec<Task>> {
        self.with_tx(|store| Ok(store.all_tasks()?))
    }

    /// External edit path: overwrites a stopped (or running) task by id.
    pub fn update_task(&mut self, task: &Task) -> TrackerResult<()> {
        self.with_tx(|store| Ok(store.update_task(task)?))
    }

    pub fn delete_task(&mut self, id: TaskId) -> TrackerResult<()> {
        self.with_tx(|store| Ok(store.delete_task(id)?))
    }

    pub fn get_config(&self) -> Config {
        self.config
    }

    /// Validates and persists the configuration, then rebuilds the policy
    /// timeline from it.
    pub fn set_config(&mut self, config: Config) -> TrackerResult<()> {
        config.validate().map_err(TrackerError::InvalidInput)?;

        self.with_tx(|store| Ok(store.save_config(&config)?))?;
        self.config = config;
        self.timeline = RulesTimeline::from_config(&self.config);

        info!("event=config_set module=service status=ok");
        Ok(())
    }

    /// Builds the full report over one consistent snapshot of the history.
    ///
    /// # Errors
    /// `NoTasks` (store-level) when the store holds no tasks at all.
    pub fn get_report(&mut self) -> TrackerResult<Report> {
        let now = Utc::now();
        let timeline = self.timeline.clone();

        self.with_tx(move |store| Ok(report::generate(store, &timeline, now)?))
    }

    /// Remaining work time today and this week against the configured quota.
    ///
    /// # Errors
    /// `NotConfigured` when no weekly quota is set.
    pub fn duration_left(&mut self) -> TrackerResult<(TimeDelta, TimeDelta)> {
        if self.config.weekly_hours <= TimeDelta::zero() {
            return Err(TrackerError::NotConfigured);
        }

        let now = Utc::now();
        let weekly_hours = self.config.weekly_hours;

        self.with_tx(move |store| {
            let day_begin = start_of_day(now);
            let daily = aggregated_time(store, day_begin, day_begin + TimeDelta::days(1), now)?;

            let week_begin = crate::timeutil::day_start(start_of_week(now.date_naive()));
            let weekly = aggregated_time(store, week_begin, week_begin + TimeDelta::days(7), now)?;

            Ok((weekly_hours / 5 - daily, weekly_hours - weekly))
        })
    }

    /// Runs `op` inside one transaction: commit on success, rollback on any
    /// error. This is the single place rollback is decided.
    fn with_tx<T>(
        &mut self,
        op: impl FnOnce(&SqliteTaskStore<'_>) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        let tx = self
            .conn
            .transaction()
            .map_err(|err| TrackerError::from(StoreError::from(err)))?;

        // Dropping an uncommitted transaction rolls it back.
        let out = op(&SqliteTaskStore::new(&tx))?;

        tx.commit()
            .map_err(|err| TrackerError::from(StoreError::from(err)))?;
        Ok(out)
    }
}

/// Total clamped task time overlapping `[start, end)`.
fn aggregated_time(
    store: &dyn TaskStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TrackerResult<TimeDelta> {
    let mut acc = TimeDelta::zero();
    for task in store.tasks_in_range(start, end)? {
        let clamped_start = task.started_at.max(start);
        let clamped_end = task.end_or(now).min(end);
        if clamped_end > clamped_start {
            acc = acc + (clamped_end - clamped_start);
        }
    }

    Ok(acc)
}

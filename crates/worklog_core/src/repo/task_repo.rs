//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide transactional CRUD over task rows and the config table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - All operations run against a caller-supplied connection; passing a
//!   `rusqlite::Transaction` (which derefs to `Connection`) gives the
//!   atomic read-decide-write sequences the lifecycle manager needs.
//! - Tags are persisted as a JSON array string in canonical sorted order.
//! - Timestamps are persisted as Unix epoch seconds.

use crate::db::DbError;
use crate::model::config::Config;
use crate::model::task::{Task, TaskId};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    description,
    started_at,
    stopped_at,
    tags
FROM tasks";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for task persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Mutation or deletion addressed a task without a valid identity.
    InvalidTaskId,
    /// The store holds no tasks at all.
    NoTasks,
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidTaskId => write!(f, "invalid task ID"),
            Self::NoTasks => write!(f, "no tasks recorded yet"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidTaskId | Self::NoTasks | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Transactional store contract consumed by the lifecycle manager and the
/// report engine.
pub trait TaskStore {
    /// Returns the running task, if any.
    fn current_task(&self) -> StoreResult<Option<Task>>;
    /// Tasks overlapping the half-open range `[start, end)`, newest first.
    fn tasks_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>>;
    /// Earliest task ever recorded. Fails `NoTasks` on an empty store.
    fn first_task(&self) -> StoreResult<Task>;
    /// Every task, newest first.
    fn all_tasks(&self) -> StoreResult<Vec<Task>>;
    /// Inserts a task and assigns its id.
    fn insert_task(&self, task: &mut Task) -> StoreResult<()>;
    /// Updates a task by id.
    fn update_task(&self, task: &Task) -> StoreResult<()>;
    /// Sets the stop timestamp of the given task.
    fn stop_task(&self, id: TaskId, at: DateTime<Utc>) -> StoreResult<()>;
    /// Deletes a task by id.
    fn delete_task(&self, id: TaskId) -> StoreResult<()>;
    fn load_config(&self) -> StoreResult<Config>;
    fn save_config(&self, config: &Config) -> StoreResult<()>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn current_task(&self) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE stopped_at IS NULL LIMIT 1;"))?;

        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn tasks_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE started_at < ?2
               AND (stopped_at IS NULL OR stopped_at > ?1)
             ORDER BY started_at DESC;"
        ))?;

        let mut rows = stmt.query(params![start.timestamp(), end.timestamp()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn first_task(&self) -> StoreResult<Task> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY started_at ASC LIMIT 1;"))?;

        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => parse_task_row(row),
            None => Err(StoreError::NoTasks),
        }
    }

    fn all_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY started_at DESC;"))?;

        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn insert_task(&self, task: &mut Task) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO tasks (description, started_at, stopped_at, tags)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                task.description,
                task.started_at.timestamp(),
                task.stopped_at.map(|t| t.timestamp()),
                encode_tags(&task.tags)?,
            ],
        )?;

        task.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    fn update_task(&self, task: &Task) -> StoreResult<()> {
        let id = task.id.ok_or(StoreError::InvalidTaskId)?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                description = ?1,
                started_at = ?2,
                stopped_at = ?3,
                tags = ?4
             WHERE id = ?5;",
            params![
                task.description,
                task.started_at.timestamp(),
                task.stopped_at.map(|t| t.timestamp()),
                encode_tags(&task.tags)?,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::InvalidTaskId);
        }

        Ok(())
    }

    fn stop_task(&self, id: TaskId, at: DateTime<Utc>) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET stopped_at = ?1 WHERE id = ?2;",
            params![at.timestamp(), id],
        )?;

        if changed == 0 {
            return Err(StoreError::InvalidTaskId);
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;

        if changed == 0 {
            return Err(StoreError::InvalidTaskId);
        }

        Ok(())
    }

    fn load_config(&self) -> StoreResult<Config> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM config;")?;
        let mut rows = stmt.query([])?;

        let mut config = Config::default();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;

            let seconds = value.parse::<i64>().map_err(|_| {
                StoreError::InvalidData(format!("config value for `{key}` is not an integer"))
            })?;

            match key.as_str() {
                "weekly_hours" => config.weekly_hours = TimeDelta::seconds(seconds),
                "monthly_hours" => config.monthly_hours = TimeDelta::seconds(seconds),
                other => {
                    return Err(StoreError::InvalidData(format!(
                        "unknown configuration key: {other}"
                    )));
                }
            }
        }

        Ok(config)
    }

    fn save_config(&self, config: &Config) -> StoreResult<()> {
        let entries = [
            ("weekly_hours", config.weekly_hours.num_seconds()),
            ("monthly_hours", config.monthly_hours.num_seconds()),
        ];

        for (key, seconds) in entries {
            self.conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                params![key, seconds.to_string()],
            )?;
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let started_at_epoch: i64 = row.get("started_at")?;
    let started_at = parse_epoch(started_at_epoch, "tasks.started_at")?;

    let stopped_at = match row.get::<_, Option<i64>>("stopped_at")? {
        Some(epoch) => Some(parse_epoch(epoch, "tasks.stopped_at")?),
        None => None,
    };

    let tags_json: String = row.get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|err| {
        StoreError::InvalidData(format!("invalid tags array in tasks.tags: {err}"))
    })?;

    Ok(Task {
        id: Some(row.get("id")?),
        description: row.get("description")?,
        tags,
        started_at,
        stopped_at,
    })
}

fn parse_epoch(epoch: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| StoreError::InvalidData(format!("invalid timestamp `{epoch}` in {column}")))
}

/// Serializes tags in canonical sorted order. The lifecycle manager
/// compares tag sequences for equality, so unsorted input from external
/// edit paths must not reach the rows.
fn encode_tags(tags: &[String]) -> StoreResult<String> {
    let mut tags = tags.to_vec();
    tags.sort();

    serde_json::to_string(&tags)
        .map_err(|err| StoreError::InvalidData(format!("unable to encode tags: {err}")))
}

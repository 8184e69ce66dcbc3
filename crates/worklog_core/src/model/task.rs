//! Task domain model.
//!
//! # Responsibility
//! - Define the single record tracked by the lifecycle state machine.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never reused.
//! - `stopped_at == None` means the task is the current (running) one.
//! - `tags` are sorted, so tag-set equality is plain sequence equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the task store.
pub type TaskId = i64;

/// One tracked unit of work with its activity interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// `None` until the store assigns a row id on insert.
    pub id: Option<TaskId>,
    /// Free-text description. Non-empty for every persisted task.
    pub description: String,
    /// `@`-prefixed labels in canonical sorted order.
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    /// `None` while the task is still running.
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a running task starting at `now`.
    pub fn new(description: impl Into<String>, tags: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            description: description.into(),
            tags,
            started_at: now,
            stopped_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// Effective end of the activity interval, treating a running task as
    /// ending at `now`. Used for duration math only, never persisted.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.stopped_at.unwrap_or(now)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

//! Core domain logic for the worklog time tracker.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod parse;
pub mod repo;
pub mod report;
pub mod rules;
pub mod service;
mod timeutil;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::config::Config;
pub use model::task::{Task, TaskId};
pub use parse::parse_raw;
pub use repo::task_repo::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use report::{Report, ReportEntry, WeekSummary};
pub use rules::{RuleEntry, RuleKind, RuleSnapshot, RulesTimeline};
pub use service::tracker::{Tracker, TrackerError, TrackerResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

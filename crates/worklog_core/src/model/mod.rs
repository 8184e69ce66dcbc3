//! Domain model for the worklog tracker.
//!
//! # Responsibility
//! - Define the canonical task record and the persisted configuration.
//!
//! # Invariants
//! - At most one task store-wide is running (`stopped_at == None`).
//! - Task tags are kept lexicographically sorted at all times.

pub mod config;
pub mod task;

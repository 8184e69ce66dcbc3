//! Persistence boundary for the worklog core.
//!
//! # Responsibility
//! - Keep all SQL behind the `TaskStore` contract.
//!
//! # Invariants
//! - Callers own the transaction boundary; a store instance never commits
//!   or rolls back on its own.

pub mod task_repo;

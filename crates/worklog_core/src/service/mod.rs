//! Use-case layer for the worklog core.
//!
//! # Responsibility
//! - Expose the operations the presentation layer is allowed to call.
//!
//! # Invariants
//! - Every mutating sequence runs inside one store transaction.

pub mod tracker;

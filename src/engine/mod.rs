// src/engine/mod.rs

//! Parallel execution engine for parbuild.
//!
//! This module ties together:
//! - the per-execution bookkeeping (requested-name queue, working set,
//!   completed names, failure record) in [`state`]
//! - the scheduler that drains working sets into the worker pool and reacts
//!   to completions from worker threads, in [`scheduler`]
//!
//! The bookkeeping in [`state`] is a plain synchronous state machine without
//! threads or channels, so it can be unit tested directly. The scheduler
//! wraps it in a single mutex and drives it from the worker pool.

/// Canonical target name type used throughout the engine.
pub type TargetName = String;

pub mod scheduler;
pub mod state;

pub use scheduler::{execute_targets, execute_targets_until};
pub use state::{FailedTarget, SchedulerState, WorkingSet};

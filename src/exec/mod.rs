// src/exec/mod.rs

//! Execution layer.
//!
//! - [`pool`] owns the fixed-size pool of worker threads that the scheduler
//!   submits ready targets to.
//! - [`command`] provides [`CommandTarget`], the target type built from a
//!   `[target.<name>]` section, whose work is a shell command.

pub mod command;
pub mod pool;

pub use command::CommandTarget;
pub use pool::{Job, Termination, WorkerPool};

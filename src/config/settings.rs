// src/config/settings.rs

//! Scheduler settings read from project properties.

use std::str::FromStr;
use std::time::Duration;

use crate::errors::{ParbuildError, Result};
use crate::project::Project;

pub const NUM_THREADS_PROPKEY: &str = "parbuild.numthreads";
pub const DEBUG_PROPKEY: &str = "parbuild.debug";
pub const TIMEOUT_PROPKEY: &str = "parbuild.timeout";

pub const DEFAULT_NUM_THREADS: usize = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Knobs for one parallel execution, read once when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Width of the worker pool.
    pub num_threads: usize,
    /// Log every submission and completion at `info`.
    pub debug: bool,
    /// Upper bound on the wait for the pool to drain.
    pub timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_NUM_THREADS,
            debug: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SchedulerSettings {
    pub fn from_project(project: &Project) -> Result<Self> {
        let num_threads: usize = read_prop(project, NUM_THREADS_PROPKEY, DEFAULT_NUM_THREADS)?;
        if num_threads == 0 {
            return Err(ParbuildError::ConfigError(format!(
                "property '{}' must be >= 1 (got 0)",
                NUM_THREADS_PROPKEY
            )));
        }

        let timeout_secs: u64 = read_prop(project, TIMEOUT_PROPKEY, DEFAULT_TIMEOUT_SECS)?;

        let debug = project
            .property(DEBUG_PROPKEY)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        Ok(Self {
            num_threads,
            debug,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn read_prop<T: FromStr>(project: &Project, key: &str, default: T) -> Result<T> {
    match project.property(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ParbuildError::ConfigError(format!(
                "property '{}' must be a non-negative integer (got '{}')",
                key, raw
            ))
        }),
    }
}

// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::engine::TargetName;

#[derive(Error, Debug)]
pub enum ParbuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Cycle detected in target graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The first target whose work failed during an execution.
    #[error("target '{target}' failed: {source}")]
    TargetFailed {
        target: TargetName,
        #[source]
        source: anyhow::Error,
    },

    #[error("parallel target execution timed out at {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("interrupted while waiting for parallel target execution")]
    Interrupted,

    #[error("worker pool is shut down; job rejected")]
    PoolShutDown,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ParbuildError>;

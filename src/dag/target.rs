// src/dag/target.rs

//! The unit of build work and a closure-backed implementation of it.

use std::fmt;

use crate::engine::TargetName;

/// A named unit of build work with declared dependencies.
///
/// The scheduler only ever reads a target: it asks for the name and the
/// dependency names, and calls [`Target::perform_work`] at most once per
/// cycle on a worker thread.
pub trait Target: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Names of the targets that must complete successfully before this one
    /// may start, in declaration order.
    fn dependencies(&self) -> &[TargetName];

    /// Run this target's own work synchronously.
    fn perform_work(&self) -> anyhow::Result<()>;
}

type WorkFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// A target whose work is an arbitrary closure.
///
/// Handy for embedding parbuild as a library and for tests.
pub struct FnTarget {
    name: TargetName,
    deps: Vec<TargetName>,
    work: Box<WorkFn>,
}

impl FnTarget {
    pub fn new<F>(name: impl Into<TargetName>, deps: &[&str], work: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            work: Box::new(work),
        }
    }

    /// A target with no work of its own; it only groups its dependencies.
    pub fn aggregate(name: impl Into<TargetName>, deps: &[&str]) -> Self {
        Self::new(name, deps, || Ok(()))
    }
}

impl fmt::Debug for FnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTarget")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

impl Target for FnTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TargetName] {
        &self.deps
    }

    fn perform_work(&self) -> anyhow::Result<()> {
        (self.work)()
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use parbuild::config::settings::{DEBUG_PROPKEY, NUM_THREADS_PROPKEY, TIMEOUT_PROPKEY};
use parbuild::dag::{FnTarget, Target};
use parbuild::project::Project;

/// Builder for `Project` to simplify test setup.
pub struct ProjectBuilder {
    project: Project,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            project: Project::new("test"),
        }
    }

    pub fn with_target(mut self, target: Arc<dyn Target>) -> Self {
        self.project.add_target(target);
        self
    }

    /// Add a target that does nothing but depend on `deps`.
    pub fn with_aggregate(self, name: &str, deps: &[&str]) -> Self {
        self.with_target(Arc::new(FnTarget::aggregate(name, deps)))
    }

    pub fn with_threads(mut self, n: usize) -> Self {
        self.project.set_property(NUM_THREADS_PROPKEY, n.to_string());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.project.set_property(TIMEOUT_PROPKEY, secs.to_string());
        self
    }

    pub fn with_debug(mut self) -> Self {
        self.project.set_property(DEBUG_PROPKEY, "true");
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.project.set_property(key, value);
        self
    }

    pub fn with_default(mut self, name: &str) -> Self {
        self.project.set_default_target(name);
        self
    }

    pub fn build(self) -> Project {
        self.project
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `["a", "b"]` -> `vec!["a".to_string(), "b".to_string()]`.
pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

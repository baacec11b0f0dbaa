// src/project.rs

//! The execution context handed to the scheduler.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::model::ConfigFile;
use crate::dag::{Target, TargetRegistry};
use crate::engine::TargetName;
use crate::exec::CommandTarget;

/// A named set of targets plus the string properties that configure how
/// they are executed.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    default_target: Option<TargetName>,
    targets: Arc<TargetRegistry>,
    properties: BTreeMap<String, String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_target: None,
            targets: Arc::new(TargetRegistry::new()),
            properties: BTreeMap::new(),
        }
    }

    /// Build a project from a validated [`ConfigFile`]: every `[target.*]`
    /// becomes a [`CommandTarget`] and `[properties]` are copied verbatim.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let name = cfg
            .project
            .name
            .clone()
            .unwrap_or_else(|| "parbuild".to_string());

        let mut project = Project::new(name);
        project.default_target = cfg.project.default.clone();

        for (name, tc) in cfg.target.iter() {
            project.add_target(Arc::new(CommandTarget::from_config(name.clone(), tc)));
        }

        for (key, value) in cfg.properties.iter() {
            project.set_property(key.clone(), value.to_string());
        }

        project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    pub fn set_default_target(&mut self, name: impl Into<TargetName>) {
        self.default_target = Some(name.into());
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Shared handle to the registry, for code that outlives the borrow of
    /// the project (worker threads resolving later cycles).
    pub fn targets_arc(&self) -> Arc<TargetRegistry> {
        Arc::clone(&self.targets)
    }

    pub fn add_target(&mut self, target: Arc<dyn Target>) {
        Arc::make_mut(&mut self.targets).insert(target);
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

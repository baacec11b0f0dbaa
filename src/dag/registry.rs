// src/dag/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dag::target::Target;
use crate::engine::TargetName;

/// Every target known to a project, keyed by name.
///
/// Cloning is cheap: targets are shared behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<TargetName, Arc<dyn Target>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target, replacing (and returning) any target previously
    /// registered under the same name.
    pub fn insert(&mut self, target: Arc<dyn Target>) -> Option<Arc<dyn Target>> {
        self.targets.insert(target.name().to_string(), target)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Target>> {
        self.targets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// All target names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Target>> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<Arc<dyn Target>> for TargetRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Target>>>(iter: I) -> Self {
        let mut registry = TargetRegistry::new();
        for target in iter {
            registry.insert(target);
        }
        registry
    }
}

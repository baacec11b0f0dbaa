// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ParbuildError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ParbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.project, raw.properties, raw.target))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_targets(cfg)?;
    validate_default_target(cfg)?;
    validate_target_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(ParbuildError::ConfigError(
            "build file must contain at least one [target.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    if let Some(default) = cfg.project.default.as_deref() {
        if !cfg.target.contains_key(default) {
            return Err(ParbuildError::ConfigError(format!(
                "[project].default names unknown target '{}'",
                default
            )));
        }
    }
    Ok(())
}

fn validate_target_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        for dep in target.depends.iter() {
            if dep == name {
                return Err(ParbuildError::ConfigError(format!(
                    "target '{}' cannot depend on itself in `depends`",
                    name
                )));
            }
            if !cfg.target.contains_key(dep) {
                return Err(ParbuildError::ConfigError(format!(
                    "target '{}' has unknown dependency '{}' in `depends`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> target
    // For:
    //   [target.B]
    //   depends = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.target.keys() {
        graph.add_node(name.as_str());
    }

    for (name, target) in cfg.target.iter() {
        for dep in target.depends.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(ParbuildError::DagCycle(format!(
                "cycle detected in target graph involving target '{}'",
                node
            )))
        }
    }
}

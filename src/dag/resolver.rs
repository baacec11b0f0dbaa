// src/dag/resolver.rs

//! Dependency resolution: expand a requested target into an execution order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::dag::registry::TargetRegistry;
use crate::dag::target::Target;
use crate::errors::{ParbuildError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Return `root` plus every target it transitively depends on, ordered so
/// that each target appears after all of its dependencies.
///
/// The walk is a depth-first search that visits dependencies in their
/// declared order, so the result is stable for a given registry. `root` is
/// always the last element.
///
/// Fails with [`ParbuildError::TargetNotFound`] if `root` or any dependency
/// is not registered, and with [`ParbuildError::DagCycle`] if the walk
/// re-enters a target it is still visiting.
pub fn topo_sort(root: &str, registry: &TargetRegistry) -> Result<Vec<Arc<dyn Target>>> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order = Vec::new();
    let mut path = Vec::new();

    visit(root, None, registry, &mut marks, &mut path, &mut order)?;

    trace!(
        root,
        order = ?order.iter().map(|t| t.name()).collect::<Vec<_>>(),
        "resolved target order"
    );
    Ok(order)
}

fn visit(
    name: &str,
    required_by: Option<&str>,
    registry: &TargetRegistry,
    marks: &mut HashMap<String, Mark>,
    path: &mut Vec<String>,
    order: &mut Vec<Arc<dyn Target>>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => {
            path.push(name.to_string());
            return Err(ParbuildError::DagCycle(format!(
                "cycle detected in target graph: {}",
                path.join(" -> ")
            )));
        }
        None => {}
    }

    let target = registry.get(name).ok_or_else(|| match required_by {
        Some(parent) => ParbuildError::TargetNotFound(format!(
            "target '{name}' does not exist in the project (required by '{parent}')"
        )),
        None => ParbuildError::TargetNotFound(format!(
            "target '{name}' does not exist in the project"
        )),
    })?;

    marks.insert(name.to_string(), Mark::Visiting);
    path.push(name.to_string());

    for dep in target.dependencies() {
        visit(dep, Some(name), registry, marks, path, order)?;
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Visited);
    order.push(Arc::clone(target));
    Ok(())
}

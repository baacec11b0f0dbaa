// src/dag/mod.rs

//! Target graph representation and dependency resolution.
//!
//! - [`target`] defines the [`Target`] trait and a closure-backed target.
//! - [`registry`] holds every target known to a project.
//! - [`resolver`] expands a requested target into a dependency-first
//!   execution order.

pub mod registry;
pub mod resolver;
pub mod target;

pub use registry::TargetRegistry;
pub use resolver::topo_sort;
pub use target::{FnTarget, Target};

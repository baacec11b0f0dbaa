// src/config/mod.rs

//! Build file loading and scheduler property lookup.
//!
//! - [`model`] mirrors the TOML layout of `Parbuild.toml`.
//! - [`loader`] reads and validates a build file.
//! - [`validate`] turns a [`RawConfigFile`] into a [`ConfigFile`].
//! - [`settings`] reads the `parbuild.*` properties that configure the
//!   scheduler.

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ProjectSection, PropertyValue, RawConfigFile, TargetConfig};
pub use settings::SchedulerSettings;

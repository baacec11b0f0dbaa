// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Top-level build file as read from TOML, before validation.
///
/// ```toml
/// [project]
/// name = "demo"
/// default = "build"
///
/// [properties]
/// "parbuild.numthreads" = 4
///
/// [target.compile]
/// cmd = "cc -c main.c"
/// depends = ["init"]
/// ```
///
/// All sections are optional at the TOML level; validation then requires at
/// least one target.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,

    /// All targets from `[target.<name>]`, keyed by target name.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,
}

/// A validated build file.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders may assume
/// every dependency exists and the target graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub properties: BTreeMap<String, PropertyValue>,
    pub target: BTreeMap<String, TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        properties: BTreeMap<String, PropertyValue>,
        target: BTreeMap<String, TargetConfig>,
    ) -> Self {
        Self {
            project,
            properties,
            target,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: Option<String>,

    /// Target to run when none is requested on the command line.
    #[serde(default)]
    pub default: Option<String>,
}

/// A `[properties]` value. Stored and looked up as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetConfig {
    /// Shell command to run. A target without a command only groups its
    /// dependencies.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Targets that must complete successfully before this one starts.
    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

// src/exec/command.rs

//! Targets whose work is a shell command.

use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::model::TargetConfig;
use crate::dag::Target;
use crate::engine::TargetName;

/// A target declared in the build file.
///
/// The command runs synchronously on the worker thread that picked the target
/// up. Captured stdout and stderr are logged as one (possibly multi-line)
/// message each once the process exits.
#[derive(Debug, Clone)]
pub struct CommandTarget {
    name: TargetName,
    deps: Vec<TargetName>,
    cmd: Option<String>,
    description: Option<String>,
}

impl CommandTarget {
    pub fn new(name: impl Into<TargetName>, deps: Vec<TargetName>, cmd: Option<String>) -> Self {
        Self {
            name: name.into(),
            deps,
            cmd,
            description: None,
        }
    }

    pub fn from_config(name: TargetName, cfg: &TargetConfig) -> Self {
        Self {
            name,
            deps: cfg.depends.clone(),
            cmd: cfg.cmd.clone(),
            description: cfg.description.clone(),
        }
    }

    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn run(&self, cmd: &str) -> Result<()> {
        info!(target_name = %self.name, cmd = %cmd, "running command");

        let output = shell_command(cmd)
            .output()
            .with_context(|| format!("spawning process for target '{}'", self.name))?;

        self.log_output(&output);

        if !output.status.success() {
            match output.status.code() {
                Some(code) => bail!("command `{cmd}` exited with status {code}"),
                None => bail!("command `{cmd}` was terminated by a signal"),
            }
        }

        debug!(target_name = %self.name, "command succeeded");
        Ok(())
    }

    fn log_output(&self, output: &Output) {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim_end();
        if !stdout.is_empty() {
            info!(target_name = %self.name, "{stdout}");
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        if !stderr.is_empty() {
            info!(target_name = %self.name, stream = "stderr", "{stderr}");
        }
    }
}

impl Target for CommandTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TargetName] {
        &self.deps
    }

    fn perform_work(&self) -> Result<()> {
        match self.cmd.as_deref() {
            Some(cmd) => self.run(cmd),
            None => {
                debug!(target_name = %self.name, "no command; nothing to do");
                Ok(())
            }
        }
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

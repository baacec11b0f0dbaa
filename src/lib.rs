// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod project;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::settings::{DEBUG_PROPKEY, NUM_THREADS_PROPKEY, TIMEOUT_PROPKEY};
use crate::dag::topo_sort;
use crate::engine::{TargetName, execute_targets_until};
use crate::errors::{ParbuildError, Result};
use crate::project::Project;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - build file loading
/// - command-line property overrides
/// - target selection (explicit or `[project].default`)
/// - the parallel scheduler
/// - Ctrl-C handling (interrupts the wait for running targets)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.file);
    let cfg = load_and_validate(&config_path)?;

    let mut project = Project::from_config(&cfg);
    apply_overrides(&mut project, &args);

    let targets = requested_targets(&project, &args)?;
    info!(project = project.name(), ?targets, "requested targets");

    if args.dry_run {
        print_dry_run(&project, &targets)?;
        return Ok(());
    }

    execute_targets_until(&project, &targets, ctrl_c()).await
}

/// Apply `-D`, `-j`, `--timeout` and `--debug` on top of `[properties]`.
/// Later sources win: shorthand flags override `-D` definitions.
fn apply_overrides(project: &mut Project, args: &CliArgs) {
    for (key, value) in args.defines.iter() {
        project.set_property(key.clone(), value.clone());
    }
    if let Some(threads) = args.threads {
        project.set_property(NUM_THREADS_PROPKEY, threads.to_string());
    }
    if let Some(timeout) = args.timeout {
        project.set_property(TIMEOUT_PROPKEY, timeout.to_string());
    }
    if args.debug {
        project.set_property(DEBUG_PROPKEY, "true");
    }
}

fn requested_targets(project: &Project, args: &CliArgs) -> Result<Vec<TargetName>> {
    if !args.targets.is_empty() {
        return Ok(args.targets.clone());
    }

    match project.default_target() {
        Some(default) => Ok(vec![default.to_string()]),
        None => Err(ParbuildError::ConfigError(
            "no targets requested and the build file has no [project].default".to_string(),
        )),
    }
}

/// Resolves when the user presses Ctrl-C. Never resolves if the signal
/// handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Simple dry-run output: print each requested target's execution order.
fn print_dry_run(project: &Project, targets: &[TargetName]) -> Result<()> {
    println!("parbuild dry-run: project {}", project.name());
    for (key, value) in project.properties() {
        println!("  {key} = {value}");
    }
    println!();

    for name in targets {
        let order = topo_sort(name, project.targets())?;
        println!("{name} ({} targets):", order.len());
        for target in order {
            if target.dependencies().is_empty() {
                println!("  - {}", target.name());
            } else {
                println!("  - {} (depends: {})", target.name(), target.dependencies().join(", "));
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

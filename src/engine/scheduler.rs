// src/engine/scheduler.rs

//! Dependency-aware parallel execution of requested targets.
//!
//! Requested names are processed one at a time. Each is resolved into a
//! working set, and every target whose dependencies have completed is
//! submitted to a fixed-size [`WorkerPool`]. Each successful completion
//! re-scans the working set; once it is drained the next requested name is
//! pulled, and once the names run out the pool is shut down. The caller then
//! waits (bounded by the configured timeout) for the pool to terminate.
//!
//! All bookkeeping lives in one [`SchedulerState`] behind a single mutex.
//! Target work always runs outside that lock.
//!
//! Failures are fail-fast: the first failing target is recorded and the
//! pool is shut down. Targets that are already running are allowed to finish
//! but their results are discarded, and queued targets are skipped. Later
//! failures are dropped without being reported.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::config::SchedulerSettings;
use crate::dag::{Target, TargetRegistry, topo_sort};
use crate::engine::TargetName;
use crate::engine::state::{SchedulerState, WorkingSet};
use crate::errors::{ParbuildError, Result};
use crate::exec::WorkerPool;
use crate::project::Project;

/// Execute `target_names` (and their dependencies) against `project`.
///
/// Equivalent to [`execute_targets_until`] with an interrupt that never
/// fires.
pub async fn execute_targets(project: &Project, target_names: &[TargetName]) -> Result<()> {
    execute_targets_until(project, target_names, std::future::pending()).await
}

/// Execute `target_names` (and their dependencies) against `project`,
/// giving up with [`ParbuildError::Interrupted`] if `interrupt` completes
/// before the worker pool has drained.
///
/// Returns:
/// - `Ok(())` once every requested target and its dependencies succeeded;
/// - [`ParbuildError::TargetFailed`] for the first target that failed;
/// - [`ParbuildError::Timeout`] if the pool did not drain within
///   `parbuild.timeout` seconds;
/// - [`ParbuildError::TargetNotFound`] (before anything runs) if a requested
///   name is unknown.
///
/// After a timeout or interrupt no further targets are submitted, but
/// targets that are already running keep running on their worker threads.
pub async fn execute_targets_until<F>(
    project: &Project,
    target_names: &[TargetName],
    interrupt: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let settings = SchedulerSettings::from_project(project)?;

    for name in target_names {
        if !project.targets().contains(name) {
            return Err(ParbuildError::TargetNotFound(format!(
                "target '{name}' does not exist in project '{}'",
                project.name()
            )));
        }
    }

    info!(
        threads = settings.num_threads,
        timeout_secs = settings.timeout.as_secs(),
        "parallel executor with {} threads, timeout {} sec",
        settings.num_threads,
        settings.timeout.as_secs()
    );

    let (pool, mut termination) = WorkerPool::spawn(settings.num_threads)?;
    let scheduler = Arc::new(Scheduler {
        state: Mutex::new(SchedulerState::new(target_names.iter().cloned())),
        pool,
        registry: project.targets_arc(),
        debug: settings.debug,
    });

    scheduler.start();

    let terminated = tokio::select! {
        terminated = termination.wait(settings.timeout) => terminated,
        () = interrupt => {
            warn!("interrupted while waiting for targets; abandoning run");
            scheduler.abandon();
            return Err(ParbuildError::Interrupted);
        }
    };

    if !terminated {
        warn!(
            timeout_secs = settings.timeout.as_secs(),
            "worker pool did not drain in time; abandoning run"
        );
        scheduler.abandon();
        return Err(ParbuildError::Timeout {
            seconds: settings.timeout.as_secs(),
        });
    }

    match scheduler.lock().take_failure() {
        Some(failed) => Err(ParbuildError::TargetFailed {
            target: failed.target,
            source: failed.error,
        }),
        None => {
            info!("all requested targets completed");
            Ok(())
        }
    }
}

/// Owns everything one execution mutates. Shared between the calling task
/// and every job on the pool.
struct Scheduler {
    state: Mutex<SchedulerState>,
    pool: WorkerPool,
    registry: Arc<TargetRegistry>,
    debug: bool,
}

impl Scheduler {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(self: &Arc<Self>) {
        let mut state = self.lock();
        self.advance(&mut state);
    }

    /// Stop submitting work after the caller gave up waiting.
    fn abandon(&self) {
        let mut state = self.lock();
        state.abandon();
        self.pool.shutdown();
    }

    /// Pull the next requested name if the current working set is drained,
    /// then submit every target that has become ready.
    ///
    /// Must be called with the state lock held.
    fn advance(self: &Arc<Self>, state: &mut SchedulerState) {
        if state.is_doomed() {
            return;
        }

        if state.needs_next_cycle() {
            let (finished, next) = state.next_requested();

            if let Some(ws) = finished {
                debug!(
                    cycle = ws.cycle(),
                    requested = ws.requested(),
                    completed = ws.completed().len(),
                    "working set drained"
                );
            }

            let Some((cycle, requested)) = next else {
                debug!("no requested targets left; shutting down worker pool");
                self.pool.shutdown();
                return;
            };

            match topo_sort(&requested, &self.registry) {
                Ok(order) => {
                    debug!(
                        cycle,
                        requested = %requested,
                        targets = order.len(),
                        "starting working set"
                    );
                    state.begin_cycle(WorkingSet::new(cycle, requested, order));
                }
                Err(err) => {
                    self.fail(state, requested, anyhow::Error::from(err));
                    return;
                }
            }
        }

        let Some(ws) = state.working_mut() else {
            return;
        };
        let cycle = ws.cycle();
        let ready = ws.take_ready();

        if ready.is_empty() && ws.is_stalled() {
            let requested = ws.requested().to_string();
            let error = anyhow!(
                "{} target(s) of '{}' have dependencies that can never complete",
                ws.pending_len(),
                requested
            );
            self.fail(state, requested, error);
            return;
        }

        for target in ready {
            self.submit(target, cycle);
        }
    }

    fn submit(self: &Arc<Self>, target: Arc<dyn Target>, cycle: u64) {
        let name = target.name().to_string();
        if self.debug {
            info!(target_name = %name, cycle, "submitting target");
        } else {
            debug!(target_name = %name, cycle, "submitting target");
        }

        let scheduler = Arc::clone(self);
        let job = Box::new(move || scheduler.run_target(target, cycle));
        if let Err(err) = self.pool.submit(job) {
            warn!(target_name = %name, error = %err, "could not submit target");
        }
    }

    /// Body of a pool job. Runs on a worker thread.
    fn run_target(self: &Arc<Self>, target: Arc<dyn Target>, cycle: u64) {
        if self.lock().is_doomed() {
            debug!(target_name = target.name(), "run already failed; skipping target");
            return;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.perform_work()))
            .unwrap_or_else(|payload| {
                Err(anyhow!("target panicked: {}", panic_message(&*payload)))
            });

        let mut state = self.lock();
        match outcome {
            Ok(()) => self.target_completed(&mut state, target.name(), cycle),
            Err(error) => self.fail(&mut state, target.name().to_string(), error),
        }
    }

    fn target_completed(self: &Arc<Self>, state: &mut SchedulerState, name: &str, cycle: u64) {
        if state.is_doomed() {
            debug!(target_name = name, "run already failed; discarding completion");
            return;
        }

        match state.working_mut() {
            Some(ws) if ws.cycle() == cycle => {
                if !ws.mark_completed(name) {
                    warn!(target_name = name, cycle, "target completed twice in one cycle");
                }
            }
            _ => {
                warn!(target_name = name, cycle, "completion for a cycle that is no longer active");
                return;
            }
        }

        if self.debug {
            info!(target_name = name, cycle, "completed target");
        } else {
            debug!(target_name = name, cycle, "completed target");
        }

        self.advance(state);
    }

    /// Record `error` as the run's failure unless one is already recorded,
    /// and stop accepting work.
    fn fail(&self, state: &mut SchedulerState, target: TargetName, error: anyhow::Error) {
        if state.failure().is_some() {
            debug!(target_name = %target, error = %error, "ignoring failure after the first");
            return;
        }

        warn!(target_name = %target, error = %error, "target failed; stopping further submissions");
        state.record_failure(target, error);
        self.pool.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

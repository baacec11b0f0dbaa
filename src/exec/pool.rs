// src/exec/pool.rs

//! Fixed-size pool of worker threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{ParbuildError, Result};

/// A unit of work run on one of the pool's threads.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// A bounded pool of `width` OS threads named `worker-<i>`.
///
/// - [`WorkerPool::submit`] queues a job; jobs start in submission order as
///   threads become free.
/// - [`WorkerPool::shutdown`] stops accepting jobs. Already queued jobs still
///   run; each thread exits once the queue is empty. Safe to call any number
///   of times from any thread.
/// - The [`Termination`] returned alongside the pool resolves once every
///   thread has exited.
///
/// Running jobs are never interrupted.
#[derive(Debug)]
pub struct WorkerPool {
    jobs: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    width: usize,
}

/// Resolves when every worker thread of a [`WorkerPool`] has exited.
#[derive(Debug)]
pub struct Termination {
    done_rx: mpsc::Receiver<()>,
}

impl WorkerPool {
    /// Spawn `width` worker threads.
    pub fn spawn(width: usize) -> Result<(WorkerPool, Termination)> {
        let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();
        let job_rx: SharedReceiver = Arc::new(Mutex::new(job_rx));

        // Nothing is ever sent on this channel; each worker holds a sender and
        // the receiver observes closure once the last worker is gone.
        let (done_tx, done_rx) = mpsc::channel::<()>(1);

        for index in 0..width {
            let rx = Arc::clone(&job_rx);
            let done = done_tx.clone();
            thread::Builder::new()
                .name(format!("worker-{index}"))
                .spawn(move || worker_loop(index, rx, done))?;
        }

        debug!(width, "worker pool started");

        let pool = WorkerPool {
            jobs: Mutex::new(Some(job_tx)),
            width,
        };
        Ok((pool, Termination { done_rx }))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Queue a job. Fails with [`ParbuildError::PoolShutDown`] once
    /// [`WorkerPool::shutdown`] has been called.
    pub fn submit(&self, job: Job) -> Result<()> {
        match self.jobs().as_ref() {
            Some(tx) => tx.send(job).map_err(|_| ParbuildError::PoolShutDown),
            None => Err(ParbuildError::PoolShutDown),
        }
    }

    /// Stop accepting jobs. Returns `true` for the call that actually shut the
    /// pool down and `false` for every later call.
    pub fn shutdown(&self) -> bool {
        let was_open = self.jobs().take().is_some();
        if was_open {
            debug!(width = self.width, "worker pool shutting down");
        }
        was_open
    }

    pub fn is_shutdown(&self) -> bool {
        self.jobs().is_none()
    }

    fn jobs(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Job>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Termination {
    /// Wait up to `timeout` for every worker thread to exit.
    ///
    /// Returns `true` if the pool terminated in time.
    pub async fn wait(&mut self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.done_rx.recv())
            .await
            .is_ok()
    }
}

fn worker_loop(index: usize, jobs: SharedReceiver, _done: mpsc::Sender<()>) {
    debug!(worker = index, "worker thread started");

    loop {
        // The guard is released as soon as a job (or closure) is received, so
        // other workers can pick up the next job while this one runs.
        let next = jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .blocking_recv();

        match next {
            Some(job) => job(),
            None => break,
        }
    }

    debug!(worker = index, "worker thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[tokio::test]
    async fn runs_queued_jobs_then_terminates_after_shutdown() {
        let (pool, mut termination) = WorkerPool::spawn(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }

        assert!(pool.shutdown());
        assert!(termination.wait(Duration::from_secs(5)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_rejects_new_jobs() {
        let (pool, mut termination) = WorkerPool::spawn(1).unwrap();

        assert!(!pool.is_shutdown());
        assert!(pool.shutdown());
        assert!(!pool.shutdown());
        assert!(pool.is_shutdown());

        let res = pool.submit(Box::new(|| {}));
        assert!(matches!(res, Err(ParbuildError::PoolShutDown)));

        assert!(termination.wait(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn does_not_terminate_while_open() {
        let (pool, mut termination) = WorkerPool::spawn(1).unwrap();
        assert!(!termination.wait(Duration::from_millis(50)).await);
        pool.shutdown();
        assert!(termination.wait(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn jobs_run_concurrently_on_named_threads() {
        let width = 3;
        let (pool, mut termination) = WorkerPool::spawn(width).unwrap();
        let barrier = Arc::new(Barrier::new(width));
        let names = Arc::new(Mutex::new(HashSet::new()));

        for _ in 0..width {
            let barrier = Arc::clone(&barrier);
            let names = Arc::clone(&names);
            pool.submit(Box::new(move || {
                // Only completes if all `width` jobs are running at once.
                barrier.wait();
                let name = thread::current().name().unwrap_or_default().to_string();
                names.lock().unwrap().insert(name);
            }))
            .unwrap();
        }

        pool.shutdown();
        assert!(termination.wait(Duration::from_secs(5)).await);

        let names = names.lock().unwrap();
        assert_eq!(names.len(), width);
        assert!(names.iter().all(|n| n.starts_with("worker-")));
    }
}

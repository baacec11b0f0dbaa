// src/engine/state.rs

//! Per-execution bookkeeping for the parallel scheduler.
//!
//! Nothing in here knows about threads: the scheduler owns one
//! [`SchedulerState`] behind a single mutex and calls into it for every
//! transition.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::dag::Target;
use crate::engine::TargetName;

/// The targets resolved for one requested name, and how far along they are.
pub struct WorkingSet {
    cycle: u64,
    requested: TargetName,
    /// Resolved targets not yet submitted, in resolver order.
    pending: Vec<Arc<dyn Target>>,
    /// Submitted targets that have not reported back yet.
    in_flight: usize,
    completed: HashSet<TargetName>,
    resolved: usize,
}

impl WorkingSet {
    pub fn new(cycle: u64, requested: TargetName, order: Vec<Arc<dyn Target>>) -> Self {
        Self {
            cycle,
            requested,
            resolved: order.len(),
            pending: order,
            in_flight: 0,
            completed: HashSet::new(),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn completed(&self) -> &HashSet<TargetName> {
        &self.completed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of targets the resolver returned for this cycle.
    pub fn resolved_len(&self) -> usize {
        self.resolved
    }

    /// Nothing left to submit and nothing running.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    /// Pending targets remain but none can ever become ready.
    pub fn is_stalled(&self) -> bool {
        !self.pending.is_empty() && self.in_flight == 0
    }

    /// Remove every pending target whose dependencies have all completed and
    /// count it as in flight. Ready targets come back in resolver order; the
    /// rest keep their relative order.
    pub fn take_ready(&mut self) -> Vec<Arc<dyn Target>> {
        let completed = &self.completed;
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|t| t.dependencies().iter().all(|d| completed.contains(d)));

        self.pending = waiting;
        self.in_flight += ready.len();
        ready
    }

    /// Record the successful completion of an in-flight target.
    ///
    /// Returns `false` if the name had already been recorded, which would mean
    /// the same target was run twice in this cycle.
    pub fn mark_completed(&mut self, name: &str) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.completed.insert(name.to_string())
    }
}

impl fmt::Debug for WorkingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingSet")
            .field("cycle", &self.cycle)
            .field("requested", &self.requested)
            .field(
                "pending",
                &self.pending.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("in_flight", &self.in_flight)
            .field("completed", &self.completed)
            .finish()
    }
}

/// The first target failure of an execution.
#[derive(Debug)]
pub struct FailedTarget {
    pub target: TargetName,
    pub error: anyhow::Error,
}

/// Mutable state of one `execute_targets` call.
#[derive(Debug, Default)]
pub struct SchedulerState {
    requested: VecDeque<TargetName>,
    working: Option<WorkingSet>,
    cycles_started: u64,
    failure: Option<FailedTarget>,
    /// The caller stopped waiting (timeout or interrupt).
    abandoned: bool,
}

impl SchedulerState {
    pub fn new<I, S>(requested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetName>,
    {
        Self {
            requested: requested.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// No more work may be submitted and late results must be discarded.
    pub fn is_doomed(&self) -> bool {
        self.failure.is_some() || self.abandoned
    }

    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    pub fn failure(&self) -> Option<&FailedTarget> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<FailedTarget> {
        self.failure.take()
    }

    /// Fill the failure slot if it is empty. Returns `true` if this call
    /// recorded the failure; later failures are dropped.
    pub fn record_failure(&mut self, target: impl Into<TargetName>, error: anyhow::Error) -> bool {
        if self.failure.is_some() {
            return false;
        }
        self.failure = Some(FailedTarget {
            target: target.into(),
            error,
        });
        true
    }

    pub fn working(&self) -> Option<&WorkingSet> {
        self.working.as_ref()
    }

    pub fn working_mut(&mut self) -> Option<&mut WorkingSet> {
        self.working.as_mut()
    }

    /// `true` if the current working set is missing or drained, i.e. the next
    /// requested name should be pulled.
    pub fn needs_next_cycle(&self) -> bool {
        self.working.as_ref().is_none_or(WorkingSet::is_drained)
    }

    /// Discard the current working set and pop the next requested name.
    ///
    /// Returns the finished working set (if any) and the next name with its
    /// freshly allocated cycle id, or `None` once the queue is exhausted.
    pub fn next_requested(&mut self) -> (Option<WorkingSet>, Option<(u64, TargetName)>) {
        let finished = self.working.take();
        let next = self.requested.pop_front().map(|name| {
            self.cycles_started += 1;
            (self.cycles_started, name)
        });
        (finished, next)
    }

    pub fn begin_cycle(&mut self, working: WorkingSet) {
        self.working = Some(working);
    }

    pub fn remaining_requested(&self) -> usize {
        self.requested.len()
    }
}

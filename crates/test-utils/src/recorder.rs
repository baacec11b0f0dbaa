use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use parbuild::dag::{FnTarget, Target};

/// Something that happened to a target while the scheduler ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

/// What a recording target does between its `Started` and `Finished` events.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed,
    Fail(String),
    Panic(String),
    Sleep(Duration),
    SleepThenFail(Duration, String),
    /// Block until the gate is released, then succeed.
    Wait(Gate),
}

/// A one-shot latch a target can block on.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }
}

/// Shared, ordered log of target starts and (successful) finishes.
///
/// Targets created through [`ExecutionLog::target`] push into it from worker
/// threads, so tests can check ordering after `execute_targets` returns.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    events: Arc<Mutex<Vec<ExecEvent>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a target that records itself in this log.
    ///
    /// `Finished` is only recorded when the behaviour succeeds.
    pub fn target(&self, name: &str, deps: &[&str], behaviour: Behaviour) -> Arc<dyn Target> {
        let events = Arc::clone(&self.events);
        let target_name = name.to_string();

        Arc::new(FnTarget::new(name, deps, move || {
            events
                .lock()
                .unwrap()
                .push(ExecEvent::Started(target_name.clone()));

            match &behaviour {
                Behaviour::Succeed => {}
                Behaviour::Fail(msg) => anyhow::bail!("{msg}"),
                Behaviour::Panic(msg) => panic!("{msg}"),
                Behaviour::Sleep(d) => thread::sleep(*d),
                Behaviour::SleepThenFail(d, msg) => {
                    thread::sleep(*d);
                    anyhow::bail!("{msg}");
                }
                Behaviour::Wait(gate) => gate.wait(),
            }

            events
                .lock()
                .unwrap()
                .push(ExecEvent::Finished(target_name.clone()));
            Ok(())
        }))
    }

    /// Shorthand for a target that just succeeds.
    pub fn ok(&self, name: &str, deps: &[&str]) -> Arc<dyn Target> {
        self.target(name, deps, Behaviour::Succeed)
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(n) => Some(n),
                ExecEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Names in the order they finished successfully.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Finished(n) => Some(n),
                ExecEvent::Started(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, name: &str) -> bool {
        self.started().iter().any(|n| n == name)
    }

    pub fn start_count(&self, name: &str) -> usize {
        self.started().iter().filter(|n| *n == name).count()
    }

    /// Position of the first `Started` event for `name`.
    pub fn start_index(&self, name: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| *e == ExecEvent::Started(name.to_string()))
    }

    /// Position of the first `Finished` event for `name`.
    pub fn finish_index(&self, name: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| *e == ExecEvent::Finished(name.to_string()))
    }
}

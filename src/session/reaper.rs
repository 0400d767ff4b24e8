//! Background deletion of materialized tracks.
//!
//! Each reaped resource gets its own task: wait for the engine to let go of
//! the file, then try to delete it a bounded number of times. Failures are
//! logged and otherwise swallowed.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ReaperSettings;

use super::resource::MaterializedResource;

/// Deletes backing storage. Swappable so tests can simulate locked files.
pub trait FileRemover: Send + Sync + 'static {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Real filesystem; a file that is already gone counts as deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Source of delays. Swappable so tests run without real waits.
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapPolicy {
    pub quiescence: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl From<&ReaperSettings> for ReapPolicy {
    fn from(s: &ReaperSettings) -> Self {
        Self {
            quiescence: Duration::from_millis(s.quiescence_ms),
            attempts: s.attempts.max(1),
            backoff: Duration::from_millis(s.backoff_ms),
        }
    }
}

impl Default for ReapPolicy {
    fn default() -> Self {
        Self::from(&ReaperSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    Deleted { attempts: u32 },
    Abandoned { attempts: u32 },
}

/// One scheduled deletion. Owns its resource until it finishes.
pub struct ReaperTask<F: FileRemover, S: Sleeper> {
    resource: MaterializedResource,
    policy: ReapPolicy,
    remover: Arc<F>,
    sleeper: Arc<S>,
}

impl<F: FileRemover, S: Sleeper> ReaperTask<F, S> {
    pub fn new(
        resource: MaterializedResource,
        policy: ReapPolicy,
        remover: Arc<F>,
        sleeper: Arc<S>,
    ) -> Self {
        Self {
            resource,
            policy,
            remover,
            sleeper,
        }
    }

    /// Wait out the quiescence delay, then delete with retries.
    pub fn run(self) -> ReapOutcome {
        let path = self.resource.path();
        self.sleeper.sleep(self.policy.quiescence);

        for attempt in 1..=self.policy.attempts {
            match self.remover.remove(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), attempt, "deleted temp file");
                    return ReapOutcome::Deleted { attempts: attempt };
                }
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "temp file deletion failed"
                    );
                    if attempt < self.policy.attempts {
                        self.sleeper.sleep(self.policy.backoff);
                    }
                }
            }
        }

        tracing::warn!(
            path = %path.display(),
            attempts = self.policy.attempts,
            "could not delete temp file, abandoning it"
        );
        ReapOutcome::Abandoned {
            attempts: self.policy.attempts,
        }
    }
}

/// Receives resources the session no longer needs.
pub trait Reap {
    /// Take ownership of `resource` and dispose of it without blocking.
    fn reap(&self, resource: MaterializedResource);
}

/// Spawns one background task per reaped resource.
pub struct Reaper<F: FileRemover = FsRemover, S: Sleeper = ThreadSleeper> {
    policy: ReapPolicy,
    remover: Arc<F>,
    sleeper: Arc<S>,
    in_flight: Arc<InFlight>,
}

impl Reaper {
    pub fn new(policy: ReapPolicy) -> Self {
        Self::with_parts(policy, FsRemover, ThreadSleeper)
    }
}

/// Count of running tasks, with a wakeup when it drops to zero.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(self: &Arc<Self>) -> InFlightGuard {
        *self.lock() += 1;
        InFlightGuard(Arc::clone(self))
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let (count, _) = self
            .idle
            .wait_timeout_while(self.lock(), timeout, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut count = self.0.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

impl<F: FileRemover, S: Sleeper> Reaper<F, S> {
    pub fn with_parts(policy: ReapPolicy, remover: F, sleeper: S) -> Self {
        Self {
            policy,
            remover: Arc::new(remover),
            sleeper: Arc::new(sleeper),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Start a deletion task for `resource` and return immediately.
    ///
    /// `None` means no thread could be spawned; the resource is abandoned.
    pub fn schedule(&self, resource: MaterializedResource) -> Option<JoinHandle<ReapOutcome>> {
        let task = ReaperTask::new(
            resource,
            self.policy,
            Arc::clone(&self.remover),
            Arc::clone(&self.sleeper),
        );

        let guard = self.in_flight.enter();

        let spawned = thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || {
                let _guard = guard;
                task.run()
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "could not start reaper task, abandoning temp file");
                None
            }
        }
    }

    /// Number of deletion tasks still running.
    pub fn in_flight(&self) -> usize {
        *self.in_flight.lock()
    }

    /// Block until every task finished or `timeout` elapsed. Returns whether
    /// the reaper went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_idle(timeout)
    }
}

impl<F: FileRemover, S: Sleeper> Reap for Reaper<F, S> {
    fn reap(&self, resource: MaterializedResource) {
        let _ = self.schedule(resource);
    }
}

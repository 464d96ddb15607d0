//! Recurring job scheduling
//!
//! Connectors arm one sampling job each through the [`Scheduler`] trait.
//! Jobs are keyed by a structured [`JobKey`]; registering a key that already
//! has a job replaces it, so re-arming never stacks samplers.

use crate::error::{EvseError, Result};
use crate::logging::{StructuredLogger, get_logger};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Identity of a connector's periodic job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub evse_id: i32,
    pub connector_id: i32,
}

impl JobKey {
    pub fn new(evse_id: i32, connector_id: i32) -> Self {
        Self {
            evse_id,
            connector_id,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evse{}-connector{}-sampling",
            self.evse_id, self.connector_id
        )
    }
}

/// Body of a recurring job. Runs synchronously and may block on hardware I/O.
pub type Job = Arc<dyn Fn() + Send + Sync>;

pub trait Scheduler: Send + Sync {
    /// Run `job` every `interval`, replacing any job already registered
    /// under `key`.
    fn schedule_every(&self, interval: Duration, key: JobKey, job: Job) -> Result<()>;

    /// Stop the job registered under `key`. Returns whether one existed.
    fn cancel(&self, key: JobKey) -> bool;
}

/// Scheduler running each job as a tokio task; job bodies execute on the
/// blocking pool so bus I/O never stalls the async workers.
pub struct TokioScheduler {
    handle: Handle,
    jobs: Mutex<HashMap<JobKey, JoinHandle<()>>>,
    logger: StructuredLogger,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            jobs: Mutex::new(HashMap::new()),
            logger: get_logger("scheduler"),
        }
    }

    /// Scheduler bound to the runtime of the calling context
    pub fn from_current() -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| EvseError::scheduling(format!("no tokio runtime: {}", e)))?;
        Ok(Self::new(handle))
    }

    /// Whether a live job is registered under `key`
    pub fn is_scheduled(&self, key: JobKey) -> bool {
        self.jobs
            .lock()
            .get(&key)
            .is_some_and(|task| !task.is_finished())
    }

    pub fn job_count(&self) -> usize {
        self.jobs
            .lock()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_every(&self, interval: Duration, key: JobKey, job: Job) -> Result<()> {
        if interval.is_zero() {
            return Err(EvseError::scheduling(format!(
                "interval for {} must be greater than zero",
                key
            )));
        }

        let mut jobs = self.jobs.lock();
        if let Some(previous) = jobs.remove(&key) {
            previous.abort();
            self.logger.debug(&format!("Replaced job {}", key));
        }

        let logger = self.logger.clone();
        let task = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let job = Arc::clone(&job);
                if let Err(e) = tokio::task::spawn_blocking(move || job()).await {
                    logger.warn(&format!("Job {} failed: {}", key, e));
                }
            }
        });
        jobs.insert(key, task);

        self.logger
            .info(&format!("Scheduled {} every {:?}", key, interval));
        Ok(())
    }

    fn cancel(&self, key: JobKey) -> bool {
        match self.jobs.lock().remove(&key) {
            Some(task) => {
                task.abort();
                self.logger.debug(&format!("Cancelled job {}", key));
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.jobs.lock().drain() {
            task.abort();
        }
    }
}

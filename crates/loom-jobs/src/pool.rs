//! Thread-pool scheduler.
//!
//! Jobs are spawned on a dedicated `rayon` pool. Each worker writes its
//! finished job back into the batch slot it came from and decrements the
//! outstanding count; `wait` sleeps on a condition variable until that
//! count reaches zero. The mutex guards only the result slots, never the
//! job while it runs.
//!
//! A panicking job aborts the process (rayon's default for `spawn`).

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use loom_types::{LoomError, LoomResult};

use crate::config::SchedulerConfig;
use crate::job::{Job, Rejected, Scheduler};

struct Batch<J> {
    slots: Vec<Option<J>>,
    remaining: usize,
}

struct Shared<J> {
    batch: Mutex<Batch<J>>,
    done: Condvar,
}

impl<J> Shared<J> {
    fn lock(&self) -> MutexGuard<'_, Batch<J>> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start/wait scheduler backed by a fixed-size `rayon::ThreadPool`.
pub struct JobScheduler<J: Job> {
    pool: rayon::ThreadPool,
    config: SchedulerConfig,
    current: Option<Arc<Shared<J>>>,
    batches: u64,
}

impl<J: Job> JobScheduler<J> {
    /// Builds the worker pool.
    ///
    /// # Errors
    /// `InvalidConfig` for zero threads or when the pool cannot be created.
    pub fn new(config: SchedulerConfig) -> LoomResult<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("loom-worker-{i}"))
            .build()
            .map_err(|e| LoomError::InvalidConfig(format!("Cannot build worker pool: {e}")))?;

        tracing::debug!(threads = config.worker_threads, "Job scheduler ready");
        Ok(Self {
            pool,
            config,
            current: None,
            batches: 0,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of batches started so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    fn outstanding(&self) -> usize {
        self.current.as_ref().map_or(0, |s| s.lock().remaining)
    }
}

impl<J: Job> Scheduler<J> for JobScheduler<J> {
    fn start(&mut self, jobs: Vec<J>) -> Result<(), Rejected<J>> {
        if self.current.is_some() {
            let outstanding = self.outstanding();
            tracing::error!(outstanding, "start() called before the previous batch was waited on");
            return Err(Rejected::new(LoomError::BatchInFlight { outstanding }, jobs));
        }

        let count = jobs.len();
        let shared = Arc::new(Shared {
            batch: Mutex::new(Batch {
                slots: (0..count).map(|_| None).collect(),
                remaining: count,
            }),
            done: Condvar::new(),
        });

        for (slot, mut job) in jobs.into_iter().enumerate() {
            let shared = Arc::clone(&shared);
            self.pool.spawn(move || {
                job.run();
                let mut batch = shared.lock();
                batch.slots[slot] = Some(job);
                batch.remaining -= 1;
                if batch.remaining == 0 {
                    shared.done.notify_all();
                }
            });
        }

        self.batches += 1;
        self.current = Some(shared);
        tracing::trace!(batch = self.batches, jobs = count, "Batch started");
        Ok(())
    }

    fn wait(&mut self) -> Vec<J> {
        let Some(shared) = self.current.take() else {
            return Vec::new();
        };

        let mut batch = shared.lock();
        while batch.remaining > 0 {
            batch = shared
                .done
                .wait(batch)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let jobs: Vec<J> = std::mem::take(&mut batch.slots)
            .into_iter()
            .flatten()
            .collect();
        tracing::trace!(batch = self.batches, jobs = jobs.len(), "Batch complete");
        jobs
    }

    fn is_running(&self) -> bool {
        self.current.is_some()
    }
}

impl<J: Job> Drop for JobScheduler<J> {
    fn drop(&mut self) {
        if self.current.is_some() {
            tracing::warn!("Job scheduler dropped with a batch in flight; waiting");
            self.wait();
        }
    }
}

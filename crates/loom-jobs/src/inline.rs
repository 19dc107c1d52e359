//! Single-threaded scheduler.
//!
//! Runs every job on the calling thread inside `start`, then holds the
//! results until `wait`. Useful for deterministic debugging and for
//! `--threads 0` runs; the start/wait contract is the same as the pool's.

use loom_types::LoomError;

use crate::job::{Job, Rejected, Scheduler};

/// Scheduler that executes jobs synchronously.
pub struct InlineScheduler<J: Job> {
    finished: Option<Vec<J>>,
}

impl<J: Job> InlineScheduler<J> {
    pub fn new() -> Self {
        Self { finished: None }
    }
}

impl<J: Job> Default for InlineScheduler<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Job> Scheduler<J> for InlineScheduler<J> {
    fn start(&mut self, mut jobs: Vec<J>) -> Result<(), Rejected<J>> {
        if self.finished.is_some() {
            return Err(Rejected::new(LoomError::BatchInFlight { outstanding: 0 }, jobs));
        }
        for job in &mut jobs {
            job.run();
        }
        self.finished = Some(jobs);
        Ok(())
    }

    fn wait(&mut self) -> Vec<J> {
        self.finished.take().unwrap_or_default()
    }

    fn is_running(&self) -> bool {
        self.finished.is_some()
    }
}

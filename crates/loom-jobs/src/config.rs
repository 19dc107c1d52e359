//! Scheduler configuration.

use loom_types::constants::DEFAULT_WORKER_THREADS;
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads (fixed for the scheduler's lifetime).
    pub worker_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl SchedulerConfig {
    pub fn with_threads(worker_threads: usize) -> Self {
        Self { worker_threads }
    }

    pub fn validate(&self) -> LoomResult<()> {
        if self.worker_threads == 0 {
            return Err(LoomError::InvalidConfig(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

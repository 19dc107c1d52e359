//! Controller configuration.

use loom_jobs::SchedulerConfig;
use serde::{Deserialize, Serialize};

/// Settings for [`SimulationController::new`](crate::SimulationController::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub scheduler: SchedulerConfig,
    /// Register a `TracingSink` (debug level) on the event bus.
    pub log_events: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            log_events: true,
        }
    }
}

impl ControllerConfig {
    pub fn with_threads(worker_threads: usize) -> Self {
        Self {
            scheduler: SchedulerConfig::with_threads(worker_threads),
            ..Default::default()
        }
    }
}

//! Simulation event types.
//!
//! Events are small value types tagged with the controller step they
//! belong to. Handles are carried as packed `u64` bits so the events stay
//! independent of the controller's types.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Controller step number (0 before the first step).
    pub step: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Batch handed to the scheduler.
    StepBegin {
        dt: f32,
        solvers: usize,
    },

    /// One solver finished its share of the step.
    SolverStep {
        solver: u64,
        cloths: usize,
        iterations: u32,
        elapsed_ms: f64,
    },

    /// Positions copied to one actor's renderer.
    Publish {
        actor: u64,
        particles: usize,
    },

    /// Step fully settled and published.
    StepEnd {
        wall_ms: f64,
        particles: usize,
    },

    /// An object was added to or removed from a registry.
    Registry {
        /// `"fabric"`, `"solver"` or `"actor"`.
        registry: String,
        handle: u64,
        tracked: bool,
    },

    /// Custom event for extensibility.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }

    /// Short name of the payload variant.
    pub fn name(&self) -> &'static str {
        match self.kind {
            EventKind::StepBegin { .. } => "step_begin",
            EventKind::SolverStep { .. } => "solver_step",
            EventKind::Publish { .. } => "publish",
            EventKind::StepEnd { .. } => "step_end",
            EventKind::Registry { .. } => "registry",
            EventKind::Custom { .. } => "custom",
        }
    }
}

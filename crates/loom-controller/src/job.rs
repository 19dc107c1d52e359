//! Solver work unit.

use loom_jobs::Job;
use loom_solver::{Solver, StepReport};
use loom_types::LoomResult;

use crate::keys::SolverKey;

/// One solver moved out of its registry slot for the duration of a step.
pub struct SolverJob {
    pub(crate) key: SolverKey,
    pub(crate) solver: Solver,
    pub(crate) dt: f32,
    pub(crate) result: Option<LoomResult<StepReport>>,
}

impl SolverJob {
    pub(crate) fn new(key: SolverKey, solver: Solver, dt: f32) -> Self {
        Self {
            key,
            solver,
            dt,
            result: None,
        }
    }

    /// Registry slot the solver returns to.
    pub fn key(&self) -> SolverKey {
        self.key
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// True once the job has run.
    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }
}

impl Job for SolverJob {
    fn run(&mut self) {
        self.result = Some(self.solver.simulate(self.dt));
    }
}

//! Work unit and scheduler traits.

use std::fmt;

use loom_types::LoomError;

/// One independent unit of work.
///
/// A job owns the state it mutates and is handed back to the caller by
/// [`Scheduler::wait`] once it has run.
pub trait Job: Send + 'static {
    fn run(&mut self);
}

impl Job for Box<dyn FnMut() + Send> {
    fn run(&mut self) {
        (**self)()
    }
}

/// A batch refused by [`Scheduler::start`], handed back unrun.
pub struct Rejected<J> {
    pub error: LoomError,
    pub jobs: Vec<J>,
}

impl<J> Rejected<J> {
    pub fn new(error: LoomError, jobs: Vec<J>) -> Self {
        Self { error, jobs }
    }
}

impl<J> fmt::Debug for Rejected<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

impl<J> fmt::Display for Rejected<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} jobs returned)", self.error, self.jobs.len())
    }
}

impl<J> From<Rejected<J>> for LoomError {
    fn from(rejected: Rejected<J>) -> Self {
        rejected.error
    }
}

/// Two-phase start/wait barrier over a batch of jobs.
pub trait Scheduler<J: Job> {
    /// Starts `jobs` and returns without waiting for them.
    ///
    /// # Errors
    /// `BatchInFlight` if the previous batch has not been waited on. The
    /// refused jobs come back in [`Rejected::jobs`] in submission order.
    fn start(&mut self, jobs: Vec<J>) -> Result<(), Rejected<J>>;

    /// Blocks until every job of the current batch has run and returns
    /// them in submission order. Returns an empty vec when nothing was
    /// started.
    fn wait(&mut self) -> Vec<J>;

    /// True between a successful `start` and the matching `wait`.
    fn is_running(&self) -> bool;
}

//! # loom-jobs
//!
//! Runs a batch of independent work units on a fixed-size worker pool
//! behind a two-phase barrier: [`Scheduler::start`] hands the batch to the
//! workers and returns, [`Scheduler::wait`] blocks until every unit of that
//! batch has finished and gives the units back.
//!
//! Only one batch may be outstanding at a time; a refused batch is handed
//! back to the caller inside [`Rejected`]. The scheduler owns no
//! simulation state; each unit carries everything it touches.

pub mod config;
pub mod inline;
pub mod job;
pub mod pool;

pub use config::SchedulerConfig;
pub use inline::InlineScheduler;
pub use job::{Job, Rejected, Scheduler};
pub use pool::JobScheduler;

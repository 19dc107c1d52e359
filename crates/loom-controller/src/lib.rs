//! # loom-controller
//!
//! The simulation controller: owns the registries of fabrics, solvers and
//! cloth actors, enforces the one-solver-per-actor binding, and drives the
//! step cycle.
//!
//! ## Step cycle
//!
//! 1. `start_step(dt)` moves every solver into a [`SolverJob`] and hands
//!    the batch to the scheduler.
//! 2. `finish_step()` waits for the batch, puts the solvers back, then
//!    copies each bound actor's positions to its renderer.
//!
//! While a step is in flight the solvers (and the cloth instances they
//! own) are inside the jobs, so no registry or cloth mutation is possible;
//! such calls return [`LoomError::Stepping`](loom_types::LoomError::Stepping).
//!
//! ## Key Types
//!
//! - [`SimulationController`] - Registries and step orchestration
//! - [`ClothActor`] - One cloth instance bound to one renderer
//! - [`SolverJob`] - Unit of work handed to the scheduler
//! - [`FabricKey`], [`SolverKey`], [`ActorKey`] - Versioned registry keys

pub mod actor;
pub mod config;
pub mod controller;
pub mod job;
pub mod keys;

pub use actor::{ActorState, ClothActor};
pub use config::ControllerConfig;
pub use controller::{SimulationController, SolverEntry, StepSummary};
pub use job::SolverJob;
pub use keys::{ActorKey, FabricKey, RegistryKey, SolverKey};

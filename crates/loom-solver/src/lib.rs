//! # loom-solver
//!
//! Position-based cloth solver. A [`Solver`] owns a set of
//! [`ClothInstance`]s keyed by [`ClothId`](loom_types::ClothId) and
//! advances all of them on `simulate(dt)`.
//!
//! ## Key Types
//!
//! - [`ClothInstance`] - Particle state of one cloth plus its coefficients
//! - [`ClothParams`] - Gravity, damping, aerodynamics, tethers, self-collision
//! - [`Solver`] - Owns instances and runs the substep loop
//! - [`SolverConfig`] - Solver-wide limits

pub mod aero;
pub mod collider;
pub mod config;
pub mod constraints;
pub mod instance;
pub mod solver;
pub mod spatial_hash;

pub use collider::SphereCollider;
pub use config::{ClothParams, SolverConfig};
pub use instance::ClothInstance;
pub use solver::{Solver, StepReport};
pub use spatial_hash::SpatialHash;

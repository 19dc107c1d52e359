//! # loom-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the Loom cloth runtime.
//!
//! This crate has zero domain logic; it defines the vocabulary
//! that all other Loom crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{LoomError, LoomResult};
pub use ids::{ClothId, ParticleId, PhaseId};

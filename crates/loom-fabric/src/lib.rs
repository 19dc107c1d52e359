//! # loom-fabric
//!
//! Turns a [`ClothMeshDesc`](loom_mesh::ClothMeshDesc) into an immutable
//! [`Fabric`]: distance constraints grouped into parallel-safe phases, and
//! tethers from free particles to pinned anchors.
//!
//! A fabric is shared by every cloth instance created from it
//! (`Arc<Fabric>`), so identical meshes are cooked once.
//!
//! ## Key Types
//!
//! - [`FabricCooker`] - Cooking entry point
//! - [`Fabric`] - Cooked constraint graph
//! - [`CookingConfig`] - Tether metric and per-kind phase defaults

pub mod config;
pub mod cooker;
pub mod fabric;
pub mod phases;
pub mod tethers;

pub use config::{CookingConfig, TetherMetric};
pub use cooker::FabricCooker;
pub use fabric::{Constraint, ConstraintKind, Fabric, Phase, PhaseConfig, Tether};

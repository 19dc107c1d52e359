//! # loom-mesh
//!
//! Cloth mesh construction: the procedural generator that turns grid
//! parameters into particles and triangles, pinning predicates, mass
//! assignment, and the read-only description handed to fabric cooking
//! and to the renderer.
//!
//! ## Key Types
//!
//! - [`ClothMeshData`] - Mutable generator output (positions, masses, triangles, quads).
//! - [`ClothMeshDesc`] - Immutable snapshot consumed by cooking and rendering.
//! - [`Topology`] - Edge adjacency queries (bending spans, neighbors, pieces).

pub mod generators;
pub mod mesh;
pub mod topology;

pub use generators::{ClothMeshData, PlaneCloth, Side, Zigzag};
pub use mesh::ClothMeshDesc;
pub use topology::{BendingSpan, Topology};

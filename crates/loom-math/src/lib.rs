//! # loom-math
//!
//! Math primitives for the Loom cloth runtime.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Mat4`, `Quat`, etc.)
//! - Axis-aligned bounding boxes for particle sets

pub mod bounds;

// Re-export glam types as the canonical math types for Loom.
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use bounds::Aabb;

//! # loom-debug
//!
//! Read-only diagnostics over a running simulation: debug line geometry
//! derived from fabric topology and live particle state, and binary
//! snapshots of a cloth instance for offline inspection.

pub mod extractor;
pub mod lines;
pub mod snapshot;

pub use extractor::{DebugDrawOptions, DiagnosticsExtractor};
pub use lines::{DebugLine, DebugLines};
pub use snapshot::ClothSnapshot;

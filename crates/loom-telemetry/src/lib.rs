//! # loom-telemetry
//!
//! Event bus for simulation telemetry. The controller emits structured
//! events (step timing, per-solver iterations, registry changes, frame
//! publication) that pluggable sinks consume when the bus is flushed.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink};

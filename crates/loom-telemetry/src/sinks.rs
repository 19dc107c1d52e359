//! Pluggable event sinks.

use std::sync::{Arc, Mutex, PoisonError};

use crate::events::SimulationEvent;

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events into a shared `Vec` for tests and inspection.
///
/// Clones share the same storage, so a clone kept by the caller sees
/// every event delivered to the clone registered on the bus.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Logs events through `tracing` at a fixed level.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        let name = event.name();
        match self.level {
            tracing::Level::ERROR => tracing::error!(step = event.step, event = ?event.kind, "{name}"),
            tracing::Level::WARN => tracing::warn!(step = event.step, event = ?event.kind, "{name}"),
            tracing::Level::INFO => tracing::info!(step = event.step, event = ?event.kind, "{name}"),
            tracing::Level::DEBUG => tracing::debug!(step = event.step, event = ?event.kind, "{name}"),
            _ => tracing::trace!(step = event.step, event = ?event.kind, "{name}"),
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

//! Event bus: queued simulation events fanned out to pluggable sinks.
//!
//! Events are queued on an `mpsc` channel at `emit` and only reach the
//! sinks on `flush`. The controller flushes once per completed step, so
//! sinks never run while solvers are in flight. Worker threads can queue
//! through a cloned [`EventBus::sender`].

use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::events::SimulationEvent;
use crate::sinks::EventSink;

pub struct EventBus {
    tx: Sender<SimulationEvent>,
    rx: Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    enabled: bool,
    /// Event names dropped at `emit`.
    muted: HashSet<&'static str>,
    /// Dispatched events per event name.
    counts: BTreeMap<&'static str, u64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            sinks: Vec::new(),
            enabled: true,
            muted: HashSet::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// A disabled bus drops everything passed to `emit`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drops events of the given [`SimulationEvent::name`] at `emit`,
    /// e.g. `"publish"` on scenes with many actors.
    pub fn mute(&mut self, name: &'static str) {
        self.muted.insert(name);
    }

    pub fn unmute(&mut self, name: &str) {
        self.muted.remove(name);
    }

    /// Queue handle for worker threads. Events sent through it skip the
    /// enabled flag and the mute list.
    pub fn sender(&self) -> Sender<SimulationEvent> {
        self.tx.clone()
    }

    pub fn emit(&self, event: SimulationEvent) {
        if !self.enabled || self.muted.contains(event.name()) {
            return;
        }
        // The bus owns the receiver, so the send cannot fail.
        let _ = self.tx.send(event);
    }

    /// Delivers every queued event to every sink in emission order.
    pub fn flush(&mut self) {
        for event in self.rx.try_iter() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            *self.counts.entry(event.name()).or_default() += 1;
        }
    }

    /// Flushes, then lets every sink finalize.
    pub fn finalize(&mut self) {
        self.flush();
        self.sinks.iter_mut().for_each(|sink| sink.finalize());
    }

    /// Total events delivered so far.
    pub fn dispatched(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Events of one name delivered so far.
    pub fn dispatched_named(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

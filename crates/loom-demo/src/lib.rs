//! # loom-demo
//!
//! One generic cloth-demo harness driven by [`Scenario`] values: grid
//! parameters, a pin rule, per-instance coefficients and run length.
//! [`ScenarioRunner`] builds the scene through the controller, steps it and
//! reports [`DemoMetrics`] (CSV export for regression tracking).

pub mod metrics;
pub mod runner;
pub mod scenario;

pub use metrics::DemoMetrics;
pub use runner::ScenarioRunner;
pub use scenario::{PinRule, Scenario, PRESET_NAMES};

//! Solver and per-cloth configuration.
//!
//! [`ClothParams`] holds the physical coefficients of one cloth instance;
//! [`SolverConfig`] holds limits shared by every cloth a solver owns.

use loom_math::Vec3;
use loom_types::constants::{DEFAULT_MAX_ITERATIONS_PER_STEP, DEFAULT_SOLVER_FREQUENCY, GRAVITY};
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};

/// Physical coefficients of one cloth instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothParams {
    /// Acceleration applied to every free particle (m/s²).
    pub gravity: Vec3,

    /// Fraction of velocity lost per 1/60 s (0.0 = none, must stay below 1.0).
    pub damping: f32,

    /// Aerodynamic drag coefficient (0.0 disables drag).
    pub linear_drag: f32,

    /// Aerodynamic lift coefficient (0.0 disables lift).
    pub lift_coefficient: f32,

    /// Air velocity the cloth moves through (m/s).
    pub wind_velocity: Vec3,

    /// Tangential velocity removed on sphere contact (0.0–1.0).
    pub friction: f32,

    /// Fraction of tether overshoot corrected per iteration (0.0–1.0).
    pub tether_stiffness: f32,

    /// Multiplier on every tether rest length.
    pub tether_scale: f32,

    /// Minimum distance kept between particles (0.0 disables self-collision).
    pub self_collision_distance: f32,

    /// Fraction of self-collision penetration corrected per iteration.
    pub self_collision_stiffness: f32,

    /// Solver iterations per simulated second.
    pub solver_frequency: f32,
}

impl Default for ClothParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            damping: 0.02,
            linear_drag: 0.0,
            lift_coefficient: 0.0,
            wind_velocity: Vec3::ZERO,
            friction: 0.5,
            tether_stiffness: 1.0,
            tether_scale: 1.0,
            self_collision_distance: 0.0,
            self_collision_stiffness: 1.0,
            solver_frequency: DEFAULT_SOLVER_FREQUENCY,
        }
    }
}

impl ClothParams {
    /// Default coefficients with wind and aerodynamics enabled.
    pub fn windy(wind_velocity: Vec3) -> Self {
        Self {
            wind_velocity,
            linear_drag: 0.2,
            lift_coefficient: 0.1,
            ..Default::default()
        }
    }

    /// Defaults with self-collision at `distance`.
    pub fn self_colliding(distance: f32) -> Self {
        Self {
            self_collision_distance: distance,
            ..Default::default()
        }
    }

    /// Rejects coefficients the solver cannot integrate.
    pub fn validate(&self) -> LoomResult<()> {
        let unit = 0.0..=1.0;
        let checks: [(&str, bool); 11] = [
            ("gravity", self.gravity.is_finite()),
            ("damping", self.damping >= 0.0 && self.damping < 1.0),
            ("linear_drag", self.linear_drag.is_finite() && self.linear_drag >= 0.0),
            (
                "lift_coefficient",
                self.lift_coefficient.is_finite() && self.lift_coefficient >= 0.0,
            ),
            ("wind_velocity", self.wind_velocity.is_finite()),
            ("friction", unit.contains(&self.friction)),
            ("tether_stiffness", unit.contains(&self.tether_stiffness)),
            ("tether_scale", self.tether_scale.is_finite() && self.tether_scale > 0.0),
            (
                "self_collision_distance",
                self.self_collision_distance.is_finite() && self.self_collision_distance >= 0.0,
            ),
            ("self_collision_stiffness", unit.contains(&self.self_collision_stiffness)),
            (
                "solver_frequency",
                self.solver_frequency.is_finite() && self.solver_frequency > 0.0,
            ),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((name, _)) => Err(LoomError::InvalidConfig(format!(
                "Cloth parameter `{name}` is out of range"
            ))),
            None => Ok(()),
        }
    }
}

/// Limits shared by every cloth a [`Solver`](crate::Solver) owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound on iterations for a single `simulate(dt)` call.
    pub max_iterations_per_step: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_step: DEFAULT_MAX_ITERATIONS_PER_STEP,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> LoomResult<()> {
        if self.max_iterations_per_step == 0 {
            return Err(LoomError::InvalidConfig(
                "max_iterations_per_step must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

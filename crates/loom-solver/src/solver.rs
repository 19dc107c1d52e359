//! The substepping cloth solver.
//!
//! `simulate(dt)` splits `dt` into `max(1, round(dt * solver_frequency))`
//! iterations per cloth. One iteration runs, in order: Verlet integration,
//! aerodynamics, every fabric phase, tethers, sphere colliders and
//! self-collision.

use std::collections::BTreeMap;
use std::time::Instant;

use loom_math::Aabb;
use loom_types::constants::DEFAULT_DT;
use loom_types::{ClothId, LoomError, LoomResult};
use serde::{Deserialize, Serialize};

use crate::aero::apply_aerodynamics;
use crate::config::SolverConfig;
use crate::constraints::{solve_phase, solve_self_collision, solve_tethers};
use crate::instance::ClothInstance;
use crate::spatial_hash::SpatialHash;

/// Summary of one `simulate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub dt: f32,
    pub cloth_count: usize,
    pub particle_count: usize,
    /// Iterations summed over every cloth.
    pub iterations: u32,
    pub sphere_contacts: u32,
    pub self_collision_contacts: u32,
    pub elapsed_ms: f64,
}

/// Owns cloth instances and advances them together.
#[derive(Debug, Default)]
pub struct Solver {
    config: SolverConfig,
    cloths: BTreeMap<ClothId, ClothInstance>,
    steps: u64,
}

impl Solver {
    /// Empty solver; fails on an invalid `config`.
    pub fn new(config: SolverConfig) -> LoomResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cloths: BTreeMap::new(),
            steps: 0,
        })
    }

    /// Settings shared by every owned cloth.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of completed `simulate` calls.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    // ─── Cloth Ownership ─────────────────────────────────────

    /// Takes ownership of `cloth` under `id`.
    ///
    /// # Errors
    /// `InvariantViolation` if `id` is already present.
    pub fn add_cloth(&mut self, id: ClothId, cloth: ClothInstance) -> LoomResult<()> {
        if self.cloths.contains_key(&id) {
            return Err(LoomError::InvariantViolation(format!(
                "Cloth {} is already owned by this solver",
                id.0
            )));
        }
        self.cloths.insert(id, cloth);
        Ok(())
    }

    /// Releases the cloth stored under `id`, if any.
    pub fn remove_cloth(&mut self, id: ClothId) -> Option<ClothInstance> {
        self.cloths.remove(&id)
    }

    /// The cloth stored under `id`.
    pub fn cloth(&self, id: ClothId) -> Option<&ClothInstance> {
        self.cloths.get(&id)
    }

    /// Mutable access to the cloth stored under `id`.
    pub fn cloth_mut(&mut self, id: ClothId) -> Option<&mut ClothInstance> {
        self.cloths.get_mut(&id)
    }

    /// Owned cloth ids in ascending order.
    pub fn cloth_ids(&self) -> Vec<ClothId> {
        self.cloths.keys().copied().collect()
    }

    /// Owned cloths in ascending id order.
    pub fn cloths(&self) -> impl Iterator<Item = (ClothId, &ClothInstance)> {
        self.cloths.iter().map(|(&id, c)| (id, c))
    }

    /// Number of owned cloths.
    pub fn len(&self) -> usize {
        self.cloths.len()
    }

    /// True when the solver owns no cloth.
    pub fn is_empty(&self) -> bool {
        self.cloths.is_empty()
    }

    /// Union of every owned cloth's bounds.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for cloth in self.cloths.values() {
            if !cloth.bounds.is_empty() {
                bounds.grow(cloth.bounds.min);
                bounds.grow(cloth.bounds.max);
            }
        }
        bounds
    }

    // ─── Simulation ──────────────────────────────────────────

    /// Advances every owned cloth by `dt` seconds.
    ///
    /// # Errors
    /// `InvalidConfig` for a non-positive `dt` or out-of-range cloth parameters.
    /// No cloth is touched when an error is returned.
    pub fn simulate(&mut self, dt: f32) -> LoomResult<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LoomError::InvalidConfig(format!(
                "Step dt must be positive and finite (got {dt})"
            )));
        }
        for cloth in self.cloths.values() {
            cloth.params.validate()?;
        }

        let start = Instant::now();
        let mut report = StepReport {
            dt,
            cloth_count: self.cloths.len(),
            ..Default::default()
        };

        for (id, cloth) in self.cloths.iter_mut() {
            let wanted = (dt * cloth.params.solver_frequency).round().max(1.0) as u32;
            let iterations = wanted.min(self.config.max_iterations_per_step);
            if iterations < wanted {
                tracing::warn!(
                    cloth = id.0,
                    wanted,
                    iterations,
                    "Iteration count clamped by max_iterations_per_step"
                );
            }
            let (spheres, self_contacts) = step_cloth(cloth, dt, iterations);
            report.iterations += iterations;
            report.sphere_contacts += spheres;
            report.self_collision_contacts += self_contacts;
            report.particle_count += cloth.particle_count();
        }

        self.steps += 1;
        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::trace!(
            step = self.steps,
            cloths = report.cloth_count,
            iterations = report.iterations,
            "Solver step complete"
        );
        Ok(report)
    }
}

/// Runs `iterations` substeps on one cloth. Returns (sphere, self) contact counts.
fn step_cloth(cloth: &mut ClothInstance, dt: f32, iterations: u32) -> (u32, u32) {
    let iteration_dt = dt / iterations as f32;
    let fabric = cloth.fabric().clone();
    let params = cloth.params.clone();

    let damping = (1.0 - params.damping).powf(iteration_dt / DEFAULT_DT);
    let gravity_offset = params.gravity * (iteration_dt * iteration_dt);
    let mut hash = (params.self_collision_distance > 0.0)
        .then(|| SpatialHash::new(params.self_collision_distance));

    let mut sphere_contacts = 0;
    let mut self_contacts = 0;

    for _ in 0..iterations {
        // Rescale implicit velocity when the iteration length changed since
        // the last step.
        let dt_ratio = if cloth.last_iteration_dt > 0.0 {
            iteration_dt / cloth.last_iteration_dt
        } else {
            1.0
        };
        cloth.last_iteration_dt = iteration_dt;

        for i in 0..cloth.positions.len() {
            let current = cloth.positions[i];
            if cloth.inv_masses[i] == 0.0 {
                cloth.prev_positions[i] = current;
                continue;
            }
            let velocity = (current - cloth.prev_positions[i]) * (damping * dt_ratio);
            cloth.prev_positions[i] = current;
            cloth.positions[i] = current + velocity + gravity_offset;
        }

        apply_aerodynamics(
            &mut cloth.positions,
            &cloth.prev_positions,
            &cloth.inv_masses,
            fabric.indices(),
            params.wind_velocity,
            params.linear_drag,
            params.lift_coefficient,
            iteration_dt,
        );

        for (p, config) in cloth.phase_configs.iter().enumerate() {
            solve_phase(
                &mut cloth.positions,
                &cloth.inv_masses,
                fabric.phase_constraints(p),
                config,
            );
        }

        solve_tethers(
            &mut cloth.positions,
            &cloth.inv_masses,
            fabric.tethers(),
            params.tether_stiffness,
            params.tether_scale,
        );

        for sphere in &cloth.spheres {
            sphere_contacts += sphere.resolve(
                &mut cloth.positions,
                &mut cloth.prev_positions,
                &cloth.inv_masses,
                params.friction,
            );
        }

        if let Some(hash) = hash.as_mut() {
            self_contacts += solve_self_collision(
                &mut cloth.positions,
                &cloth.inv_masses,
                fabric.rest_positions(),
                params.self_collision_distance,
                params.self_collision_stiffness,
                hash,
            );
        }
    }

    cloth.bounds = Aabb::from_points(&cloth.positions);
    (sphere_contacts, self_contacts)
}

//! Per-instance cloth state.
//!
//! A [`ClothInstance`] pairs a shared [`Fabric`] with the mutable particle
//! buffers of one cloth. Positions are kept in world space. The instance
//! transform only matters when it changes: pinned particles follow the
//! frame, free particles keep their world position and velocity (inertia).

use std::sync::Arc;

use loom_fabric::{Fabric, PhaseConfig};
use loom_math::{Aabb, Mat4, Quat, Vec3};
use loom_mesh::ClothMeshDesc;
use loom_types::{LoomError, LoomResult};

use crate::collider::SphereCollider;
use crate::config::ClothParams;

/// Mutable simulation state of one cloth built from a shared fabric.
#[derive(Debug, Clone)]
pub struct ClothInstance {
    fabric: Arc<Fabric>,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) prev_positions: Vec<Vec3>,
    pub(crate) inv_masses: Vec<f32>,
    pub(crate) params: ClothParams,
    pub(crate) phase_configs: Vec<PhaseConfig>,
    pub(crate) spheres: Vec<SphereCollider>,
    translation: Vec3,
    rotation: Quat,
    pub(crate) bounds: Aabb,
    pub(crate) last_iteration_dt: f32,
}

impl ClothInstance {
    /// Creates an instance with explicit starting particles.
    ///
    /// # Errors
    /// `InvalidMesh` when the buffers do not match the fabric's particle count
    /// or hold non-finite values.
    pub fn new(fabric: Arc<Fabric>, positions: Vec<Vec3>, inv_masses: Vec<f32>) -> LoomResult<Self> {
        let n = fabric.particle_count();
        if positions.len() != n || inv_masses.len() != n {
            return Err(LoomError::InvalidMesh(format!(
                "Instance buffers ({} positions, {} inverse masses) do not match fabric particle count {}",
                positions.len(),
                inv_masses.len(),
                n
            )));
        }
        if positions.iter().any(|p| !p.is_finite()) {
            return Err(LoomError::InvalidMesh("Instance position is not finite".into()));
        }
        if inv_masses.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(LoomError::InvalidMesh(
                "Instance inverse mass must be finite and non-negative".into(),
            ));
        }

        let phase_configs = fabric.phases().iter().map(|p| p.config).collect();
        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            fabric,
            prev_positions: positions.clone(),
            positions,
            inv_masses,
            params: ClothParams::default(),
            phase_configs,
            spheres: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            bounds,
            last_iteration_dt: 0.0,
        })
    }

    /// Creates an instance from the description the fabric was cooked from.
    pub fn from_desc(fabric: Arc<Fabric>, desc: &ClothMeshDesc) -> LoomResult<Self> {
        Self::new(fabric, desc.positions.clone(), desc.inv_masses.clone())
    }

    pub fn with_params(mut self, params: ClothParams) -> LoomResult<Self> {
        self.set_params(params)?;
        Ok(self)
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn fabric(&self) -> &Arc<Fabric> {
        &self.fabric
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    /// Current particle positions, ordered by particle index.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Positions before the last solver iteration.
    pub fn prev_positions(&self) -> &[Vec3] {
        &self.prev_positions
    }

    pub fn inv_masses(&self) -> &[f32] {
        &self.inv_masses
    }

    pub fn params(&self) -> &ClothParams {
        &self.params
    }

    pub fn phase_configs(&self) -> &[PhaseConfig] {
        &self.phase_configs
    }

    pub fn spheres(&self) -> &[SphereCollider] {
        &self.spheres
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Bounds of the particles after the last step.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Duration of one solver iteration in the last step (0.0 before the first).
    pub fn last_iteration_dt(&self) -> f32 {
        self.last_iteration_dt
    }

    pub fn pinned_count(&self) -> usize {
        self.inv_masses.iter().filter(|&&w| w == 0.0).count()
    }

    // ─── Parameters ──────────────────────────────────────────

    /// Replaces every coefficient at once.
    pub fn set_params(&mut self, params: ClothParams) -> LoomResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Acceleration applied to every free particle (m/s²).
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.params.gravity = gravity;
    }

    /// Fraction of velocity lost per 1/60 s.
    pub fn set_damping(&mut self, damping: f32) {
        self.params.damping = damping;
    }

    /// Aerodynamic drag coefficient. Zero disables drag.
    pub fn set_linear_drag(&mut self, drag: f32) {
        self.params.linear_drag = drag;
    }

    /// Aerodynamic lift coefficient. Zero disables lift.
    pub fn set_lift_coefficient(&mut self, lift: f32) {
        self.params.lift_coefficient = lift;
    }

    /// Air velocity the cloth moves through (m/s).
    pub fn set_wind_velocity(&mut self, wind: Vec3) {
        self.params.wind_velocity = wind;
    }

    /// Tangential velocity removed on sphere contact.
    pub fn set_friction(&mut self, friction: f32) {
        self.params.friction = friction;
    }

    /// Fraction of tether overshoot corrected per iteration.
    pub fn set_tether_stiffness(&mut self, stiffness: f32) {
        self.params.tether_stiffness = stiffness;
    }

    /// Multiplier on every tether rest length.
    pub fn set_tether_scale(&mut self, scale: f32) {
        self.params.tether_scale = scale;
    }

    /// Minimum particle spacing. Zero disables self-collision.
    pub fn set_self_collision_distance(&mut self, distance: f32) {
        self.params.self_collision_distance = distance;
    }

    /// Fraction of self-collision penetration corrected per iteration.
    pub fn set_self_collision_stiffness(&mut self, stiffness: f32) {
        self.params.self_collision_stiffness = stiffness;
    }

    /// Solver iterations per simulated second.
    pub fn set_solver_frequency(&mut self, frequency: f32) {
        self.params.solver_frequency = frequency;
    }

    /// Overrides the settings of one phase for this instance only.
    pub fn set_phase_config(&mut self, phase: usize, config: PhaseConfig) -> LoomResult<()> {
        config.validate()?;
        let count = self.phase_configs.len();
        let slot = self.phase_configs.get_mut(phase).ok_or_else(|| {
            LoomError::InvalidConfig(format!("Phase {phase} out of range ({count} phases)"))
        })?;
        *slot = config;
        Ok(())
    }

    pub fn add_sphere(&mut self, sphere: SphereCollider) {
        self.spheres.push(sphere);
    }

    pub fn clear_spheres(&mut self) {
        self.spheres.clear();
    }

    // ─── Particles ───────────────────────────────────────────

    /// Sets one particle's inverse mass (`0.0` pins it).
    pub fn set_inv_mass(&mut self, particle: usize, inv_mass: f32) -> LoomResult<()> {
        if !inv_mass.is_finite() || inv_mass < 0.0 {
            return Err(LoomError::InvalidConfig(format!(
                "Inverse mass must be finite and non-negative (got {inv_mass})"
            )));
        }
        let count = self.inv_masses.len();
        let slot = self.inv_masses.get_mut(particle).ok_or_else(|| {
            LoomError::InvalidConfig(format!("Particle {particle} out of range ({count} particles)"))
        })?;
        *slot = inv_mass;
        Ok(())
    }

    /// Drops all implicit velocity.
    pub fn clear_inertia(&mut self) {
        self.prev_positions.copy_from_slice(&self.positions);
    }

    // ─── Transform ───────────────────────────────────────────

    pub fn set_translation(&mut self, translation: Vec3) {
        self.set_transform(translation, self.rotation);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.set_transform(self.translation, rotation);
    }

    /// Moves the instance frame. Pinned particles are carried along; free
    /// particles stay where they are in the world.
    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat) {
        let old = self.transform();
        self.translation = translation;
        self.rotation = rotation.normalize();
        let delta = self.transform() * old.inverse();

        for i in 0..self.positions.len() {
            if self.inv_masses[i] == 0.0 {
                self.positions[i] = delta.transform_point3(self.positions[i]);
                self.prev_positions[i] = self.positions[i];
            }
        }
        self.bounds = Aabb::from_points(&self.positions);
    }
}

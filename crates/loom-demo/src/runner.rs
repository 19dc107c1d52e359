//! Scenario runner: builds a scene through the controller, steps it and
//! collects metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use loom_controller::{
    ActorKey, ClothActor, ControllerConfig, RegistryKey, SimulationController, SolverJob,
};
use loom_debug::extractor::tether_lines;
use loom_debug::lines::TETHER_OVER_LIMIT_COLOR;
use loom_debug::ClothSnapshot;
use loom_fabric::FabricCooker;
use loom_jobs::{InlineScheduler, Scheduler};
use loom_math::Vec3;
use loom_render::{HeadlessRenderer, JsonFrameExporter, Renderer};
use loom_solver::{ClothInstance, Solver, SolverConfig};
use loom_types::{LoomError, LoomResult};

use crate::metrics::DemoMetrics;
use crate::scenario::Scenario;

/// Runs scenarios and collects metrics.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    /// Worker threads; 0 runs every solver inline on the calling thread.
    threads: usize,
    frames: Option<u32>,
    export: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

struct Tracked {
    handle: ActorKey,
    start: Vec<Vec3>,
}

impl ScenarioRunner {
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            ..Default::default()
        }
    }

    /// Overrides the scenario's frame count.
    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Writes every frame of the first instance to a JSON file.
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export = Some(path.into());
        self
    }

    /// Saves a snapshot of the first instance after the last frame.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Runs a single scenario: generate, cook, track, bind, step, teardown.
    pub fn run(&self, scenario: &Scenario) -> LoomResult<DemoMetrics> {
        scenario.validate()?;
        if self.threads == 0 {
            self.drive(SimulationController::with_scheduler(InlineScheduler::<SolverJob>::new()), scenario)
        } else {
            let config = ControllerConfig {
                log_events: false,
                ..ControllerConfig::with_threads(self.threads)
            };
            self.drive(SimulationController::new(config)?, scenario)
        }
    }

    /// Runs every scenario in order, stopping at the first failure.
    pub fn run_all(&self, scenarios: &[Scenario]) -> LoomResult<Vec<DemoMetrics>> {
        scenarios.iter().map(|s| self.run(s)).collect()
    }

    fn drive<S: Scheduler<SolverJob>>(
        &self,
        mut ctl: SimulationController<S>,
        scenario: &Scenario,
    ) -> LoomResult<DemoMetrics> {
        let frames = self.frames.unwrap_or(scenario.frames);
        let mesh = scenario.build_mesh()?;
        let desc = mesh.cloth_mesh_desc();
        let fabric = ctl.track_fabric(FabricCooker::new(scenario.cooking.clone()).cook(&desc)?)?;
        let shared = ctl
            .fabric(fabric)
            .ok_or_else(|| fabric.unknown("fabric"))?;

        let solvers = (0..scenario.solvers)
            .map(|_| ctl.track_solver(Solver::new(SolverConfig::default())?))
            .collect::<LoomResult<Vec<_>>>()?;

        let mut tracked = Vec::with_capacity(scenario.instances);
        for i in 0..scenario.instances {
            let offset = scenario.instance_offset(i);
            let positions: Vec<Vec3> = desc.positions.iter().map(|p| *p + offset).collect();
            let mut cloth = ClothInstance::new(Arc::clone(&shared), positions.clone(), desc.inv_masses.clone())?
                .with_params(scenario.params.clone())?;
            for sphere in &scenario.spheres {
                let mut sphere = *sphere;
                sphere.center += offset;
                cloth.add_sphere(sphere);
            }

            let renderer: Box<dyn Renderer> = match (&self.export, i) {
                (Some(path), 0) => Box::new(JsonFrameExporter::new(path)),
                _ => Box::new(HeadlessRenderer::new()),
            };
            let handle = ctl.track_actor(ClothActor::new(cloth, renderer)?)?;
            ctl.bind_actor_to_solver(handle, solvers[i % solvers.len()])?;
            tracked.push(Tracked {
                handle,
                start: positions,
            });
        }
        drop(shared);

        tracing::info!(
            scenario = %scenario.name,
            particles = desc.particle_count() * scenario.instances,
            instances = scenario.instances,
            solvers = scenario.solvers,
            frames,
            "Running scenario"
        );

        let mut step_ms = Vec::with_capacity(frames as usize);
        let mut iterations = 0_u64;
        let mut sphere_contacts = 0_u64;
        let mut self_collision_contacts = 0_u64;
        let total_start = Instant::now();
        for _ in 0..frames {
            let summary = ctl.step(scenario.dt)?;
            step_ms.push(summary.wall_ms);
            for (_, report) in &summary.solver_reports {
                iterations += u64::from(report.iterations);
                sphere_contacts += u64::from(report.sphere_contacts);
                self_collision_contacts += u64::from(report.self_collision_contacts);
            }
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let mut metrics = DemoMetrics {
            scenario: scenario.name.clone(),
            instances: scenario.instances,
            solvers: scenario.solvers,
            particles: desc.particle_count() * scenario.instances,
            triangles: desc.triangle_count(),
            pinned: mesh.pinned_indices().len() * scenario.instances,
            frames,
            total_wall_time,
            sphere_contacts,
            self_collision_contacts,
            ..Default::default()
        };
        if !step_ms.is_empty() {
            metrics.avg_step_ms = step_ms.iter().sum::<f64>() / step_ms.len() as f64;
            metrics.min_step_ms = step_ms.iter().copied().fold(f64::MAX, f64::min);
            metrics.max_step_ms = step_ms.iter().copied().fold(0.0, f64::max);
            metrics.avg_iterations = iterations as f32 / frames as f32;
        }

        for entry in &tracked {
            let cloth = ctl.cloth(entry.handle).ok_or_else(|| entry.handle.unknown("actor"))?;
            measure(cloth, &entry.start, &mut metrics);
        }

        if let (Some(path), Some(first)) = (&self.snapshot, tracked.first()) {
            let cloth = ctl.cloth(first.handle).ok_or_else(|| first.handle.unknown("actor"))?;
            ClothSnapshot::capture(ctl.frame(), cloth).save(path)?;
        }

        ctl.teardown()?;
        if !metrics.final_kinetic_energy.is_finite() {
            return Err(LoomError::InvariantViolation(format!(
                "Scenario {} diverged",
                scenario.name
            )));
        }
        Ok(metrics)
    }
}

/// Folds one instance's final state into the metrics.
fn measure(cloth: &ClothInstance, start: &[Vec3], metrics: &mut DemoMetrics) {
    let dt = cloth.last_iteration_dt();
    let particles = cloth
        .positions()
        .iter()
        .zip(cloth.prev_positions())
        .zip(cloth.inv_masses())
        .zip(start);
    for (((&p, &prev), &w), &s) in particles {
        let moved = (p - s).length();
        metrics.max_displacement = metrics.max_displacement.max(moved);
        if w == 0.0 {
            metrics.pinned_drift = metrics.pinned_drift.max(moved);
        } else if dt > 0.0 {
            let v = (p - prev) / dt;
            metrics.final_kinetic_energy += 0.5 * f64::from(v.length_squared() / w);
        }
    }
    metrics.stretched_tethers += tether_lines(cloth)
        .iter()
        .filter(|l| l.color == TETHER_OVER_LIMIT_COLOR)
        .count();
}

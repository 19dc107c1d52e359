//! Registries and step orchestration.

use std::sync::Arc;
use std::time::Instant;

use loom_fabric::Fabric;
use loom_jobs::{JobScheduler, Scheduler};
use loom_render::RenderFrame;
use loom_solver::{ClothInstance, Solver, StepReport};
use loom_telemetry::{EventBus, EventKind, SimulationEvent, TracingSink};
use loom_types::{LoomError, LoomResult};
use slotmap::SlotMap;

use crate::actor::{ActorState, ClothActor};
use crate::config::ControllerConfig;
use crate::job::SolverJob;
use crate::keys::{ActorKey, FabricKey, RegistryKey, SolverKey};

/// Registry slot of one solver.
///
/// The solver is absent while it is inside an in-flight step.
pub struct SolverEntry {
    solver: Option<Solver>,
    actors: Vec<ActorKey>,
}

impl SolverEntry {
    /// Actors bound to this solver, in bind order.
    pub fn actors(&self) -> &[ActorKey] {
        &self.actors
    }
}

/// Result of one completed step.
#[derive(Debug, Clone, Default)]
pub struct StepSummary {
    pub frame: u64,
    pub dt: f32,
    pub solver_reports: Vec<(SolverKey, StepReport)>,
    /// Actors whose renderer received a frame.
    pub published: usize,
    pub particles: usize,
    pub wall_ms: f64,
}

struct PendingStep {
    dt: f32,
    solvers: usize,
    started: Instant,
}

/// Owns every tracked fabric, solver and actor and drives the step cycle.
///
/// Constructed explicitly per scene; there is no global instance.
pub struct SimulationController<S: Scheduler<SolverJob> = JobScheduler<SolverJob>> {
    scheduler: S,
    fabrics: SlotMap<FabricKey, Arc<Fabric>>,
    solvers: SlotMap<SolverKey, SolverEntry>,
    actors: SlotMap<ActorKey, ClothActor>,
    bus: EventBus,
    frame: u64,
    pending: Option<PendingStep>,
}

impl SimulationController<JobScheduler<SolverJob>> {
    /// Creates a controller with a worker pool built from `config`.
    pub fn new(config: ControllerConfig) -> LoomResult<Self> {
        let scheduler = JobScheduler::new(config.scheduler.clone())?;
        let mut controller = Self::with_scheduler(scheduler);
        if config.log_events {
            controller
                .bus
                .add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));
        }
        Ok(controller)
    }
}

impl<S: Scheduler<SolverJob>> SimulationController<S> {
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            scheduler,
            fabrics: SlotMap::with_key(),
            solvers: SlotMap::with_key(),
            actors: SlotMap::with_key(),
            bus: EventBus::new(),
            frame: 0,
            pending: None,
        }
    }

    // ─── Inspection ──────────────────────────────────────────

    /// Number of completed steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_stepping(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn fabric_count(&self) -> usize {
        self.fabrics.len()
    }

    pub fn solver_count(&self) -> usize {
        self.solvers.len()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Shared reference to a tracked fabric, for building instances.
    pub fn fabric(&self, handle: FabricKey) -> Option<Arc<Fabric>> {
        self.fabrics.get(handle).cloned()
    }

    /// The solver behind `handle` (`None` while stepping).
    pub fn solver(&self, handle: SolverKey) -> Option<&Solver> {
        self.solvers.get(handle)?.solver.as_ref()
    }

    pub fn solver_entry(&self, handle: SolverKey) -> Option<&SolverEntry> {
        self.solvers.get(handle)
    }

    pub fn actor(&self, handle: ActorKey) -> Option<&ClothActor> {
        self.actors.get(handle)
    }

    pub fn actor_state(&self, handle: ActorKey) -> Option<ActorState> {
        self.actors.get(handle).map(ClothActor::state)
    }

    pub fn actor_keys(&self) -> Vec<ActorKey> {
        self.actors.keys().collect()
    }

    pub fn solver_keys(&self) -> Vec<SolverKey> {
        self.solvers.keys().collect()
    }

    /// The instance of `actor`, wherever it currently lives. `None` for
    /// unknown actors and for bound actors while stepping.
    pub fn cloth(&self, actor: ActorKey) -> Option<&ClothInstance> {
        let entry = self.actors.get(actor)?;
        self.resolve_cloth(actor, entry)
    }

    /// Every reachable cloth instance with its actor, in slot order.
    pub fn cloths(&self) -> Vec<(ActorKey, &ClothInstance)> {
        self.actors
            .iter()
            .filter_map(|(handle, entry)| Some((handle, self.resolve_cloth(handle, entry)?)))
            .collect()
    }

    fn resolve_cloth<'a>(&'a self, handle: ActorKey, entry: &'a ClothActor) -> Option<&'a ClothInstance> {
        match entry.solver {
            None => entry.cloth.as_ref(),
            Some(solver) => self
                .solvers
                .get(solver)?
                .solver
                .as_ref()?
                .cloth(handle.cloth_id()),
        }
    }

    fn ensure_idle(&self, operation: &'static str) -> LoomResult<()> {
        if self.pending.is_some() {
            tracing::error!(operation, "Rejected while a step is in flight");
            return Err(LoomError::Stepping(operation));
        }
        Ok(())
    }

    fn reset_stepping_actors(&mut self) {
        for (_, actor) in self.actors.iter_mut() {
            if actor.state == ActorState::Stepping {
                actor.state = ActorState::Bound;
            }
        }
    }

    fn emit_registry(&self, registry: &str, handle: u64, tracked: bool) {
        self.bus.emit(SimulationEvent::new(
            self.frame,
            EventKind::Registry {
                registry: registry.to_owned(),
                handle,
                tracked,
            },
        ));
    }

    // ─── Registries ──────────────────────────────────────────

    pub fn track_fabric(&mut self, fabric: impl Into<Arc<Fabric>>) -> LoomResult<FabricKey> {
        self.ensure_idle("track_fabric")?;
        let handle = self.fabrics.insert(fabric.into());
        tracing::debug!(?handle, "Tracked fabric");
        self.emit_registry("fabric", handle.to_bits(), true);
        Ok(handle)
    }

    /// Drops the registry's reference. Instances built from the fabric
    /// keep it alive. Stale keys are a no-op.
    pub fn untrack_fabric(&mut self, handle: FabricKey) -> LoomResult<Option<Arc<Fabric>>> {
        self.ensure_idle("untrack_fabric")?;
        let removed = self.fabrics.remove(handle);
        if removed.is_some() {
            tracing::debug!(?handle, "Untracked fabric");
            self.emit_registry("fabric", handle.to_bits(), false);
        }
        Ok(removed)
    }

    pub fn track_solver(&mut self, solver: Solver) -> LoomResult<SolverKey> {
        self.ensure_idle("track_solver")?;
        let handle = self.solvers.insert(SolverEntry {
            solver: Some(solver),
            actors: Vec::new(),
        });
        tracing::debug!(?handle, "Tracked solver");
        self.emit_registry("solver", handle.to_bits(), true);
        Ok(handle)
    }

    /// Unbinds every actor of the solver (returning their instances to
    /// them), then removes it. Stale keys are a no-op.
    pub fn untrack_solver(&mut self, handle: SolverKey) -> LoomResult<Option<Solver>> {
        self.ensure_idle("untrack_solver")?;
        let Some(actors) = self.solvers.get(handle).map(|e| e.actors.clone()) else {
            return Ok(None);
        };
        for actor in actors {
            self.unbind_actor(actor)?;
        }
        let removed = self.solvers.remove(handle).and_then(|e| e.solver);
        tracing::debug!(?handle, "Untracked solver");
        self.emit_registry("solver", handle.to_bits(), false);
        Ok(removed)
    }

    pub fn track_actor(&mut self, actor: ClothActor) -> LoomResult<ActorKey> {
        self.ensure_idle("track_actor")?;
        if actor.solver.is_some() || actor.cloth.is_none() {
            return Err(LoomError::InvariantViolation(
                "Only unbound actors can be tracked".into(),
            ));
        }
        let handle = self.actors.insert(actor);
        tracing::debug!(?handle, "Tracked actor");
        self.emit_registry("actor", handle.to_bits(), true);
        Ok(handle)
    }

    /// Unbinds the actor if needed and removes it. The returned actor owns
    /// its instance again. Stale keys are a no-op.
    pub fn untrack_actor(&mut self, handle: ActorKey) -> LoomResult<Option<ClothActor>> {
        self.ensure_idle("untrack_actor")?;
        if !self.actors.contains_key(handle) {
            return Ok(None);
        }
        self.unbind_actor(handle)?;
        let removed = self.actors.remove(handle);
        tracing::debug!(?handle, "Untracked actor");
        self.emit_registry("actor", handle.to_bits(), false);
        Ok(removed)
    }

    // ─── Binding ─────────────────────────────────────────────

    /// Moves the actor's instance into `solver`.
    ///
    /// Binding to the solver the actor is already bound to is a no-op.
    ///
    /// # Errors
    /// - `AlreadyBound` if the actor is bound to a different solver
    /// - `UnknownKey` for stale actor or solver keys
    /// - `Stepping` while a step is in flight
    pub fn bind_actor_to_solver(&mut self, actor: ActorKey, solver: SolverKey) -> LoomResult<()> {
        self.ensure_idle("bind_actor_to_solver")?;
        let entry = self.actors.get_mut(actor).ok_or_else(|| actor.unknown("actor"))?;
        let slot = self.solvers.get_mut(solver).ok_or_else(|| solver.unknown("solver"))?;

        match entry.solver {
            Some(bound) if bound == solver => return Ok(()),
            Some(bound) => {
                tracing::error!(?actor, ?bound, requested = ?solver, "Actor is already bound to another solver");
                return Err(LoomError::AlreadyBound {
                    bound: bound.to_bits(),
                    requested: solver.to_bits(),
                });
            }
            None => {}
        }

        let target = slot.solver.as_mut().ok_or_else(|| {
            LoomError::InvariantViolation("Idle solver slot has no solver".into())
        })?;
        let id = actor.cloth_id();
        if target.cloth(id).is_some() {
            return Err(LoomError::InvariantViolation(format!(
                "Solver already owns cloth {}",
                id.0
            )));
        }
        let cloth = entry.cloth.take().ok_or_else(|| {
            LoomError::InvariantViolation("Unbound actor has no cloth instance".into())
        })?;
        target.add_cloth(id, cloth)?;

        slot.actors.push(actor);
        entry.solver = Some(solver);
        entry.state = ActorState::Bound;
        tracing::debug!(?actor, ?solver, "Bound actor");
        Ok(())
    }

    /// Moves the actor's instance back out of its solver. Unbinding an
    /// unbound actor is a no-op.
    pub fn unbind_actor(&mut self, actor: ActorKey) -> LoomResult<()> {
        self.ensure_idle("unbind_actor")?;
        let entry = self.actors.get_mut(actor).ok_or_else(|| actor.unknown("actor"))?;
        let Some(solver) = entry.solver else {
            return Ok(());
        };
        let slot = self.solvers.get_mut(solver).ok_or_else(|| {
            LoomError::InvariantViolation(format!("Actor bound to untracked solver {solver:?}"))
        })?;
        let cloth = slot
            .solver
            .as_mut()
            .and_then(|s| s.remove_cloth(actor.cloth_id()))
            .ok_or_else(|| {
                LoomError::InvariantViolation(format!("Solver {solver:?} lost the cloth of {actor:?}"))
            })?;

        slot.actors.retain(|&a| a != actor);
        entry.cloth = Some(cloth);
        entry.solver = None;
        entry.state = ActorState::Unbound;
        tracing::debug!(?actor, ?solver, "Unbound actor");
        Ok(())
    }

    /// Runs `f` on the actor's instance (gravity, wind, pins, transform).
    ///
    /// # Errors
    /// `Stepping` while a step is in flight, `UnknownKey` for stale actors.
    pub fn with_cloth_mut<R>(
        &mut self,
        actor: ActorKey,
        f: impl FnOnce(&mut ClothInstance) -> R,
    ) -> LoomResult<R> {
        self.ensure_idle("with_cloth_mut")?;
        let entry = self.actors.get_mut(actor).ok_or_else(|| actor.unknown("actor"))?;
        let cloth = match entry.solver {
            None => entry.cloth.as_mut(),
            Some(solver) => self
                .solvers
                .get_mut(solver)
                .and_then(|slot| slot.solver.as_mut())
                .and_then(|s| s.cloth_mut(actor.cloth_id())),
        };
        let cloth = cloth.ok_or_else(|| {
            LoomError::InvariantViolation(format!("Cloth of {actor:?} is unreachable"))
        })?;
        Ok(f(cloth))
    }

    // ─── Stepping ────────────────────────────────────────────

    /// Advances every solver by `dt` and publishes the result.
    pub fn step(&mut self, dt: f32) -> LoomResult<StepSummary> {
        self.start_step(dt)?;
        self.finish_step()?
            .ok_or_else(|| LoomError::InvariantViolation("Started step vanished".into()))
    }

    /// Hands one job per solver to the scheduler and returns.
    ///
    /// # Errors
    /// `BatchInFlight` if the previous step has not been finished,
    /// `InvalidConfig` for a non-positive `dt`. When the scheduler refuses
    /// the batch every solver goes back to its slot and the step is not
    /// counted.
    pub fn start_step(&mut self, dt: f32) -> LoomResult<()> {
        if self.pending.is_some() || self.scheduler.is_running() {
            tracing::error!("start_step called before the previous step finished");
            return Err(LoomError::BatchInFlight {
                outstanding: self.solvers.len(),
            });
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LoomError::InvalidConfig(format!(
                "Step dt must be positive and finite (got {dt})"
            )));
        }

        let jobs: Vec<SolverJob> = self
            .solvers
            .iter_mut()
            .filter_map(|(key, slot)| Some(SolverJob::new(key, slot.solver.take()?, dt)))
            .collect();
        let solvers = jobs.len();

        let started = Instant::now();
        if let Err(rejected) = self.scheduler.start(jobs) {
            tracing::error!(err = %rejected.error, "Scheduler rejected the step");
            let returned = rejected.jobs.len();
            for job in rejected.jobs {
                if let Some(slot) = self.solvers.get_mut(job.key) {
                    slot.solver = Some(job.solver);
                }
            }
            if returned != solvers {
                return Err(LoomError::InvariantViolation(format!(
                    "Scheduler rejected the step and returned {returned} of {solvers} solvers"
                )));
            }
            return Err(rejected.error);
        }

        for (_, actor) in self.actors.iter_mut() {
            if actor.solver.is_some() {
                actor.state = ActorState::Stepping;
            }
        }
        self.bus.emit(SimulationEvent::new(
            self.frame + 1,
            EventKind::StepBegin { dt, solvers },
        ));
        tracing::trace!(frame = self.frame + 1, solvers, "Step started");

        self.pending = Some(PendingStep {
            dt,
            solvers,
            started,
        });
        Ok(())
    }

    /// Waits for the in-flight step, restores the solvers and publishes
    /// positions to every bound actor's renderer. Returns `None` when no
    /// step was started.
    ///
    /// Nothing is published when a solver reported an error.
    pub fn finish_step(&mut self) -> LoomResult<Option<StepSummary>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };

        let jobs = self.scheduler.wait();
        self.frame += 1;

        let returned = jobs.len();
        let mut failure = None;
        let mut solver_reports = Vec::with_capacity(returned);
        for job in jobs {
            let SolverJob {
                key: handle,
                solver,
                result,
                ..
            } = job;
            match self.solvers.get_mut(handle) {
                Some(slot) => slot.solver = Some(solver),
                None => {
                    failure.get_or_insert(LoomError::InvariantViolation(format!(
                        "Solver {handle:?} was untracked mid-step"
                    )));
                }
            }
            match result {
                Some(Ok(report)) => solver_reports.push((handle, report)),
                Some(Err(err)) => {
                    failure.get_or_insert(err);
                }
                None => {
                    failure.get_or_insert(LoomError::InvariantViolation(format!(
                        "Scheduler returned solver {handle:?} without running it"
                    )));
                }
            }
        }
        if returned != pending.solvers {
            failure.get_or_insert(LoomError::InvariantViolation(format!(
                "Scheduler returned {returned} of {} solvers",
                pending.solvers
            )));
        }

        if let Some(err) = failure {
            self.reset_stepping_actors();
            tracing::error!(frame = self.frame, %err, "Step failed; nothing published");
            self.bus.flush();
            return Err(err);
        }

        for (handle, report) in &solver_reports {
            self.bus.emit(SimulationEvent::new(
                self.frame,
                EventKind::SolverStep {
                    solver: handle.to_bits(),
                    cloths: report.cloth_count,
                    iterations: report.iterations,
                    elapsed_ms: report.elapsed_ms,
                },
            ));
        }

        // Publish only after every job has been waited on.
        let mut published = 0;
        let mut particles = 0;
        let mut publish_error = None;
        for (handle, actor) in self.actors.iter_mut() {
            let Some(solver) = actor.solver else {
                continue;
            };
            let cloth = self
                .solvers
                .get(solver)
                .and_then(|slot| slot.solver.as_ref())
                .and_then(|s| s.cloth(handle.cloth_id()));
            let Some(cloth) = cloth else {
                publish_error.get_or_insert(LoomError::InvariantViolation(format!(
                    "Bound actor {handle:?} has no cloth in its solver"
                )));
                continue;
            };

            let frame = RenderFrame::from_positions(self.frame, cloth.positions());
            if let Err(err) = actor.renderer.submit_frame(&frame) {
                tracing::warn!(actor = ?handle, %err, "Renderer rejected frame");
                publish_error.get_or_insert(err);
                actor.state = ActorState::Bound;
                continue;
            }
            actor.state = ActorState::Settled;
            actor.frames_published += 1;
            published += 1;
            particles += frame.positions.len();
            self.bus.emit(SimulationEvent::new(
                self.frame,
                EventKind::Publish {
                    actor: handle.to_bits(),
                    particles: frame.positions.len(),
                },
            ));
        }

        let wall_ms = pending.started.elapsed().as_secs_f64() * 1000.0;
        self.bus.emit(SimulationEvent::new(
            self.frame,
            EventKind::StepEnd { wall_ms, particles },
        ));
        self.bus.flush();

        if let Some(err) = publish_error {
            return Err(err);
        }
        Ok(Some(StepSummary {
            frame: self.frame,
            dt: pending.dt,
            solver_reports,
            published,
            particles,
            wall_ms,
        }))
    }

    // ─── Teardown ────────────────────────────────────────────

    /// Releases everything in reverse creation order: detach actors, drop
    /// solvers, drop actors with their instances (finalizing renderers),
    /// then release fabrics.
    pub fn teardown(&mut self) -> LoomResult<()> {
        self.ensure_idle("teardown")?;

        for actor in self.actors.keys().collect::<Vec<_>>() {
            self.unbind_actor(actor)?;
        }
        for solver in self.solvers.keys().collect::<Vec<_>>() {
            self.untrack_solver(solver)?;
        }

        let mut finalize_error = None;
        for handle in self.actors.keys().collect::<Vec<_>>() {
            if let Some(mut actor) = self.untrack_actor(handle)? {
                if let Err(err) = actor.renderer.finalize() {
                    tracing::warn!(actor = ?handle, %err, "Renderer failed to finalize");
                    finalize_error.get_or_insert(err);
                }
            }
        }
        for fabric in self.fabrics.keys().collect::<Vec<_>>() {
            self.untrack_fabric(fabric)?;
        }

        self.bus.finalize();
        tracing::info!(frames = self.frame, "Controller torn down");
        finalize_error.map_or(Ok(()), Err)
    }
}

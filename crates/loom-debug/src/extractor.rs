//! Debug line extraction.
//!
//! Every function reads a [`ClothInstance`] (fabric plus live particle
//! state) and produces line segments; nothing here mutates simulation
//! state. [`DiagnosticsExtractor::extract`] walks every cloth reachable
//! through a controller and concatenates the selected overlays.

use std::ops::Range;

use loom_controller::{SimulationController, SolverJob};
use loom_fabric::ConstraintKind;
use loom_jobs::Scheduler;
use loom_math::{Aabb, Vec3};
use loom_solver::ClothInstance;
use loom_types::constants::{DEFAULT_DT, EPSILON};
use serde::{Deserialize, Serialize};

use crate::lines::{
    error_color, DebugLine, DebugLines, BENDING_COLOR, BOUNDS_COLOR, DELTA_COLOR, SHEAR_COLOR,
    STRETCH_COLOR, TETHER_COLOR, TETHER_OVER_LIMIT_COLOR,
};

/// Which overlays to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDrawOptions {
    pub tethers: bool,
    pub constraints: bool,
    /// Restricts constraint lines to these phase indices.
    pub phase_range: Option<Range<usize>>,
    pub constraint_error: bool,
    /// Relative length change that maps to full error color.
    pub error_scale: f32,
    pub position_deltas: bool,
    /// Step length the position deltas are normalized to.
    pub reference_dt: f32,
    pub bounds: bool,
}

impl Default for DebugDrawOptions {
    fn default() -> Self {
        Self {
            tethers: false,
            constraints: false,
            phase_range: None,
            constraint_error: false,
            error_scale: 0.1,
            position_deltas: false,
            reference_dt: DEFAULT_DT,
            bounds: false,
        }
    }
}

impl DebugDrawOptions {
    /// Every overlay enabled.
    pub fn all() -> Self {
        Self {
            tethers: true,
            constraints: true,
            constraint_error: true,
            position_deltas: true,
            bounds: true,
            ..Default::default()
        }
    }
}

/// Derives debug overlays from live cloth state.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsExtractor {
    options: DebugDrawOptions,
}

impl DiagnosticsExtractor {
    pub fn new(options: DebugDrawOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DebugDrawOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DebugDrawOptions {
        &mut self.options
    }

    /// Lines for every cloth the controller can currently reach.
    ///
    /// Bound cloths are unreachable while a step is in flight and are
    /// skipped; an empty controller yields no lines.
    pub fn extract<S: Scheduler<SolverJob>>(&self, controller: &SimulationController<S>) -> DebugLines {
        let mut out = DebugLines::new();
        for (_, cloth) in controller.cloths() {
            out.append(&mut self.extract_cloth(cloth));
        }
        tracing::trace!(lines = out.len(), "Extracted debug lines");
        out
    }

    /// Lines for one instance according to the options.
    pub fn extract_cloth(&self, cloth: &ClothInstance) -> DebugLines {
        let o = &self.options;
        let mut out = DebugLines::new();
        if o.tethers {
            out.append(&mut tether_lines(cloth));
        }
        if o.constraints {
            out.append(&mut constraint_lines(cloth, o.phase_range.clone()));
        }
        if o.constraint_error {
            out.append(&mut constraint_error_lines(cloth, o.error_scale));
        }
        if o.position_deltas {
            out.append(&mut position_delta_lines(cloth, o.reference_dt));
        }
        if o.bounds {
            out.append(&mut bounds_lines(&cloth.bounds()));
        }
        out
    }
}

/// Anchor-to-particle segment per tether, red when longer than
/// `rest_length * tether_scale`. Self tethers of pinned particles are skipped.
pub fn tether_lines(cloth: &ClothInstance) -> DebugLines {
    let positions = cloth.positions();
    let scale = cloth.params().tether_scale;
    cloth
        .fabric()
        .tethers()
        .iter()
        .filter(|t| t.particle != t.anchor)
        .map(|t| {
            let anchor = positions[t.anchor as usize];
            let particle = positions[t.particle as usize];
            let over = (particle - anchor).length() > t.rest_length * scale;
            let color = if over { TETHER_OVER_LIMIT_COLOR } else { TETHER_COLOR };
            DebugLine::new(anchor, particle, color)
        })
        .collect()
}

/// Every constraint edge colored by kind, optionally only for a range of
/// phases (clamped to the fabric's phase count).
pub fn constraint_lines(cloth: &ClothInstance, phase_range: Option<Range<usize>>) -> DebugLines {
    let fabric = cloth.fabric();
    let positions = cloth.positions();
    let phases = fabric.phases();
    let range = phase_range.unwrap_or(0..phases.len());
    let start = range.start.min(phases.len());
    let end = range.end.clamp(start, phases.len());

    phases[start..end]
        .iter()
        .flat_map(|phase| {
            let color = match phase.kind {
                ConstraintKind::Stretch => STRETCH_COLOR,
                ConstraintKind::Shear => SHEAR_COLOR,
                ConstraintKind::Bending => BENDING_COLOR,
            };
            fabric.constraints()[phase.range()].iter().map(move |c| {
                DebugLine::new(positions[c.a as usize], positions[c.b as usize], color)
            })
        })
        .collect()
}

/// Normalized strain of one edge: `0.5` at rest length, `0` when
/// compressed by `error_scale` or more, `1` when stretched by it.
pub fn constraint_error(current_length: f32, rest_length: f32, error_scale: f32) -> f32 {
    if rest_length <= EPSILON || error_scale <= 0.0 {
        return 0.5;
    }
    let strain = current_length / rest_length - 1.0;
    (strain / error_scale).clamp(-1.0, 1.0) * 0.5 + 0.5
}

/// Every constraint edge colored by its strain.
pub fn constraint_error_lines(cloth: &ClothInstance, error_scale: f32) -> DebugLines {
    let positions = cloth.positions();
    cloth
        .fabric()
        .constraints()
        .iter()
        .map(|c| {
            let (a, b) = (positions[c.a as usize], positions[c.b as usize]);
            let error = constraint_error((b - a).length(), c.rest_length, error_scale);
            DebugLine::new(a, b, error_color(error))
        })
        .collect()
}

/// Displacement over the last iteration per free particle, rescaled to
/// `reference_dt` so the drawn length does not depend on the solver
/// frequency. Empty before the first step.
pub fn position_delta_lines(cloth: &ClothInstance, reference_dt: f32) -> DebugLines {
    let iteration_dt = cloth.last_iteration_dt();
    if iteration_dt <= 0.0 {
        return DebugLines::new();
    }
    let scale = reference_dt / iteration_dt;
    cloth
        .positions()
        .iter()
        .zip(cloth.prev_positions())
        .zip(cloth.inv_masses())
        .filter(|(_, &w)| w > 0.0)
        .map(|((&p, &prev), _)| DebugLine::new(p, p + (p - prev) * scale, DELTA_COLOR))
        .collect()
}

/// The twelve edges of a bounding box. Empty boxes yield no lines.
pub fn bounds_lines(bounds: &Aabb) -> DebugLines {
    if bounds.is_empty() {
        return DebugLines::new();
    }
    let corners = bounds.corners();
    Aabb::EDGES
        .iter()
        .map(|&(a, b)| DebugLine::new(corners[a], corners[b], BOUNDS_COLOR))
        .collect()
}

/// Lines of the box around `center` with half-size `extent`.
pub fn bounds_lines_from_center(center: Vec3, extent: Vec3) -> DebugLines {
    bounds_lines(&Aabb::from_center_extent(center, extent))
}

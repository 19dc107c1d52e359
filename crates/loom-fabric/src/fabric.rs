//! Cooked fabric data.
//!
//! A [`Fabric`] is immutable once built. Constraints are stored phase by
//! phase in one flat array; each [`Phase`] owns a contiguous range of it.

use std::ops::Range;

use loom_math::Vec3;
use loom_types::{LoomError, LoomResult, PhaseId};
use serde::{Deserialize, Serialize};

/// Which mesh feature a constraint was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Mesh edges (quad sides when the mesh carries quads).
    Stretch,
    /// Quad diagonals.
    Shear,
    /// Wing-to-wing span across an interior edge.
    Bending,
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Stretch => "stretch",
            ConstraintKind::Shear => "shear",
            ConstraintKind::Bending => "bending",
        }
    }
}

/// Distance constraint between two particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub a: u32,
    pub b: u32,
    pub rest_length: f32,
    pub phase: PhaseId,
}

/// Solver settings for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Fraction of the constraint error corrected per iteration (0.0–1.0).
    pub stiffness: f32,
    /// Scales `stiffness` while the length stays inside
    /// `[compression_limit, stretch_limit] * rest_length`.
    pub stiffness_multiplier: f32,
    /// Lower bound of the soft zone, relative to rest length (≤ 1.0).
    pub compression_limit: f32,
    /// Upper bound of the soft zone, relative to rest length (≥ 1.0).
    pub stretch_limit: f32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            stiffness: 1.0,
            stiffness_multiplier: 1.0,
            compression_limit: 1.0,
            stretch_limit: 1.0,
        }
    }
}

impl PhaseConfig {
    pub fn validate(&self) -> LoomResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.stiffness) || !unit.contains(&self.stiffness_multiplier) {
            return Err(LoomError::InvalidConfig(format!(
                "Phase stiffness ({}) and multiplier ({}) must lie in [0, 1]",
                self.stiffness, self.stiffness_multiplier
            )));
        }
        if !(self.compression_limit > 0.0 && self.compression_limit <= 1.0) {
            return Err(LoomError::InvalidConfig(format!(
                "Compression limit must lie in (0, 1] (got {})",
                self.compression_limit
            )));
        }
        if !(self.stretch_limit >= 1.0 && self.stretch_limit.is_finite()) {
            return Err(LoomError::InvalidConfig(format!(
                "Stretch limit must be finite and at least 1 (got {})",
                self.stretch_limit
            )));
        }
        Ok(())
    }
}

/// Constraints that share no particle and can be solved in one parallel sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: ConstraintKind,
    /// Start of this phase's range in [`Fabric::constraints`].
    pub start: u32,
    /// One past the end of the range.
    pub end: u32,
    pub config: PhaseConfig,
}

impl Phase {
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Maximum-distance link from a particle to a pinned anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tether {
    pub particle: u32,
    pub anchor: u32,
    pub rest_length: f32,
}

/// Immutable constraint topology shared across cloth instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fabric {
    rest_positions: Vec<Vec3>,
    constraints: Vec<Constraint>,
    phases: Vec<Phase>,
    tethers: Vec<Tether>,
    indices: Vec<u32>,
}

impl Fabric {
    pub(crate) fn from_parts(
        rest_positions: Vec<Vec3>,
        constraints: Vec<Constraint>,
        phases: Vec<Phase>,
        tethers: Vec<Tether>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            rest_positions,
            constraints,
            phases,
            tethers,
            indices,
        }
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.rest_positions.len()
    }

    /// Positions the fabric was cooked from.
    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    /// All constraints, grouped by phase in phase order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Constraints of phase `phase`.
    pub fn phase_constraints(&self, phase: usize) -> &[Constraint] {
        &self.constraints[self.phases[phase].range()]
    }

    pub fn tethers(&self) -> &[Tether] {
        &self.tethers
    }

    /// Triangle indices stored flat (aerodynamics and rendering).
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of constraints of the given kind.
    pub fn constraint_count(&self, kind: ConstraintKind) -> usize {
        self.phases
            .iter()
            .filter(|p| p.kind == kind)
            .map(Phase::len)
            .sum()
    }
}

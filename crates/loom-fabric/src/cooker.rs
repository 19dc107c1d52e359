//! Fabric cooking.
//!
//! Derives distance constraints from a [`ClothMeshDesc`]:
//!
//! - **Stretch**: quad sides when the mesh carries quads, triangle edges otherwise
//! - **Shear**: both diagonals of every quad
//! - **Bending**: wing-to-wing span across each interior triangle edge,
//!   skipped when the pair is already constrained
//!
//! Each kind is colored into independent phases, emitted in the order
//! stretch, shear, bending.

use std::collections::HashSet;

use loom_mesh::{ClothMeshDesc, Topology};
use loom_types::{LoomResult, PhaseId};

use crate::config::{CookingConfig, TetherMetric};
use crate::fabric::{Constraint, ConstraintKind, Fabric, Phase, PhaseConfig};
use crate::phases::PhaseColoring;
use crate::tethers;

/// Builds [`Fabric`]s from mesh descriptions.
#[derive(Debug, Clone, Default)]
pub struct FabricCooker {
    config: CookingConfig,
}

impl FabricCooker {
    pub fn new(config: CookingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CookingConfig {
        &self.config
    }

    /// Cooks `desc` into an immutable fabric.
    ///
    /// # Errors
    /// `InvalidMesh` when the description fails validation, `InvalidConfig`
    /// when a phase default is out of range.
    pub fn cook(&self, desc: &ClothMeshDesc) -> LoomResult<Fabric> {
        desc.validate()?;
        self.config.stretch.validate()?;
        self.config.shear.validate()?;
        self.config.bend.validate()?;

        let topology = Topology::build(desc);
        let mut seen: HashSet<(u32, u32)> = HashSet::new();

        let stretch = if desc.quad_count() > 0 {
            let sides = (0..desc.quad_count()).flat_map(|q| {
                let [a, b, c, d] = desc.quad(q);
                [[a, b], [b, c], [c, d], [d, a]]
            });
            unique_pairs(sides, &mut seen)
        } else {
            unique_pairs(topology.edges.iter().copied(), &mut seen)
        };

        let shear = unique_pairs(
            (0..desc.quad_count()).flat_map(|q| {
                let [a, b, c, d] = desc.quad(q);
                [[a, c], [b, d]]
            }),
            &mut seen,
        );

        let bending = if self.config.bending {
            unique_pairs(topology.bending_spans.iter().map(|s| s.wings), &mut seen)
        } else {
            Vec::new()
        };

        let mut constraints = Vec::with_capacity(stretch.len() + shear.len() + bending.len());
        let mut phases = Vec::new();
        for (kind, pairs, config) in [
            (ConstraintKind::Stretch, &stretch, self.config.stretch),
            (ConstraintKind::Shear, &shear, self.config.shear),
            (ConstraintKind::Bending, &bending, self.config.bend),
        ] {
            push_phases(desc, kind, pairs, config, &mut constraints, &mut phases);
        }

        let tethers = match self.config.tether_metric {
            TetherMetric::Euclidean => {
                tethers::euclidean_tethers(&desc.positions, &desc.inv_masses, &topology.components())
            }
            TetherMetric::Geodesic => {
                let mut paths = stretch.clone();
                paths.extend_from_slice(&shear);
                tethers::geodesic_tethers(&desc.positions, &desc.inv_masses, &paths)
            }
        };

        tracing::debug!(
            particles = desc.particle_count(),
            stretch = stretch.len(),
            shear = shear.len(),
            bending = bending.len(),
            phases = phases.len(),
            tethers = tethers.len(),
            "Cooked fabric"
        );

        Ok(Fabric::from_parts(
            desc.positions.clone(),
            constraints,
            phases,
            tethers,
            desc.indices.clone(),
        ))
    }
}

/// Normalizes pairs to `(min, max)` and drops any already in `seen`.
fn unique_pairs(
    pairs: impl IntoIterator<Item = [u32; 2]>,
    seen: &mut HashSet<(u32, u32)>,
) -> Vec<[u32; 2]> {
    pairs
        .into_iter()
        .filter(|&[a, b]| a != b)
        .map(|[a, b]| [a.min(b), a.max(b)])
        .filter(|&[a, b]| seen.insert((a, b)))
        .collect()
}

fn push_phases(
    desc: &ClothMeshDesc,
    kind: ConstraintKind,
    pairs: &[[u32; 2]],
    config: PhaseConfig,
    constraints: &mut Vec<Constraint>,
    phases: &mut Vec<Phase>,
) {
    for class in PhaseColoring::color(pairs, desc.particle_count()) {
        let phase = PhaseId(phases.len() as u32);
        let start = constraints.len() as u32;
        constraints.extend(class.into_iter().map(|pi| {
            let [a, b] = pairs[pi];
            Constraint {
                a,
                b,
                rest_length: desc.positions[a as usize].distance(desc.positions[b as usize]),
                phase,
            }
        }));
        phases.push(Phase {
            kind,
            start,
            end: constraints.len() as u32,
            config,
        });
    }
}

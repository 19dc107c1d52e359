//! Position projection for distance constraints, tethers and
//! particle-particle self-collision.
//!
//! Every routine moves particles in proportion to their inverse mass, so a
//! particle with `inv_mass == 0.0` is never displaced.

use loom_fabric::{Constraint, PhaseConfig, Tether};
use loom_math::Vec3;
use loom_types::constants::EPSILON;

use crate::spatial_hash::SpatialHash;

/// Projects one phase of distance constraints.
///
/// Inside `[compression_limit, stretch_limit] * rest_length` the length is
/// pulled toward rest with `stiffness * stiffness_multiplier`; outside it is
/// pulled back to the violated limit with `stiffness`.
pub fn solve_phase(
    positions: &mut [Vec3],
    inv_masses: &[f32],
    constraints: &[Constraint],
    config: &PhaseConfig,
) {
    for c in constraints {
        let (a, b) = (c.a as usize, c.b as usize);
        let (wa, wb) = (inv_masses[a], inv_masses[b]);
        let w = wa + wb;
        if w == 0.0 {
            continue;
        }

        let delta = positions[b] - positions[a];
        let len = delta.length();
        if len < EPSILON {
            continue;
        }

        let lo = c.rest_length * config.compression_limit;
        let hi = c.rest_length * config.stretch_limit;
        let (error, k) = if len < lo || len > hi {
            (len - len.clamp(lo, hi), config.stiffness)
        } else {
            (
                len - c.rest_length,
                config.stiffness * config.stiffness_multiplier,
            )
        };
        if error == 0.0 {
            continue;
        }

        let correction = delta * (error * k / (len * w));
        positions[a] += correction * wa;
        positions[b] -= correction * wb;
    }
}

/// Pulls free particles back inside `rest_length * scale` of their anchor.
pub fn solve_tethers(
    positions: &mut [Vec3],
    inv_masses: &[f32],
    tethers: &[Tether],
    stiffness: f32,
    scale: f32,
) {
    if stiffness == 0.0 {
        return;
    }
    for t in tethers {
        let p = t.particle as usize;
        if inv_masses[p] == 0.0 {
            continue;
        }
        let delta = positions[p] - positions[t.anchor as usize];
        let len = delta.length();
        let max = t.rest_length * scale;
        if len > max && len > EPSILON {
            positions[p] -= delta * ((len - max) / len * stiffness);
        }
    }
}

/// Separates particles closer than `distance` that are not already closer
/// than `distance` at rest. Returns the number of pairs corrected.
pub fn solve_self_collision(
    positions: &mut [Vec3],
    inv_masses: &[f32],
    rest_positions: &[Vec3],
    distance: f32,
    stiffness: f32,
    hash: &mut SpatialHash,
) -> u32 {
    hash.rebuild(positions);
    let d2 = distance * distance;
    let mut contacts = 0;

    for (a, b) in hash.candidate_pairs() {
        let (a, b) = (a as usize, b as usize);
        let (wa, wb) = (inv_masses[a], inv_masses[b]);
        let w = wa + wb;
        if w == 0.0 {
            continue;
        }
        if rest_positions[a].distance_squared(rest_positions[b]) < d2 {
            continue;
        }

        let delta = positions[b] - positions[a];
        let len2 = delta.length_squared();
        if len2 >= d2 || len2 < EPSILON * EPSILON {
            continue;
        }

        let len = len2.sqrt();
        let correction = delta * ((distance - len) * stiffness / (len * w));
        positions[a] -= correction * wa;
        positions[b] += correction * wb;
        contacts += 1;
    }

    contacts
}

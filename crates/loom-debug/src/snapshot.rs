//! Cloth state snapshots for offline inspection.
//!
//! A snapshot captures one instance's particle state after a step, so a
//! misbehaving frame can be saved from a run and examined later with
//! `loom inspect`.

use std::path::Path;

use loom_math::{Aabb, Vec3};
use loom_solver::{ClothInstance, ClothParams};
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};

/// Particle state of one cloth instance at one frame.
///
/// Serialized with `bincode` for compact binary output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothSnapshot {
    /// Controller frame the snapshot was taken after.
    pub frame: u64,
    /// Flat `[x0, y0, z0, x1, y1, z1, ...]`.
    pub positions: Vec<f32>,
    /// Positions one solver iteration earlier, same layout.
    pub prev_positions: Vec<f32>,
    pub inv_masses: Vec<f32>,
    pub params: ClothParams,
    pub iteration_dt: f32,
    pub particle_count: usize,
}

fn flatten(points: &[Vec3]) -> Vec<f32> {
    points.iter().flat_map(|p| p.to_array()).collect()
}

impl ClothSnapshot {
    pub fn capture(frame: u64, cloth: &ClothInstance) -> Self {
        Self {
            frame,
            positions: flatten(cloth.positions()),
            prev_positions: flatten(cloth.prev_positions()),
            inv_masses: cloth.inv_masses().to_vec(),
            params: cloth.params().clone(),
            iteration_dt: cloth.last_iteration_dt(),
            particle_count: cloth.particle_count(),
        }
    }

    /// Particle `i`'s position.
    pub fn position(&self, i: usize) -> Option<Vec3> {
        self.positions.get(i * 3..i * 3 + 3).map(Vec3::from_slice)
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.positions.chunks_exact(3).map(Vec3::from_slice).collect()
    }

    /// Per-particle velocity estimated from the last iteration.
    /// All zero before the first step.
    pub fn velocities(&self) -> Vec<Vec3> {
        let dt = self.iteration_dt;
        self.positions
            .chunks_exact(3)
            .zip(self.prev_positions.chunks_exact(3))
            .map(|(p, q)| {
                if dt > 0.0 {
                    (Vec3::from_slice(p) - Vec3::from_slice(q)) / dt
                } else {
                    Vec3::ZERO
                }
            })
            .collect()
    }

    pub fn pinned_count(&self) -> usize {
        self.inv_masses.iter().filter(|&&w| w == 0.0).count()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.positions())
    }

    /// Largest per-particle distance to `other`. `None` if the particle
    /// counts differ.
    pub fn max_displacement(&self, other: &ClothSnapshot) -> Option<f32> {
        if self.particle_count != other.particle_count {
            return None;
        }
        let max = self
            .positions()
            .iter()
            .zip(other.positions())
            .map(|(a, b)| (*a - b).length())
            .fold(0.0_f32, f32::max);
        Some(max)
    }

    /// Serializes to compact binary format.
    pub fn to_bytes(&self) -> LoomResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| LoomError::Serialization(format!("Snapshot serialization failed: {e}")))
    }

    /// Deserializes from binary format and checks buffer lengths.
    pub fn from_bytes(data: &[u8]) -> LoomResult<Self> {
        let snapshot: Self = bincode::deserialize(data)
            .map_err(|e| LoomError::Serialization(format!("Snapshot deserialization failed: {e}")))?;
        let n = snapshot.particle_count;
        if snapshot.positions.len() != n * 3
            || snapshot.prev_positions.len() != n * 3
            || snapshot.inv_masses.len() != n
        {
            return Err(LoomError::Serialization(format!(
                "Snapshot buffers do not match particle count {n}"
            )));
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LoomResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)?;
        tracing::info!(path = %path.display(), frame = self.frame, "Wrote cloth snapshot");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> LoomResult<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}

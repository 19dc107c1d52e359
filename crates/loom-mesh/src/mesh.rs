//! Read-only cloth mesh description.
//!
//! [`ClothMeshDesc`] is the boundary type between mesh generation and
//! everything downstream: fabric cooking reads it to derive constraints,
//! and renderers build their static index buffer from it. Arrays are kept
//! in generator order; nothing downstream is allowed to reorder them.

use loom_math::Vec3;
use serde::{Deserialize, Serialize};
use loom_types::{LoomError, LoomResult};

/// Plain particle/triangle description of a cloth mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothMeshDesc {
    /// Particle positions (already placed by the generator transform).
    pub positions: Vec<Vec3>,
    /// Per-particle inverse mass. `0.0` marks a pinned particle.
    pub inv_masses: Vec<f32>,
    /// Triangle indices stored flat: `[t0v0, t0v1, t0v2, t1v0, ...]`.
    pub indices: Vec<u32>,
    /// Optional quad indices stored flat, four per quad.
    pub quads: Vec<u32>,
    /// Unique undirected mesh edges in first-appearance order.
    pub edges: Vec<[u32; 2]>,
}

impl ClothMeshDesc {
    /// Returns the number of particles.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.quads.len() / 4
    }

    /// Returns the three particle indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    #[inline]
    pub fn quad(&self, q: usize) -> [u32; 4] {
        let base = q * 4;
        [
            self.quads[base],
            self.quads[base + 1],
            self.quads[base + 2],
            self.quads[base + 3],
        ]
    }

    /// Number of particles with zero inverse mass.
    pub fn pinned_count(&self) -> usize {
        self.inv_masses.iter().filter(|&&w| w == 0.0).count()
    }

    /// Validates description integrity.
    ///
    /// Checks:
    /// - At least one particle
    /// - Position and inverse-mass arrays have the same length
    /// - Index buffers are whole primitives and within bounds
    /// - No degenerate triangles (repeated particle indices)
    /// - Inverse masses are finite and non-negative
    pub fn validate(&self) -> LoomResult<()> {
        let n = self.positions.len();
        if n == 0 {
            return Err(LoomError::InvalidMesh("Mesh has no particles".into()));
        }
        if self.inv_masses.len() != n {
            return Err(LoomError::InvalidMesh(format!(
                "Inverse mass count ({}) != particle count ({})",
                self.inv_masses.len(),
                n
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(LoomError::InvalidMesh(
                "Index count is not divisible by 3".into(),
            ));
        }
        if self.quads.len() % 4 != 0 {
            return Err(LoomError::InvalidMesh(
                "Quad index count is not divisible by 4".into(),
            ));
        }

        let all_indices = self
            .indices
            .iter()
            .chain(self.quads.iter())
            .chain(self.edges.iter().flatten());
        for &idx in all_indices {
            if idx as usize >= n {
                return Err(LoomError::InvalidMesh(format!(
                    "Index {} is out of range (particle count: {})",
                    idx, n
                )));
            }
        }

        for t in 0..self.triangle_count() {
            let [a, b, c] = self.triangle(t);
            if a == b || b == c || a == c {
                return Err(LoomError::InvalidMesh(format!(
                    "Triangle {} has repeated particle indices: [{}, {}, {}]",
                    t, a, b, c
                )));
            }
        }

        if let Some(i) = self
            .inv_masses
            .iter()
            .position(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(LoomError::InvalidMesh(format!(
                "Particle {} has invalid inverse mass {}",
                i, self.inv_masses[i]
            )));
        }

        Ok(())
    }
}

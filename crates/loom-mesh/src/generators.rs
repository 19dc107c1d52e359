//! Procedural cloth generation and pinning.
//!
//! [`ClothMeshData`] is built once per cloth piece at scene load, pinned
//! and weighted in place, optionally merged with other pieces, and then
//! frozen into a [`ClothMeshDesc`] for cooking and rendering.

use std::collections::HashSet;

use loom_math::{Mat4, Vec2, Vec3};
use loom_types::{LoomError, LoomResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mesh::ClothMeshDesc;

/// Out-of-plane row offset pattern for plane cloths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zigzag {
    /// Flat grid.
    #[default]
    Off,
    /// Rows follow `sin(0.5 * row)`, a gentle wave across the cloth.
    Sine,
    /// Row pairs are folded into pleats stacked along the local Y axis.
    /// With an odd row count the last row stays on the cloth's far edge.
    Pleat,
}

/// Grid edge selector for [`ClothMeshData::attach_by_side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Row 0.
    Top,
    /// Last row.
    Bottom,
    /// Column 0.
    Left,
    /// Last column.
    Right,
}

/// Declarative parameters for [`ClothMeshData::generate_plane_cloth`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneCloth {
    /// Size along local X (meters).
    pub width: f32,
    /// Size along local Z (meters).
    pub height: f32,
    /// Cells along X (particle columns = segments_x + 1).
    pub segments_x: u32,
    /// Cells along Z (particle rows = segments_y + 1).
    pub segments_y: u32,
    /// Also emit one quad per cell.
    pub quads: bool,
    /// Placement applied to every local grid position.
    pub transform: Mat4,
    /// Flip the triangle diagonal on a checkerboard pattern.
    pub alternating_diagonals: bool,
    /// Out-of-plane row pattern.
    pub zigzag: Zigzag,
}

impl Default for PlaneCloth {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            segments_x: 10,
            segments_y: 10,
            quads: false,
            transform: Mat4::IDENTITY,
            alternating_diagonals: false,
            zigzag: Zigzag::Off,
        }
    }
}

impl PlaneCloth {
    /// Flat grid of `width × height` meters with the given cell counts.
    pub fn new(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Self {
        Self {
            width,
            height,
            segments_x,
            segments_y,
            ..Default::default()
        }
    }

    /// Sets the placement applied to every generated position.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Also emit one quad per cell.
    pub fn with_quads(mut self, quads: bool) -> Self {
        self.quads = quads;
        self
    }

    /// Flip the diagonal of every other cell.
    pub fn with_alternating_diagonals(mut self, alternating: bool) -> Self {
        self.alternating_diagonals = alternating;
        self
    }

    /// Sets the out-of-plane row pattern.
    pub fn with_zigzag(mut self, zigzag: Zigzag) -> Self {
        self.zigzag = zigzag;
        self
    }

    /// Number of particles the grid will produce.
    pub fn particle_count(&self) -> usize {
        (self.segments_x as usize + 1) * (self.segments_y as usize + 1)
    }
}

/// Mutable cloth mesh under construction.
///
/// Particle `(x, y)` of a generated plane lives at index
/// `x + y * (segments_x + 1)`; row 0 is the first row emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClothMeshData {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub inv_masses: Vec<f32>,
    /// Triangle indices stored flat, three per triangle.
    pub indices: Vec<u32>,
    /// Quad indices stored flat, four per quad. Empty unless requested.
    pub quads: Vec<u32>,
}

impl ClothMeshData {
    /// Generates a rectangular particle grid with two triangles per cell.
    ///
    /// ```text
    ///  v0______v1_____v2      v0______v1_____v2
    ///   |\     |\     |        |\     |     /|
    ///   |  \t0 |  \t2 |        |  \   |   /  |
    ///   | t1 \ | t3 \ |        |    \ | /    |
    ///  v3-----\v4----\v5      v3------v4-----v5
    ///        default           alternating_diagonals
    /// ```
    ///
    /// Local positions span `[-w/2, w/2] × {0} × [-h/2, h/2]` before
    /// `transform` is applied.
    pub fn generate_plane_cloth(params: &PlaneCloth) -> LoomResult<Self> {
        if params.segments_x == 0 || params.segments_y == 0 {
            return Err(LoomError::InvalidMesh(format!(
                "Plane cloth needs at least one segment per axis (got {}x{})",
                params.segments_x, params.segments_y
            )));
        }
        if !(params.width.is_finite() && params.width > 0.0)
            || !(params.height.is_finite() && params.height > 0.0)
        {
            return Err(LoomError::InvalidMesh(format!(
                "Plane cloth size must be positive and finite (got {} x {})",
                params.width, params.height
            )));
        }

        let sx = params.segments_x as usize;
        let sy = params.segments_y as usize;
        let cols = sx + 1;
        let vertex_count = cols * (sy + 1);
        let cell_count = sx * sy;

        let mut mesh = Self {
            positions: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            inv_masses: vec![1.0; vertex_count],
            indices: Vec::with_capacity(cell_count * 6),
            quads: Vec::with_capacity(if params.quads { cell_count * 4 } else { 0 }),
        };

        let w = params.width;
        let h = params.height;
        let top_left = Vec3::new(-w * 0.5, 0.0, -h * 0.5);

        for y in 0..=sy {
            for x in 0..=sx {
                let u = x as f32 / sx as f32;
                let v = y as f32 / sy as f32;
                let local = match params.zigzag {
                    Zigzag::Off => Vec3::new(u * w, 0.0, v * h),
                    Zigzag::Sine => Vec3::new(u * w, (y as f32 * 0.5).sin() / sy as f32 * h, v * h),
                    Zigzag::Pleat => Vec3::new(
                        u * w,
                        (y & 2) as f32 / sy as f32 * h,
                        ((y + 1) & !1).min(sy) as f32 / sy as f32 * h,
                    ),
                };
                mesh.positions
                    .push(params.transform.transform_point3(top_left + local));
                mesh.uvs.push(Vec2::new(u, v));
            }
        }

        let idx = |x: usize, y: usize| (x + y * cols) as u32;

        for y in 0..sy {
            for x in 0..sx {
                if params.alternating_diagonals && (x ^ y) & 1 == 1 {
                    // Top-right to bottom-left diagonal
                    mesh.indices
                        .extend_from_slice(&[idx(x, y), idx(x + 1, y), idx(x, y + 1)]);
                    mesh.indices
                        .extend_from_slice(&[idx(x + 1, y), idx(x + 1, y + 1), idx(x, y + 1)]);
                } else {
                    // Top-left to bottom-right diagonal
                    mesh.indices
                        .extend_from_slice(&[idx(x, y), idx(x + 1, y), idx(x + 1, y + 1)]);
                    mesh.indices
                        .extend_from_slice(&[idx(x, y), idx(x + 1, y + 1), idx(x, y + 1)]);
                }

                if params.quads {
                    mesh.quads.extend_from_slice(&[
                        idx(x, y),
                        idx(x + 1, y),
                        idx(x + 1, y + 1),
                        idx(x, y + 1),
                    ]);
                }
            }
        }

        debug!(
            particles = vertex_count,
            triangles = mesh.triangle_count(),
            quads = mesh.quad_count(),
            "generated plane cloth"
        );
        Ok(mesh)
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.quads.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Indices of pinned particles, ascending.
    pub fn pinned_indices(&self) -> Vec<u32> {
        self.inv_masses
            .iter()
            .enumerate()
            .filter(|(_, &w)| w == 0.0)
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn check_grid(&self, segments_x: u32, segments_y: u32) -> LoomResult<usize> {
        let cols = segments_x as usize + 1;
        let expected = cols * (segments_y as usize + 1);
        if segments_x == 0 || segments_y == 0 || expected != self.particle_count() {
            return Err(LoomError::InvalidMesh(format!(
                "Grid {}x{} does not match particle count {}",
                segments_x,
                segments_y,
                self.particle_count()
            )));
        }
        Ok(cols)
    }

    /// Pins the two corner particles of the attachment edge.
    ///
    /// With `attach_by_width` the edge is row 0 (corners `(0, 0)` and
    /// `(segments_x, 0)`), otherwise column 0 (corners `(0, 0)` and
    /// `(0, segments_y)`). Hanging a cloth from its corners this way
    /// emulates a sheet clipped to a rod at both ends.
    pub fn attach_by_angles(
        &mut self,
        segments_x: u32,
        segments_y: u32,
        attach_by_width: bool,
    ) -> LoomResult<()> {
        let cols = self.check_grid(segments_x, segments_y)?;
        let (sx, sy) = (segments_x as usize, segments_y as usize);
        let corners = if attach_by_width {
            [0, sx]
        } else {
            [0, sy * cols]
        };
        for i in corners {
            self.inv_masses[i] = 0.0;
        }
        Ok(())
    }

    /// Pins every particle on one edge of the grid.
    pub fn attach_by_side(&mut self, segments_x: u32, segments_y: u32, side: Side) -> LoomResult<()> {
        let cols = self.check_grid(segments_x, segments_y)?;
        let (sx, sy) = (segments_x as usize, segments_y as usize);
        let pinned: Vec<usize> = match side {
            Side::Top => (0..=sx).collect(),
            Side::Bottom => (0..=sx).map(|x| x + sy * cols).collect(),
            Side::Left => (0..=sy).map(|y| y * cols).collect(),
            Side::Right => (0..=sy).map(|y| sx + y * cols).collect(),
        };
        for i in pinned {
            self.inv_masses[i] = 0.0;
        }
        Ok(())
    }

    /// Pins every particle whose Y lies within `threshold_y` of the highest particle.
    ///
    /// Returns the number of particles pinned by this call.
    pub fn attach_using_top_vertices(&mut self, threshold_y: f32) -> LoomResult<usize> {
        if !threshold_y.is_finite() || threshold_y < 0.0 {
            return Err(LoomError::InvalidConfig(format!(
                "Top-vertex threshold must be finite and non-negative (got {threshold_y})"
            )));
        }
        let top = self
            .positions
            .iter()
            .map(|p| p.y)
            .fold(f32::NEG_INFINITY, f32::max);
        let mut count = 0;
        for (p, w) in self.positions.iter().zip(self.inv_masses.iter_mut()) {
            if p.y >= top - threshold_y && *w != 0.0 {
                *w = 0.0;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Assigns the same inverse mass to every free particle.
    ///
    /// Pinned particles keep their zero inverse mass.
    pub fn set_inv_masses(&mut self, inv_mass: f32) -> LoomResult<()> {
        if !inv_mass.is_finite() || inv_mass <= 0.0 {
            return Err(LoomError::InvalidConfig(format!(
                "Inverse mass must be positive and finite (got {inv_mass})"
            )));
        }
        for w in self.inv_masses.iter_mut().filter(|w| **w != 0.0) {
            *w = inv_mass;
        }
        Ok(())
    }

    /// Derives inverse masses from an areal density (kg/m²).
    ///
    /// Each triangle contributes `area * density / 3` to each of its
    /// corners, so border particles end up lighter than interior ones.
    /// Pinned particles stay pinned; particles touching no triangle get
    /// zero inverse mass.
    pub fn set_inv_masses_from_density(&mut self, density: f32) -> LoomResult<()> {
        if !density.is_finite() || density <= 0.0 {
            return Err(LoomError::InvalidConfig(format!(
                "Density must be positive and finite (got {density})"
            )));
        }

        let mut mass = vec![0.0_f32; self.particle_count()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let area = 0.5
                * (self.positions[b] - self.positions[a])
                    .cross(self.positions[c] - self.positions[a])
                    .length();
            let share = area * density / 3.0;
            mass[a] += share;
            mass[b] += share;
            mass[c] += share;
        }

        for (w, m) in self.inv_masses.iter_mut().zip(mass) {
            if *w != 0.0 {
                *w = if m > 0.0 { 1.0 / m } else { 0.0 };
            }
        }
        Ok(())
    }

    /// Appends `other`, offsetting its indices past this mesh's particles.
    ///
    /// No constraint or triangle crosses the seam; the pieces stay
    /// mechanically independent.
    pub fn merge(&mut self, other: &ClothMeshData) -> LoomResult<()> {
        if self.is_empty() || other.is_empty() {
            return Err(LoomError::InvalidMesh(format!(
                "Cannot merge empty cloth meshes ({} + {} particles)",
                self.particle_count(),
                other.particle_count()
            )));
        }
        let offset = self.particle_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        self.uvs.extend_from_slice(&other.uvs);
        self.inv_masses.extend_from_slice(&other.inv_masses);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
        self.quads.extend(other.quads.iter().map(|i| i + offset));

        debug!(
            offset,
            particles = self.particle_count(),
            "merged cloth mesh"
        );
        Ok(())
    }

    /// Freezes the mesh into the description consumed by cooking and rendering.
    pub fn cloth_mesh_desc(&self) -> ClothMeshDesc {
        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        let mut edges = Vec::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push([key.0, key.1]);
                }
            }
        }

        ClothMeshDesc {
            positions: self.positions.clone(),
            inv_masses: self.inv_masses.clone(),
            indices: self.indices.clone(),
            quads: self.quads.clone(),
            edges,
        }
    }
}

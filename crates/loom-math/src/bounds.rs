//! Axis-aligned bounding boxes.
//!
//! Cloth instances report their bounds as center + half-extent, which is
//! what the debug overlay draws and what broad-phase code consumes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box stored as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any `grow` call will overwrite.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds a box from its center and half-extent.
    pub fn from_center_extent(center: Vec3, extent: Vec3) -> Self {
        let extent = extent.abs();
        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    /// Smallest box containing every point. Empty input yields [`Aabb::EMPTY`].
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |mut acc, &p| {
            acc.grow(p);
            acc
        })
    }

    /// Expands the box to contain `p`.
    #[inline]
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Returns true if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Half-size along each axis.
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.max - self.min) * 0.5
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// The eight corners, indexed by bit pattern (bit 0 = x, 1 = y, 2 = z).
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }

    /// The twelve box edges as corner-index pairs into [`Aabb::corners`].
    pub const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

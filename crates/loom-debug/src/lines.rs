//! Colored line segments for debug overlays.

use loom_math::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Tether within its limit.
pub const TETHER_COLOR: Vec4 = Vec4::new(0.2, 0.8, 0.2, 1.0);
/// Tether longer than its limit.
pub const TETHER_OVER_LIMIT_COLOR: Vec4 = Vec4::new(1.0, 0.1, 0.1, 1.0);
pub const STRETCH_COLOR: Vec4 = Vec4::new(0.9, 0.9, 0.9, 1.0);
pub const SHEAR_COLOR: Vec4 = Vec4::new(0.9, 0.7, 0.2, 1.0);
pub const BENDING_COLOR: Vec4 = Vec4::new(0.3, 0.5, 1.0, 1.0);
pub const DELTA_COLOR: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);
pub const BOUNDS_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);

const COMPRESSED: Vec4 = Vec4::new(0.0, 0.3, 1.0, 1.0);
const AT_REST: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);
const STRETCHED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// One segment with an RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Vec4,
}

impl DebugLine {
    pub fn new(start: Vec3, end: Vec3, color: Vec4) -> Self {
        Self { start, end, color }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }
}

/// Maps a 0..1 error value to a color: 0 compressed, 0.5 at rest, 1 stretched.
pub fn error_color(error: f32) -> Vec4 {
    let t = error.clamp(0.0, 1.0);
    if t < 0.5 {
        COMPRESSED.lerp(AT_REST, t * 2.0)
    } else {
        AT_REST.lerp(STRETCHED, (t - 0.5) * 2.0)
    }
}

/// A batch of debug segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugLines(pub Vec<DebugLine>);

impl DebugLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: DebugLine) {
        self.0.push(line);
    }

    pub fn append(&mut self, other: &mut DebugLines) {
        self.0.append(&mut other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DebugLine> {
        self.0.iter()
    }

    /// Interleaved `[x, y, z, r, g, b, a]` per endpoint, two endpoints per
    /// line, ready for a line-list vertex buffer.
    pub fn to_vertex_data(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.0.len() * 14);
        for line in &self.0 {
            for p in [line.start, line.end] {
                out.extend_from_slice(&p.to_array());
                out.extend_from_slice(&line.color.to_array());
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a DebugLines {
    type Item = &'a DebugLine;
    type IntoIter = std::slice::Iter<'a, DebugLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<DebugLine> for DebugLines {
    fn extend<I: IntoIterator<Item = DebugLine>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<DebugLine> for DebugLines {
    fn from_iter<I: IntoIterator<Item = DebugLine>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Analytical sphere collision.
//!
//! Particles inside a sphere are projected to its surface. Friction is
//! applied through the Verlet previous position: the tangential part of the
//! implicit velocity is scaled down by the cloth's friction coefficient.

use loom_math::Vec3;
use serde::{Deserialize, Serialize};

/// Sphere in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Pushes penetrating free particles to the surface.
    ///
    /// Returns the number of particles corrected.
    pub fn resolve(
        &self,
        positions: &mut [Vec3],
        prev_positions: &mut [Vec3],
        inv_masses: &[f32],
        friction: f32,
    ) -> u32 {
        let mut resolved = 0;
        let r2 = self.radius * self.radius;

        for i in 0..positions.len() {
            if inv_masses[i] == 0.0 {
                continue;
            }
            let offset = positions[i] - self.center;
            let dist2 = offset.length_squared();
            if dist2 >= r2 {
                continue;
            }

            let normal = if dist2 > 1e-12 {
                offset / dist2.sqrt()
            } else {
                // Exactly at the center: push up.
                Vec3::Y
            };
            positions[i] = self.center + normal * self.radius;

            let velocity = positions[i] - prev_positions[i];
            let tangential = velocity - normal * velocity.dot(normal);
            prev_positions[i] += tangential * friction;

            resolved += 1;
        }

        resolved
    }
}

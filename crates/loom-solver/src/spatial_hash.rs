//! Spatial hash broad phase for particle self-collision.
//!
//! Bins particles into a uniform grid. Candidate pairs come from the same
//! or adjacent cells, so any two particles closer than the cell size are
//! reported.

use std::collections::HashMap;

use loom_math::Vec3;

/// Uniform-grid particle hash.
///
/// Cell size should be at least the collision distance.
pub struct SpatialHash {
    inv_cell_size: f32,
    grid: HashMap<(i32, i32, i32), Vec<u32>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = cell_size.max(1e-6);
        Self {
            inv_cell_size: 1.0 / cell_size,
            grid: HashMap::new(),
        }
    }

    /// Cell of `p`. Coordinates outside the `i32` range saturate, so far
    /// away or diverged particles collapse into the edge cells.
    fn cell_key(&self, p: Vec3) -> (i32, i32, i32) {
        let c = (p * self.inv_cell_size).floor();
        (c.x as i32, c.y as i32, c.z as i32)
    }

    /// Re-bins every position.
    pub fn rebuild(&mut self, positions: &[Vec3]) {
        self.grid.clear();
        for (i, &p) in positions.iter().enumerate() {
            let key = self.cell_key(p);
            self.grid.entry(key).or_default().push(i as u32);
        }
    }

    /// Candidate pairs `(a, b)` with `a < b`, sorted and without duplicates.
    pub fn candidate_pairs(&self) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();

        for (&cell, particles) in &self.grid {
            for i in 0..particles.len() {
                for j in (i + 1)..particles.len() {
                    pairs.push(ordered(particles[i], particles[j]));
                }
            }

            // Only neighbors with a greater key, so each cell pair is visited once.
            for dx in -1..=1_i32 {
                for dy in -1..=1_i32 {
                    for dz in -1..=1_i32 {
                        let Some(nkey) = offset_cell(cell, dx, dy, dz) else {
                            continue;
                        };
                        if nkey <= cell {
                            continue;
                        }
                        if let Some(neighbors) = self.grid.get(&nkey) {
                            for &a in particles {
                                for &b in neighbors {
                                    pairs.push(ordered(a, b));
                                }
                            }
                        }
                    }
                }
            }
        }

        // HashMap iteration order is unspecified.
        pairs.sort_unstable();
        pairs
    }

    pub fn occupied_cells(&self) -> usize {
        self.grid.len()
    }
}

/// Neighbor cell, or `None` past the edge of the `i32` grid.
fn offset_cell((x, y, z): (i32, i32, i32), dx: i32, dy: i32, dz: i32) -> Option<(i32, i32, i32)> {
    Some((x.checked_add(dx)?, y.checked_add(dy)?, z.checked_add(dz)?))
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

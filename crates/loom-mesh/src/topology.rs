//! Edge adjacency of a cloth mesh.
//!
//! Derived once from the triangle list of a [`ClothMeshDesc`]: unique
//! edges, the triangles on each side of every edge, the bending spans
//! across interior edges, and per-particle neighbor lists.
//!
//! Edges are kept in ascending `(min, max)` order so that cooking is
//! deterministic and merged meshes keep each piece's relative ordering.

use std::collections::BTreeMap;

use crate::mesh::ClothMeshDesc;

/// Edge adjacency of one cloth mesh.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Unique edges as `[min, max]`, sorted.
    pub edges: Vec<[u32; 2]>,
    /// Triangles touching `edges[i]`. One on the border, two inside,
    /// more on non-manifold seams.
    pub edge_triangles: Vec<Vec<u32>>,
    /// One span per edge shared by exactly two triangles.
    pub bending_spans: Vec<BendingSpan>,
    /// Sorted edge neighbors of every particle.
    neighbors: Vec<Vec<u32>>,
}

/// The two triangles hinged on an interior edge.
///
/// A bending constraint joins the wings, the corners opposite the hinge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BendingSpan {
    pub hinge: [u32; 2],
    pub wings: [u32; 2],
    pub triangles: [u32; 2],
}

impl Topology {
    pub fn build(desc: &ClothMeshDesc) -> Self {
        let mut incidence: BTreeMap<[u32; 2], Vec<u32>> = BTreeMap::new();
        for t in 0..desc.triangle_count() {
            let [a, b, c] = desc.triangle(t);
            for [u, v] in [[a, b], [b, c], [c, a]] {
                incidence.entry([u.min(v), u.max(v)]).or_default().push(t as u32);
            }
        }

        let mut neighbors = vec![Vec::new(); desc.particle_count()];
        let mut topology = Self {
            edges: Vec::with_capacity(incidence.len()),
            edge_triangles: Vec::with_capacity(incidence.len()),
            ..Default::default()
        };
        for (hinge, triangles) in incidence {
            let [u, v] = hinge;
            neighbors[u as usize].push(v);
            neighbors[v as usize].push(u);
            if let [ta, tb] = triangles[..] {
                topology.bending_spans.push(BendingSpan {
                    hinge,
                    wings: [opposite(desc, ta, hinge), opposite(desc, tb, hinge)],
                    triangles: [ta, tb],
                });
            }
            topology.edges.push(hinge);
            topology.edge_triangles.push(triangles);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        topology.neighbors = neighbors;
        topology
    }

    /// Particles sharing an edge with `particle`.
    pub fn neighbors(&self, particle: u32) -> &[u32] {
        self.neighbors
            .get(particle as usize)
            .map_or(&[], Vec::as_slice)
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edge_triangles.iter().filter(|t| t.len() == 1).count()
    }

    /// True when every edge has a triangle on both sides.
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count() == 0
    }

    /// Labels every particle with the index of its connected piece.
    /// Pieces are numbered by their lowest particle.
    pub fn components(&self) -> Vec<u32> {
        let mut label = vec![u32::MAX; self.neighbors.len()];
        let mut next = 0;
        let mut stack = Vec::new();
        for seed in 0..self.neighbors.len() {
            if label[seed] != u32::MAX {
                continue;
            }
            label[seed] = next;
            stack.push(seed as u32);
            while let Some(p) = stack.pop() {
                for &q in self.neighbors(p) {
                    if label[q as usize] == u32::MAX {
                        label[q as usize] = next;
                        stack.push(q);
                    }
                }
            }
            next += 1;
        }
        label
    }

    pub fn component_count(&self) -> usize {
        self.components().iter().max().map_or(0, |&m| m as usize + 1)
    }
}

/// Corner of triangle `tri` not on `hinge`.
fn opposite(desc: &ClothMeshDesc, tri: u32, hinge: [u32; 2]) -> u32 {
    desc.triangle(tri as usize)
        .into_iter()
        .find(|v| !hinge.contains(v))
        .unwrap_or(hinge[0])
}

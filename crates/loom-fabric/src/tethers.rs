//! Tether generation.
//!
//! Every particle gets at most one tether to a pinned anchor (zero inverse
//! mass). Anchors are only looked up inside the particle's own connected
//! piece, so merged meshes never tether across pieces. A pinned particle
//! tethers to itself with zero length; a particle whose piece has no
//! anchor gets no tether.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use loom_math::Vec3;

use crate::fabric::Tether;

/// Straight-line tethers to the nearest anchor of the same piece.
/// `pieces` labels each particle with its connected piece.
pub fn euclidean_tethers(positions: &[Vec3], inv_masses: &[f32], pieces: &[u32]) -> Vec<Tether> {
    let n = positions.len();
    let anchors: Vec<u32> = (0..n as u32).filter(|&i| inv_masses[i as usize] == 0.0).collect();
    if anchors.is_empty() {
        return Vec::new();
    }

    let mut tethers = Vec::new();
    for i in 0..n {
        if inv_masses[i] == 0.0 {
            tethers.push(Tether {
                particle: i as u32,
                anchor: i as u32,
                rest_length: 0.0,
            });
            continue;
        }
        let nearest = anchors
            .iter()
            .filter(|&&a| pieces[a as usize] == pieces[i])
            .map(|&a| (a, positions[i].distance(positions[a as usize])))
            .min_by(|x, y| x.1.total_cmp(&y.1));
        if let Some((anchor, rest_length)) = nearest {
            tethers.push(Tether {
                particle: i as u32,
                anchor,
                rest_length,
            });
        }
    }
    tethers
}

/// Tethers whose rest length is the shortest path to an anchor along
/// `edges`, weighted by rest distance.
pub fn geodesic_tethers(positions: &[Vec3], inv_masses: &[f32], edges: &[[u32; 2]]) -> Vec<Tether> {
    let n = positions.len();
    let mut adjacency: Vec<Vec<(u32, f32)>> = vec![Vec::new(); n];
    for &[a, b] in edges {
        let len = positions[a as usize].distance(positions[b as usize]);
        adjacency[a as usize].push((b, len));
        adjacency[b as usize].push((a, len));
    }

    // Multi-source Dijkstra: every anchor starts at distance zero.
    let mut dist = vec![f32::INFINITY; n];
    let mut source = vec![u32::MAX; n];
    let mut heap = BinaryHeap::new();
    for i in 0..n {
        if inv_masses[i] == 0.0 {
            dist[i] = 0.0;
            source[i] = i as u32;
            heap.push(Frontier { dist: 0.0, node: i as u32 });
        }
    }
    if heap.is_empty() {
        return Vec::new();
    }

    while let Some(Frontier { dist: d, node }) = heap.pop() {
        if d > dist[node as usize] {
            continue;
        }
        for &(next, len) in &adjacency[node as usize] {
            let candidate = d + len;
            if candidate < dist[next as usize] {
                dist[next as usize] = candidate;
                source[next as usize] = source[node as usize];
                heap.push(Frontier {
                    dist: candidate,
                    node: next,
                });
            }
        }
    }

    (0..n)
        .filter(|&i| source[i] != u32::MAX)
        .map(|i| Tether {
            particle: i as u32,
            anchor: source[i],
            rest_length: dist[i],
        })
        .collect()
}

/// Min-heap entry (reversed ordering on distance, ties by node).
#[derive(Debug, Clone, Copy)]
struct Frontier {
    dist: f32,
    node: u32,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

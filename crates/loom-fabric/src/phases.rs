//! Greedy coloring of distance constraints into independent sets.
//!
//! Two constraints conflict when they share a particle. Each color class is
//! a set of constraints that touch disjoint particles, so a whole class can
//! be projected in one sweep without write conflicts.

/// Partitions constraint pairs into colors.
pub struct PhaseColoring;

impl PhaseColoring {
    /// Colors `pairs` and returns, per color, the indices of the pairs it
    /// holds. Pairs are visited in input order, so the output is
    /// deterministic. Colors appear in ascending order and no pair index is
    /// repeated.
    pub fn color(pairs: &[[u32; 2]], particle_count: usize) -> Vec<Vec<usize>> {
        if pairs.is_empty() {
            return Vec::new();
        }

        // Colors already used at each particle, as a growable bitset.
        let mut used: Vec<Vec<u64>> = vec![Vec::new(); particle_count];
        let mut classes: Vec<Vec<usize>> = Vec::new();

        for (pi, &[a, b]) in pairs.iter().enumerate() {
            let color = first_free(&used[a as usize], &used[b as usize]);
            mark(&mut used[a as usize], color);
            mark(&mut used[b as usize], color);

            if color == classes.len() {
                classes.push(Vec::new());
            }
            classes[color].push(pi);
        }

        classes
    }

    /// Checks that no two pairs in any class share a particle.
    pub fn is_independent(pairs: &[[u32; 2]], classes: &[Vec<usize>]) -> bool {
        classes.iter().all(|class| {
            let mut seen = std::collections::HashSet::new();
            class.iter().all(|&pi| {
                let [a, b] = pairs[pi];
                seen.insert(a) && seen.insert(b)
            })
        })
    }
}

fn first_free(a: &[u64], b: &[u64]) -> usize {
    let words = a.len().max(b.len());
    for w in 0..words {
        let taken = a.get(w).copied().unwrap_or(0) | b.get(w).copied().unwrap_or(0);
        if taken != u64::MAX {
            return w * 64 + (!taken).trailing_zeros() as usize;
        }
    }
    words * 64
}

fn mark(bits: &mut Vec<u64>, color: usize) {
    let word = color / 64;
    if bits.len() <= word {
        bits.resize(word + 1, 0);
    }
    bits[word] |= 1u64 << (color % 64);
}

//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of particle indices
//! with phase indices or cloth keys.

use serde::{Deserialize, Serialize};

/// Index into the particle arrays of a fabric or cloth instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

/// Index into the ordered phase list of a fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhaseId(pub u32);

/// Key under which a solver stores one cloth instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClothId(pub u64);

impl ParticleId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PhaseId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ParticleId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for PhaseId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u64> for ClothId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

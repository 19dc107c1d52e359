//! Registry keys.
//!
//! Every registry is a [`slotmap::SlotMap`]. Removing an entry bumps the
//! slot version, so a key kept after `untrack_*` never resolves to a
//! later entry stored in the same slot.

use loom_types::{ClothId, LoomError};
use slotmap::Key;

slotmap::new_key_type! {
    /// Key of a tracked fabric.
    pub struct FabricKey;

    /// Key of a tracked solver.
    pub struct SolverKey;

    /// Key of a tracked cloth actor.
    pub struct ActorKey;
}

/// Conversions shared by the three registry keys.
pub trait RegistryKey: Key {
    /// Packed `u64` form carried by telemetry events and errors.
    fn to_bits(self) -> u64 {
        self.data().as_ffi()
    }

    /// Error reported when this key does not resolve.
    fn unknown(self, kind: &'static str) -> LoomError {
        LoomError::UnknownKey {
            kind,
            key: format!("{self:?}"),
        }
    }
}

impl<K: Key> RegistryKey for K {}

impl ActorKey {
    /// Id under which the actor's instance is stored in its solver.
    pub fn cloth_id(self) -> ClothId {
        ClothId(self.to_bits())
    }
}

//! State hashing for determinism verification.
//!
//! Two hordes driven by the same seed and the same inputs must produce the
//! same hash after every tick. Floats are hashed by bit pattern.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::entity::Spawn;
use crate::store::SpawnStore;

/// Computes a deterministic hash of the store contents.
///
/// This hash includes, per record in index order:
/// - Id, archetype, level
/// - Position and facing
/// - Current health, flags and both timers
///
/// Grid layout is not hashed; it is derived from positions.
#[must_use]
pub fn hash_store(store: &SpawnStore) -> u64 {
    let mut hasher = DefaultHasher::new();
    store.len().hash(&mut hasher);
    for spawn in store.iter() {
        hash_spawn(spawn, &mut hasher);
    }
    hasher.finish()
}

fn hash_spawn<H: Hasher>(spawn: &Spawn, hasher: &mut H) {
    spawn.id().hash(hasher);
    spawn.kind().hash(hasher);
    spawn.level().hash(hasher);
    spawn.position().x.to_bits().hash(hasher);
    spawn.position().y.to_bits().hash(hasher);
    spawn.facing().hash(hasher);
    spawn.health_current().to_bits().hash(hasher);
    spawn.flags().bits().hash(hasher);
    spawn.cooldown().to_bits().hash(hasher);
    spawn.death_timer().to_bits().hash(hasher);
}

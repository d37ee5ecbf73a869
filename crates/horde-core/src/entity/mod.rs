//! Spawn records and their identifiers.
//!
//! This module provides the core entity types for the population engine:
//! - [`SpawnId`]: Stable, externally visible identifier
//! - [`SpawnHandle`]: Index + generation pair stored in the spatial grid
//! - [`StatusFlags`]: Lifecycle flags (alive, damagable, dying, removable)
//! - [`Spawn`]: The complete record of one hostile NPC
//!
//! # Identity
//!
//! A spawn's position in the store's dense array changes whenever the store
//! compacts, so nothing outside the store holds indices. External code keeps
//! [`SpawnId`]s; the spatial grid keeps [`SpawnHandle`]s whose generation is
//! checked on every resolve.
//!
//! # Example
//!
//! ```
//! use horde_core::entity::{SpawnHandle, SpawnId};
//!
//! let id = SpawnId::new(42);
//! assert_eq!(id.as_u64(), 42);
//!
//! let handle = SpawnHandle::new(3, 1);
//! assert_eq!(handle.index(), 3);
//! assert_eq!(handle.generation(), 1);
//! ```

pub mod archetype;

use bitflags::bitflags;
use glam::Vec2;
use horde_grid::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use archetype::{
    Archetype, ArchetypeTable, ItemKind, LootEntry, QuantityFormula, SpawnKind,
};

/// Unique identifier for a spawn.
///
/// Ids are assigned monotonically by the store and never reused within a
/// session, so a stale id can only ever resolve to nothing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpawnId(u64);

impl SpawnId {
    /// Creates a new `SpawnId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpawnId({})", self.0)
    }
}

impl fmt::Display for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SpawnId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<SpawnId> for u64 {
    fn from(id: SpawnId) -> Self {
        id.0
    }
}

/// Slot reference held by the spatial grid.
///
/// The generation is bumped every time a slot's occupant changes, so a handle
/// captured before a compaction no longer resolves afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpawnHandle {
    index: u32,
    generation: u32,
}

impl SpawnHandle {
    /// Creates a handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the store's dense array.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Opaque animation handle owned by the render collaborator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    /// Placeholder used until a presentation attaches a real handle.
    pub const NONE: Self = Self(0);

    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Lifecycle flags for a spawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Seeking the target and able to attack
        const ALIVE = 1 << 0;
        /// Can take damage (cleared during the damage-break window)
        const DAMAGABLE = 1 << 1;
        /// Health reached zero; death presentation running
        const DYING = 1 << 2;
        /// Scheduled for removal in the current compaction pass
        const REMOVABLE = 1 << 3;
    }
}

/// Per-entity state machine position, derived from [`StatusFlags`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnState {
    /// Alive and damagable, moving toward the target
    Seeking,
    /// Alive inside the post-hit invulnerability window
    Cooldown,
    /// Health reached zero; waiting for the death presentation
    Dying,
}

/// Horizontal facing, taken from the sign of the last applied X movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing negative X
    Left,
    /// Facing positive X
    #[default]
    Right,
}

/// One hostile NPC tracked by the store.
///
/// All derived stats (health, damage, speed, collision size, timer lengths)
/// are computed once at spawn time from the archetype table and level curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub(crate) id: SpawnId,
    pub(crate) kind: SpawnKind,
    pub(crate) level: u32,
    pub(crate) scale: f32,
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) speed: f32,
    pub(crate) damage: f32,
    pub(crate) health_current: f32,
    pub(crate) health_max: f32,
    pub(crate) flags: StatusFlags,
    /// Remaining damage-break time while not damagable.
    pub(crate) cooldown: f32,
    /// Length of the hit-reaction animation.
    pub(crate) hit_reaction_secs: f32,
    /// Remaining death presentation time while dying.
    pub(crate) death_timer: f32,
    pub(crate) facing: Facing,
    pub(crate) animation: AnimationHandle,
}

impl Spawn {
    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> SpawnId {
        self.id
    }

    /// Archetype.
    #[must_use]
    pub const fn kind(&self) -> SpawnKind {
        self.kind
    }

    /// Level used for stat and loot curves.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Size multiplier applied to the sprite extent and stats.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// World position (center of the collision rectangle).
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Contact damage dealt to the player per tick of overlap.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Collision rectangle: scaled sprite extent centered on the position.
    #[must_use]
    pub fn collision(&self) -> Rect {
        Rect::from_center_size(self.position, self.size)
    }

    /// Current health. Zero once dying.
    #[must_use]
    pub const fn health_current(&self) -> f32 {
        self.health_current
    }

    /// Health at spawn time.
    #[must_use]
    pub const fn health_max(&self) -> f32 {
        self.health_max
    }

    /// Raw lifecycle flags.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Remaining damage-break time.
    #[must_use]
    pub const fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Remaining death presentation time.
    #[must_use]
    pub const fn death_timer(&self) -> f32 {
        self.death_timer
    }

    /// Horizontal facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Animation handle issued by the presentation collaborator.
    #[must_use]
    pub const fn animation(&self) -> AnimationHandle {
        self.animation
    }

    /// Alive and not dying.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.flags.contains(StatusFlags::ALIVE)
    }

    /// Can currently take damage.
    #[must_use]
    pub fn is_damagable(&self) -> bool {
        self.flags.contains(StatusFlags::DAMAGABLE)
    }

    /// Health reached zero.
    #[must_use]
    pub fn is_dying(&self) -> bool {
        self.flags.contains(StatusFlags::DYING)
    }

    /// Projects the flags onto the per-entity state machine.
    #[must_use]
    pub fn state(&self) -> SpawnState {
        if self.is_dying() {
            SpawnState::Dying
        } else if self.is_damagable() {
            SpawnState::Seeking
        } else {
            SpawnState::Cooldown
        }
    }

    /// Enters the dying state. Returns false if already dying.
    pub(crate) fn begin_dying(&mut self, death_secs: f32) -> bool {
        if self.is_dying() {
            return false;
        }
        self.health_current = 0.0;
        self.flags.remove(StatusFlags::ALIVE | StatusFlags::DAMAGABLE);
        self.flags.insert(StatusFlags::DYING);
        self.cooldown = 0.0;
        self.death_timer = death_secs;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spawn() -> Spawn {
        Spawn {
            id: SpawnId::new(1),
            kind: SpawnKind::Skeleton,
            level: 1,
            scale: 1.0,
            position: Vec2::new(10.0, 20.0),
            size: Vec2::new(4.0, 8.0),
            speed: 50.0,
            damage: 5.0,
            health_current: 30.0,
            health_max: 30.0,
            flags: StatusFlags::ALIVE | StatusFlags::DAMAGABLE,
            cooldown: 0.0,
            hit_reaction_secs: 0.3,
            death_timer: 0.0,
            facing: Facing::Right,
            animation: AnimationHandle::NONE,
        }
    }

    mod spawn_id_tests {
        use super::*;

        #[test]
        fn ids_order_numerically() {
            assert!(SpawnId::new(1) < SpawnId::new(2));
            assert_eq!(u64::from(SpawnId::from(9)), 9);
        }

        #[test]
        fn debug_and_display() {
            let id = SpawnId::new(7);
            assert_eq!(format!("{id:?}"), "SpawnId(7)");
            assert_eq!(id.to_string(), "7");
        }
    }

    mod spawn_tests {
        use super::*;

        #[test]
        fn collision_is_centered() {
            let spawn = sample_spawn();
            let rect = spawn.collision();
            assert_eq!(rect.center(), spawn.position());
            assert_eq!(rect.size(), Vec2::new(4.0, 8.0));
        }

        #[test]
        fn state_follows_flags() {
            let mut spawn = sample_spawn();
            assert_eq!(spawn.state(), SpawnState::Seeking);

            spawn.flags.remove(StatusFlags::DAMAGABLE);
            assert_eq!(spawn.state(), SpawnState::Cooldown);

            assert!(spawn.begin_dying(1.5));
            assert_eq!(spawn.state(), SpawnState::Dying);
            assert!(!spawn.is_live());
            assert!(!spawn.is_damagable());
            assert_eq!(spawn.death_timer(), 1.5);
            assert_eq!(spawn.health_current(), 0.0);
        }

        #[test]
        fn begin_dying_only_once() {
            let mut spawn = sample_spawn();
            assert!(spawn.begin_dying(1.0));
            spawn.death_timer = 0.25;
            assert!(!spawn.begin_dying(1.0));
            assert_eq!(spawn.death_timer(), 0.25);
        }
    }
}

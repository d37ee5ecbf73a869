//! Per-archetype configuration.
//!
//! Each [`SpawnKind`] maps to one [`Archetype`] entry holding its sprite
//! extent, stat factors, timer lengths, presentation ids and loot table. The
//! table is consulted once at spawn time (and again for loot on death); the
//! update path works on the derived values stored in the record.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Enemy archetype.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    /// Baseline melee walker
    Skeleton,
    /// Slow, durable walker
    Zombie,
    /// Fast, fragile flyer
    Bat,
    /// Heavy hitter
    Ghoul,
    /// Boss variant; drops a single chest instead of rolling loot
    Boss,
}

impl SpawnKind {
    /// Every archetype, in declaration order.
    pub const ALL: [SpawnKind; 5] = [
        Self::Skeleton,
        Self::Zombie,
        Self::Bat,
        Self::Ghoul,
        Self::Boss,
    ];
}

/// Item dropped by a dying spawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Currency
    Coin,
    /// Experience gem
    Gem,
    /// Healing potion
    Potion,
    /// Boss reward
    Chest,
}

/// Quantity of a successful loot roll: `base + per_level * level`, before
/// archetype and scale multipliers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityFormula {
    /// Quantity at level zero
    pub base: f32,
    /// Added per level
    pub per_level: f32,
}

impl QuantityFormula {
    /// Evaluates the formula.
    ///
    /// The result is rounded and never less than one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn evaluate(&self, level: u32, factor: f32, scale: f32) -> u32 {
        let raw = (self.base + self.per_level * level as f32) * factor * scale;
        if raw.is_finite() {
            raw.round().max(1.0) as u32
        } else {
            1
        }
    }
}

/// One independent loot roll.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Item produced on success
    pub item: ItemKind,
    /// Success chance in percent (0..=100)
    pub percent: f32,
    /// Quantity on success
    pub quantity: QuantityFormula,
}

/// Static description of an archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Unscaled sprite extent (width, height) in world units
    pub extent: Vec2,
    /// Base movement speed in world units per second
    pub base_speed: f32,
    /// Multiplier on the health curve
    pub health_factor: f32,
    /// Multiplier on the damage curve
    pub damage_factor: f32,
    /// Multiplier on loot quantities
    pub loot_factor: f32,
    /// Length of the hit-reaction animation; the damage-break window
    pub hit_reaction_secs: f32,
    /// Length of the death presentation
    pub death_secs: f32,
    /// Sprite set passed to the presentation on attach
    pub sprite_set: u32,
    /// Sound group played on death
    pub death_sound_group: u32,
    /// Independent loot rolls
    pub loot: Vec<LootEntry>,
    /// Boss archetypes drop one chest and skip the loot table
    pub boss: bool,
}

impl Archetype {
    fn walker(extent: Vec2, base_speed: f32, health: f32, damage: f32, sprite_set: u32) -> Self {
        Self {
            extent,
            base_speed,
            health_factor: health,
            damage_factor: damage,
            loot_factor: 1.0,
            hit_reaction_secs: 0.3,
            death_secs: 0.8,
            sprite_set,
            death_sound_group: sprite_set,
            loot: vec![
                LootEntry {
                    item: ItemKind::Gem,
                    percent: 60.0,
                    quantity: QuantityFormula {
                        base: 1.0,
                        per_level: 0.25,
                    },
                },
                LootEntry {
                    item: ItemKind::Coin,
                    percent: 25.0,
                    quantity: QuantityFormula {
                        base: 2.0,
                        per_level: 0.5,
                    },
                },
                LootEntry {
                    item: ItemKind::Potion,
                    percent: 2.0,
                    quantity: QuantityFormula {
                        base: 1.0,
                        per_level: 0.0,
                    },
                },
            ],
            boss: false,
        }
    }

    /// Default entry for `kind`.
    #[must_use]
    pub fn default_for(kind: SpawnKind) -> Self {
        match kind {
            SpawnKind::Skeleton => Self::walker(Vec2::new(48.0, 64.0), 70.0, 1.0, 1.0, 1),
            SpawnKind::Zombie => Self {
                hit_reaction_secs: 0.4,
                death_secs: 1.0,
                loot_factor: 1.5,
                ..Self::walker(Vec2::new(56.0, 72.0), 45.0, 1.6, 1.2, 2)
            },
            SpawnKind::Bat => Self {
                hit_reaction_secs: 0.2,
                death_secs: 0.5,
                loot_factor: 0.5,
                ..Self::walker(Vec2::new(40.0, 32.0), 120.0, 0.5, 0.6, 3)
            },
            SpawnKind::Ghoul => Self {
                hit_reaction_secs: 0.35,
                death_secs: 1.2,
                loot_factor: 2.0,
                ..Self::walker(Vec2::new(64.0, 80.0), 60.0, 2.2, 1.5, 4)
            },
            SpawnKind::Boss => Self {
                extent: Vec2::new(160.0, 200.0),
                base_speed: 40.0,
                health_factor: 25.0,
                damage_factor: 3.0,
                loot_factor: 1.0,
                hit_reaction_secs: 0.25,
                death_secs: 2.5,
                sprite_set: 10,
                death_sound_group: 10,
                loot: Vec::new(),
                boss: true,
            },
        }
    }
}

/// Archetype lookup table.
///
/// Backed by a `BTreeMap` so serialization and iteration are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeTable {
    entries: BTreeMap<SpawnKind, Archetype>,
}

impl ArchetypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces an entry, builder style.
    #[must_use]
    pub fn with(mut self, kind: SpawnKind, archetype: Archetype) -> Self {
        self.insert(kind, archetype);
        self
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, kind: SpawnKind, archetype: Archetype) {
        self.entries.insert(kind, archetype);
    }

    /// Looks up an archetype.
    #[must_use]
    pub fn get(&self, kind: SpawnKind) -> Option<&Archetype> {
        self.entries.get(&kind)
    }

    /// Iterates entries in `SpawnKind` order.
    pub fn iter(&self) -> impl Iterator<Item = (SpawnKind, &Archetype)> + '_ {
        self.entries.iter().map(|(kind, archetype)| (*kind, archetype))
    }

    /// Number of configured archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no archetypes are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest unscaled extent on either axis.
    #[must_use]
    pub fn max_extent(&self) -> f32 {
        self.entries
            .values()
            .map(|a| a.extent.max_element())
            .fold(0.0, f32::max)
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        SpawnKind::ALL
            .iter()
            .fold(Self::empty(), |table, kind| {
                table.with(*kind, Archetype::default_for(*kind))
            })
    }
}

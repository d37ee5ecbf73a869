//! Combat resolver for damage requests, cooldowns and death side effects.
//!
//! The `CombatResolver` handles:
//! - Damage requests: a shape plus an amount, applied to every live damagable
//!   spawn whose collision rectangle overlaps the shape
//! - Cooldowns: counting down the post-hit damage break
//! - Standing attacks: one contact-damage event per live spawn per tick
//! - Deaths: loot rolls and the death sound, exactly once per spawn
//!
//! # Ordering
//!
//! Candidates of a damage request are applied in store index order. Loot
//! rolls consume the caller's RNG in death order, then table order, so a
//! fixed seed reproduces the same drops.

use horde_grid::Shape;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HordeConfig;
use crate::entity::{ArchetypeTable, ItemKind, Spawn, SpawnId, StatusFlags};
use crate::event::{EventBus, SpawnEvent};
use crate::presentation::Presentation;
use crate::store::{DamageOutcome, DeathRecord, SpawnStore};

/// An area attack submitted by player or ability code.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    /// Area of effect
    pub shape: Shape,
    /// Damage dealt to each spawn hit
    pub amount: f32,
}

impl DamageRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(shape: impl Into<Shape>, amount: f32) -> Self {
        Self {
            shape: shape.into(),
            amount,
        }
    }
}

/// Summary of one resolved [`DamageRequest`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Spawns that took damage
    pub hits: usize,
    /// Hits that started the dying state
    pub kills: usize,
    /// Overlapping spawns skipped because of their damage break
    pub in_cooldown: usize,
}

impl DamageReport {
    /// Adds another report's counts to this one.
    pub fn merge(&mut self, other: DamageReport) {
        self.hits += other.hits;
        self.kills += other.kills;
        self.in_cooldown += other.in_cooldown;
    }
}

/// Resolver for combat-related mutations and events.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use horde_core::config::HordeConfig;
/// use horde_core::entity::SpawnKind;
/// use horde_core::presentation::Frustum;
/// use horde_core::resolver::{CombatResolver, DamageRequest};
/// use horde_core::store::{SpawnRequest, SpawnStore};
/// use horde_grid::{Circle, Rect};
///
/// let config = HordeConfig::default();
/// let mut store = SpawnStore::new(&config);
/// let frustum = Frustum::new(Rect::from_min_max(Vec2::splat(-10.0), Vec2::splat(10.0)));
/// store
///     .spawn(&SpawnRequest::new(SpawnKind::Bat, Vec2::new(400.0, 0.0)), &frustum)
///     .unwrap();
///
/// let combat = CombatResolver::new(&config);
/// let request = DamageRequest::new(Circle::new(Vec2::new(380.0, 0.0), 30.0), 1.0);
/// let report = combat.resolve_damage_request(&mut store, &request);
/// assert_eq!(report.hits, 1);
/// ```
#[derive(Debug, Clone)]
pub struct CombatResolver {
    archetypes: ArchetypeTable,
    loot_drop_distance: f32,
}

impl CombatResolver {
    /// Creates a resolver using the archetype loot tables of `config`.
    #[must_use]
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            archetypes: config.archetypes.clone(),
            loot_drop_distance: config.loot_drop_distance,
        }
    }

    /// Applies `request` to every live, damagable spawn it overlaps.
    ///
    /// Malformed requests (non-finite amount or shape) hit nothing.
    pub fn resolve_damage_request(
        &self,
        store: &mut SpawnStore,
        request: &DamageRequest,
    ) -> DamageReport {
        let bounds = request.shape.bounds();
        if !(request.amount.is_finite() && bounds.is_valid()) {
            debug!(?request, "ignoring malformed damage request");
            return DamageReport::default();
        }

        let targets = match Self::candidates(store, request) {
            Some(targets) => targets,
            None => {
                store.report_desync("stale handle in region query");
                Self::candidates(store, request).unwrap_or_default()
            }
        };

        let mut report = DamageReport::default();
        for id in targets {
            match store.damage(id, request.amount) {
                DamageOutcome::Applied { killed, .. } => {
                    report.hits += 1;
                    if killed {
                        report.kills += 1;
                    }
                }
                DamageOutcome::InCooldown => report.in_cooldown += 1,
                DamageOutcome::NotFound => {}
            }
        }
        report
    }

    /// Live spawns overlapping the request, in store index order. Returns
    /// `None` if the grid yielded a stale handle.
    fn candidates(store: &SpawnStore, request: &DamageRequest) -> Option<Vec<SpawnId>> {
        let indices = store.indices_near(&request.shape.bounds())?;
        Some(
            indices
                .into_iter()
                .filter_map(|index| store.at(index))
                .filter(|s| s.is_live() && request.shape.overlaps_rect(&s.collision()))
                .map(Spawn::id)
                .collect(),
        )
    }

    /// Counts down damage breaks. Spawns whose break ended become damagable
    /// again and their hit reaction is reset.
    ///
    /// Non-finite or negative `dt` is treated as zero.
    pub fn update_cooldowns(
        &self,
        store: &mut SpawnStore,
        presentation: &mut dyn Presentation,
        dt: f32,
    ) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for spawn in store.records_mut() {
            if spawn.is_dying() || spawn.is_damagable() {
                continue;
            }
            spawn.cooldown -= dt;
            if spawn.cooldown <= 0.0 {
                spawn.cooldown = 0.0;
                spawn.flags.insert(StatusFlags::DAMAGABLE);
                presentation.reset_hit_reaction(spawn.animation);
            }
        }
    }

    /// Publishes one `DamagePlayerIfOverlapping` per live spawn, in index
    /// order. Returns the number of events published.
    pub fn standing_attacks(&self, store: &SpawnStore, bus: &mut EventBus) -> usize {
        let mut attacks = 0;
        for spawn in store.live() {
            bus.publish(&SpawnEvent::DamagePlayerIfOverlapping {
                rect: spawn.collision(),
                damage: spawn.damage(),
            });
            attacks += 1;
        }
        attacks
    }

    /// Runs the death side effects of one spawn: loot, then the death sound.
    ///
    /// Each loot entry is an independent trial. Boss archetypes skip the
    /// table and always drop a single chest. Returns the number of items
    /// dropped.
    pub fn on_death(&self, death: &DeathRecord, rng: &mut ChaCha8Rng, bus: &mut EventBus) -> usize {
        let Some(archetype) = self.archetypes.get(death.kind) else {
            return 0;
        };
        let mut dropped = 0;

        if archetype.boss {
            bus.publish(&self.item_event(death, ItemKind::Chest, 1));
            dropped += 1;
        } else {
            for entry in &archetype.loot {
                let roll: f32 = rng.gen_range(0.0..100.0);
                if roll < entry.percent {
                    let quantity =
                        entry
                            .quantity
                            .evaluate(death.level, archetype.loot_factor, death.scale);
                    bus.publish(&self.item_event(death, entry.item, quantity));
                    dropped += 1;
                }
            }
        }

        bus.publish(&SpawnEvent::PlayDeathSoundGroup {
            group: archetype.death_sound_group,
        });
        debug!(id = %death.id, kind = ?death.kind, dropped, "death side effects");
        dropped
    }

    fn item_event(&self, death: &DeathRecord, item: ItemKind, quantity: u32) -> SpawnEvent {
        SpawnEvent::SpawnItem {
            item,
            world_x: death.position.x,
            world_y: death.position.y,
            drop_start_y: death.collision.min.y,
            drop_end_y: death.position.y + self.loot_drop_distance,
            context: quantity,
        }
    }
}

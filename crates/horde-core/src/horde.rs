//! The population context object and its tick loop.
//!
//! A [`Horde`] owns everything one play session needs: the spawn store (and
//! through it the spatial grid), the resolvers, the outgoing event bus, the
//! presentation collaborator and the seeded RNG. It is constructed explicitly
//! with [`Horde::new`] and consumed by [`Horde::teardown`]; there is no global
//! state.
//!
//! # Tick phases
//!
//! 1. **COOLDOWNS**: count down damage breaks
//! 2. **MOVEMENT**: step every live spawn toward the target, in index order
//! 3. **ATTACKS**: one standing contact attack per live spawn
//! 4. **DAMAGE**: apply queued damage requests in submission order
//! 5. **DEATHS**: loot and death sound for every spawn that started dying
//! 6. **TIMERS**: advance death presentation timers
//! 7. **REMOVAL**: compact finished and off-screen dying spawns, rebuild the grid
//! 8. **CHECK**: debug-build grid consistency check, advance the tick counter
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use horde_core::config::HordeConfig;
//! use horde_core::entity::SpawnKind;
//! use horde_core::horde::Horde;
//! use horde_core::presentation::Frustum;
//! use horde_core::store::SpawnRequest;
//! use horde_grid::Rect;
//!
//! let mut horde = Horde::new(HordeConfig::default(), 42).unwrap();
//! let frustum = Frustum::new(Rect::from_min_max(Vec2::splat(-200.0), Vec2::splat(200.0)));
//!
//! let id = horde
//!     .spawn(&SpawnRequest::new(SpawnKind::Zombie, Vec2::new(600.0, 0.0)), &frustum)
//!     .unwrap();
//!
//! for _ in 0..10 {
//!     horde.tick(Vec2::ZERO, &frustum, 1.0 / 60.0);
//! }
//!
//! assert_eq!(horde.current_tick(), 10);
//! assert!(horde.get(id).unwrap().position().x < 600.0);
//! ```

use std::fmt;

use glam::Vec2;
use horde_grid::Rect;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::HordeConfig;
use crate::entity::{AnimationHandle, Facing, Spawn, SpawnId, SpawnState};
use crate::error::HordeError;
use crate::event::EventBus;
use crate::hash::hash_store;
use crate::presentation::{Frustum, Presentation, TimedPresentation};
use crate::resolver::{CombatResolver, DamageReport, DamageRequest, MovementSolver, StepOutcome};
use crate::store::{DamageOutcome, PopulationStats, SpawnRequest, SpawnStore};

/// Summary of one [`Horde::tick`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number that was executed
    pub tick: u64,
    /// Spawns whose position changed
    pub moved: usize,
    /// Spawns blocked on both axes
    pub blocked: usize,
    /// Standing attack events published
    pub attacks: usize,
    /// Outcome of the queued damage requests
    pub damage: DamageReport,
    /// Deaths whose side effects ran this tick
    pub kills: usize,
    /// Spawns removed by compaction
    pub removed: usize,
}

/// Per-spawn data handed to the render collaborator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderView {
    /// Spawn id
    pub id: SpawnId,
    /// Collision center
    pub position: Vec2,
    /// Horizontal facing
    pub facing: Facing,
    /// Collision rectangle
    pub collision: Rect,
    /// Presentation handle
    pub animation: AnimationHandle,
    /// Lifecycle state
    pub state: SpawnState,
}

impl From<&Spawn> for RenderView {
    fn from(spawn: &Spawn) -> Self {
        Self {
            id: spawn.id(),
            position: spawn.position(),
            facing: spawn.facing(),
            collision: spawn.collision(),
            animation: spawn.animation(),
            state: spawn.state(),
        }
    }
}

/// Population engine context for one play session.
pub struct Horde {
    config: HordeConfig,
    store: SpawnStore,
    movement: MovementSolver,
    combat: CombatResolver,
    bus: EventBus,
    presentation: Box<dyn Presentation>,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
    /// Damage requests waiting for the next tick's damage phase.
    pending_damage: Vec<DamageRequest>,
}

impl fmt::Debug for Horde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Horde")
            .field("store", &self.store)
            .field("bus", &self.bus)
            .field("seed", &self.seed)
            .field("tick", &self.tick)
            .field("pending_damage", &self.pending_damage.len())
            .finish_non_exhaustive()
    }
}

impl Horde {
    /// Creates a context with the headless [`TimedPresentation`].
    ///
    /// # Errors
    ///
    /// Returns [`HordeError::Config`] if `config` fails validation.
    pub fn new(config: HordeConfig, seed: u64) -> Result<Self, HordeError> {
        Self::with_presentation(config, seed, Box::new(TimedPresentation::new()))
    }

    /// Creates a context driving a custom presentation collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`HordeError::Config`] if `config` fails validation.
    pub fn with_presentation(
        config: HordeConfig,
        seed: u64,
        presentation: Box<dyn Presentation>,
    ) -> Result<Self, HordeError> {
        config.validate()?;
        info!(
            seed,
            capacity = config.max_spawns,
            cell_size = config.cell_size,
            archetypes = config.archetypes.len(),
            "horde initialized"
        );
        Ok(Self {
            store: SpawnStore::new(&config),
            movement: MovementSolver::new(),
            combat: CombatResolver::new(&config),
            bus: EventBus::new(),
            presentation,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            tick: 0,
            pending_damage: Vec::new(),
            config,
        })
    }

    // -------------------------------------------------------------------------
    // Spawning and damage
    // -------------------------------------------------------------------------

    /// Validates and creates a spawn, attaching its presentation.
    ///
    /// # Errors
    ///
    /// Returns [`HordeError::Spawn`] with the rejection reason.
    pub fn spawn(
        &mut self,
        request: &SpawnRequest,
        frustum: &Frustum,
    ) -> Result<SpawnId, HordeError> {
        let id = self.store.spawn(request, frustum)?;
        self.store.attach_presentation(id, &mut *self.presentation);
        Ok(id)
    }

    /// Damages one spawn immediately. Death side effects run before this
    /// returns.
    pub fn damage(&mut self, id: SpawnId, amount: f32) -> DamageOutcome {
        let outcome = self.store.damage(id, amount);
        self.flush_deaths();
        outcome
    }

    /// Applies an area damage request immediately.
    pub fn resolve_damage_request(&mut self, request: &DamageRequest) -> DamageReport {
        let report = self.combat.resolve_damage_request(&mut self.store, request);
        self.flush_deaths();
        report
    }

    /// Queues an area damage request for the next tick's damage phase.
    pub fn submit_damage(&mut self, request: DamageRequest) {
        self.pending_damage.push(request);
    }

    /// Puts every live spawn into the dying state. Returns how many died.
    pub fn kill_all(&mut self) -> usize {
        let killed = self.store.kill_all();
        self.flush_deaths();
        killed
    }

    /// Runs loot and death sound for every spawn that started dying since the
    /// last flush. Returns the number of deaths processed.
    fn flush_deaths(&mut self) -> usize {
        let deaths = self.store.take_deaths();
        for death in &deaths {
            self.combat.on_death(death, &mut self.rng, &mut self.bus);
        }
        deaths.len()
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advances the population by `dt` seconds toward `target`.
    ///
    /// Non-finite or negative `dt` is treated as zero.
    pub fn tick(&mut self, target: Vec2, frustum: &Frustum, dt: f32) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        // PHASE 1: COOLDOWNS
        self.combat
            .update_cooldowns(&mut self.store, &mut *self.presentation, dt);

        // PHASE 2: MOVEMENT
        let movers: Vec<SpawnId> = self.store.live().map(Spawn::id).collect();
        for id in movers {
            match self.movement.step(&mut self.store, id, target, dt) {
                StepOutcome::Moved { .. } => report.moved += 1,
                StepOutcome::Blocked => report.blocked += 1,
                StepOutcome::Idle | StepOutcome::Inactive | StepOutcome::NotFound => {}
            }
        }

        // PHASE 3: ATTACKS
        report.attacks = self.combat.standing_attacks(&self.store, &mut self.bus);

        // PHASE 4: DAMAGE
        for request in std::mem::take(&mut self.pending_damage) {
            let outcome = self.combat.resolve_damage_request(&mut self.store, &request);
            report.damage.merge(outcome);
        }

        // PHASE 5: DEATHS
        report.kills = self.flush_deaths();

        // PHASE 6: TIMERS
        self.store.advance_death_timers(dt);

        // PHASE 7: REMOVAL
        let removed = self.store.remove_finished(frustum, &*self.presentation);
        for entry in &removed {
            self.presentation.detach(entry.animation);
        }
        report.removed = removed.len();

        // PHASE 8: CHECK
        if cfg!(debug_assertions) {
            self.store.check_grid();
        }
        self.tick += 1;

        debug!(
            tick = report.tick,
            moved = report.moved,
            blocked = report.blocked,
            kills = report.kills,
            removed = report.removed,
            "tick complete"
        );
        report
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Looks up a spawn by id.
    #[must_use]
    pub fn get(&self, id: SpawnId) -> Option<&Spawn> {
        self.store.get(id)
    }

    /// The spawn store.
    #[must_use]
    pub fn store(&self) -> &SpawnStore {
        &self.store
    }

    /// The outgoing event bus, for subscribing handlers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// The configuration this context was built from.
    #[must_use]
    pub fn config(&self) -> &HordeConfig {
        &self.config
    }

    /// Render data for every tracked spawn, in index order.
    pub fn render_view(&self) -> impl Iterator<Item = RenderView> + '_ {
        self.store.iter().map(RenderView::from)
    }

    /// Population counters.
    #[must_use]
    pub fn stats(&self) -> PopulationStats {
        self.store.stats()
    }

    /// Deterministic hash of the tracked spawns.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        hash_store(&self.store)
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Seed of the loot RNG.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of damage requests queued for the next tick.
    #[must_use]
    pub fn pending_damage(&self) -> usize {
        self.pending_damage.len()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Ends the session: releases every presentation handle, drops every
    /// event handler and returns the final counters.
    pub fn teardown(mut self) -> PopulationStats {
        for spawn in self.store.iter() {
            self.presentation.detach(spawn.animation());
        }
        self.bus.clear();
        let stats = self.store.stats();
        info!(
            ticks = self.tick,
            live = stats.live,
            dying = stats.dying,
            spawned_total = stats.spawned_total,
            removed_total = stats.removed_total,
            "horde torn down"
        );
        stats
    }
}

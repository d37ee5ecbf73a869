//! Dense spawn storage with id remapping.
//!
//! The `SpawnStore` is the container for every tracked spawn. It provides:
//! - A dense `Vec` of records iterated in index order
//! - An id→index map so external code only ever holds [`SpawnId`]s
//! - Per-slot generations so grid handles can be validated
//! - The owned [`SpatialGrid`], kept consistent with record positions
//!
//! # Compaction
//!
//! Removal is swap-remove: the removed slot receives the last record, the map
//! entry of that survivor is rewritten and the tail is popped. Indices are
//! therefore only stable between compactions. Every compaction bumps the
//! generation of the slots it touches and rebuilds the grid, so no grid entry
//! outlives the layout it was created for.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use horde_core::config::HordeConfig;
//! use horde_core::entity::SpawnKind;
//! use horde_core::presentation::Frustum;
//! use horde_core::store::{SpawnRequest, SpawnStore};
//! use horde_grid::Rect;
//!
//! let mut store = SpawnStore::new(&HordeConfig::default());
//! let frustum = Frustum::new(Rect::from_min_max(Vec2::splat(-100.0), Vec2::splat(100.0)));
//!
//! let id = store
//!     .spawn(&SpawnRequest::new(SpawnKind::Skeleton, Vec2::new(500.0, 0.0)), &frustum)
//!     .unwrap();
//!
//! assert_eq!(store.get(id).unwrap().position(), Vec2::new(500.0, 0.0));
//! ```

use std::collections::HashMap;

use glam::Vec2;
use horde_grid::{Cell, Rect, SpatialGrid};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{HordeConfig, LevelCurves};
use crate::entity::{
    AnimationHandle, ArchetypeTable, Facing, Spawn, SpawnHandle, SpawnId, SpawnKind, StatusFlags,
};
use crate::error::SpawnRejection;
use crate::presentation::{Frustum, Presentation};

/// Cell count above which a region query degrades to a linear store scan
/// (when the store is smaller than this).
const SCAN_THRESHOLD: usize = 64;

/// Parameters of a spawn request.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Archetype
    pub kind: SpawnKind,
    /// World position (collision center)
    pub position: Vec2,
    /// Level for the stat curves (1-based)
    pub level: u32,
    /// Size and stat multiplier
    pub scale: f32,
}

impl SpawnRequest {
    /// Level 1, scale 1 request.
    #[must_use]
    pub const fn new(kind: SpawnKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            level: 1,
            scale: 1.0,
        }
    }

    /// Sets the level.
    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Sets the scale.
    ///
    /// The scaled extent must still fit in one grid cell, otherwise
    /// [`SpawnStore::spawn`] rejects the request. With the default 256 unit
    /// cells a 200 unit tall boss tops out at scale 1.28.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Result of [`SpawnStore::damage`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DamageOutcome {
    /// Damage was applied.
    Applied {
        /// Health after the hit (zero once dying)
        remaining: f32,
        /// The hit started the dying state
        killed: bool,
    },
    /// The spawn is inside its damage-break window, or already dying.
    InCooldown,
    /// Unknown or stale id. Expected when a spawn was removed earlier.
    NotFound,
}

/// Everything death side effects need, captured when the spawn starts dying.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeathRecord {
    /// Spawn that died
    pub id: SpawnId,
    /// Its archetype
    pub kind: SpawnKind,
    /// Its level
    pub level: u32,
    /// Its scale
    pub scale: f32,
    /// Its position at the moment of death
    pub position: Vec2,
    /// Its collision rectangle at the moment of death
    pub collision: Rect,
}

/// Population counters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Alive, non-dying spawns
    pub live: usize,
    /// Spawns in the dying state
    pub dying: usize,
    /// Successful spawns this session
    pub spawned_total: u64,
    /// Removed spawns this session
    pub removed_total: u64,
}

/// A removed spawn, reported so the caller can release its presentation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Removed {
    /// Id of the removed spawn
    pub id: SpawnId,
    /// Its animation handle
    pub animation: AnimationHandle,
    /// True if it left the visible region before its presentation finished
    pub offscreen: bool,
}

/// Dense spawn container.
#[derive(Debug, Clone)]
pub struct SpawnStore {
    /// Tracked records, live and dying.
    records: Vec<Spawn>,
    /// Generation per slot. Never shrinks, so vacated slots keep their count.
    generations: Vec<u32>,
    /// id → current slot index.
    index_of: HashMap<SpawnId, usize>,
    /// Spatial index over record positions.
    grid: SpatialGrid<SpawnHandle>,
    /// Archetype configuration, consulted at spawn.
    archetypes: ArchetypeTable,
    /// Stat curves, consulted at spawn.
    curves: LevelCurves,
    /// Maximum tracked records.
    capacity: usize,
    /// Monotonically increasing id counter.
    next_id: u64,
    /// Deaths whose side effects have not run yet.
    pending_deaths: Vec<DeathRecord>,
    spawned_total: u64,
    removed_total: u64,
}

impl SpawnStore {
    /// Creates an empty store from a configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.cell_size` is not positive and finite; run
    /// [`HordeConfig::validate`] first.
    #[must_use]
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            records: Vec::new(),
            generations: Vec::new(),
            index_of: HashMap::new(),
            grid: SpatialGrid::with_radius(config.cell_size, config.neighbor_radius),
            archetypes: config.archetypes.clone(),
            curves: config.curves,
            capacity: config.max_spawns,
            next_id: 1,
            pending_deaths: Vec::new(),
            spawned_total: 0,
            removed_total: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Validates and creates a spawn.
    ///
    /// Checks, in order: request sanity, archetype, capacity, that the
    /// collision rectangle is not entirely on screen, and that it does not
    /// overlap any live spawn.
    ///
    /// # Errors
    ///
    /// Returns the first [`SpawnRejection`] that applies. The store is
    /// unchanged on error.
    pub fn spawn(
        &mut self,
        request: &SpawnRequest,
        frustum: &Frustum,
    ) -> Result<SpawnId, SpawnRejection> {
        let result = self.try_spawn(request, frustum);
        match &result {
            Ok(id) => debug!(id = %id, kind = ?request.kind, pos = ?request.position, "spawned"),
            Err(reason) => debug!(
                kind = ?request.kind,
                pos = ?request.position,
                %reason,
                "spawn rejected"
            ),
        }
        result
    }

    fn try_spawn(
        &mut self,
        request: &SpawnRequest,
        frustum: &Frustum,
    ) -> Result<SpawnId, SpawnRejection> {
        if !request.position.is_finite() {
            return Err(SpawnRejection::InvalidRequest("position must be finite"));
        }
        if !(request.scale.is_finite() && request.scale > 0.0) {
            return Err(SpawnRejection::InvalidRequest("scale must be positive"));
        }
        if request.level == 0 {
            return Err(SpawnRejection::InvalidRequest("level starts at 1"));
        }
        let archetype = self
            .archetypes
            .get(request.kind)
            .cloned()
            .ok_or(SpawnRejection::UnknownArchetype(request.kind))?;
        let size = archetype.extent * request.scale;
        if size.max_element() > self.grid.cell_size() {
            return Err(SpawnRejection::InvalidRequest(
                "scaled extent exceeds the grid cell size",
            ));
        }
        if self.records.len() >= self.capacity {
            return Err(SpawnRejection::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let collision = Rect::from_center_size(request.position, size);
        if frustum.contains(&collision) {
            return Err(SpawnRejection::OnScreen);
        }
        if let Some(other) = self.first_live_overlap(&collision) {
            return Err(SpawnRejection::Overlapping { other });
        }

        let scale = request.scale;
        let health_max = self.curves.health.value(request.level) * archetype.health_factor * scale;
        let record = Spawn {
            id: SpawnId::new(self.next_id),
            kind: request.kind,
            level: request.level,
            scale,
            position: request.position,
            size,
            speed: archetype.base_speed * self.curves.speed.value(request.level),
            damage: self.curves.damage.value(request.level) * archetype.damage_factor * scale,
            health_current: health_max,
            health_max,
            flags: StatusFlags::ALIVE | StatusFlags::DAMAGABLE,
            cooldown: 0.0,
            hit_reaction_secs: archetype.hit_reaction_secs,
            death_timer: 0.0,
            facing: Facing::default(),
            animation: AnimationHandle::NONE,
        };
        let id = record.id;
        self.next_id += 1;

        let index = self.records.len();
        self.records.push(record);
        if self.generations.len() <= index {
            self.generations.push(0);
        }
        self.index_of.insert(id, index);
        let handle = self.handle_at(index);
        let cell = self.grid.cell_of(request.position);
        self.grid.insert(handle, cell);
        self.spawned_total += 1;
        Ok(id)
    }

    /// Attaches a presentation handle to a freshly created spawn.
    pub(crate) fn attach_presentation(&mut self, id: SpawnId, presentation: &mut dyn Presentation) {
        let Some(&index) = self.index_of.get(&id) else {
            return;
        };
        let sprite_set = self
            .archetypes
            .get(self.records[index].kind)
            .map_or(0, |a| a.sprite_set);
        self.records[index].animation = presentation.attach(id, sprite_set);
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Returns the record for `id`, or `None` if it is unknown or removed.
    #[must_use]
    pub fn get(&self, id: SpawnId) -> Option<&Spawn> {
        self.index_of.get(&id).map(|&index| &self.records[index])
    }

    /// Current slot index of `id`. Only valid until the next compaction.
    #[must_use]
    pub fn index_of(&self, id: SpawnId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    /// Record at a slot index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Spawn> {
        self.records.get(index)
    }

    /// Resolves a grid handle. Stale handles resolve to `None`.
    #[must_use]
    pub fn resolve(&self, handle: SpawnHandle) -> Option<&Spawn> {
        let index = handle.index();
        if index < self.records.len() && self.generations[index] == handle.generation() {
            Some(&self.records[index])
        } else {
            None
        }
    }

    /// Handle for the record currently at `index`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn handle_at(&self, index: usize) -> SpawnHandle {
        SpawnHandle::new(index as u32, self.generations[index])
    }

    /// Every tracked record in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Spawn> + '_ {
        self.records.iter()
    }

    /// Live, non-dying records in index order.
    pub fn live(&self) -> impl Iterator<Item = &Spawn> + '_ {
        self.records.iter().filter(|s| s.is_live())
    }

    /// Calls `f` for every live record in index order.
    pub fn for_each_live<F: FnMut(&Spawn)>(&self, f: F) {
        self.live().for_each(f);
    }

    /// Ids of every tracked record in index order.
    pub fn ids(&self) -> impl Iterator<Item = SpawnId> + '_ {
        self.records.iter().map(Spawn::id)
    }

    /// Number of tracked records (live and dying).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of tracked records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The spatial grid.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid<SpawnHandle> {
        &self.grid
    }

    /// Archetype configuration.
    #[must_use]
    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    /// Grid cell of a world position.
    #[must_use]
    pub fn cell_of(&self, pos: Vec2) -> Cell {
        self.grid.cell_of(pos)
    }

    /// Population counters.
    #[must_use]
    pub fn stats(&self) -> PopulationStats {
        let dying = self.records.iter().filter(|s| s.is_dying()).count();
        PopulationStats {
            live: self.records.len() - dying,
            dying,
            spawned_total: self.spawned_total,
            removed_total: self.removed_total,
        }
    }

    /// Store indices of every record whose collision rectangle can reach
    /// `region`, in index order. Returns `None` if the grid yielded a stale
    /// handle.
    ///
    /// Records are registered by center and reach at most half a cell out,
    /// so the region is widened by that much before walking cells. Regions
    /// covering more cells than there are records scan the store instead.
    pub(crate) fn indices_near(&self, region: &Rect) -> Option<Vec<usize>> {
        let reach = Vec2::splat(self.grid.cell_size() * 0.5);
        let bounds = Rect::from_min_max(region.min - reach, region.max + reach);
        let lo = self.grid.cell_of(bounds.min);
        let hi = self.grid.cell_of(bounds.max);
        let span =
            (i64::from(hi.x) - i64::from(lo.x) + 1) * (i64::from(hi.y) - i64::from(lo.y) + 1);
        let limit = self.records.len().max(SCAN_THRESHOLD);
        if usize::try_from(span).map_or(true, |cells| cells > limit) {
            return Some((0..self.records.len()).collect());
        }

        let mut indices = Vec::new();
        for handle in self.grid.query_region(bounds) {
            self.resolve(handle)?;
            indices.push(handle.index());
        }
        indices.sort_unstable();
        indices.dedup();
        Some(indices)
    }

    /// First live spawn whose collision rectangle overlaps `rect`.
    fn first_live_overlap(&mut self, rect: &Rect) -> Option<SpawnId> {
        let indices = match self.indices_near(rect) {
            Some(indices) => indices,
            None => {
                self.report_desync("stale handle in overlap query");
                self.indices_near(rect).unwrap_or_default()
            }
        };
        indices
            .into_iter()
            .filter_map(|index| self.records.get(index))
            .find(|s| s.is_live() && s.collision().overlaps(rect))
            .map(Spawn::id)
    }

    // -------------------------------------------------------------------------
    // Damage
    // -------------------------------------------------------------------------

    /// Applies `amount` damage to `id`.
    ///
    /// A non-lethal hit clears `DAMAGABLE` for the archetype's hit-reaction
    /// length. A lethal hit enters the dying state and schedules the death
    /// side effects exactly once; they are drained with
    /// [`SpawnStore::take_deaths`].
    pub fn damage(&mut self, id: SpawnId, amount: f32) -> DamageOutcome {
        let Some(&index) = self.index_of.get(&id) else {
            return DamageOutcome::NotFound;
        };
        let record = &mut self.records[index];
        if !record.is_damagable() {
            return DamageOutcome::InCooldown;
        }

        // NaN and negative amounts deal nothing but still count as a hit
        let amount = amount.max(0.0);
        record.health_current -= amount;
        if record.health_current <= 0.0 {
            self.enter_dying(index);
            return DamageOutcome::Applied {
                remaining: 0.0,
                killed: true,
            };
        }
        record.flags.remove(StatusFlags::DAMAGABLE);
        record.cooldown = record.hit_reaction_secs;
        DamageOutcome::Applied {
            remaining: record.health_current,
            killed: false,
        }
    }

    /// Marks every live record as dying. Returns how many were affected.
    pub fn kill_all(&mut self) -> usize {
        let mut killed = 0;
        for index in 0..self.records.len() {
            if !self.records[index].is_dying() && self.enter_dying(index) {
                killed += 1;
            }
        }
        killed
    }

    fn enter_dying(&mut self, index: usize) -> bool {
        let record = &mut self.records[index];
        let death_secs = self
            .archetypes
            .get(record.kind)
            .map_or(0.0, |a| a.death_secs);
        if !record.begin_dying(death_secs) {
            return false;
        }
        debug!(id = %record.id, kind = ?record.kind, "spawn dying");
        self.pending_deaths.push(DeathRecord {
            id: record.id,
            kind: record.kind,
            level: record.level,
            scale: record.scale,
            position: record.position,
            collision: record.collision(),
        });
        true
    }

    /// Drains deaths whose side effects have not run yet, in death order.
    pub fn take_deaths(&mut self) -> Vec<DeathRecord> {
        std::mem::take(&mut self.pending_deaths)
    }

    /// Number of deaths waiting for side effects.
    #[must_use]
    pub fn pending_deaths(&self) -> usize {
        self.pending_deaths.len()
    }

    // -------------------------------------------------------------------------
    // Timers and movement (crate-internal mutation)
    // -------------------------------------------------------------------------

    /// Mutable access for resolvers. Must not change `position`; use
    /// [`SpawnStore::move_to`] for that.
    pub(crate) fn records_mut(&mut self) -> &mut [Spawn] {
        &mut self.records
    }

    /// Advances every dying record's death timer. Non-finite or negative
    /// `dt` is treated as zero.
    pub fn advance_death_timers(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for record in self.records.iter_mut().filter(|s| s.is_dying()) {
            record.death_timer = (record.death_timer - dt).max(0.0);
        }
    }

    /// Moves the record at `index` and keeps its grid entry in the right cell.
    pub(crate) fn move_to(&mut self, index: usize, position: Vec2, facing: Facing) {
        let old_cell = self.grid.cell_of(self.records[index].position);
        let new_cell = self.grid.cell_of(position);
        let record = &mut self.records[index];
        record.position = position;
        record.facing = facing;
        let handle = self.handle_at(index);
        if !self.grid.relocate(handle, old_cell, new_cell) {
            self.report_desync("relocate source cell did not hold the handle");
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes dying records whose death presentation finished, or that are
    /// no longer visible (those skip the presentation).
    ///
    /// Walks the array from the tail so each swapped-in survivor has already
    /// been examined. Rebuilds the grid if anything was removed.
    pub fn remove_finished(
        &mut self,
        frustum: &Frustum,
        presentation: &dyn Presentation,
    ) -> Vec<Removed> {
        let mut removed = Vec::new();
        for index in (0..self.records.len()).rev() {
            let record = &mut self.records[index];
            if !record.is_dying() {
                continue;
            }
            let offscreen = !frustum.overlaps(&record.collision());
            if !offscreen && !presentation.death_finished(record.animation, record) {
                continue;
            }
            record.flags.insert(StatusFlags::REMOVABLE);
            let gone = self.swap_remove(index);
            debug!(id = %gone.id, offscreen, "spawn removed");
            removed.push(Removed {
                id: gone.id,
                animation: gone.animation,
                offscreen,
            });
        }
        if !removed.is_empty() {
            self.rebuild_grid();
        }
        removed
    }

    fn swap_remove(&mut self, index: usize) -> Spawn {
        let last = self.records.len() - 1;
        let gone = self.records.swap_remove(index);
        self.index_of.remove(&gone.id);
        // The vacated tail slot and the refilled slot both change occupant
        self.generations[last] = self.generations[last].wrapping_add(1);
        if index != last {
            self.generations[index] = self.generations[index].wrapping_add(1);
            let survivor = self.records[index].id;
            self.index_of.insert(survivor, index);
        }
        self.removed_total += 1;
        gone
    }

    // -------------------------------------------------------------------------
    // Grid consistency
    // -------------------------------------------------------------------------

    /// Repopulates the grid from current record positions.
    pub fn rebuild_grid(&mut self) {
        let entries: Vec<(SpawnHandle, Vec2)> = (0..self.records.len())
            .map(|index| (self.handle_at(index), self.records[index].position))
            .collect();
        self.grid.rebuild(entries);
    }

    /// True if every record has exactly one grid entry, in the cell of its
    /// current position, carrying its current generation.
    #[must_use]
    pub fn grid_consistent(&self) -> bool {
        self.grid.len() == self.records.len()
            && self.records.iter().enumerate().all(|(index, record)| {
                self.grid
                    .contains(self.handle_at(index), self.grid.cell_of(record.position))
            })
    }

    /// Flags a grid/store desync. Debug builds assert; release builds log and
    /// rebuild so queries are correct again from the next call on.
    pub(crate) fn report_desync(&mut self, reason: &'static str) {
        debug_assert!(false, "spatial grid out of sync with store: {reason}");
        warn!(reason, "spatial grid out of sync with store, rebuilding");
        self.rebuild_grid();
    }

    /// Checks consistency and repairs if needed. Returns false if a repair ran.
    pub fn check_grid(&mut self) -> bool {
        if self.grid_consistent() {
            true
        } else {
            self.report_desync("consistency check failed");
            false
        }
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut SpatialGrid<SpawnHandle> {
        &mut self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::TimedPresentation;
    use crate::tests::helpers::{offscreen_frustum, test_store, wide_frustum};

    fn request(x: f32, y: f32) -> SpawnRequest {
        SpawnRequest::new(SpawnKind::Skeleton, Vec2::new(x, y))
    }

    mod spawn_tests {
        use super::*;

        #[test]
        fn ids_are_sequential_and_resolvable() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let a = store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            let b = store.spawn(&request(300.0, 0.0), &frustum).unwrap();

            assert_eq!(a, SpawnId::new(1));
            assert_eq!(b, SpawnId::new(2));
            assert_eq!(store.len(), 2);
            assert_eq!(store.get(b).unwrap().position(), Vec2::new(300.0, 0.0));
            assert!(store.grid_consistent());
        }

        #[test]
        fn derived_stats_follow_curves() {
            let mut store = test_store();
            let id = store
                .spawn(&request(0.0, 0.0).with_level(3).with_scale(2.0), &offscreen_frustum())
                .unwrap();
            let spawn = store.get(id).unwrap();
            let curves = LevelCurves::default();

            assert!((spawn.health_max() - curves.health.value(3) * 2.0).abs() < 1e-4);
            assert_eq!(spawn.health_current(), spawn.health_max());
            assert!((spawn.damage() - curves.damage.value(3) * 2.0).abs() < 1e-4);
            assert!((spawn.speed() - 70.0 * curves.speed.value(3)).abs() < 1e-4);
            assert_eq!(spawn.collision().size(), Vec2::new(96.0, 128.0));
        }

        #[test]
        fn rejects_overlap_with_live_spawn() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let first = store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            let err = store.spawn(&request(10.0, 10.0), &frustum).unwrap_err();
            assert_eq!(err, SpawnRejection::Overlapping { other: first });
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn overlap_check_crosses_cell_boundary() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let first = store.spawn(&request(250.0, 0.0), &frustum).unwrap();
            let err = store.spawn(&request(262.0, 0.0), &frustum).unwrap_err();
            assert_eq!(err, SpawnRejection::Overlapping { other: first });
        }

        #[test]
        fn dying_spawn_does_not_block() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let first = store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            store.kill_all();
            assert!(store.get(first).unwrap().is_dying());
            assert!(store.spawn(&request(0.0, 0.0), &frustum).is_ok());
        }

        #[test]
        fn rejects_fully_visible_spawn() {
            let mut store = test_store();
            let err = store.spawn(&request(0.0, 0.0), &wide_frustum()).unwrap_err();
            assert_eq!(err, SpawnRejection::OnScreen);
        }

        #[test]
        fn accepts_partially_visible_spawn() {
            let mut store = test_store();
            // wide_frustum spans -1000..1000; this rect straddles its right edge
            assert!(store.spawn(&request(1000.0, 0.0), &wide_frustum()).is_ok());
        }

        #[test]
        fn rejects_unknown_archetype() {
            let config = HordeConfig::default().with_archetypes(
                ArchetypeTable::empty().with(
                    SpawnKind::Bat,
                    crate::entity::Archetype::default_for(SpawnKind::Bat),
                ),
            );
            let mut store = SpawnStore::new(&config);
            let err = store.spawn(&request(0.0, 0.0), &offscreen_frustum()).unwrap_err();
            assert_eq!(err, SpawnRejection::UnknownArchetype(SpawnKind::Skeleton));
        }

        #[test]
        fn rejects_beyond_capacity() {
            let mut store = SpawnStore::new(&HordeConfig::with_capacity(2));
            let frustum = offscreen_frustum();
            store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            store.spawn(&request(500.0, 0.0), &frustum).unwrap();
            let err = store.spawn(&request(1000.0, 0.0), &frustum).unwrap_err();
            assert_eq!(err, SpawnRejection::CapacityExceeded { capacity: 2 });
        }

        #[test]
        fn rejects_malformed_requests() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            assert!(matches!(
                store.spawn(&request(f32::NAN, 0.0), &frustum),
                Err(SpawnRejection::InvalidRequest(_))
            ));
            assert!(matches!(
                store.spawn(&request(0.0, 0.0).with_scale(0.0), &frustum),
                Err(SpawnRejection::InvalidRequest(_))
            ));
            assert!(matches!(
                store.spawn(&request(0.0, 0.0).with_level(0), &frustum),
                Err(SpawnRejection::InvalidRequest(_))
            ));
            assert!(matches!(
                store.spawn(&request(0.0, 0.0).with_scale(10.0), &frustum),
                Err(SpawnRejection::InvalidRequest(_))
            ));
            assert!(store.is_empty());
        }

        #[test]
        fn boss_scale_capped_by_cell_size() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let boss = |x: f32, scale: f32| {
                SpawnRequest::new(SpawnKind::Boss, Vec2::new(x, 0.0)).with_scale(scale)
            };

            assert!(store.spawn(&boss(0.0, 1.25), &frustum).is_ok());
            assert!(matches!(
                store.spawn(&boss(1_000.0, 1.3), &frustum),
                Err(SpawnRejection::InvalidRequest(_))
            ));
        }
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn damage_decrements_and_starts_cooldown() {
            let mut store = test_store();
            let id = store.spawn(&request(0.0, 0.0), &offscreen_frustum()).unwrap();
            let max = store.get(id).unwrap().health_max();

            let outcome = store.damage(id, 5.0);
            assert_eq!(
                outcome,
                DamageOutcome::Applied {
                    remaining: max - 5.0,
                    killed: false
                }
            );
            let spawn = store.get(id).unwrap();
            assert!(!spawn.is_damagable());
            assert_eq!(spawn.cooldown(), 0.3);
        }

        #[test]
        fn second_hit_during_cooldown_is_ignored() {
            let mut store = test_store();
            let id = store.spawn(&request(0.0, 0.0), &offscreen_frustum()).unwrap();
            store.damage(id, 5.0);
            let health = store.get(id).unwrap().health_current();

            assert_eq!(store.damage(id, 5.0), DamageOutcome::InCooldown);
            assert_eq!(store.get(id).unwrap().health_current(), health);
        }

        #[test]
        fn lethal_damage_schedules_death_once() {
            let mut store = test_store();
            let id = store.spawn(&request(0.0, 0.0), &offscreen_frustum()).unwrap();
            let max = store.get(id).unwrap().health_max();

            assert_eq!(
                store.damage(id, max),
                DamageOutcome::Applied {
                    remaining: 0.0,
                    killed: true
                }
            );
            assert_eq!(store.damage(id, max), DamageOutcome::InCooldown);
            assert_eq!(store.kill_all(), 0);

            let deaths = store.take_deaths();
            assert_eq!(deaths.len(), 1);
            assert_eq!(deaths[0].id, id);
            assert!(store.take_deaths().is_empty());
            assert_eq!(store.get(id).unwrap().death_timer(), 0.8);
        }

        #[test]
        fn unknown_id_is_not_found() {
            let mut store = test_store();
            assert_eq!(store.damage(SpawnId::new(99), 1.0), DamageOutcome::NotFound);
        }

        #[test]
        fn negative_amount_deals_nothing() {
            let mut store = test_store();
            let id = store.spawn(&request(0.0, 0.0), &offscreen_frustum()).unwrap();
            let max = store.get(id).unwrap().health_max();
            assert_eq!(
                store.damage(id, -50.0),
                DamageOutcome::Applied {
                    remaining: max,
                    killed: false
                }
            );
        }
    }

    mod removal_tests {
        use super::*;

        fn spawn_row(store: &mut SpawnStore, count: usize) -> Vec<SpawnId> {
            let frustum = offscreen_frustum();
            (0..count)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let x = i as f32 * 100.0;
                    store.spawn(&request(x, 0.0), &frustum).unwrap()
                })
                .collect()
        }

        #[test]
        fn removal_waits_for_presentation_while_visible() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 3);
            let presentation = TimedPresentation::new();
            store.kill_all();

            assert!(store.remove_finished(&wide_frustum(), &presentation).is_empty());
            store.advance_death_timers(0.5);
            assert!(store.remove_finished(&wide_frustum(), &presentation).is_empty());
            store.advance_death_timers(0.5);
            let removed = store.remove_finished(&wide_frustum(), &presentation);
            assert_eq!(removed.len(), 3);
            assert!(removed.iter().all(|r| !r.offscreen));
            assert!(store.is_empty());
            assert!(ids.iter().all(|id| store.get(*id).is_none()));
        }

        #[test]
        fn offscreen_dying_spawn_removed_immediately() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 2);
            store.damage(ids[0], 1_000.0);

            let removed = store.remove_finished(&offscreen_frustum(), &TimedPresentation::new());
            assert_eq!(removed.len(), 1);
            assert_eq!(removed[0].id, ids[0]);
            assert!(removed[0].offscreen);
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn bad_dt_leaves_death_timer_untouched() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 1);
            store.damage(ids[0], 1_000.0);
            let before = store.get(ids[0]).unwrap().death_timer();

            store.advance_death_timers(f32::NAN);
            store.advance_death_timers(-1.0);

            assert_eq!(store.get(ids[0]).unwrap().death_timer(), before);
            assert!(store.get(ids[0]).unwrap().is_dying());
        }

        #[test]
        fn swap_remove_remaps_survivor() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 4);
            let last_before = store.get(ids[3]).unwrap().clone();
            store.damage(ids[0], 1_000.0);

            store.remove_finished(&offscreen_frustum(), &TimedPresentation::new());

            assert_eq!(store.index_of(ids[3]), Some(0));
            assert_eq!(store.get(ids[3]).unwrap(), &last_before);
            assert_eq!(store.stats().removed_total, 1);
            assert!(store.grid_consistent());
        }

        #[test]
        fn stale_handles_stop_resolving() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 3);
            let old_first = store.handle_at(0);
            let old_last = store.handle_at(2);
            store.damage(ids[0], 1_000.0);

            store.remove_finished(&offscreen_frustum(), &TimedPresentation::new());

            assert!(store.resolve(old_first).is_none());
            assert!(store.resolve(old_last).is_none());
            assert_eq!(store.resolve(store.handle_at(0)).unwrap().id(), ids[2]);
        }

        #[test]
        fn reused_slot_gets_new_generation() {
            let mut store = test_store();
            let ids = spawn_row(&mut store, 2);
            let old_tail = store.handle_at(1);
            store.damage(ids[1], 1_000.0);
            store.remove_finished(&offscreen_frustum(), &TimedPresentation::new());

            store.spawn(&request(900.0, 0.0), &offscreen_frustum()).unwrap();
            assert_ne!(store.handle_at(1), old_tail);
            assert!(store.resolve(old_tail).is_none());
        }
    }

    mod grid_sync_tests {
        use super::*;

        #[test]
        fn move_to_relocates_across_cells() {
            let mut store = test_store();
            let id = store.spawn(&request(10.0, 10.0), &offscreen_frustum()).unwrap();
            let index = store.index_of(id).unwrap();

            store.move_to(index, Vec2::new(300.0, 10.0), Facing::Right);

            let handle = store.handle_at(index);
            assert!(store.grid().contains(handle, store.cell_of(Vec2::new(300.0, 10.0))));
            assert!(store.grid_consistent());
        }

        #[test]
        fn check_grid_repairs_tampering() {
            let mut store = test_store();
            let id = store.spawn(&request(10.0, 10.0), &offscreen_frustum()).unwrap();
            let handle = store.handle_at(store.index_of(id).unwrap());
            let cell = store.cell_of(Vec2::new(10.0, 10.0));
            store.grid_mut().remove(handle, cell);
            assert!(!store.grid_consistent());

            store.rebuild_grid();
            assert!(store.grid_consistent());
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_count_live_and_dying() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let a = store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            store.spawn(&request(400.0, 0.0), &frustum).unwrap();
            store.damage(a, 1_000.0);

            let stats = store.stats();
            assert_eq!(stats.live, 1);
            assert_eq!(stats.dying, 1);
            assert_eq!(stats.spawned_total, 2);
            assert_eq!(stats.removed_total, 0);
        }

        #[test]
        fn for_each_live_skips_dying() {
            let mut store = test_store();
            let frustum = offscreen_frustum();
            let a = store.spawn(&request(0.0, 0.0), &frustum).unwrap();
            let b = store.spawn(&request(400.0, 0.0), &frustum).unwrap();
            store.damage(a, 1_000.0);

            let mut seen = Vec::new();
            store.for_each_live(|s| seen.push(s.id()));
            assert_eq!(seen, vec![b]);
        }
    }
}

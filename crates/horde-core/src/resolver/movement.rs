//! Steering toward a target with axis-separated avoidance.
//!
//! The `MovementSolver` moves one spawn per call:
//! - Compute a straight move toward the target of length `speed * dt`
//!   (clamped to the remaining distance)
//! - Gather live neighbors around the area the move sweeps over
//! - Test the X-only and Y-only partial moves against them
//! - Apply whichever axes are clear; hold position if both are blocked
//!
//! A move is tested against the bounding box of its start and end
//! rectangles, so long steps never tunnel through or land on a neighbor.
//! The diagonal test is conservative and may fall back to one axis.
//!
//! # Neighbors
//!
//! Dying spawns never block. Neither do neighbors the mover already overlaps,
//! so two spawns pushed into each other can always walk apart again.

use glam::Vec2;
use horde_grid::Rect;
use tracing::trace;

use crate::entity::{Facing, Spawn, SpawnId};
use crate::store::SpawnStore;

/// Result of one [`MovementSolver::step`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StepOutcome {
    /// The spawn moved by `applied`.
    Moved {
        /// Delta actually applied
        applied: Vec2,
        /// True if one axis was dropped to avoid a neighbor
        slid: bool,
    },
    /// Both axes were blocked; the spawn held position.
    Blocked,
    /// Already at the target, or zero speed.
    Idle,
    /// The spawn is dying and does not move.
    Inactive,
    /// Unknown or stale id.
    NotFound,
}

impl StepOutcome {
    /// True if the spawn's position changed.
    #[must_use]
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Per-spawn steering solver.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use horde_core::config::HordeConfig;
/// use horde_core::entity::SpawnKind;
/// use horde_core::presentation::Frustum;
/// use horde_core::resolver::{MovementSolver, StepOutcome};
/// use horde_core::store::{SpawnRequest, SpawnStore};
/// use horde_grid::Rect;
///
/// let mut store = SpawnStore::new(&HordeConfig::default());
/// let frustum = Frustum::new(Rect::from_min_max(Vec2::splat(-10.0), Vec2::splat(10.0)));
/// let id = store
///     .spawn(&SpawnRequest::new(SpawnKind::Skeleton, Vec2::new(500.0, 0.0)), &frustum)
///     .unwrap();
///
/// let outcome = MovementSolver::new().step(&mut store, id, Vec2::ZERO, 0.1);
/// assert!(outcome.moved());
/// assert!(store.get(id).unwrap().position().x < 500.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementSolver;

impl MovementSolver {
    /// Creates a solver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Steps spawn `id` toward `target` over `dt` seconds.
    pub fn step(&self, store: &mut SpawnStore, id: SpawnId, target: Vec2, dt: f32) -> StepOutcome {
        let Some(index) = store.index_of(id) else {
            return StepOutcome::NotFound;
        };
        let Some(spawn) = store.at(index) else {
            return StepOutcome::NotFound;
        };
        if !spawn.is_live() {
            return StepOutcome::Inactive;
        }

        let position = spawn.position();
        let to_target = target - position;
        let distance = to_target.length();
        let reach = spawn.speed() * dt;
        if !(distance.is_finite() && reach.is_finite())
            || distance <= f32::EPSILON
            || reach <= 0.0
        {
            return StepOutcome::Idle;
        }
        let delta = to_target / distance * reach.min(distance);
        let size = spawn.size;
        let current = spawn.collision();
        let facing = spawn.facing();

        let reachable = swept(&current, &Rect::from_center_size(position + delta, size));
        let obstacles = match Self::obstacles(store, index, &current, &reachable) {
            Some(obstacles) => obstacles,
            None => {
                store.report_desync("stale handle in neighbor query");
                Self::obstacles(store, index, &current, &reachable).unwrap_or_default()
            }
        };
        // Same arithmetic as `Spawn::collision` so the tested rect is the one applied
        let blocked = |d: Vec2| {
            let path = swept(&current, &Rect::from_center_size(position + d, size));
            obstacles.iter().any(|o| o.overlaps(&path))
        };

        let x_only = Vec2::new(delta.x, 0.0);
        let y_only = Vec2::new(0.0, delta.y);
        let x_clear = !blocked(x_only);
        let y_clear = !blocked(y_only);

        let applied = match (x_clear, y_clear) {
            (true, true) if !blocked(delta) => delta,
            // Each axis alone is clear but the diagonal clips a corner
            (true, true) if delta.x.abs() >= delta.y.abs() => x_only,
            (true, true) | (false, true) => y_only,
            (true, false) => x_only,
            (false, false) => Vec2::ZERO,
        };

        if applied == Vec2::ZERO {
            trace!(id = %id, ?delta, "movement blocked on both axes");
            return StepOutcome::Blocked;
        }

        let facing = if applied.x < 0.0 {
            Facing::Left
        } else if applied.x > 0.0 {
            Facing::Right
        } else {
            facing
        };
        store.move_to(index, position + applied, facing);

        let slid = applied != delta;
        if slid {
            trace!(id = %id, ?delta, ?applied, "movement slid along one axis");
        }
        StepOutcome::Moved { applied, slid }
    }

    /// Collision rectangles of live neighbors inside `reachable` that can
    /// block the spawn at `index`. Returns `None` if the grid yielded a
    /// stale handle.
    fn obstacles(
        store: &SpawnStore,
        index: usize,
        current: &Rect,
        reachable: &Rect,
    ) -> Option<Vec<Rect>> {
        let obstacles = store
            .indices_near(reachable)?
            .into_iter()
            .filter(|&other| other != index)
            .filter_map(|other| store.at(other))
            .filter(|neighbor| neighbor.is_live())
            .map(Spawn::collision)
            .filter(|rect| rect.overlaps(reachable) && !rect.overlaps(current))
            .collect();
        Some(obstacles)
    }
}

/// Smallest rectangle covering both `from` and `to`.
fn swept(from: &Rect, to: &Rect) -> Rect {
    Rect::from_min_max(from.min.min(to.min), from.max.max(to.max))
}

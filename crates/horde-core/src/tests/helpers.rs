//! Test helper functions for setting up stores and hordes.

use glam::Vec2;
use horde_grid::Rect;

use crate::config::HordeConfig;
use crate::entity::{SpawnId, SpawnKind};
use crate::horde::Horde;
use crate::presentation::Frustum;
use crate::store::{SpawnRequest, SpawnStore};

// =============================================================================
// Frustums
// =============================================================================

/// A camera far away from every test position, so nothing is on screen.
pub fn offscreen_frustum() -> Frustum {
    Frustum::new(Rect::from_min_max(
        Vec2::splat(1.0e6),
        Vec2::splat(1.0e6 + 100.0),
    ))
}

/// A 2000x2000 camera centered on the origin.
pub fn wide_frustum() -> Frustum {
    Frustum::new(Rect::from_min_max(Vec2::splat(-1000.0), Vec2::splat(1000.0)))
}

/// A 640x480 camera centered on `center`.
pub fn camera_at(center: Vec2) -> Frustum {
    Frustum::new(Rect::from_center_size(center, Vec2::new(640.0, 480.0)))
}

// =============================================================================
// Setup
// =============================================================================

/// Store with the default configuration.
pub fn test_store() -> SpawnStore {
    SpawnStore::new(&HordeConfig::default())
}

/// Horde with the default configuration and a fixed seed.
pub fn test_horde(seed: u64) -> Horde {
    Horde::new(HordeConfig::default(), seed).expect("default config is valid")
}

/// Spawns one `kind` at each position, off screen. Panics on rejection.
pub fn spawn_at(horde: &mut Horde, kind: SpawnKind, positions: &[Vec2]) -> Vec<SpawnId> {
    positions
        .iter()
        .map(|pos| {
            horde
                .spawn(&SpawnRequest::new(kind, *pos), &offscreen_frustum())
                .expect("test spawn accepted")
        })
        .collect()
}

/// Positions on a ring around `center`, `count` evenly spaced.
#[allow(clippy::cast_precision_loss)]
pub fn ring(center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Ticks until nothing is dying or `max_ticks` is reached. Returns ticks run.
pub fn run_until_settled(
    horde: &mut Horde,
    target: Vec2,
    frustum: &Frustum,
    dt: f32,
    max_ticks: usize,
) -> usize {
    for ticks in 0..max_ticks {
        if horde.stats().dying == 0 {
            return ticks;
        }
        horde.tick(target, frustum, dt);
    }
    max_ticks
}

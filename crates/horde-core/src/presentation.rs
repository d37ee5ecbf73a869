//! Render and camera collaborator seams.
//!
//! The engine never draws anything. It hands the render side an
//! [`AnimationHandle`] per spawn and only reads back one bit: whether the
//! death presentation has finished. The camera side supplies a [`Frustum`]
//! consulted at spawn time and at removal time.

use horde_grid::Rect;

use crate::entity::{AnimationHandle, Spawn, SpawnId};

/// Render collaborator contract.
pub trait Presentation {
    /// Creates the animation state for a new spawn.
    fn attach(&mut self, id: SpawnId, sprite_set: u32) -> AnimationHandle;

    /// Returns the hit-reaction animation to idle when the damage-break ends.
    fn reset_hit_reaction(&mut self, handle: AnimationHandle);

    /// Whether the death animation of a dying spawn has completed.
    fn death_finished(&self, handle: AnimationHandle, spawn: &Spawn) -> bool;

    /// Releases the animation state of a removed spawn.
    fn detach(&mut self, handle: AnimationHandle);
}

/// Headless presentation driven by the record's own timers.
///
/// Death is finished once the spawn's death timer (seeded from the
/// archetype's `death_secs`) has run out.
#[derive(Debug, Default)]
pub struct TimedPresentation {
    next_handle: u64,
    attached: usize,
}

impl TimedPresentation {
    /// Creates a presentation with no attached spawns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles attached and not yet detached.
    #[must_use]
    pub fn attached(&self) -> usize {
        self.attached
    }
}

impl Presentation for TimedPresentation {
    fn attach(&mut self, _id: SpawnId, _sprite_set: u32) -> AnimationHandle {
        self.next_handle += 1;
        self.attached += 1;
        AnimationHandle::new(self.next_handle)
    }

    fn reset_hit_reaction(&mut self, _handle: AnimationHandle) {}

    fn death_finished(&self, _handle: AnimationHandle, spawn: &Spawn) -> bool {
        spawn.death_timer() <= 0.0
    }

    fn detach(&mut self, _handle: AnimationHandle) {
        self.attached = self.attached.saturating_sub(1);
    }
}

/// Camera-visible region of the world.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    /// Visible rectangle in world units
    pub visible: Rect,
}

impl Frustum {
    /// Wraps a visible rectangle.
    #[must_use]
    pub const fn new(visible: Rect) -> Self {
        Self { visible }
    }

    /// True if `rect` lies entirely on screen.
    #[must_use]
    pub fn contains(&self, rect: &Rect) -> bool {
        self.visible.contains_rect(rect)
    }

    /// True if any part of `rect` is on screen.
    #[must_use]
    pub fn overlaps(&self, rect: &Rect) -> bool {
        self.visible.overlaps(rect)
    }
}

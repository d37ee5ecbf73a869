//! Error types for the population engine.
//!
//! Only spawn validation and configuration can fail. Lookups against unknown
//! or stale ids are ordinary outcomes ([`crate::store::DamageOutcome::NotFound`],
//! `None` from `get`) and have no error type.

use thiserror::Error;

use crate::entity::{SpawnId, SpawnKind};

/// Reasons a spawn request is rejected.
///
/// Rejections are never fatal; the caller may retry with different parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnRejection {
    /// The archetype has no entry in the configured table.
    #[error("no archetype configured for {0:?}")]
    UnknownArchetype(SpawnKind),
    /// The store already tracks its maximum number of spawns.
    #[error("spawn capacity of {capacity} reached")]
    CapacityExceeded {
        /// Configured capacity
        capacity: usize,
    },
    /// The collision rectangle would overlap a live spawn.
    #[error("would overlap live spawn {other}")]
    Overlapping {
        /// The spawn already occupying the space
        other: SpawnId,
    },
    /// The collision rectangle lies entirely inside the visible region.
    #[error("spawn position is inside the visible region")]
    OnScreen,
    /// The request itself is malformed.
    #[error("invalid spawn request: {0}")]
    InvalidRequest(&'static str),
}

/// Error returned by an event handler.
///
/// The event bus logs these and carries on; they never reach the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event handler failed: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Creates a handler error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Cell size must be a positive finite number.
    #[error("cell size must be positive and finite, got {0}")]
    CellSize(f32),
    /// The neighborhood radius must be at least one cell.
    #[error("neighbor radius must be at least 1")]
    NeighborRadius,
    /// Capacity must allow at least one spawn.
    #[error("max_spawns must be at least 1")]
    Capacity,
    /// No archetypes configured.
    #[error("archetype table is empty")]
    EmptyArchetypes,
    /// An archetype entry is out of range.
    #[error("archetype {kind:?}: {reason}")]
    Archetype {
        /// Offending archetype
        kind: SpawnKind,
        /// What is wrong with it
        reason: &'static str,
    },
    /// A level curve has a non-finite or non-positive parameter.
    #[error("level curve {0} is invalid")]
    Curve(&'static str),
    /// Loot drop distance must be finite.
    #[error("loot drop distance must be finite")]
    DropDistance,
    /// Configuration JSON could not be decoded.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from the [`crate::horde::Horde`] entry points.
#[derive(Debug, Error)]
pub enum HordeError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A spawn request was rejected.
    #[error(transparent)]
    Spawn(#[from] SpawnRejection),
}

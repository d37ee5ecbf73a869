//! # Horde Core
//!
//! Spawn population engine for a 2D action game.
//!
//! This crate tracks hostile NPC instances: it creates them off screen, steers
//! them toward the player with local avoidance, resolves area damage, runs
//! the death lifecycle and emits loot and sound events.
//!
//! ## Architecture
//!
//! - **Store**: dense spawn records with id remapping and swap-remove
//!   compaction ([`store::SpawnStore`])
//! - **Grid**: uniform spatial hash over spawn positions (`horde_grid`)
//! - **Resolvers**: movement and combat ([`resolver`])
//! - **Events**: outgoing fire-and-forget channel ([`event::EventBus`])
//! - **Context**: one [`horde::Horde`] per play session drives the tick
//!
//! ## Usage
//!
//! ```
//! use glam::Vec2;
//! use horde_core::{DamageRequest, Frustum, Horde, HordeConfig, SpawnKind, SpawnRequest};
//! use horde_grid::{Circle, Rect};
//!
//! let mut horde = Horde::new(HordeConfig::default(), 1).unwrap();
//! let camera = Frustum::new(Rect::from_min_max(Vec2::splat(-320.0), Vec2::splat(320.0)));
//!
//! let id = horde
//!     .spawn(&SpawnRequest::new(SpawnKind::Skeleton, Vec2::new(400.0, 0.0)), &camera)
//!     .unwrap();
//!
//! horde.submit_damage(DamageRequest::new(Circle::new(Vec2::new(400.0, 0.0), 16.0), 5.0));
//! let report = horde.tick(Vec2::ZERO, &camera, 1.0 / 60.0);
//!
//! assert_eq!(report.damage.hits, 1);
//! assert!(horde.get(id).is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Re-export the spatial substrate
pub use horde_grid;

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod hash;
pub mod horde;
pub mod presentation;
pub mod resolver;
pub mod store;

pub use config::{HordeConfig, LevelCurves, StatCurve};
pub use entity::{Spawn, SpawnId, SpawnKind, SpawnState};
pub use error::{ConfigError, HandlerError, HordeError, SpawnRejection};
pub use event::{EventBus, SpawnEvent};
pub use horde::{Horde, RenderView, TickReport};
pub use presentation::{Frustum, Presentation, TimedPresentation};
pub use resolver::{CombatResolver, DamageReport, DamageRequest, MovementSolver, StepOutcome};
pub use store::{DamageOutcome, PopulationStats, SpawnRequest, SpawnStore};

#[cfg(test)]
mod tests;

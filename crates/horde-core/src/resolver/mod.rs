//! Per-tick resolvers.
//!
//! Resolvers read the [`crate::store::SpawnStore`] and apply the tick's
//! mutations to it. They hold configuration only; all entity state lives in
//! the store.
//!
//! # Invariants
//!
//! - Resolvers iterate the store in index order, so a fixed sequence of
//!   inputs produces a fixed sequence of mutations and events
//! - Positions only change through the store's `move_to`, which keeps the
//!   spatial grid in step
//!
//! # Available Resolvers
//!
//! - [`MovementSolver`]: Steering with axis-separated neighbor avoidance
//! - [`CombatResolver`]: Damage requests, cooldowns, standing attacks and
//!   death side effects

mod combat;
mod movement;

pub use combat::{CombatResolver, DamageReport, DamageRequest};
pub use movement::{MovementSolver, StepOutcome};

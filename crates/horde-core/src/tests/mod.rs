//! Crate-level scenario tests.
//!
//! - `determinism.rs`: same seed and inputs give the same state and events
//! - `integration.rs`: end-to-end population scenarios through [`crate::horde::Horde`]
//! - `helpers.rs`: shared setup used here and by the unit tests

mod determinism;
pub(crate) mod helpers;

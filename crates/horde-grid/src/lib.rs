//! # Horde Grid
//!
//! Uniform spatial hash grid for the horde population engine.
//!
//! The world is divided into square cells of a fixed size. Each occupied cell
//! keeps the list of occupant handles currently inside it, which gives
//! average O(1) neighborhood queries for local avoidance and overlap checks.
//!
//! - [`Cell`]: Discretized integer cell coordinate
//! - [`Rect`], [`Circle`], [`Shape`]: Axis-aligned overlap primitives
//! - [`SpatialGrid`]: The grid itself, generic over the handle type
//!
//! ## Usage
//!
//! ```
//! use glam::Vec2;
//! use horde_grid::{Cell, SpatialGrid};
//!
//! let mut grid: SpatialGrid<u32> = SpatialGrid::new(256.0);
//! let cell = grid.cell_of(Vec2::new(300.0, -10.0));
//! assert_eq!(cell, Cell::new(1, -1));
//!
//! grid.insert(7, cell);
//! let near: Vec<u32> = grid.query_neighbors(Cell::new(0, 0)).collect();
//! assert_eq!(near, vec![7]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;
pub mod shape;

pub use grid::{Cell, SpatialGrid, DEFAULT_CELL_SIZE};
pub use shape::{Circle, Rect, Shape};

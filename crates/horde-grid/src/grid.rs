//! Uniform spatial hash grid.
//!
//! The grid maps a discretized [`Cell`] to the handles occupying it. It holds
//! handles, never entity data, so the owner of the data is responsible for
//! keeping membership consistent with positions:
//!
//! - A position update that crosses a cell boundary must call
//!   [`SpatialGrid::relocate`].
//! - Any structural change in the owning storage that changes what a handle
//!   refers to (compaction, reordering) requires [`SpatialGrid::rebuild`].
//!
//! # Determinism
//!
//! Queries visit cells in row-major order (`y` outer, `x` inner) and yield the
//! occupants of each cell in insertion order. The `HashMap` is only used for
//! keyed lookup and is never iterated in a way that affects query results.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shape::Rect;

/// Default cell edge length in world units.
pub const DEFAULT_CELL_SIZE: f32 = 256.0;

/// Integer grid cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the cell offset by `(dx, dy)`, saturating at the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Chebyshev distance in cells.
    #[must_use]
    pub fn chebyshev(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Uniform spatial hash grid keyed by [`Cell`].
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use horde_grid::SpatialGrid;
///
/// let mut grid: SpatialGrid<u32> = SpatialGrid::new(100.0);
/// let a = grid.cell_of(Vec2::new(50.0, 50.0));
/// let b = grid.cell_of(Vec2::new(150.0, 50.0));
///
/// grid.insert(1, a);
/// grid.relocate(1, a, b);
///
/// assert!(grid.contains(1, b));
/// assert!(!grid.contains(1, a));
/// ```
#[derive(Debug, Clone)]
pub struct SpatialGrid<H> {
    /// Cell edge length in world units.
    cell_size: f32,
    /// Neighborhood radius in cells (1 means 3x3).
    radius: i32,
    /// Occupants per non-empty cell.
    cells: HashMap<Cell, Vec<H>>,
    /// Total number of entries.
    len: usize,
}

impl<H: Copy + PartialEq> SpatialGrid<H> {
    /// Creates an empty grid with a 3x3 query neighborhood.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self::with_radius(cell_size, 1)
    }

    /// Creates an empty grid with a custom neighborhood radius.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    #[must_use]
    pub fn with_radius(cell_size: f32, radius: u32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive and finite"
        );
        Self {
            cell_size,
            radius: i32::try_from(radius).unwrap_or(i32::MAX),
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Cell edge length in world units.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Neighborhood radius in cells.
    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius.unsigned_abs()
    }

    /// Maps a world position to its cell by floor division.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, pos: Vec2) -> Cell {
        let scaled = (pos / self.cell_size).floor();
        // `as` saturates for out-of-range and maps NaN to 0
        Cell::new(scaled.x as i32, scaled.y as i32)
    }

    /// Adds `handle` to `cell`.
    ///
    /// The grid does not check for duplicates; callers insert each handle once.
    pub fn insert(&mut self, handle: H, cell: Cell) {
        self.cells.entry(cell).or_default().push(handle);
        self.len += 1;
    }

    /// Removes `handle` from `cell`. Returns true if it was present.
    pub fn remove(&mut self, handle: H, cell: Cell) -> bool {
        let Some(occupants) = self.cells.get_mut(&cell) else {
            return false;
        };
        let Some(pos) = occupants.iter().position(|h| *h == handle) else {
            return false;
        };
        occupants.remove(pos);
        if occupants.is_empty() {
            self.cells.remove(&cell);
        }
        self.len -= 1;
        true
    }

    /// Moves `handle` from `old` to `new`. No-op if the cells are equal.
    ///
    /// Returns false if the handle was not found in `old`; in that case it is
    /// still inserted into `new` so that membership matches the caller's
    /// position afterwards.
    pub fn relocate(&mut self, handle: H, old: Cell, new: Cell) -> bool {
        if old == new {
            return true;
        }
        let found = self.remove(handle, old);
        self.insert(handle, new);
        found
    }

    /// Returns true if `handle` is registered in `cell`.
    #[must_use]
    pub fn contains(&self, handle: H, cell: Cell) -> bool {
        self.cells
            .get(&cell)
            .is_some_and(|occupants| occupants.contains(&handle))
    }

    /// Occupants of a single cell, in insertion order.
    #[must_use]
    pub fn occupants(&self, cell: Cell) -> &[H] {
        self.cells.get(&cell).map_or(&[], Vec::as_slice)
    }

    /// Iterates the occupants of the configured neighborhood around `cell`.
    pub fn query_neighbors(&self, cell: Cell) -> impl Iterator<Item = H> + '_ {
        self.query_within(cell, self.radius.unsigned_abs())
    }

    /// Iterates the occupants of the `(2r+1) x (2r+1)` block around `cell`.
    pub fn query_within(&self, cell: Cell, radius: u32) -> impl Iterator<Item = H> + '_ {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        (-r..=r)
            .flat_map(move |dy| (-r..=r).map(move |dx| cell.offset(dx, dy)))
            .flat_map(move |c| self.occupants(c).iter().copied())
    }

    /// Iterates the occupants of every cell touched by `region`.
    ///
    /// Handles are only returned as candidates; callers still run their exact
    /// overlap test against the returned entities.
    pub fn query_region(&self, region: Rect) -> impl Iterator<Item = H> + '_ {
        let lo = self.cell_of(region.min);
        let hi = self.cell_of(region.max);
        (lo.y..=hi.y)
            .flat_map(move |y| (lo.x..=hi.x).map(move |x| Cell::new(x, y)))
            .flat_map(move |c| self.occupants(c).iter().copied())
    }

    /// Drops every entry and repopulates from `(handle, position)` pairs.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (H, Vec2)>,
    {
        self.clear();
        for (handle, pos) in entries {
            let cell = self.cell_of(pos);
            self.insert(handle, cell);
        }
        debug!(
            entries = self.len,
            cells = self.cells.len(),
            "spatial grid rebuilt"
        );
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the grid has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Iterates every `(cell, handle)` entry.
    ///
    /// Order is unspecified; use this for consistency checks, not simulation.
    pub fn entries(&self) -> impl Iterator<Item = (Cell, H)> + '_ {
        self.cells
            .iter()
            .flat_map(|(cell, occupants)| occupants.iter().map(move |h| (*cell, *h)))
    }
}

impl<H: Copy + PartialEq> Default for SpatialGrid<H> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

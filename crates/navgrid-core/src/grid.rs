//! The walkability grid for one map.

use std::rc::Rc;

use thiserror::Error;

use crate::cell::{Ability, Cell};
use crate::distance::{UNREACHABLE, manhattan};
use crate::geom::{Bounds, Point, WorldPos};

/// Neighbor connectivity used for movement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Movement {
    /// Cardinal (4-way) movement only.
    #[default]
    Straight,
    /// Cardinal plus diagonal (8-way) movement.
    Diagonal,
}

/// Error building a [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// The corners describe a region with zero or negative area.
    #[error("degenerate grid extent: start {start}, end {end}")]
    DegenerateExtent { start: Point, end: Point },
}

// Fixed neighbor enumeration order; y grows north. Cardinals first so the
// order is a prefix of the 8-way order.
const CARDINAL: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// A rectangular map region of walkability-tagged cells.
///
/// The region spans the half-open world-space rectangle `[start, end)`;
/// every unit square in it is one cell, addressed by a grid-local [`Cell`]
/// coordinate in `[0, W) × [0, H)`. All cell slots are populated eagerly at
/// construction; the grid is discarded wholesale when its map changes.
///
/// Walkability and ability tags live in dense per-cell stores. The ability
/// store is a pure tag map for the surrounding application and has no
/// effect on pathfinding. `Rc` tag storage keeps the grid single-threaded,
/// matching the synchronous search model.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: Bounds,
    width: usize,
    walkable: Vec<bool>,
    abilities: Vec<Option<Rc<dyn Ability>>>,
}

impl Grid {
    /// Build the grid for the region `[start, end)`.
    ///
    /// All cells start walkable with no ability attached. Fails with
    /// [`GridError::DegenerateExtent`] if the region has zero or negative
    /// width or height.
    pub fn new(start: Point, end: Point) -> Result<Self, GridError> {
        let bounds = Bounds::new(start, end);
        if bounds.is_empty() {
            return Err(GridError::DegenerateExtent { start, end });
        }
        let len = bounds.len();
        Ok(Self {
            bounds,
            width: bounds.width() as usize,
            walkable: vec![true; len],
            abilities: vec![None; len],
        })
    }

    /// The world-space rectangle this grid covers.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.walkable.len()
    }

    /// Whether the grid has no cells. Construction rejects degenerate
    /// extents, so this is false for any built grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.walkable.is_empty()
    }

    /// Whether `cell` addresses a slot in this grid.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width() && cell.y >= 0 && cell.y < self.height()
    }

    #[inline]
    fn idx(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.y as usize * self.width + cell.x as usize)
    }

    // -----------------------------------------------------------------------
    // World <-> grid mapping
    // -----------------------------------------------------------------------

    /// The cell containing `pos`, or `None` if it falls outside the grid.
    pub fn cell_at(&self, pos: WorldPos) -> Option<Cell> {
        let p = pos.floor();
        if !self.bounds.contains(p) {
            return None;
        }
        let local = p - self.bounds.min;
        Some(Cell::new(local.x, local.y))
    }

    /// The world position of `cell`'s lower-left corner (`z = 0`).
    ///
    /// Inverse of [`cell_at`](Self::cell_at) for every in-bounds cell.
    pub fn world_of(&self, cell: Cell) -> WorldPos {
        WorldPos::xy(
            (self.bounds.min.x + cell.x) as f32,
            (self.bounds.min.y + cell.y) as f32,
        )
    }

    /// Manhattan distance in grid steps between the cells containing the
    /// two positions.
    ///
    /// Returns [`UNREACHABLE`] and logs a diagnostic if either position
    /// does not resolve to a cell: an out-of-grid query here is a caller or
    /// map-data bug worth surfacing, but not worth halting for.
    pub fn grid_distance(&self, a: WorldPos, b: WorldPos) -> i32 {
        match (self.cell_at(a), self.cell_at(b)) {
            (Some(ca), Some(cb)) => manhattan(ca, cb),
            _ => {
                log::error!("grid_distance: {a} or {b} outside grid {}", self.bounds);
                UNREACHABLE
            }
        }
    }

    // -----------------------------------------------------------------------
    // Neighbors
    // -----------------------------------------------------------------------

    /// Fill `buf` with the in-bounds neighbors of `cell`.
    ///
    /// Enumeration order is fixed (N, S, E, W, then NE, NW, SE, SW) so
    /// downstream tie-breaking is reproducible. Walkability is not
    /// consulted; callers filter as needed.
    pub fn neighbors(&self, cell: Cell, movement: Movement, buf: &mut Vec<Cell>) {
        buf.clear();
        for (dx, dy) in CARDINAL {
            let n = cell.shift(dx, dy);
            if self.contains(n) {
                buf.push(n);
            }
        }
        if movement == Movement::Diagonal {
            for (dx, dy) in DIAGONAL {
                let n = cell.shift(dx, dy);
                if self.contains(n) {
                    buf.push(n);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Walkability
    // -----------------------------------------------------------------------

    /// Whether `cell` can be traversed. Out-of-bounds cells are not.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        match self.idx(cell) {
            Some(i) => self.walkable[i],
            None => false,
        }
    }

    /// Set the walkability of `cell`. Does nothing if out of bounds.
    pub fn set_walkable(&mut self, cell: Cell, walkable: bool) {
        if let Some(i) = self.idx(cell) {
            self.walkable[i] = walkable;
        }
    }

    // -----------------------------------------------------------------------
    // Ability tags
    // -----------------------------------------------------------------------

    /// Attach an ability to `cell`, replacing any previous one. Does
    /// nothing if out of bounds.
    pub fn set_ability(&mut self, cell: Cell, ability: Rc<dyn Ability>) {
        if let Some(i) = self.idx(cell) {
            self.abilities[i] = Some(ability);
        }
    }

    /// The ability attached to `cell`, if any.
    pub fn ability_of(&self, cell: Cell) -> Option<Rc<dyn Ability>> {
        self.idx(cell).and_then(|i| self.abilities[i].clone())
    }

    /// Whether `cell` has an ability attached.
    pub fn has_ability(&self, cell: Cell) -> bool {
        self.idx(cell)
            .is_some_and(|i| self.abilities[i].is_some())
    }

    /// Detach and return the ability attached to `cell`, if any.
    pub fn clear_ability(&mut self, cell: Cell) -> Option<Rc<dyn Ability>> {
        self.idx(cell).and_then(|i| self.abilities[i].take())
    }

    /// Row-major iterator over every cell coordinate.
    pub fn cells(&self) -> Cells {
        Cells {
            width: self.width(),
            len: self.len(),
            i: 0,
        }
    }
}

/// Row-major iterator over the cell coordinates of a [`Grid`].
#[derive(Clone, Debug)]
pub struct Cells {
    width: i32,
    len: usize,
    i: usize,
}

impl Iterator for Cells {
    type Item = Cell;

    #[inline]
    fn next(&mut self) -> Option<Cell> {
        if self.i >= self.len {
            return None;
        }
        let i = self.i as i32;
        self.i += 1;
        Some(Cell::new(i % self.width, i / self.width))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.i;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Cells {}

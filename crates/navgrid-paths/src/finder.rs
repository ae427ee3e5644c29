use navgrid_core::{Cell, Grid, Movement, distance};

/// Cost of one cardinal step between adjacent cells.
pub const STRAIGHT_COST: i32 = 10;
/// Cost of one diagonal step between adjacent cells. Exceeds the straight
/// cost and stays below two straight steps, so cutting a corner is cheaper
/// than walking around it but never free.
pub const DIAGONAL_COST: i32 = 14;

// ---------------------------------------------------------------------------
// Search nodes
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) g: i32,
    pub(crate) f: i32,
    pub(crate) parent: usize,
    pub(crate) generation: u32,
    pub(crate) open: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: 0,
            f: 0,
            parent: usize::MAX,
            generation: 0,
            open: false,
        }
    }
}

/// Reference into the node arena, ordered for the open-set heap: lowest
/// `f` first, ties broken by lowest `h`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) struct OpenRef {
    pub(crate) idx: usize,
    pub(crate) f: i32,
    pub(crate) h: i32,
}

impl Ord for OpenRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first; the h
        // fallback keeps tie-breaks deterministic and goal-directed.
        other.f.cmp(&self.f).then(other.h.cmp(&self.h))
    }
}

impl PartialOrd for OpenRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// PathFinder
// ---------------------------------------------------------------------------

/// A* path finder over the active map's [`Grid`].
///
/// Owns only per-search bookkeeping: an arena of search nodes indexed by
/// flat grid coordinate (predecessors stored as indices, not pointers), a
/// generation counter that lazily invalidates the whole arena between
/// searches, and a reusable neighbor buffer. Repeated searches on the same
/// map allocate nothing after warm-up. The grid itself is never mutated by
/// a search.
pub struct PathFinder {
    pub(crate) movement: Movement,
    pub(crate) nodes: Vec<Node>,
    pub(crate) generation: u32,
    pub(crate) width: usize,
    pub(crate) nbuf: Vec<Cell>,
}

impl PathFinder {
    /// Create a path finder with the given movement policy.
    pub fn new(movement: Movement) -> Self {
        Self {
            movement,
            nodes: Vec::new(),
            generation: 0,
            width: 0,
            nbuf: Vec::with_capacity(8),
        }
    }

    /// The movement policy this finder searches with.
    #[inline]
    pub fn movement(&self) -> Movement {
        self.movement
    }

    /// Size the node arena for `grid`. Grows as needed, never shrinks;
    /// stale entries from previous layouts are ignored via generations.
    pub(crate) fn bind(&mut self, grid: &Grid) {
        self.width = grid.width() as usize;
        let len = grid.len();
        if len > self.nodes.len() {
            self.nodes.clear();
            self.nodes.resize(len, Node::default());
            self.generation = 0;
        }
    }

    /// Flat arena index of an in-grid cell.
    #[inline]
    pub(crate) fn idx(&self, cell: Cell) -> usize {
        cell.y as usize * self.width + cell.x as usize
    }

    /// Inverse of [`idx`](Self::idx).
    #[inline]
    pub(crate) fn cell(&self, idx: usize) -> Cell {
        Cell::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    /// Cost of moving between two adjacent cells.
    #[inline]
    pub(crate) fn step_cost(&self, from: Cell, to: Cell) -> i32 {
        if from.x != to.x && from.y != to.y {
            DIAGONAL_COST
        } else {
            STRAIGHT_COST
        }
    }

    /// Heuristic estimate of remaining cost, matched to the movement
    /// policy so it never overestimates: exact Manhattan cost for cardinal
    /// movement, octile distance when diagonals are allowed.
    #[inline]
    pub(crate) fn estimate(&self, from: Cell, to: Cell) -> i32 {
        match self.movement {
            Movement::Straight => STRAIGHT_COST * distance::manhattan(from, to),
            Movement::Diagonal => {
                let dx = (from.x - to.x).abs();
                let dy = (from.y - to.y).abs();
                let diag = dx.min(dy);
                DIAGONAL_COST * diag + STRAIGHT_COST * (dx.max(dy) - diag)
            }
        }
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(Movement::default())
    }
}

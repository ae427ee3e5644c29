//! **navgrid-paths** — A* pathfinding over navgrid walkability grids.
//!
//! The crate has two pieces:
//!
//! - [`MapContext`] holds the grid of the currently active map; the
//!   surrounding application activates it on map load and deactivates it
//!   on teardown.
//! - [`PathFinder`] runs A* between two world positions on that grid and
//!   returns the route as world-space waypoints
//!   ([`PathFinder::find_path`]).
//!
//! Search state lives in an arena of nodes indexed by flat grid
//! coordinate, invalidated between searches by a generation counter, so
//! repeated queries allocate nothing after warm-up. The open set is a
//! binary heap ordered by `f` cost with ties broken by `h` cost, which
//! keeps returned routes deterministic.
//!
//! ```
//! use navgrid_core::{Grid, Movement, Point, WorldPos};
//! use navgrid_paths::{MapContext, PathFinder};
//!
//! let grid = Grid::new(Point::ZERO, Point::new(8, 8)).unwrap();
//! let mut ctx = MapContext::new();
//! ctx.activate_map(grid);
//!
//! let mut finder = PathFinder::new(Movement::Straight);
//! let path = finder
//!     .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(6.5, 2.5))
//!     .expect("open grid always has a path");
//! assert_eq!(path.len(), 9);
//! ```

mod astar;
mod context;
mod finder;

pub use context::MapContext;
pub use finder::{DIAGONAL_COST, PathFinder, STRAIGHT_COST};

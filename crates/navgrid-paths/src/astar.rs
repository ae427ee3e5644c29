use std::collections::BinaryHeap;

use navgrid_core::WorldPos;

use crate::context::MapContext;
use crate::finder::{OpenRef, PathFinder};

impl PathFinder {
    /// Compute the cheapest walkable path between two world positions on
    /// the active grid.
    ///
    /// Returns one waypoint per traversed cell, start cell included,
    /// ordered start→target. Returns `None` when no map is active, when
    /// either position falls outside the grid, or when the target cannot
    /// be reached with the current walkability.
    ///
    /// Walkability is checked for neighbors only: a search may leave an
    /// unwalkable start cell, and an unwalkable target is simply never
    /// reached.
    pub fn find_path(
        &mut self,
        ctx: &MapContext,
        start: WorldPos,
        target: WorldPos,
    ) -> Option<Vec<WorldPos>> {
        let Some(grid) = ctx.grid() else {
            log::debug!("find_path: no active map, returning no path");
            return None;
        };
        let from = grid.cell_at(start)?;
        let to = grid.cell_at(target)?;

        if from == to {
            return Some(vec![grid.world_of(from)]);
        }

        self.bind(grid);

        // Bump generation to lazily invalidate all nodes.
        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        let start_idx = self.idx(from);
        let goal_idx = self.idx(to);

        // Initialise the start node.
        let start_h = self.estimate(from, to);
        {
            let node = &mut self.nodes[start_idx];
            node.g = 0;
            node.f = start_h;
            node.parent = usize::MAX;
            node.generation = cur_gen;
            node.open = true;
        }

        let mut open: BinaryHeap<OpenRef> = BinaryHeap::new();
        open.push(OpenRef {
            idx: start_idx,
            f: start_h,
            h: start_h,
        });

        let mut nbuf = std::mem::take(&mut self.nbuf);

        let found = 'search: loop {
            let Some(current) = open.pop() else {
                break 'search false;
            };

            let ci = current.idx;

            // Skip stale entries.
            if self.nodes[ci].generation != cur_gen || !self.nodes[ci].open {
                continue;
            }

            if ci == goal_idx {
                break 'search true;
            }

            self.nodes[ci].open = false;
            let current_g = self.nodes[ci].g;
            let current_cell = self.cell(ci);

            grid.neighbors(current_cell, self.movement, &mut nbuf);

            for &nc in nbuf.iter() {
                if !grid.is_walkable(nc) {
                    continue;
                }
                let ni = self.idx(nc);
                let tentative_g = current_g + self.step_cost(current_cell, nc);
                let h = self.estimate(nc, to);

                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    // Already reached this search; only a strict
                    // improvement reopens it.
                    if tentative_g >= n.g {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.g = tentative_g;
                n.f = tentative_g + h;
                n.parent = ci;
                n.open = true;

                open.push(OpenRef { idx: ni, f: n.f, h });
            }
        };

        self.nbuf = nbuf;

        if !found {
            return None;
        }

        // Walk predecessor links back from the target, then reverse.
        let mut cells = Vec::new();
        let mut ci = goal_idx;
        while ci != usize::MAX {
            cells.push(self.cell(ci));
            ci = self.nodes[ci].parent;
        }
        cells.reverse();
        Some(cells.into_iter().map(|c| grid.world_of(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navgrid_core::{Ability, Cell, Grid, Movement, Point, WorldPos, chebyshev, manhattan};
    use std::rc::Rc;

    fn active_ctx(grid: Grid) -> MapContext {
        let mut ctx = MapContext::new();
        ctx.activate_map(grid);
        ctx
    }

    fn open_5x5() -> MapContext {
        active_ctx(Grid::new(Point::ZERO, Point::new(5, 5)).unwrap())
    }

    fn path_cells(ctx: &MapContext, path: &[WorldPos]) -> Vec<Cell> {
        let grid = ctx.grid().unwrap();
        path.iter().map(|&wp| grid.cell_at(wp).unwrap()).collect()
    }

    #[test]
    fn no_active_map_returns_none() {
        let ctx = MapContext::new();
        let mut pf = PathFinder::new(Movement::Straight);
        assert_eq!(
            pf.find_path(&ctx, WorldPos::xy(0.0, 0.0), WorldPos::xy(1.0, 1.0)),
            None
        );
    }

    #[test]
    fn out_of_bounds_endpoints_return_none() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Straight);
        assert_eq!(
            pf.find_path(&ctx, WorldPos::xy(-1.0, 0.0), WorldPos::xy(2.0, 2.0)),
            None
        );
        assert_eq!(
            pf.find_path(&ctx, WorldPos::xy(2.0, 2.0), WorldPos::xy(9.0, 9.0)),
            None
        );
    }

    #[test]
    fn same_cell_returns_single_waypoint() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Straight);
        // Different positions, same unit square.
        let path = pf
            .find_path(&ctx, WorldPos::xy(1.2, 1.7), WorldPos::xy(1.9, 1.01))
            .unwrap();
        assert_eq!(path, vec![WorldPos::xy(1.0, 1.0)]);
    }

    #[test]
    fn same_cell_ignores_walkability() {
        let mut ctx = open_5x5();
        ctx.grid_mut().unwrap().set_walkable(Cell::new(1, 1), false);
        let mut pf = PathFinder::new(Movement::Straight);
        let path = pf
            .find_path(&ctx, WorldPos::xy(1.5, 1.5), WorldPos::xy(1.5, 1.5))
            .unwrap();
        assert_eq!(path, vec![WorldPos::xy(1.0, 1.0)]);
    }

    #[test]
    fn straight_corridor_is_returned_exactly() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Straight);
        // Unique shortest path: along the bottom row.
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 0.5))
            .unwrap();
        assert_eq!(
            path,
            vec![
                WorldPos::xy(0.0, 0.0),
                WorldPos::xy(1.0, 0.0),
                WorldPos::xy(2.0, 0.0),
                WorldPos::xy(3.0, 0.0),
                WorldPos::xy(4.0, 0.0),
            ]
        );
    }

    #[test]
    fn corner_to_corner_is_a_monotonic_staircase() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Straight);
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 4.5))
            .unwrap();

        // 8 steps = the Manhattan distance; 9 waypoints with endpoints.
        assert_eq!(path.len(), 9);
        let cells = path_cells(&ctx, &path);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[8], Cell::new(4, 4));
        for w in cells.windows(2) {
            let dx = w[1].x - w[0].x;
            let dy = w[1].y - w[0].y;
            // Every step advances one cell toward the target.
            assert_eq!(dx + dy, 1);
            assert!(dx >= 0 && dy >= 0);
        }
    }

    #[test]
    fn step_count_matches_manhattan_on_open_grid() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Straight);
        let pairs = [
            (WorldPos::xy(0.0, 0.0), WorldPos::xy(3.2, 1.8)),
            (WorldPos::xy(4.5, 0.5), WorldPos::xy(0.5, 3.5)),
            (WorldPos::xy(2.5, 4.5), WorldPos::xy(2.5, 0.5)),
        ];
        for (a, b) in pairs {
            let grid = ctx.grid().unwrap();
            let expected = manhattan(grid.cell_at(a).unwrap(), grid.cell_at(b).unwrap());
            let path = pf.find_path(&ctx, a, b).unwrap();
            assert_eq!(path.len() as i32 - 1, expected);
        }
    }

    #[test]
    fn wall_forces_a_detour() {
        let mut ctx = open_5x5();
        {
            let grid = ctx.grid_mut().unwrap();
            // Wall across row 2 with a gap at x = 4.
            for x in 0..4 {
                grid.set_walkable(Cell::new(x, 2), false);
            }
        }
        let mut pf = PathFinder::new(Movement::Straight);
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(0.5, 4.5))
            .unwrap();

        let cells = path_cells(&ctx, &path);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(*cells.last().unwrap(), Cell::new(0, 4));
        // Detour through the gap: 12 steps instead of the direct 4.
        assert_eq!(path.len(), 13);
        assert!(cells.contains(&Cell::new(4, 2)));
        for w in cells.windows(2) {
            assert_eq!(manhattan(w[0], w[1]), 1);
        }
        let grid = ctx.grid().unwrap();
        for &c in &cells[1..] {
            assert!(grid.is_walkable(c));
        }
    }

    #[test]
    fn boxed_in_start_is_unreachable() {
        let mut ctx = open_5x5();
        {
            let grid = ctx.grid_mut().unwrap();
            grid.set_walkable(Cell::new(0, 1), false);
            grid.set_walkable(Cell::new(1, 0), false);
        }
        let mut pf = PathFinder::new(Movement::Straight);
        assert_eq!(
            pf.find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 4.5)),
            None
        );
    }

    #[test]
    fn unwalkable_start_can_path_away() {
        let mut ctx = open_5x5();
        ctx.grid_mut().unwrap().set_walkable(Cell::new(0, 0), false);
        let mut pf = PathFinder::new(Movement::Straight);
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 0.5))
            .unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], WorldPos::xy(0.0, 0.0));
    }

    #[test]
    fn unwalkable_target_returns_none() {
        let mut ctx = open_5x5();
        ctx.grid_mut().unwrap().set_walkable(Cell::new(4, 0), false);
        let mut pf = PathFinder::new(Movement::Straight);
        assert_eq!(
            pf.find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 0.5)),
            None
        );
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        let mut ctx = open_5x5();
        {
            let grid = ctx.grid_mut().unwrap();
            for x in 0..4 {
                grid.set_walkable(Cell::new(x, 2), false);
            }
        }
        let a = WorldPos::xy(0.5, 0.5);
        let b = WorldPos::xy(0.5, 4.5);

        let mut pf = PathFinder::new(Movement::Straight);
        let first = pf.find_path(&ctx, a, b).unwrap();
        let second = pf.find_path(&ctx, a, b).unwrap();
        assert_eq!(first, second);

        // A fresh finder agrees too.
        let mut other = PathFinder::new(Movement::Straight);
        assert_eq!(other.find_path(&ctx, a, b).unwrap(), first);
    }

    #[test]
    fn walkability_changes_apply_between_searches() {
        let mut ctx = open_5x5();
        let a = WorldPos::xy(0.5, 0.5);
        let b = WorldPos::xy(4.5, 0.5);
        let mut pf = PathFinder::new(Movement::Straight);

        assert_eq!(pf.find_path(&ctx, a, b).unwrap().len(), 5);

        ctx.grid_mut().unwrap().set_walkable(Cell::new(2, 0), false);
        assert_eq!(pf.find_path(&ctx, a, b).unwrap().len(), 7);

        ctx.grid_mut().unwrap().set_walkable(Cell::new(2, 0), true);
        assert_eq!(pf.find_path(&ctx, a, b).unwrap().len(), 5);
    }

    #[test]
    fn diagonal_movement_cuts_the_corner() {
        let ctx = open_5x5();
        let mut pf = PathFinder::new(Movement::Diagonal);
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(4.5, 4.5))
            .unwrap();
        // The only 4-step route is the pure diagonal.
        assert_eq!(
            path,
            vec![
                WorldPos::xy(0.0, 0.0),
                WorldPos::xy(1.0, 1.0),
                WorldPos::xy(2.0, 2.0),
                WorldPos::xy(3.0, 3.0),
                WorldPos::xy(4.0, 4.0),
            ]
        );
    }

    #[test]
    fn diagonal_detour_stays_adjacent() {
        let mut ctx = open_5x5();
        {
            let grid = ctx.grid_mut().unwrap();
            for x in 0..4 {
                grid.set_walkable(Cell::new(x, 2), false);
            }
        }
        let mut pf = PathFinder::new(Movement::Diagonal);
        let path = pf
            .find_path(&ctx, WorldPos::xy(0.5, 0.5), WorldPos::xy(0.5, 4.5))
            .unwrap();
        let cells = path_cells(&ctx, &path);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(*cells.last().unwrap(), Cell::new(0, 4));
        for w in cells.windows(2) {
            assert_eq!(chebyshev(w[0], w[1]), 1);
        }
    }

    #[derive(Debug)]
    struct Marker;

    impl Ability for Marker {
        fn id(&self) -> i32 {
            1
        }
    }

    #[test]
    fn ability_tags_do_not_affect_search() {
        let a = WorldPos::xy(0.5, 0.5);
        let b = WorldPos::xy(4.5, 0.5);
        let mut pf = PathFinder::new(Movement::Straight);

        let ctx = open_5x5();
        let baseline = pf.find_path(&ctx, a, b).unwrap();

        let mut tagged = open_5x5();
        {
            let grid = tagged.grid_mut().unwrap();
            for x in 0..5 {
                grid.set_ability(Cell::new(x, 0), Rc::new(Marker));
            }
        }
        assert_eq!(pf.find_path(&tagged, a, b).unwrap(), baseline);
    }

    #[test]
    fn finder_survives_map_switches() {
        let mut pf = PathFinder::new(Movement::Straight);

        let big = active_ctx(Grid::new(Point::ZERO, Point::new(10, 10)).unwrap());
        let path = pf
            .find_path(&big, WorldPos::xy(0.5, 0.5), WorldPos::xy(9.5, 9.5))
            .unwrap();
        assert_eq!(path.len(), 19);

        // Smaller map afterwards: stale arena state must not leak in.
        let small = active_ctx(Grid::new(Point::ZERO, Point::new(3, 3)).unwrap());
        let path = pf
            .find_path(&small, WorldPos::xy(0.5, 0.5), WorldPos::xy(2.5, 2.5))
            .unwrap();
        assert_eq!(path.len(), 5);

        let path = pf
            .find_path(&big, WorldPos::xy(0.5, 0.5), WorldPos::xy(9.5, 0.5))
            .unwrap();
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn random_walls_produce_valid_paths() {
        use rand::{RngExt, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(0xA5);
        let mut grid = Grid::new(Point::ZERO, Point::new(20, 20)).unwrap();
        for c in grid.cells() {
            if rng.random::<f64>() < 0.25 {
                grid.set_walkable(c, false);
            }
        }
        let start_cell = Cell::new(0, 0);
        let target_cell = Cell::new(19, 19);
        grid.set_walkable(start_cell, true);
        grid.set_walkable(target_cell, true);
        let ctx = active_ctx(grid);

        let a = WorldPos::xy(0.5, 0.5);
        let b = WorldPos::xy(19.5, 19.5);

        for movement in [Movement::Straight, Movement::Diagonal] {
            let mut pf = PathFinder::new(movement);
            let first = pf.find_path(&ctx, a, b);
            assert_eq!(pf.find_path(&ctx, a, b), first);

            let Some(path) = first else { continue };
            let cells = path_cells(&ctx, &path);
            assert_eq!(cells[0], start_cell);
            assert_eq!(*cells.last().unwrap(), target_cell);
            let grid = ctx.grid().unwrap();
            for w in cells.windows(2) {
                match movement {
                    Movement::Straight => assert_eq!(manhattan(w[0], w[1]), 1),
                    Movement::Diagonal => assert_eq!(chebyshev(w[0], w[1]), 1),
                }
            }
            for &c in &cells[1..] {
                assert!(grid.is_walkable(c));
            }
        }
    }
}

//! Terminal demo: builds a map grid, carves a wall with a gap, runs the
//! path finder between the lower corners and renders the route as ASCII.
//!
//! ```text
//! cargo run -- --width 16 --height 10 --diagonal
//! ```

use std::collections::HashSet;
use std::error::Error;

use clap::Parser;

use navgrid_core::{Cell, Grid, Movement, Point, WorldPos};
use navgrid_paths::{MapContext, PathFinder};

#[derive(Parser)]
#[command(name = "navgrid-demo", about = "Grid pathfinding demo")]
struct Args {
    /// Grid width in cells.
    #[arg(long, default_value_t = 12)]
    width: i32,

    /// Grid height in cells.
    #[arg(long, default_value_t = 8)]
    height: i32,

    /// Allow diagonal movement.
    #[arg(long)]
    diagonal: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut grid = Grid::new(Point::ZERO, Point::new(args.width, args.height))?;

    // Vertical wall down the middle, open only at the top row.
    let wall_x = args.width / 2;
    for y in 0..args.height - 1 {
        grid.set_walkable(Cell::new(wall_x, y), false);
    }

    let mut ctx = MapContext::new();
    ctx.activate_map(grid);

    let movement = if args.diagonal {
        Movement::Diagonal
    } else {
        Movement::Straight
    };
    let mut finder = PathFinder::new(movement);

    let start = WorldPos::xy(0.5, 0.5);
    let target = WorldPos::xy(args.width as f32 - 0.5, 0.5);

    match (finder.find_path(&ctx, start, target), ctx.grid()) {
        (Some(path), Some(grid)) => {
            log::info!("{} waypoints, {} steps", path.len(), path.len() - 1);
            render(grid, &path, start, target);
        }
        _ => println!("no path from {start} to {target}"),
    }
    Ok(())
}

fn render(grid: &Grid, path: &[WorldPos], start: WorldPos, target: WorldPos) {
    let route: HashSet<Cell> = path.iter().filter_map(|&wp| grid.cell_at(wp)).collect();
    let start_cell = grid.cell_at(start);
    let target_cell = grid.cell_at(target);

    for y in (0..grid.height()).rev() {
        let mut row = String::with_capacity(grid.width() as usize);
        for x in 0..grid.width() {
            let c = Cell::new(x, y);
            let ch = if start_cell == Some(c) {
                'S'
            } else if target_cell == Some(c) {
                'T'
            } else if route.contains(&c) {
                '*'
            } else if !grid.is_walkable(c) {
                '#'
            } else {
                '.'
            };
            row.push(ch);
        }
        println!("{row}");
    }
    println!("{} steps", path.len() - 1);
}

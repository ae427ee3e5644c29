use navgrid_core::Grid;

/// Owner of the currently active map's grid.
///
/// The surrounding application activates a grid when a map becomes active
/// and deactivates it on teardown; at most one grid is active at a time,
/// and activating a new one replaces the old wholesale. The context is
/// passed explicitly to [`PathFinder::find_path`]; there is no ambient
/// global.
///
/// [`PathFinder::find_path`]: crate::PathFinder::find_path
#[derive(Debug, Default)]
pub struct MapContext {
    grid: Option<Grid>,
}

impl MapContext {
    /// Create a context with no active map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `grid` the active map's grid, discarding any previous one.
    pub fn activate_map(&mut self, grid: Grid) {
        self.grid = Some(grid);
    }

    /// Clear the active grid. Called when the map is torn down.
    pub fn deactivate_map(&mut self) {
        self.grid = None;
    }

    /// Whether a map is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.grid.is_some()
    }

    /// The active grid, if any.
    #[inline]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Mutable access to the active grid, for walkability and ability
    /// changes between searches.
    #[inline]
    pub fn grid_mut(&mut self) -> Option<&mut Grid> {
        self.grid.as_mut()
    }
}

//! Navigation grid
//!
//! Scans static geometry into cells, each carrying walkability and vertical
//! clearance. Edge classification lives in [`super::edge`].

use std::collections::VecDeque;

use glam::Vec2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::edge::{ActionPenalties, Edge, classify};
use crate::physics::{CollisionQuery, LayerMask, TriggerScope};

/// Overlap boxes are shrunk so neighbouring geometry touching a cell's edge
/// does not mark it blocked
const OVERLAP_SHRINK: f32 = 0.95;

/// Grid construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World-space center of the grid
    pub origin: Vec2,
    /// World-space size covered by the grid
    pub world_size: Vec2,
    /// Edge length of one square cell
    pub cell_diameter: f32,
    /// Layers that count as obstacles
    pub obstacle_mask: LayerMask,
    /// Maximum cells counted when measuring clearance
    pub clearance_lookahead: u8,
    /// Breadth-first depth used to snap off-grid queries
    pub snap_radius: usize,
    /// Per-action traversal penalties
    pub penalties: ActionPenalties,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            world_size: Vec2::new(20.0, 10.0),
            cell_diameter: 0.5,
            obstacle_mask: LayerMask::GROUND,
            clearance_lookahead: 4,
            snap_radius: 2,
            penalties: ActionPenalties::default(),
        }
    }
}

impl GridConfig {
    /// Set the world-space area covered by the grid
    #[must_use]
    pub fn with_bounds(mut self, origin: Vec2, world_size: Vec2) -> Self {
        self.origin = origin;
        self.world_size = world_size;
        self
    }

    /// Set the cell size
    #[must_use]
    pub fn with_cell_diameter(mut self, cell_diameter: f32) -> Self {
        self.cell_diameter = cell_diameter;
        self
    }

    /// Set the obstacle layers
    #[must_use]
    pub fn with_obstacle_mask(mut self, mask: LayerMask) -> Self {
        self.obstacle_mask = mask;
        self
    }

    /// Set the clearance lookahead depth
    #[must_use]
    pub fn with_clearance_lookahead(mut self, lookahead: u8) -> Self {
        self.clearance_lookahead = lookahead;
        self
    }

    /// Set the action penalties
    #[must_use]
    pub fn with_penalties(mut self, penalties: ActionPenalties) -> Self {
        self.penalties = penalties;
        self
    }

    /// Config whose cells line up one-to-one with a tile grid whose
    /// bottom-left corner is at `bottom_left`
    #[must_use]
    pub fn for_tiles(bottom_left: Vec2, width: usize, height: usize, tile_size: f32) -> Self {
        let world_size = Vec2::new(width as f32, height as f32) * tile_size;
        Self {
            origin: bottom_left + world_size * 0.5,
            world_size,
            cell_diameter: tile_size,
            ..Default::default()
        }
    }
}

/// Integer grid coordinates, (0, 0) is the bottom-left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column
    pub x: usize,
    /// Row, growing upward
    pub y: usize,
}

impl CellCoord {
    /// Create a coordinate
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Offset by a signed delta, `None` if it would go below zero
    #[must_use]
    pub fn offset(self, dx: isize, dy: isize) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl From<(usize, usize)> for CellCoord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Grid coordinates
    pub coord: CellCoord,
    /// World-space center
    pub position: Vec2,
    /// Free of obstacle geometry
    pub walkable: bool,
    /// Contiguous walkable cells from here upward, this one included, capped
    /// at the lookahead depth. Zero exactly when not walkable.
    pub clearance: u8,
}

/// A 2D navigation grid
#[derive(Debug, Clone)]
pub struct Grid {
    config: GridConfig,
    /// Width in cells
    width: usize,
    /// Height in cells
    height: usize,
    /// Row-major, row 0 at the bottom
    cells: Vec<Cell>,
    /// World position of the bottom-left corner
    bottom_left: Vec2,
    /// Set once a build has completed
    ready: bool,
}

impl Grid {
    /// Create an unbuilt grid
    ///
    /// Every query panics until [`Grid::build`] has run.
    ///
    /// # Panics
    ///
    /// Panics if the cell diameter is not positive or the clearance
    /// lookahead is zero
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        assert!(
            config.cell_diameter > 0.0,
            "cell diameter must be positive, got {}",
            config.cell_diameter
        );
        assert!(
            config.clearance_lookahead > 0,
            "clearance lookahead must be at least 1"
        );

        let width = ((config.world_size.x / config.cell_diameter).round() as usize).max(1);
        let height = ((config.world_size.y / config.cell_diameter).round() as usize).max(1);
        let bottom_left = config.origin - config.world_size * 0.5;

        Self {
            config,
            width,
            height,
            cells: Vec::new(),
            bottom_left,
            ready: false,
        }
    }

    /// Scan `world` and (re)compute every cell.
    ///
    /// Trigger volumes are ignored for the duration of the scan; the world's
    /// previous query mode is restored afterwards.
    pub fn build<W: CollisionQuery + ?Sized>(&mut self, world: &mut W) {
        self.ready = false;
        let scope = TriggerScope::ignore_triggers(world);

        let half = Vec2::splat(self.config.cell_diameter * OVERLAP_SHRINK * 0.5);
        let mut cells = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let coord = CellCoord::new(x, y);
                let position = self.cell_center(coord);
                let walkable = !scope.overlap_box(position, half, self.config.obstacle_mask);
                cells.push(Cell {
                    coord,
                    position,
                    walkable,
                    clearance: 0,
                });
            }
        }
        drop(scope);

        self.cells = cells;
        self.compute_clearance();
        self.ready = true;

        log::info!(
            "Built navigation grid {}x{} ({} walkable cells)",
            self.width,
            self.height,
            self.walkable_count()
        );
    }

    /// Count walkable cells upward from every cell, capped at the lookahead
    fn compute_clearance(&mut self) {
        let lookahead = usize::from(self.config.clearance_lookahead);
        for x in 0..self.width {
            // Walk each column top-down so a cell's run is the one above plus itself
            let mut run = 0usize;
            for y in (0..self.height).rev() {
                let index = y * self.width + x;
                if self.cells[index].walkable {
                    run += 1;
                } else {
                    run = 0;
                }
                self.cells[index].clearance = run.min(lookahead) as u8;
            }
        }
    }

    #[track_caller]
    fn assert_ready(&self) {
        assert!(self.ready, "navigation grid queried before build completed");
    }

    /// Whether a build has completed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid configuration
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Cell edge length in world units
    #[must_use]
    pub fn cell_diameter(&self) -> f32 {
        self.config.cell_diameter
    }

    /// Flat index of a coordinate
    #[must_use]
    pub fn index(&self, coord: CellCoord) -> usize {
        coord.y * self.width + coord.x
    }

    /// Whether the coordinate lies inside the grid
    #[must_use]
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Cell at a coordinate, `None` outside the grid
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.assert_ready();
        if !self.contains(coord) {
            return None;
        }
        self.cells.get(self.index(coord))
    }

    /// Cell by flat index
    #[must_use]
    pub fn cell_at_index(&self, index: usize) -> &Cell {
        self.assert_ready();
        &self.cells[index]
    }

    /// Iterate over all cells, bottom row first
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.assert_ready();
        self.cells.iter()
    }

    /// Check if a cell is walkable; outside the grid is not
    #[must_use]
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.cell(coord).is_some_and(|c| c.walkable)
    }

    /// Clearance of a cell; outside the grid is zero
    #[must_use]
    pub fn clearance(&self, coord: CellCoord) -> u8 {
        self.cell(coord).map_or(0, |c| c.clearance)
    }

    /// Number of walkable cells
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.walkable).count()
    }

    /// World position of a cell center
    #[must_use]
    pub fn cell_center(&self, coord: CellCoord) -> Vec2 {
        self.bottom_left
            + Vec2::new(
                (coord.x as f32 + 0.5) * self.config.cell_diameter,
                (coord.y as f32 + 0.5) * self.config.cell_diameter,
            )
    }

    /// Map a world position to the nearest cell, clamping into the grid
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> CellCoord {
        self.assert_ready();
        let local = (position - self.bottom_left) / self.config.cell_diameter;
        let clamp = |value: f32, len: usize| -> usize {
            if value.is_nan() || value < 0.0 {
                0
            } else {
                (value.floor() as usize).min(len - 1)
            }
        };
        CellCoord::new(clamp(local.x, self.width), clamp(local.y, self.height))
    }

    /// Outgoing edges of a cell, classified by the locomotion they require
    #[must_use]
    pub fn neighbors(&self, coord: CellCoord) -> SmallVec<[Edge; 4]> {
        self.assert_ready();
        classify(self, coord, &self.config.penalties)
    }

    /// Nearest walkable cell within `radius` grid steps of `coord`.
    ///
    /// Breadth-first over the four grid neighbours regardless of edges, so a
    /// query point drifted into geometry lands on the closest free cell.
    #[must_use]
    pub fn nearest_walkable(&self, coord: CellCoord, radius: usize) -> Option<CellCoord> {
        self.assert_ready();
        if !self.contains(coord) {
            return None;
        }

        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([(coord, 0usize)]);
        visited.insert(coord);

        while let Some((current, depth)) = queue.pop_front() {
            if self.is_walkable(current) {
                return Some(current);
            }
            if depth == radius {
                continue;
            }

            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let Some(next) = current.offset(dx, dy) else {
                    continue;
                };
                if self.contains(next) && visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        None
    }

    /// Render the grid as text, top row first: `#` blocked, digits are clearance
    #[must_use]
    pub fn describe(&self) -> String {
        self.assert_ready();
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = &self.cells[y * self.width + x];
                if cell.walkable {
                    out.push(char::from_digit(u32::from(cell.clearance.min(9)), 10).unwrap_or('?'));
                } else {
                    out.push('#');
                }
            }
            out.push('\n');
        }
        out
    }
}

/// One-shot grid construction
#[derive(Debug, Clone, Default)]
pub struct GridBuilder {
    config: GridConfig,
}

impl GridBuilder {
    /// Create a builder for the given config
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    /// Scan `world` into a ready grid
    pub fn build<W: CollisionQuery + ?Sized>(self, world: &mut W) -> Grid {
        let mut grid = Grid::new(self.config);
        grid.build(world);
        grid
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::physics::{BoxWorld, StaticGeometry, TileLayout};

    /// Build a unit-cell grid from a layout, one cell per tile
    pub(crate) fn grid_from_layout(text: &str) -> Grid {
        let layout = TileLayout::parse(text).unwrap();
        let mut world = BoxWorld::new();
        layout.populate(&mut world, Vec2::ZERO, 1.0, LayerMask::GROUND);
        let config = GridConfig::for_tiles(Vec2::ZERO, layout.width(), layout.height(), 1.0);
        GridBuilder::new(config).build(&mut world)
    }

    /// Width x height unit-cell grid with the given blocked cells
    pub(crate) fn grid_with_walls(width: usize, height: usize, walls: &[(usize, usize)]) -> Grid {
        let mut world = BoxWorld::new();
        for &(x, y) in walls {
            world.add_solid(
                Vec2::new(x as f32 + 0.5, y as f32 + 0.5),
                Vec2::splat(0.5),
                LayerMask::GROUND,
            );
        }
        let config = GridConfig::for_tiles(Vec2::ZERO, width, height, 1.0);
        GridBuilder::new(config).build(&mut world)
    }

    #[test]
    fn test_dimensions_and_centers() {
        let grid = grid_with_walls(6, 4, &[]);

        assert_eq!(grid.width(), 6);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.cell_center(CellCoord::new(0, 0)), Vec2::new(0.5, 0.5));
        assert_eq!(grid.cell_center(CellCoord::new(5, 3)), Vec2::new(5.5, 3.5));
    }

    #[test]
    fn test_world_to_cell_clamps() {
        let grid = grid_with_walls(6, 4, &[]);

        assert_eq!(grid.world_to_cell(Vec2::new(2.3, 1.9)), CellCoord::new(2, 1));
        assert_eq!(grid.world_to_cell(Vec2::new(-5.0, 1.0)), CellCoord::new(0, 1));
        assert_eq!(grid.world_to_cell(Vec2::new(50.0, 50.0)), CellCoord::new(5, 3));
    }

    #[test]
    fn test_walls_block_cells() {
        let grid = grid_with_walls(4, 4, &[(1, 2)]);

        assert!(!grid.is_walkable(CellCoord::new(1, 2)));
        assert!(grid.is_walkable(CellCoord::new(1, 1)));
        // Touching the wall's edge does not block the neighbour
        assert!(grid.is_walkable(CellCoord::new(0, 2)));
        assert!(!grid.is_walkable(CellCoord::new(9, 9)));
    }

    #[test]
    fn test_clearance_zero_iff_blocked() {
        let grid = grid_from_layout(
            "
#.....
#..#..
#..#..
......
.####.
......
",
        );

        for cell in grid.cells() {
            assert_eq!(cell.clearance == 0, !cell.walkable, "cell {}", cell.coord);
        }
    }

    #[test]
    fn test_clearance_matches_manual_count() {
        let grid = grid_from_layout(
            "
......
..#...
......
......
......
.#....
......
",
        );
        let lookahead = usize::from(grid.config().clearance_lookahead);

        for cell in grid.cells().filter(|c| c.walkable) {
            let mut count = 0;
            let mut y = cell.coord.y;
            while y < grid.height() && grid.is_walkable(CellCoord::new(cell.coord.x, y)) {
                count += 1;
                y += 1;
            }
            assert_eq!(usize::from(cell.clearance), count.min(lookahead));
            assert!(usize::from(cell.clearance) <= lookahead);
        }

        // Capped at the default lookahead of 4
        assert_eq!(grid.clearance(CellCoord::new(0, 0)), 4);
        // Stops under the block at (2, 5)
        assert_eq!(grid.clearance(CellCoord::new(2, 3)), 2);
        // Stops at the top edge
        assert_eq!(grid.clearance(CellCoord::new(0, 6)), 1);
    }

    #[test]
    fn test_triggers_do_not_block_and_mode_restored() {
        let mut world = BoxWorld::new();
        world.add_trigger(Vec2::new(1.5, 1.5), Vec2::splat(0.5), LayerMask::GROUND);
        world.add_solid(Vec2::new(2.5, 1.5), Vec2::splat(0.5), LayerMask::GROUND);
        world.set_queries_hit_triggers(true);

        let config = GridConfig::for_tiles(Vec2::ZERO, 4, 3, 1.0);
        let grid = GridBuilder::new(config).build(&mut world);

        assert!(grid.is_walkable(CellCoord::new(1, 1)));
        assert!(!grid.is_walkable(CellCoord::new(2, 1)));
        assert!(world.queries_hit_triggers());
    }

    #[test]
    fn test_obstacle_mask_filters_layers() {
        let mut world = BoxWorld::new();
        world.add_solid(Vec2::new(0.5, 0.5), Vec2::splat(0.5), LayerMask::layer(5));

        let config = GridConfig::for_tiles(Vec2::ZERO, 2, 2, 1.0);
        let grid = GridBuilder::new(config).build(&mut world);

        assert!(grid.is_walkable(CellCoord::new(0, 0)));
    }

    #[test]
    fn test_nearest_walkable() {
        let grid = grid_with_walls(5, 5, &[(2, 2), (1, 2), (3, 2), (2, 1)]);

        assert_eq!(grid.nearest_walkable(CellCoord::new(0, 0), 2), Some(CellCoord::new(0, 0)));
        // (2, 3) is one step up from (2, 2)
        assert_eq!(grid.nearest_walkable(CellCoord::new(2, 2), 2), Some(CellCoord::new(2, 3)));
        assert_eq!(grid.nearest_walkable(CellCoord::new(2, 2), 0), None);
    }

    #[test]
    fn test_describe() {
        let grid = grid_with_walls(3, 2, &[(1, 0)]);

        assert_eq!(grid.describe(), "111\n2#2\n");
    }

    #[test]
    #[should_panic(expected = "queried before build")]
    fn test_query_before_build_panics() {
        let grid = Grid::new(GridConfig::default());

        let _ = grid.world_to_cell(Vec2::ZERO);
    }

    #[test]
    fn test_builder_on_rapier_world() {
        let mut physics = crate::physics::Physics::new();
        physics.add_box(Vec2::new(1.5, 0.5), Vec2::splat(0.5), LayerMask::GROUND);
        physics.add_sensor_box(Vec2::new(2.5, 0.5), Vec2::splat(0.5), LayerMask::GROUND);

        let config = GridConfig::for_tiles(Vec2::ZERO, 4, 2, 1.0);
        let grid = GridBuilder::new(config).build(&mut physics);

        assert!(!grid.is_walkable(CellCoord::new(1, 0)));
        assert!(grid.is_walkable(CellCoord::new(2, 0)));
        assert!(physics.queries_hit_triggers());
    }
}

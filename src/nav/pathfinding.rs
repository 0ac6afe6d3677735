//! A* pathfinding over the navigation grid
//!
//! Edge costs come from [`super::edge`]: a distance term plus an action
//! penalty. The heuristic is the octile distance alone; penalties are only
//! ever added through `g`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use glam::Vec2;

use super::edge::{Action, Edge, octile_distance};
use super::grid::{CellCoord, Grid};
use crate::core::PlannerStats;

/// One step of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Destination cell of this step
    pub cell: CellCoord,
    /// World-space center of the cell
    pub position: Vec2,
    /// Locomotion needed to reach the cell from the previous one
    pub action: Action,
    /// World-space center of the wall cell a Climb step runs along
    pub wall: Option<Vec2>,
    /// Cumulative cost from the start cell
    pub cost: u32,
}

/// Result of pathfinding, start cell excluded
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Build a path from waypoints in travel order
    #[must_use]
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Check if the path has no waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Final waypoint
    #[must_use]
    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// All waypoints in travel order
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Iterate over waypoints
    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    /// Cost of the whole path
    #[must_use]
    pub fn total_cost(&self) -> u32 {
        self.waypoints.last().map_or(0, |w| w.cost)
    }

    /// Whether any step uses `action`
    #[must_use]
    pub fn uses(&self, action: Action) -> bool {
        self.waypoints.iter().any(|w| w.action == action)
    }
}

/// Reasons a target cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// The query point lies in geometry and no walkable cell is within the
    /// snap radius
    OffGrid {
        /// Cell the query point mapped to
        cell: CellCoord,
    },
    /// Every reachable cell was expanded without meeting the target
    Exhausted {
        /// Cells expanded before giving up
        expanded: usize,
    },
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OffGrid { cell } => {
                write!(f, "unreachable target: no walkable cell near {cell}")
            }
            Self::Exhausted { expanded } => {
                write!(f, "unreachable target: open set exhausted after {expanded} cells")
            }
        }
    }
}

impl std::error::Error for PathError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unseen,
    Open,
    Closed,
}

/// Open set entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_cost: u32,
    h_cost: u32,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap: lowest f, then lowest h, then lowest index
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-search state indexed by cell, reset before every run
#[derive(Debug, Default)]
struct SearchRecords {
    g_cost: Vec<u32>,
    h_cost: Vec<u32>,
    parent: Vec<Option<Edge>>,
    state: Vec<NodeState>,
    open: BinaryHeap<OpenEntry>,
}

impl SearchRecords {
    fn reset(&mut self, cell_count: usize) {
        self.g_cost.clear();
        self.g_cost.resize(cell_count, u32::MAX);
        self.h_cost.clear();
        self.h_cost.resize(cell_count, 0);
        self.parent.clear();
        self.parent.resize(cell_count, None);
        self.state.clear();
        self.state.resize(cell_count, NodeState::Unseen);
        self.open.clear();
    }
}

/// A* planner.
///
/// Owns its search records, so one planner runs at most one search at a
/// time. The grid is borrowed per query.
#[derive(Debug, Default)]
pub struct PathPlanner {
    records: SearchRecords,
    stats: PlannerStats,
    last_expanded: usize,
}

impl PathPlanner {
    /// Create a planner with empty records
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics over recent searches
    #[must_use]
    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    /// Cells expanded by the most recent search
    #[must_use]
    pub fn last_expanded(&self) -> usize {
        self.last_expanded
    }

    /// Find a path between two world positions
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the target cannot be reached
    ///
    /// # Panics
    ///
    /// Panics if the grid has not been built
    pub fn find_path(&mut self, grid: &Grid, start: Vec2, target: Vec2) -> Result<Path, PathError> {
        let started = Instant::now();
        self.last_expanded = 0;
        let result = self.search(grid, start, target);
        self.stats
            .record_search(started.elapsed(), self.last_expanded, result.is_ok());

        match &result {
            Ok(path) => log::debug!(
                "Path found: {} waypoints, cost {}, {} cells expanded",
                path.len(),
                path.total_cost(),
                self.last_expanded
            ),
            Err(e) => log::warn!("No path from {start} to {target}: {e}"),
        }
        result
    }

    /// Map a world point to a walkable cell, snapping out of geometry
    pub(crate) fn snap(grid: &Grid, position: Vec2) -> Result<CellCoord, PathError> {
        let cell = grid.world_to_cell(position);
        if grid.is_walkable(cell) {
            return Ok(cell);
        }

        let snapped = grid
            .nearest_walkable(cell, grid.config().snap_radius)
            .ok_or(PathError::OffGrid { cell })?;
        log::debug!("Snapped off-grid query {cell} to {snapped}");
        Ok(snapped)
    }

    fn search(&mut self, grid: &Grid, start: Vec2, target: Vec2) -> Result<Path, PathError> {
        let start = Self::snap(grid, start)?;
        let target = Self::snap(grid, target)?;
        if start == target {
            return Ok(Path::default());
        }

        self.records.reset(grid.width() * grid.height());
        let start_index = grid.index(start);
        let target_index = grid.index(target);

        let h = octile_distance(start, target);
        self.records.g_cost[start_index] = 0;
        self.records.h_cost[start_index] = h;
        self.records.state[start_index] = NodeState::Open;
        self.records.open.push(OpenEntry {
            f_cost: h,
            h_cost: h,
            index: start_index,
        });

        while let Some(current) = self.records.open.pop() {
            let index = current.index;
            if self.records.state[index] == NodeState::Closed {
                continue;
            }
            self.records.state[index] = NodeState::Closed;
            self.last_expanded += 1;

            if index == target_index {
                return Ok(self.retrace(grid, start_index, target_index));
            }

            let coord = grid.cell_at_index(index).coord;
            let g = self.records.g_cost[index];
            for edge in grid.neighbors(coord) {
                let next = grid.index(edge.to);
                let state = self.records.state[next];
                if state == NodeState::Closed {
                    continue;
                }

                let tentative_g = g + edge.cost();
                if state == NodeState::Unseen || tentative_g < self.records.g_cost[next] {
                    let h = octile_distance(edge.to, target);
                    self.records.g_cost[next] = tentative_g;
                    self.records.h_cost[next] = h;
                    self.records.parent[next] = Some(edge);
                    self.records.state[next] = NodeState::Open;
                    self.records.open.push(OpenEntry {
                        f_cost: tentative_g + h,
                        h_cost: h,
                        index: next,
                    });
                }
            }
        }

        Err(PathError::Exhausted {
            expanded: self.last_expanded,
        })
    }

    /// Walk parents back from the target and reverse into travel order
    fn retrace(&self, grid: &Grid, start_index: usize, target_index: usize) -> Path {
        let mut waypoints = Vec::new();
        let mut current = target_index;

        while current != start_index {
            let Some(edge) = self.records.parent[current] else {
                break;
            };
            let cell = grid.cell_at_index(current);
            waypoints.push(Waypoint {
                cell: cell.coord,
                position: cell.position,
                action: edge.action,
                wall: edge.wall.map(|wall| grid.cell_center(wall)),
                cost: self.records.g_cost[current],
            });
            current = grid.index(edge.from);
        }

        waypoints.reverse();
        Path::new(waypoints)
    }
}

/// Find a path with a one-off planner
///
/// # Errors
///
/// Returns [`PathError`] when the target cannot be reached
pub fn find_path(grid: &Grid, start: Vec2, target: Vec2) -> Result<Path, PathError> {
    PathPlanner::new().find_path(grid, start, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{grid_from_layout, grid_with_walls};

    fn center(x: usize, y: usize) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    fn cells(path: &Path) -> Vec<(usize, usize)> {
        path.iter().map(|w| (w.cell.x, w.cell.y)).collect()
    }

    #[test]
    fn test_direct_path() {
        let grid = grid_with_walls(10, 5, &[]);

        let path = find_path(&grid, center(0, 0), center(3, 0)).unwrap();

        // Start cell excluded
        assert_eq!(cells(&path), vec![(1, 0), (2, 0), (3, 0)]);
        assert!(path.iter().all(|w| w.action == Action::Walk));
        assert_eq!(path.total_cost(), 30);
        assert_eq!(path.last().unwrap().position, center(3, 0));
    }

    #[test]
    fn test_same_cell_is_empty_path() {
        let grid = grid_with_walls(4, 4, &[]);

        let path = find_path(&grid, Vec2::new(1.2, 1.2), Vec2::new(1.8, 1.7)).unwrap();

        assert!(path.is_empty());
    }

    #[test]
    fn test_no_path_across_unbroken_wall() {
        let walls: Vec<(usize, usize)> = (0..6).map(|y| (3, y)).collect();
        let grid = grid_with_walls(7, 6, &walls);

        let result = find_path(&grid, center(0, 0), center(6, 0));

        assert!(matches!(result, Err(PathError::Exhausted { .. })));
    }

    #[test]
    fn test_cost_is_non_decreasing() {
        let grid = grid_with_walls(8, 6, &[(2, 0), (2, 1), (5, 2), (5, 3), (6, 3)]);

        let path = find_path(&grid, center(0, 0), center(7, 0)).unwrap();

        assert!(!path.is_empty());
        for pair in path.waypoints().windows(2) {
            assert!(pair[0].cost <= pair[1].cost);
        }
    }

    #[test]
    fn test_avoids_climb_penalty_on_equal_routes() {
        // The wall at (3, 0) turns the upward edge at x = 2 into a climb
        let grid = grid_with_walls(4, 5, &[(3, 0)]);
        let climb = grid
            .neighbors(CellCoord::new(2, 0))
            .into_iter()
            .find(|e| e.to == CellCoord::new(2, 1))
            .unwrap();
        assert_eq!(climb.action, Action::Climb);

        let path = find_path(&grid, center(0, 0), center(2, 1)).unwrap();

        assert_eq!(path.len(), 3);
        assert!(!path.uses(Action::Climb));
        assert_eq!(path.total_cost(), 30);
    }

    #[test]
    fn test_low_corridor_uses_crouch() {
        // Ceiling at y = 2 over x = 1..=3 leaves a corridor two cells high
        let grid = grid_with_walls(5, 4, &[(1, 2), (2, 2), (3, 2)]);

        let path = find_path(&grid, center(0, 0), center(4, 0)).unwrap();

        assert_eq!(cells(&path), vec![(1, 0), (2, 0), (3, 0), (4, 0)]);
        let actions: Vec<Action> = path.iter().map(|w| w.action).collect();
        assert_eq!(
            actions,
            vec![Action::Crouch, Action::Crouch, Action::Crouch, Action::Walk]
        );
        assert_eq!(path.total_cost(), 85);
    }

    #[test]
    fn test_climbs_over_wall_and_falls_back_down() {
        let grid = grid_with_walls(5, 5, &[(2, 0), (2, 1), (2, 2)]);

        let path = find_path(&grid, center(0, 0), center(4, 0)).unwrap();
        let route = cells(&path);

        assert_eq!(route.last(), Some(&(4, 0)));
        let crossing = route.iter().position(|&c| c == (2, 3)).unwrap();

        // Reaches y = 3 by climbing beside the wall
        let climb = path.iter().position(|w| w.action == Action::Climb).unwrap();
        assert!(climb < crossing);
        assert_eq!(path.get(climb).unwrap().cell.x, 1);

        // Only lateral moves and falls after the crossing
        let after = &path.waypoints()[crossing + 1..];
        assert!(after.iter().any(|w| w.action == Action::Fall));
        assert!(after.iter().all(|w| !matches!(w.action, Action::Climb | Action::Jump)));
        assert_eq!(path.total_cost(), 140);
    }

    #[test]
    fn test_route_from_layout() {
        let grid = grid_from_layout(
            "
.....
.....
.....
.#...
.#...
",
        );

        let path = find_path(&grid, center(0, 0), center(4, 0)).unwrap();

        assert_eq!(path.get(0).unwrap().action, Action::Climb);
        assert_eq!(path.get(1).unwrap().action, Action::Climb);
        assert_eq!(path.last().unwrap().cell, CellCoord::new(4, 0));
        assert_eq!(path.total_cost(), 100);

        // Climb steps point at the wall they run along
        assert_eq!(path.get(0).unwrap().wall, Some(center(1, 0)));
        assert_eq!(path.get(1).unwrap().wall, Some(center(1, 1)));
        assert!(path.iter().skip(2).all(|w| w.wall.is_none()));
    }

    #[test]
    fn test_off_grid_start_snaps() {
        let grid = grid_with_walls(6, 4, &[(0, 0)]);

        let path = find_path(&grid, center(0, 0), center(5, 0)).unwrap();

        assert_eq!(path.get(0).unwrap().cell, CellCoord::new(2, 0));
        assert_eq!(path.last().unwrap().cell, CellCoord::new(5, 0));
    }

    #[test]
    fn test_off_grid_beyond_radius_fails() {
        let mut walls = Vec::new();
        for x in 1..=5 {
            for y in 1..=5 {
                walls.push((x, y));
            }
        }
        let grid = grid_with_walls(7, 7, &walls);

        let result = find_path(&grid, center(0, 0), center(3, 3));

        assert_eq!(
            result,
            Err(PathError::OffGrid {
                cell: CellCoord::new(3, 3)
            })
        );
    }

    #[test]
    fn test_planner_reuse_across_grids() {
        let mut planner = PathPlanner::new();
        let small = grid_with_walls(4, 4, &[]);
        let large = grid_with_walls(12, 6, &[(5, 0), (5, 1)]);

        let first = planner.find_path(&large, center(0, 0), center(11, 0)).unwrap();
        let _ = planner.find_path(&small, center(0, 0), center(3, 0)).unwrap();
        let again = planner.find_path(&large, center(0, 0), center(11, 0)).unwrap();

        assert_eq!(first, again);
        assert_eq!(first, find_path(&large, center(0, 0), center(11, 0)).unwrap());
        assert_eq!(planner.stats().total_searches(), 3);
        assert!(planner.last_expanded() > 0);
    }

    #[test]
    fn test_failed_search_recorded() {
        let walls: Vec<(usize, usize)> = (0..4).map(|y| (2, y)).collect();
        let grid = grid_with_walls(5, 4, &walls);
        let mut planner = PathPlanner::new();

        assert!(planner.find_path(&grid, center(0, 0), center(4, 0)).is_err());
        assert_eq!(planner.stats().total_failures(), 1);
        assert_eq!(planner.stats().last_found(), Some(false));
    }
}

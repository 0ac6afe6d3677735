//! Navigation module
//!
//! Grid construction, locomotion-aware edge classification and A* search.

mod edge;
mod grid;
mod pathfinding;

pub use edge::{
    Action, ActionPenalties, CROUCH_CLEARANCE, DIAGONAL_COST, Edge, STANDING_CLEARANCE,
    STRAIGHT_COST, octile_distance,
};
pub use grid::{Cell, CellCoord, Grid, GridBuilder, GridConfig};
pub use pathfinding::{Path, PathError, PathPlanner, Waypoint, find_path};

#[cfg(test)]
pub(crate) use grid::tests::{grid_from_layout, grid_with_walls};

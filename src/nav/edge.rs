//! Edge classification
//!
//! Decides, for each of a cell's four neighbours, whether the agent can move
//! there and which locomotion it needs. Edges are plain values produced on
//! demand; nothing is written back to the grid.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::grid::{CellCoord, Grid};

/// Cost of one straight step in fixed-point units
pub const STRAIGHT_COST: u32 = 10;

/// Cost of one diagonal step in fixed-point units
pub const DIAGONAL_COST: u32 = 14;

/// Clearance the agent needs to stand
pub const STANDING_CLEARANCE: u8 = 3;

/// Clearance the agent needs to crouch through
pub const CROUCH_CLEARANCE: u8 = 2;

/// Locomotion required to traverse an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Upright lateral movement
    Walk,
    /// Lateral movement under a low ceiling
    Crouch,
    /// Upward movement through open space
    Jump,
    /// Upward movement along a wall
    Climb,
    /// Downward movement under gravity
    Fall,
}

impl Action {
    /// Action name for logging
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Walk => "Walk",
            Self::Crouch => "Crouch",
            Self::Jump => "Jump",
            Self::Climb => "Climb",
            Self::Fall => "Fall",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Extra cost added per edge, by action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPenalties {
    /// Walk penalty
    pub walk: u32,
    /// Crouch penalty
    pub crouch: u32,
    /// Jump penalty
    pub jump: u32,
    /// Climb penalty
    pub climb: u32,
    /// Fall penalty
    pub fall: u32,
}

impl ActionPenalties {
    /// Penalty for one action
    #[must_use]
    pub fn penalty(&self, action: Action) -> u32 {
        match action {
            Action::Walk => self.walk,
            Action::Crouch => self.crouch,
            Action::Jump => self.jump,
            Action::Climb => self.climb,
            Action::Fall => self.fall,
        }
    }
}

impl Default for ActionPenalties {
    fn default() -> Self {
        Self {
            walk: 0,
            crouch: 15,
            jump: 0,
            climb: 10,
            fall: 0,
        }
    }
}

/// A traversable connection between two neighbouring cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Origin cell
    pub from: CellCoord,
    /// Destination cell
    pub to: CellCoord,
    /// Locomotion required
    pub action: Action,
    /// Distance cost
    pub base_cost: u32,
    /// Action penalty
    pub penalty: u32,
    /// Wall cell beside the origin that a Climb edge is classified against
    pub wall: Option<CellCoord>,
}

impl Edge {
    /// Total traversal cost
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.base_cost + self.penalty
    }
}

/// Octile distance between two cells in fixed-point units
#[must_use]
pub fn octile_distance(a: CellCoord, b: CellCoord) -> u32 {
    let dx = a.x.abs_diff(b.x) as u32;
    let dy = a.y.abs_diff(b.y) as u32;
    if dx > dy {
        DIAGONAL_COST * dy + STRAIGHT_COST * (dx - dy)
    } else {
        DIAGONAL_COST * dx + STRAIGHT_COST * (dy - dx)
    }
}

/// An in-grid solid cell laterally adjacent to `from`, left side first
fn wall_beside(grid: &Grid, from: CellCoord) -> Option<CellCoord> {
    [from.offset(-1, 0), from.offset(1, 0)]
        .into_iter()
        .flatten()
        .find(|&c| grid.contains(c) && !grid.is_walkable(c))
}

/// Which action, if any, moves from `from` to the walkable cell `to`
fn action_between(grid: &Grid, from: CellCoord, to: CellCoord, dy: isize) -> Option<Action> {
    let clearance = grid.clearance(to);
    match dy {
        1 => {
            if wall_beside(grid, from).is_some() {
                Some(Action::Climb)
            } else if clearance >= STANDING_CLEARANCE {
                Some(Action::Jump)
            } else {
                None
            }
        }
        -1 => Some(Action::Fall),
        _ => {
            if clearance >= STANDING_CLEARANCE {
                Some(Action::Walk)
            } else if clearance == CROUCH_CLEARANCE {
                Some(Action::Crouch)
            } else {
                None
            }
        }
    }
}

/// Enumerate the edges leaving `from`
pub(super) fn classify(
    grid: &Grid,
    from: CellCoord,
    penalties: &ActionPenalties,
) -> SmallVec<[Edge; 4]> {
    let mut edges = SmallVec::new();

    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        let Some(to) = from.offset(dx, dy) else {
            continue;
        };
        if !grid.is_walkable(to) {
            continue;
        }

        if let Some(action) = action_between(grid, from, to, dy) {
            edges.push(Edge {
                from,
                to,
                action,
                base_cost: octile_distance(from, to),
                penalty: penalties.penalty(action),
                wall: if action == Action::Climb {
                    wall_beside(grid, from)
                } else {
                    None
                },
            });
        }
    }

    edges
}

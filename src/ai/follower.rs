//! Path following
//!
//! Turns the planner's waypoints into [`Motor`] commands once per control
//! tick. Local [`Sensors`] win over the plan for posture, and a vent reflex
//! can force a crouch without touching the stored path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Motor, Sensors};
use crate::nav::{Action, Grid, Path, PathError, PathPlanner, Waypoint};

/// Follower cadence and tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Seconds between replans
    pub replan_interval: f32,
    /// Seconds per control tick
    pub fixed_timestep: f32,
    /// Horizontal distance at which a waypoint counts as reached
    pub lateral_tolerance: f32,
    /// Vertical distance, feet to cell center, at which a waypoint counts
    /// as reached. Should exceed half a cell and stay under a full cell.
    pub vertical_tolerance: f32,
    /// Vertical speed while climbing (units/second)
    pub climb_speed: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            replan_interval: 0.5,
            fixed_timestep: 1.0 / 60.0,
            lateral_tolerance: 0.15,
            vertical_tolerance: 0.3,
            climb_speed: 3.0,
        }
    }
}

impl FollowerConfig {
    /// Set the replan interval
    #[must_use]
    pub fn with_replan_interval(mut self, seconds: f32) -> Self {
        self.replan_interval = seconds;
        self
    }

    /// Set the control tick length
    #[must_use]
    pub fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = seconds;
        self
    }

    /// Set the waypoint tolerances
    #[must_use]
    pub fn with_tolerances(mut self, lateral: f32, vertical: f32) -> Self {
        self.lateral_tolerance = lateral;
        self.vertical_tolerance = vertical;
        self
    }

    /// Set the climb speed
    #[must_use]
    pub fn with_climb_speed(mut self, speed: f32) -> Self {
        self.climb_speed = speed;
        self
    }
}

/// What the follower did on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerCommand {
    /// No waypoint left; the motor was stopped
    Idle,
    /// Crouched toward an opening ahead
    Vent {
        /// Waypoint being approached
        index: usize,
        /// Lateral target
        target_x: f32,
    },
    /// Executed the waypoint's action
    Step {
        /// Waypoint being approached
        index: usize,
        /// Action dispatched
        action: Action,
        /// Lateral target
        target_x: f32,
    },
}

/// Follows the most recently planned path
#[derive(Debug, Default)]
pub struct PathFollower {
    config: FollowerConfig,
    planner: PathPlanner,
    path: Path,
    index: usize,
    /// Position at which the last waypoint advance happened
    last_advance: Option<Vec2>,
}

impl PathFollower {
    /// Create an idle follower
    #[must_use]
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Follower configuration
    #[must_use]
    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// The planner used for replans
    #[must_use]
    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Stored path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the waypoint being approached
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Waypoint being approached
    #[must_use]
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.path.get(self.index)
    }

    /// Whether any waypoint is left to follow
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.index < self.path.len()
    }

    /// Plan from `start` to `target` and swap the result in.
    ///
    /// On failure the stored path is kept. An empty plan (already in the
    /// target cell) also keeps a stored path that still ends in that cell,
    /// so the agent finishes its approach to the cell center.
    ///
    /// # Errors
    ///
    /// Returns the planner's [`PathError`]
    pub fn replan(&mut self, grid: &Grid, start: Vec2, target: Vec2) -> Result<(), PathError> {
        let path = self.planner.find_path(grid, start, target)?;
        if path.is_empty() && self.has_path() {
            let goal = PathPlanner::snap(grid, target)?;
            if self.path.last().is_some_and(|w| w.cell == goal) {
                log::trace!("Inside target cell {goal}, finishing approach");
                return Ok(());
            }
        }
        self.set_path(path);
        Ok(())
    }

    /// Replace the stored path wholesale
    pub fn set_path(&mut self, path: Path) {
        self.path = path;
        self.index = 0;
        self.last_advance = None;

        if self.index >= self.path.len() {
            log::debug!("Swapped in empty path, idling");
        }
    }

    /// Drop the stored path
    pub fn clear(&mut self) {
        self.set_path(Path::default());
    }

    /// Move to the next waypoint if the current one is reached.
    ///
    /// Advances at most once per distinct position.
    pub fn advance(&mut self, position: Vec2) -> bool {
        let Some(waypoint) = self.path.get(self.index) else {
            return false;
        };
        if self.last_advance == Some(position) {
            return false;
        }

        let delta = (waypoint.position - position).abs();
        if delta.x > self.config.lateral_tolerance || delta.y > self.config.vertical_tolerance {
            return false;
        }

        let cell = waypoint.cell;
        self.index += 1;
        self.last_advance = Some(position);
        if self.index == self.path.len() {
            log::info!("Reached final waypoint {cell}");
        } else {
            log::debug!("Reached waypoint {} of {} at {cell}", self.index, self.path.len());
        }
        true
    }

    /// Run one control tick
    pub fn tick<M, S>(&mut self, motor: &mut M, sensors: &S) -> FollowerCommand
    where
        M: Motor + ?Sized,
        S: Sensors + ?Sized,
    {
        let position = motor.position();
        self.advance(position);

        let Some(&waypoint) = self.path.get(self.index) else {
            motor.stop();
            if motor.is_climbing() {
                motor.stop_climb();
            }
            return FollowerCommand::Idle;
        };
        let index = self.index;
        let target_x = waypoint.position.x;

        if self.vent_reflex(motor, sensors, position, target_x) {
            return FollowerCommand::Vent { index, target_x };
        }

        if waypoint.action != Action::Climb && motor.is_climbing() {
            motor.stop_climb();
        }

        match waypoint.action {
            Action::Walk | Action::Crouch => {
                Self::apply_posture(motor, sensors, waypoint.action);
                motor.move_toward_x(target_x);
            }
            Action::Jump => {
                if motor.is_crouching() && sensors.can_stand_safely() {
                    motor.stop_crouch();
                }
                motor.move_toward_x(target_x);
                if motor.is_grounded() {
                    motor.jump();
                }
            }
            Action::Climb => {
                if sensors.has_climbable_wall() {
                    if !motor.is_climbing() {
                        motor.start_climb(self.config.climb_speed);
                    }
                } else {
                    if motor.is_climbing() {
                        motor.stop_climb();
                    }
                    // Walk into the wall; past its top this steps onto the ledge
                    let wall_x = waypoint.wall.map_or(target_x, |wall| wall.x);
                    motor.face(wall_x - position.x);
                    motor.move_toward_x(wall_x);
                }
            }
            Action::Fall => motor.move_toward_x(target_x),
        }

        log::trace!(
            "Waypoint {index} {} via {} from {position}",
            waypoint.cell,
            waypoint.action
        );
        FollowerCommand::Step {
            index,
            action: waypoint.action,
            target_x,
        }
    }

    /// Crouch through an opening ahead when the path leads into it
    fn vent_reflex<M, S>(&self, motor: &mut M, sensors: &S, position: Vec2, target_x: f32) -> bool
    where
        M: Motor + ?Sized,
        S: Sensors + ?Sized,
    {
        if !sensors.is_vent_opening() {
            return false;
        }
        let dx = target_x - position.x;
        if dx.abs() <= self.config.lateral_tolerance || dx.signum() != motor.facing().signum() {
            return false;
        }

        if motor.is_climbing() {
            motor.stop_climb();
        }
        motor.start_crouch();
        motor.move_toward_x(target_x);
        log::debug!("Opening ahead, crouching toward x = {target_x:.2}");
        true
    }

    /// Pick a posture for lateral movement; sensors beat the plan
    fn apply_posture<M, S>(motor: &mut M, sensors: &S, planned: Action)
    where
        M: Motor + ?Sized,
        S: Sensors + ?Sized,
    {
        let crouch = if sensors.should_crouch() {
            true
        } else if sensors.can_stand_safely() {
            false
        } else {
            motor.is_crouching()
        };

        if crouch != (planned == Action::Crouch) {
            log::debug!(
                "Sensors disagree with planned {planned}, {}",
                if crouch { "crouching" } else { "standing" }
            );
        }

        if crouch {
            motor.start_crouch();
        } else {
            motor.stop_crouch();
        }
    }
}

//! Navigating agent
//!
//! Ties a [`PathFollower`] to the two cadences: replanning on the variable
//! frame tick and control on a fixed step. While the last plan failed and no
//! path is left, a [`ScanRoutine`] runs instead.
//!
//! A host loop looks like:
//!
//! ```ignore
//! let steps = agent.update(frame_dt, &grid, &body);
//! for _ in 0..steps {
//!     let sensors = body.sensors(&world, &config.sensors);
//!     agent.fixed_update(&mut body, &sensors);
//!     body.step(&world, agent.fixed_step());
//! }
//! ```

use glam::Vec2;

use super::{FollowerCommand, Motor, PathFollower, RoutineConfig, ScanPhase, ScanRoutine, Sensors};
use crate::core::{FixedTimestep, Interval, NavConfig};
use crate::nav::Grid;

/// What the agent did on one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentCommand {
    /// Followed the path (or idled)
    Follow(FollowerCommand),
    /// Ran the scan routine
    Scan(ScanPhase),
}

/// A path-following agent with replan and control cadences
#[derive(Debug)]
pub struct NavAgent {
    follower: PathFollower,
    routine_config: RoutineConfig,
    routine: Option<ScanRoutine>,
    clock: FixedTimestep,
    replan: Interval,
    target: Option<Vec2>,
    plan_failed: bool,
}

impl NavAgent {
    /// Create an agent without a target
    ///
    /// # Panics
    ///
    /// Panics if the fixed timestep is not positive
    #[must_use]
    pub fn new(config: &NavConfig) -> Self {
        Self {
            follower: PathFollower::new(config.follower.clone()),
            routine_config: config.routine.clone(),
            routine: None,
            clock: FixedTimestep::new(config.follower.fixed_timestep),
            replan: Interval::new(config.follower.replan_interval),
            target: None,
            plan_failed: false,
        }
    }

    /// Set the navigation target; the next update replans
    pub fn set_target(&mut self, target: Vec2) {
        self.target = Some(target);
        self.replan.trigger();
        log::info!("New navigation target {target}");
    }

    /// Forget the target and the stored path
    pub fn clear_target(&mut self) {
        self.target = None;
        self.plan_failed = false;
        self.follower.clear();
    }

    /// Current target
    #[must_use]
    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// The path follower
    #[must_use]
    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    /// Whether the scan routine is active
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.routine.as_ref().is_some_and(|r| !r.is_done())
    }

    /// Whether the most recent plan failed
    #[must_use]
    pub fn plan_failed(&self) -> bool {
        self.plan_failed
    }

    /// Seconds per control tick
    #[must_use]
    pub fn fixed_step(&self) -> f32 {
        self.clock.step()
    }

    /// Variable-rate update.
    ///
    /// Replans when the interval expires and returns the number of control
    /// ticks due this frame.
    pub fn update<M: Motor + ?Sized>(&mut self, dt: f32, grid: &Grid, motor: &M) -> u32 {
        if self.replan.tick(dt) {
            self.replan_now(grid, motor);
        }
        self.clock.advance(dt)
    }

    /// Plan from the motor's position to the target immediately
    pub fn replan_now<M: Motor + ?Sized>(&mut self, grid: &Grid, motor: &M) {
        let Some(target) = self.target else {
            return;
        };

        // Sample half a cell above the feet so the start lands in the body's cell
        let start = motor.position() + Vec2::Y * (grid.cell_diameter() * 0.5);
        match self.follower.replan(grid, start, target) {
            Ok(()) => {
                if self.plan_failed {
                    log::info!("Path to {target} found after failed plan");
                }
                self.plan_failed = false;
            }
            Err(_) => self.plan_failed = true,
        }
    }

    /// Fixed-rate control tick
    pub fn fixed_update<M, S>(&mut self, motor: &mut M, sensors: &S) -> AgentCommand
    where
        M: Motor + ?Sized,
        S: Sensors + ?Sized,
    {
        if self.follower.has_path() {
            if let Some(mut routine) = self.routine.take() {
                routine.cancel(motor, sensors);
            }
            return AgentCommand::Follow(self.follower.tick(motor, sensors));
        }

        if self.plan_failed {
            let step = self.clock.step();
            let config = &self.routine_config;
            let routine = self.routine.get_or_insert_with(|| {
                log::info!("No path available, scanning");
                ScanRoutine::new(config.clone(), motor.position(), motor.facing())
            });
            return AgentCommand::Scan(routine.tick(step, motor));
        }

        AgentCommand::Follow(self.follower.tick(motor, sensors))
    }
}

//! Agent control module
//!
//! Path following, local sensing, timed routines and the agent glue that
//! runs them on the replan and control cadences.

mod agent;
mod follower;
mod fsm;
mod motor;
mod routine;
mod sensors;

pub use agent::{AgentCommand, NavAgent};
pub use follower::{FollowerCommand, FollowerConfig, PathFollower};
pub use fsm::{State, StateMachine, Transition};
pub use motor::{Motor, Sensors};
pub use routine::{RoutineConfig, ScanContext, ScanOutput, ScanPhase, ScanRoutine};
pub use sensors::{ProbeSensors, SensorConfig};

#[cfg(test)]
pub(crate) mod mock {
    use glam::Vec2;

    use super::{Motor, Sensors};

    /// Motor that records requests without simulating anything
    #[derive(Debug, Default)]
    pub(crate) struct MockMotor {
        pub position: Vec2,
        pub facing: f32,
        pub target_x: Option<f32>,
        pub jumps: u32,
        pub crouching: bool,
        pub climbing: bool,
        pub climb_speed: f32,
        pub grounded: bool,
    }

    impl MockMotor {
        pub(crate) fn at(position: Vec2) -> Self {
            Self {
                position,
                facing: 1.0,
                grounded: true,
                ..Default::default()
            }
        }
    }

    impl Motor for MockMotor {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn facing(&self) -> f32 {
            self.facing
        }

        fn move_toward_x(&mut self, x: f32) {
            self.target_x = Some(x);
        }

        fn stop(&mut self) {
            self.target_x = None;
        }

        fn face(&mut self, direction: f32) {
            if direction != 0.0 {
                self.facing = direction.signum();
            }
        }

        fn jump(&mut self) {
            self.jumps += 1;
        }

        fn start_crouch(&mut self) {
            self.crouching = true;
        }

        fn stop_crouch(&mut self) {
            self.crouching = false;
        }

        fn start_climb(&mut self, speed: f32) {
            self.climbing = true;
            self.climb_speed = speed;
        }

        fn stop_climb(&mut self) {
            self.climbing = false;
        }

        fn is_grounded(&self) -> bool {
            self.grounded
        }

        fn is_crouching(&self) -> bool {
            self.crouching
        }

        fn is_climbing(&self) -> bool {
            self.climbing
        }
    }

    /// Fixed sensor readings
    #[derive(Debug, Default, Clone, Copy)]
    pub(crate) struct MockSensors {
        pub wall: bool,
        pub low_ceiling: bool,
        pub blocked_above: bool,
        pub vent: bool,
    }

    impl Sensors for MockSensors {
        fn has_climbable_wall(&self) -> bool {
            self.wall
        }

        fn should_crouch(&self) -> bool {
            self.low_ceiling
        }

        fn can_stand_safely(&self) -> bool {
            !self.blocked_above
        }

        fn is_vent_opening(&self) -> bool {
            self.vent
        }
    }
}

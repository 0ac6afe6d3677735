//! Locomotion and sensing interfaces
//!
//! The follower only ever talks to these traits, so it can drive any body
//! that can execute the primitives below.

use glam::Vec2;

/// Executes locomotion primitives.
pub trait Motor {
    /// Agent position in world space (bottom center of the body)
    fn position(&self) -> Vec2;

    /// Facing direction, `-1.0` for left and `1.0` for right
    fn facing(&self) -> f32;

    /// Move laterally toward `x`
    fn move_toward_x(&mut self, x: f32);

    /// Cancel lateral movement
    fn stop(&mut self);

    /// Turn to face the sign of `direction`
    fn face(&mut self, direction: f32);

    /// Jump, ignored unless grounded
    fn jump(&mut self);

    /// Enter crouched posture
    fn start_crouch(&mut self);

    /// Request standing posture
    fn stop_crouch(&mut self);

    /// Enter climb mode at a vertical speed, locking lateral motion
    fn start_climb(&mut self, speed: f32);

    /// Leave climb mode
    fn stop_climb(&mut self);

    /// Whether the body rests on ground
    fn is_grounded(&self) -> bool;

    /// Whether the body is crouched
    fn is_crouching(&self) -> bool;

    /// Whether the body is in climb mode
    fn is_climbing(&self) -> bool;
}

/// Boolean local probes around the agent.
///
/// These read live geometry and win over the grid when the two disagree.
pub trait Sensors {
    /// A climbable wall is directly ahead
    fn has_climbable_wall(&self) -> bool;

    /// The space ahead is too low to stand in
    fn should_crouch(&self) -> bool;

    /// Standing up here would not hit a ceiling
    fn can_stand_safely(&self) -> bool;

    /// A crouch-height opening is directly ahead
    fn is_vent_opening(&self) -> bool;
}

//! Scan routine
//!
//! What an agent does while it has no path: look behind, look ahead, then
//! back off a little. Each phase is a [`State`] advanced once per control
//! tick with the elapsed time; states only write a [`ScanOutput`] and the
//! routine applies it to the motor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fsm::{State, StateMachine, Transition};
use super::{Motor, Sensors};

/// Routine timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineConfig {
    /// Seconds spent facing each side
    pub look_duration: f32,
    /// Distance to back off after looking
    pub retreat_distance: f32,
    /// Upper bound on the time spent backing off
    pub retreat_duration: f32,
    /// Distance at which the retreat point counts as reached
    pub arrive_tolerance: f32,
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            look_duration: 0.75,
            retreat_distance: 1.0,
            retreat_duration: 1.5,
            arrive_tolerance: 0.05,
        }
    }
}

/// Phase of a [`ScanRoutine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Facing away from the original direction
    LookBack,
    /// Facing the original direction again
    LookAhead,
    /// Backing away
    Retreat,
    /// Finished or cancelled
    Done,
}

/// Motor request written by the active phase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScanOutput {
    /// Leave the motor alone
    #[default]
    Hold,
    /// Stand still facing a direction
    Face(f32),
    /// Move toward an x coordinate
    MoveTo(f32),
    /// Stop moving
    Stop,
}

/// Context shared by the routine's states
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Seconds since the previous tick
    pub delta_time: f32,
    /// Agent x position this tick
    pub position_x: f32,
    /// Active phase
    pub phase: Option<ScanPhase>,
    /// Request for this tick
    pub output: ScanOutput,
}

/// Facing and origin captured when the routine starts
#[derive(Debug, Clone)]
struct ScanPlan {
    facing: f32,
    origin_x: f32,
    config: RoutineConfig,
}

#[derive(Debug)]
struct LookBack {
    plan: ScanPlan,
    elapsed: f32,
}

impl State<ScanContext> for LookBack {
    fn name(&self) -> &'static str {
        "LookBack"
    }

    fn enter(&mut self, ctx: &mut ScanContext) {
        ctx.phase = Some(ScanPhase::LookBack);
        ctx.output = ScanOutput::Face(-self.plan.facing);
    }

    fn update(&mut self, ctx: &mut ScanContext) -> Transition<ScanContext> {
        self.elapsed += ctx.delta_time;
        if self.elapsed >= self.plan.config.look_duration {
            return Transition::to(LookAhead {
                plan: self.plan.clone(),
                elapsed: 0.0,
            });
        }
        Transition::None
    }
}

#[derive(Debug)]
struct LookAhead {
    plan: ScanPlan,
    elapsed: f32,
}

impl State<ScanContext> for LookAhead {
    fn name(&self) -> &'static str {
        "LookAhead"
    }

    fn enter(&mut self, ctx: &mut ScanContext) {
        ctx.phase = Some(ScanPhase::LookAhead);
        ctx.output = ScanOutput::Face(self.plan.facing);
    }

    fn update(&mut self, ctx: &mut ScanContext) -> Transition<ScanContext> {
        self.elapsed += ctx.delta_time;
        if self.elapsed >= self.plan.config.look_duration {
            let target_x = self.plan.origin_x - self.plan.facing * self.plan.config.retreat_distance;
            return Transition::to(Retreat {
                plan: self.plan.clone(),
                target_x,
                elapsed: 0.0,
            });
        }
        Transition::None
    }
}

#[derive(Debug)]
struct Retreat {
    plan: ScanPlan,
    target_x: f32,
    elapsed: f32,
}

impl State<ScanContext> for Retreat {
    fn name(&self) -> &'static str {
        "Retreat"
    }

    fn enter(&mut self, ctx: &mut ScanContext) {
        ctx.phase = Some(ScanPhase::Retreat);
    }

    fn update(&mut self, ctx: &mut ScanContext) -> Transition<ScanContext> {
        self.elapsed += ctx.delta_time;
        let arrived = (ctx.position_x - self.target_x).abs() <= self.plan.config.arrive_tolerance;
        if arrived || self.elapsed >= self.plan.config.retreat_duration {
            return Transition::Pop;
        }
        ctx.output = ScanOutput::MoveTo(self.target_x);
        Transition::None
    }

    fn exit(&mut self, ctx: &mut ScanContext) {
        ctx.output = ScanOutput::Stop;
    }
}

/// Look-around routine run while no path is available
#[derive(Debug)]
pub struct ScanRoutine {
    machine: StateMachine<ScanContext>,
    ctx: ScanContext,
}

impl ScanRoutine {
    /// Start a routine for an agent at `origin` facing `facing`
    #[must_use]
    pub fn new(config: RoutineConfig, origin: Vec2, facing: f32) -> Self {
        let plan = ScanPlan {
            facing: if facing < 0.0 { -1.0 } else { 1.0 },
            origin_x: origin.x,
            config,
        };
        Self {
            machine: StateMachine::new(LookBack { plan, elapsed: 0.0 }),
            ctx: ScanContext {
                phase: Some(ScanPhase::LookBack),
                ..Default::default()
            },
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        if self.machine.is_finished() {
            ScanPhase::Done
        } else {
            self.ctx.phase.unwrap_or(ScanPhase::LookBack)
        }
    }

    /// Whether the routine has run to completion or been cancelled
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.machine.is_finished()
    }

    /// Advance by `dt` seconds and drive the motor
    pub fn tick<M: Motor + ?Sized>(&mut self, dt: f32, motor: &mut M) -> ScanPhase {
        if self.machine.is_finished() {
            return ScanPhase::Done;
        }

        let before = self.phase();
        self.ctx.delta_time = dt;
        self.ctx.position_x = motor.position().x;
        self.ctx.output = ScanOutput::Hold;
        self.machine.update(&mut self.ctx);
        Self::apply(self.ctx.output, motor);

        let phase = self.phase();
        if phase != before {
            log::debug!("Scan routine {before:?} -> {phase:?}");
        }
        phase
    }

    /// Stop the routine and leave the motor in a neutral pose: stopped, off
    /// any wall, standing if there is room
    pub fn cancel<M, S>(&mut self, motor: &mut M, sensors: &S)
    where
        M: Motor + ?Sized,
        S: Sensors + ?Sized,
    {
        self.machine.finish(&mut self.ctx);

        motor.stop();
        if motor.is_climbing() {
            motor.stop_climb();
        }
        if motor.is_crouching() && sensors.can_stand_safely() {
            motor.stop_crouch();
        }
        log::debug!("Scan routine cancelled");
    }

    fn apply<M: Motor + ?Sized>(output: ScanOutput, motor: &mut M) {
        match output {
            ScanOutput::Hold => {}
            ScanOutput::Face(direction) => {
                motor.stop();
                motor.face(direction);
            }
            ScanOutput::MoveTo(x) => motor.move_toward_x(x),
            ScanOutput::Stop => motor.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::{MockMotor, MockSensors};

    fn config() -> RoutineConfig {
        RoutineConfig {
            look_duration: 0.5,
            retreat_distance: 1.0,
            retreat_duration: 1.0,
            arrive_tolerance: 0.05,
        }
    }

    #[test]
    fn test_phases_advance_on_elapsed_time() {
        let mut motor = MockMotor::at(Vec2::new(3.0, 0.0));
        let mut routine = ScanRoutine::new(config(), motor.position(), 1.0);

        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::LookBack);
        assert!((motor.facing + 1.0).abs() < f32::EPSILON);

        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::LookAhead);
        assert!((motor.facing - 1.0).abs() < f32::EPSILON);

        routine.tick(0.25, &mut motor);
        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::Retreat);

        // Backs away from the original facing
        routine.tick(0.25, &mut motor);
        assert_eq!(motor.target_x, Some(2.0));
    }

    #[test]
    fn test_retreat_times_out() {
        let mut motor = MockMotor::at(Vec2::new(3.0, 0.0));
        let mut routine = ScanRoutine::new(config(), motor.position(), 1.0);
        for _ in 0..4 {
            routine.tick(0.25, &mut motor);
        }
        assert_eq!(routine.phase(), ScanPhase::Retreat);

        // The mock never moves, so only the time bound ends the retreat
        for _ in 0..3 {
            assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::Retreat);
        }
        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::Done);
        assert_eq!(motor.target_x, None);
        assert!(routine.is_done());
    }

    #[test]
    fn test_retreat_ends_on_arrival() {
        let mut motor = MockMotor::at(Vec2::new(3.0, 0.0));
        let mut routine = ScanRoutine::new(config(), motor.position(), -1.0);
        for _ in 0..4 {
            routine.tick(0.25, &mut motor);
        }

        motor.position.x = 4.0;

        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::Done);
    }

    #[test]
    fn test_cancel_forces_terminal_pose() {
        let mut motor = MockMotor::at(Vec2::new(3.0, 0.0));
        let mut routine = ScanRoutine::new(config(), motor.position(), 1.0);
        for _ in 0..5 {
            routine.tick(0.25, &mut motor);
        }
        motor.climbing = true;
        motor.crouching = true;

        routine.cancel(&mut motor, &MockSensors::default());

        assert_eq!(routine.phase(), ScanPhase::Done);
        assert_eq!(motor.target_x, None);
        assert!(!motor.climbing);
        assert!(!motor.crouching);
        assert_eq!(routine.tick(0.25, &mut motor), ScanPhase::Done);
    }

    #[test]
    fn test_cancel_stays_crouched_under_ceiling() {
        let mut motor = MockMotor::at(Vec2::ZERO);
        motor.crouching = true;
        let mut routine = ScanRoutine::new(config(), motor.position(), 1.0);
        let sensors = MockSensors {
            blocked_above: true,
            ..Default::default()
        };

        routine.cancel(&mut motor, &sensors);

        assert!(motor.crouching);
        assert!(routine.is_done());
    }
}

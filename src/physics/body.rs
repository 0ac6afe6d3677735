//! Kinematic platformer body
//!
//! A box-shaped character stepped at a fixed rate against a
//! [`CollisionQuery`] world. It implements [`Motor`] so the path follower can
//! drive it directly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{CollisionQuery, LayerMask};
use crate::ai::{Motor, ProbeSensors, SensorConfig};

/// Largest distance moved per collision sub-step
const SUB_STEP: f32 = 0.02;

/// Thickness of the ground probe under the feet
const GROUND_PROBE: f32 = 0.04;

/// Collision box inset so resting contact never counts as overlap
const SKIN: f32 = 0.005;

/// Body dimensions and movement tuning
///
/// The defaults fit the default half-unit grid: standing takes three cells,
/// crouching two, and one jump rises `jump_speed² / (2 * gravity)` = 1.62
/// units, just over three cells. The grid chains Jump edges up any open
/// column without a height limit, so a route stacking more Jump edges than
/// one apex covers leaves this body hopping under the waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Body width
    pub width: f32,
    /// Standing height
    pub height: f32,
    /// Crouched height
    pub crouch_height: f32,
    /// Lateral speed while standing (units/second)
    pub run_speed: f32,
    /// Lateral speed while crouched (units/second)
    pub crouch_speed: f32,
    /// Initial upward speed of a jump (units/second)
    pub jump_speed: f32,
    /// Downward acceleration (units/second^2)
    pub gravity: f32,
    /// Terminal falling speed (units/second)
    pub max_fall_speed: f32,
    /// Layers the body collides with
    pub mask: LayerMask,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            width: 0.4,
            height: 1.4,
            crouch_height: 0.9,
            run_speed: 4.0,
            crouch_speed: 2.0,
            jump_speed: 9.0,
            gravity: 25.0,
            max_fall_speed: 15.0,
            mask: LayerMask::GROUND,
        }
    }
}

/// Simulated platformer character
#[derive(Debug, Clone)]
pub struct PlatformerBody {
    config: BodyConfig,
    /// Bottom center of the body
    feet: Vec2,
    velocity: Vec2,
    facing: f32,
    target_x: Option<f32>,
    jump_requested: bool,
    crouch_requested: bool,
    crouching: bool,
    climbing: bool,
    climb_speed: f32,
    grounded: bool,
}

impl PlatformerBody {
    /// Create a body standing with its feet at `feet`
    #[must_use]
    pub fn new(config: BodyConfig, feet: Vec2) -> Self {
        Self {
            config,
            feet,
            velocity: Vec2::ZERO,
            facing: 1.0,
            target_x: None,
            jump_requested: false,
            crouch_requested: false,
            crouching: false,
            climbing: false,
            climb_speed: 0.0,
            grounded: false,
        }
    }

    /// Body configuration
    #[must_use]
    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    /// Current velocity
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current height, depending on posture
    #[must_use]
    pub fn height(&self) -> f32 {
        if self.crouching {
            self.config.crouch_height
        } else {
            self.config.height
        }
    }

    /// Probe sensors for the body's current pose
    pub fn sensors<'w, W: CollisionQuery + ?Sized>(
        &self,
        world: &'w W,
        config: &SensorConfig,
    ) -> ProbeSensors<'w, W> {
        ProbeSensors::new(world, config.clone(), &self.config, self.feet, self.facing)
    }

    fn collides<W: CollisionQuery + ?Sized>(&self, world: &W, feet: Vec2, height: f32) -> bool {
        let half = Vec2::new(self.config.width * 0.5 - SKIN, height * 0.5 - SKIN);
        world.overlap_box(feet + Vec2::new(0.0, height * 0.5), half, self.config.mask)
    }

    /// Move by `delta` in sub-steps, stopping before the first blocked one.
    /// Returns true if the full distance was covered.
    fn sweep<W: CollisionQuery + ?Sized>(&mut self, world: &W, delta: Vec2) -> bool {
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return true;
        }

        let steps = (distance / SUB_STEP).ceil().max(1.0) as u32;
        let step = delta / steps as f32;
        let height = self.height();

        for _ in 0..steps {
            let next = self.feet + step;
            if self.collides(world, next, height) {
                return false;
            }
            self.feet = next;
        }
        true
    }

    fn probe_ground<W: CollisionQuery + ?Sized>(&self, world: &W) -> bool {
        let half = Vec2::new(self.config.width * 0.45, GROUND_PROBE * 0.5);
        let center = self.feet - Vec2::new(0.0, half.y);
        world.overlap_box(center, half, self.config.mask)
    }

    /// Advance the body by one fixed step
    pub fn step<W: CollisionQuery + ?Sized>(&mut self, world: &W, dt: f32) {
        // Posture first so sweeps use the right box
        if self.crouch_requested {
            self.crouching = true;
        } else if self.crouching && !self.collides(world, self.feet, self.config.height) {
            self.crouching = false;
        }

        if self.climbing {
            self.velocity = Vec2::new(0.0, self.climb_speed);
        } else {
            let speed = if self.crouching {
                self.config.crouch_speed
            } else {
                self.config.run_speed
            };
            self.velocity.x = match self.target_x {
                Some(x) => ((x - self.feet.x) / dt).clamp(-speed, speed),
                None => 0.0,
            };

            if self.jump_requested && self.grounded {
                self.velocity.y = self.config.jump_speed;
                self.grounded = false;
            }
            self.velocity.y =
                (self.velocity.y - self.config.gravity * dt).max(-self.config.max_fall_speed);
        }
        self.jump_requested = false;

        if self.velocity.x.abs() > 0.01 {
            self.facing = self.velocity.x.signum();
        }

        if !self.sweep(world, Vec2::new(self.velocity.x * dt, 0.0)) {
            self.velocity.x = 0.0;
        }

        let falling = self.velocity.y <= 0.0;
        if !self.sweep(world, Vec2::new(0.0, self.velocity.y * dt)) {
            self.velocity.y = 0.0;
        }

        self.grounded = falling && self.probe_ground(world);
        if self.grounded && !self.climbing {
            self.velocity.y = self.velocity.y.max(0.0);
        }
    }
}

impl Motor for PlatformerBody {
    fn position(&self) -> Vec2 {
        self.feet
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
        self.jump_requested = true;
    }

    fn start_crouch(&mut self) {
        self.crouch_requested = true;
    }

    fn stop_crouch(&mut self) {
        self.crouch_requested = false;
    }

    fn start_climb(&mut self, speed: f32) {
        self.climbing = true;
        self.climb_speed = speed;
    }

    fn stop_climb(&mut self) {
        // Velocity is kept; the next step hands it to gravity
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

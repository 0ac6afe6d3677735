//! Probe sensors
//!
//! Answers the [`Sensors`] questions with box overlaps placed relative to the
//! body. Bands are measured up from the feet:
//!
//! ```text
//!   height        +------+ - - - - +
//!                 | head |  ahead  |
//!   crouch_height +------+ - - - - +
//!                 | low  |  ahead  |
//!   feet          +------+ - - - - +
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::Sensors;
use crate::physics::{BodyConfig, CollisionQuery, LayerMask};

/// Probe geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// How far ahead of the body the forward probes reach
    pub reach: f32,
    /// Gap left above the feet so the floor does not register
    pub floor_margin: f32,
    /// Gap kept around band boundaries
    pub band_margin: f32,
    /// Layers the probes hit
    pub mask: LayerMask,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            reach: 0.3,
            floor_margin: 0.05,
            band_margin: 0.02,
            mask: LayerMask::GROUND,
        }
    }
}

impl SensorConfig {
    /// Set the forward reach
    #[must_use]
    pub fn with_reach(mut self, reach: f32) -> Self {
        self.reach = reach;
        self
    }

    /// Set the probed layers
    #[must_use]
    pub fn with_mask(mut self, mask: LayerMask) -> Self {
        self.mask = mask;
        self
    }
}

/// Sensors for one body pose
#[derive(Debug)]
pub struct ProbeSensors<'w, W: CollisionQuery + ?Sized> {
    world: &'w W,
    config: SensorConfig,
    feet: Vec2,
    facing: f32,
    half_width: f32,
    height: f32,
    crouch_height: f32,
}

impl<'w, W: CollisionQuery + ?Sized> ProbeSensors<'w, W> {
    /// Create sensors for a body of the given shape standing at `feet`
    pub fn new(world: &'w W, config: SensorConfig, body: &BodyConfig, feet: Vec2, facing: f32) -> Self {
        Self {
            world,
            config,
            feet,
            facing: if facing < 0.0 { -1.0 } else { 1.0 },
            half_width: body.width * 0.5,
            height: body.height,
            crouch_height: body.crouch_height,
        }
    }

    /// Vertical extent of the low band as (bottom, top)
    fn low_band(&self) -> (f32, f32) {
        (
            self.feet.y + self.config.floor_margin,
            self.feet.y + self.crouch_height - self.config.band_margin,
        )
    }

    /// Vertical extent of the head band as (bottom, top)
    fn head_band(&self) -> (f32, f32) {
        (
            self.feet.y + self.crouch_height + self.config.band_margin,
            self.feet.y + self.height - self.config.band_margin,
        )
    }

    /// Horizontal extent of the forward probe as (left, right)
    fn ahead(&self) -> (f32, f32) {
        let front = self.feet.x + self.facing * self.half_width;
        let far = front + self.facing * self.config.reach;
        (front.min(far), front.max(far))
    }

    /// Horizontal extent of the body as (left, right)
    fn footprint(&self) -> (f32, f32) {
        (self.feet.x - self.half_width, self.feet.x + self.half_width)
    }

    fn blocked(&self, (left, right): (f32, f32), (bottom, top): (f32, f32)) -> bool {
        if right <= left || top <= bottom {
            return false;
        }
        let center = Vec2::new((left + right) * 0.5, (bottom + top) * 0.5);
        let half = Vec2::new((right - left) * 0.5, (top - bottom) * 0.5);
        self.world.overlap_box(center, half, self.config.mask)
    }
}

impl<W: CollisionQuery + ?Sized> Sensors for ProbeSensors<'_, W> {
    fn has_climbable_wall(&self) -> bool {
        // Reading ends once the feet rise past the wall top
        self.blocked(self.ahead(), self.low_band())
    }

    fn should_crouch(&self) -> bool {
        let (left, right) = self.footprint();
        let (ahead_left, ahead_right) = self.ahead();
        let span = (left.min(ahead_left), right.max(ahead_right));
        self.blocked(span, self.head_band()) && !self.blocked(self.footprint(), self.low_band())
    }

    fn can_stand_safely(&self) -> bool {
        !self.blocked(self.footprint(), self.head_band())
    }

    fn is_vent_opening(&self) -> bool {
        self.blocked(self.ahead(), self.head_band()) && !self.blocked(self.ahead(), self.low_band())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BoxWorld, StaticGeometry};

    fn world_with(boxes: &[(Vec2, Vec2)]) -> BoxWorld {
        let mut world = BoxWorld::new();
        for &(center, half) in boxes {
            world.add_solid(center, half, LayerMask::GROUND);
        }
        world
    }

    fn probe(world: &BoxWorld, feet: Vec2, facing: f32) -> ProbeSensors<'_, BoxWorld> {
        ProbeSensors::new(world, SensorConfig::default(), &BodyConfig::default(), feet, facing)
    }

    #[test]
    fn test_open_space() {
        let world = world_with(&[(Vec2::new(0.0, -0.5), Vec2::new(5.0, 0.5))]);
        let sensors = probe(&world, Vec2::ZERO, 1.0);

        assert!(!sensors.has_climbable_wall());
        assert!(!sensors.should_crouch());
        assert!(sensors.can_stand_safely());
        assert!(!sensors.is_vent_opening());
    }

    #[test]
    fn test_wall_ahead_depends_on_facing() {
        // Wall face at x = 0.4, body front at x = 0.2
        let world = world_with(&[(Vec2::new(0.9, 2.0), Vec2::new(0.5, 2.0))]);

        assert!(probe(&world, Vec2::ZERO, 1.0).has_climbable_wall());
        assert!(!probe(&world, Vec2::ZERO, -1.0).has_climbable_wall());
    }

    #[test]
    fn test_wall_ends_at_its_top() {
        // Ledge ahead with its top at y = 1.0, below the head band
        let world = world_with(&[(Vec2::new(0.9, 0.5), Vec2::new(0.5, 0.5))]);

        assert!(probe(&world, Vec2::ZERO, 1.0).has_climbable_wall());
        assert!(probe(&world, Vec2::new(0.0, 0.9), 1.0).has_climbable_wall());
        assert!(!probe(&world, Vec2::new(0.0, 1.0), 1.0).has_climbable_wall());
    }

    #[test]
    fn test_vent_ahead() {
        // Ceiling ahead with its underside at y = 1.0, between crouch and
        // standing height
        let world = world_with(&[(Vec2::new(1.4, 1.5), Vec2::new(1.0, 0.5))]);
        let sensors = probe(&world, Vec2::ZERO, 1.0);

        assert!(sensors.is_vent_opening());
        assert!(sensors.should_crouch());
        assert!(sensors.can_stand_safely());
        assert!(!sensors.has_climbable_wall());
    }

    #[test]
    fn test_under_low_ceiling() {
        let world = world_with(&[(Vec2::new(0.0, 1.5), Vec2::new(2.0, 0.5))]);
        let sensors = probe(&world, Vec2::ZERO, -1.0);

        assert!(!sensors.can_stand_safely());
        assert!(sensors.should_crouch());
    }

    #[test]
    fn test_mask_filters_probes() {
        let mut world = BoxWorld::new();
        world.add_solid(Vec2::new(0.9, 2.0), Vec2::new(0.5, 2.0), LayerMask::layer(4));
        let sensors = probe(&world, Vec2::ZERO, 1.0);

        assert!(!sensors.has_climbable_wall());
    }
}

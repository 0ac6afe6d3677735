//! Axis-aligned box world
//!
//! A minimal collision world: a flat list of boxes tested one by one.

use glam::Vec2;

use super::{CollisionQuery, LayerMask, StaticGeometry};

/// One box in a [`BoxWorld`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    /// Center in world space
    pub center: Vec2,
    /// Half size on each axis
    pub half_extents: Vec2,
    /// Layer the box lives on
    pub layer: LayerMask,
    /// Trigger volumes are skipped when the world ignores triggers
    pub trigger: bool,
}

impl BoxCollider {
    /// Strict overlap test, touching edges do not count
    #[must_use]
    pub fn overlaps(&self, center: Vec2, half_extents: Vec2) -> bool {
        let delta = (self.center - center).abs();
        let reach = self.half_extents + half_extents;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Collision world made of axis-aligned boxes
#[derive(Debug, Clone)]
pub struct BoxWorld {
    colliders: Vec<BoxCollider>,
    hit_triggers: bool,
}

impl BoxWorld {
    /// Create an empty world; queries hit triggers by default
    #[must_use]
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
            hit_triggers: true,
        }
    }

    /// All colliders in insertion order
    #[must_use]
    pub fn colliders(&self) -> &[BoxCollider] {
        &self.colliders
    }

    /// Number of colliders
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Check if the world has no colliders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl Default for BoxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionQuery for BoxWorld {
    fn overlap_box(&self, center: Vec2, half_extents: Vec2, mask: LayerMask) -> bool {
        self.colliders.iter().any(|collider| {
            collider.layer.intersects(mask)
                && (self.hit_triggers || !collider.trigger)
                && collider.overlaps(center, half_extents)
        })
    }

    fn queries_hit_triggers(&self) -> bool {
        self.hit_triggers
    }

    fn set_queries_hit_triggers(&mut self, hit: bool) {
        self.hit_triggers = hit;
    }
}

impl StaticGeometry for BoxWorld {
    fn add_solid(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask) {
        self.colliders.push(BoxCollider {
            center,
            half_extents,
            layer,
            trigger: false,
        });
    }

    fn add_trigger(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask) {
        self.colliders.push(BoxCollider {
            center,
            half_extents,
            layer,
            trigger: true,
        });
    }
}

//! Collision world module
//!
//! Static level geometry and the overlap queries navigation is built from.
//! [`Physics`] is backed by rapier3d, [`BoxWorld`] is a plain list of boxes.

mod body;
mod boxes;
mod layout;
mod world;

use std::ops::{Deref, DerefMut};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use body::{BodyConfig, PlatformerBody};
pub use boxes::{BoxCollider, BoxWorld};
pub use layout::{LayoutError, Tile, TileLayout};
pub use world::{ColliderHandle, Physics};

/// Bit set of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing
    pub const NONE: Self = Self(0);
    /// Matches every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Default layer for level geometry
    pub const GROUND: Self = Self(1);
    /// Layer for trigger volumes
    pub const TRIGGERS: Self = Self(1 << 1);

    /// Mask with only `layer` set
    #[must_use]
    pub const fn layer(layer: u32) -> Self {
        Self(1 << layer)
    }

    /// Whether the two masks share any layer
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Overlap queries against static geometry.
///
/// Worlds carry a query mode deciding whether trigger volumes (non-solid
/// colliders) take part in queries. Use [`TriggerScope`] to change it for a
/// bounded region of code.
pub trait CollisionQuery {
    /// Whether any collider on `mask` overlaps the box
    fn overlap_box(&self, center: Vec2, half_extents: Vec2, mask: LayerMask) -> bool;

    /// Current trigger query mode
    fn queries_hit_triggers(&self) -> bool;

    /// Change the trigger query mode
    fn set_queries_hit_triggers(&mut self, hit: bool);
}

/// Worlds that static geometry can be added to.
pub trait StaticGeometry {
    /// Add a solid box
    fn add_solid(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask);

    /// Add a trigger volume
    fn add_trigger(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask);
}

/// Scoped trigger query mode.
///
/// Sets the mode on creation and restores the previous one when dropped,
/// including during unwinding.
pub struct TriggerScope<'w, W: CollisionQuery + ?Sized> {
    world: &'w mut W,
    previous: bool,
}

impl<'w, W: CollisionQuery + ?Sized> TriggerScope<'w, W> {
    /// Enter a scope where queries skip trigger volumes
    pub fn ignore_triggers(world: &'w mut W) -> Self {
        Self::with_mode(world, false)
    }

    /// Enter a scope with an explicit trigger mode
    pub fn with_mode(world: &'w mut W, hit_triggers: bool) -> Self {
        let previous = world.queries_hit_triggers();
        world.set_queries_hit_triggers(hit_triggers);
        Self { world, previous }
    }
}

impl<W: CollisionQuery + ?Sized> Deref for TriggerScope<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        self.world
    }
}

impl<W: CollisionQuery + ?Sized> DerefMut for TriggerScope<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        self.world
    }
}

impl<W: CollisionQuery + ?Sized> Drop for TriggerScope<'_, W> {
    fn drop(&mut self) {
        self.world.set_queries_hit_triggers(self.previous);
    }
}

//! Static level geometry using rapier3d
//!
//! The platforming world is 2D; colliders live on the z = 0 plane with a
//! fixed depth so overlap queries reduce to 2D box tests.

use std::cell::{Cell, RefCell};

use glam::Vec2;
use rapier3d::parry::shape::Cuboid;
use rapier3d::prelude::*;

use super::{CollisionQuery, LayerMask, StaticGeometry};

/// Half depth of every collider and query box along z
const HALF_DEPTH: f32 = 0.5;

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier3d::geometry::ColliderHandle);

/// Convert a layer mask to rapier interaction groups
fn collider_groups(layer: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::from_bits_truncate(layer.0), Group::ALL)
}

/// Interaction groups used by queries filtering on `mask`
fn query_groups(mask: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::ALL, Group::from_bits_truncate(mask.0))
}

/// Static collision world
pub struct Physics {
    /// Rigid body set (queries need it even though every collider is parentless)
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Query pipeline for overlap tests, rebuilt on the first query after a
    /// collider change
    query_pipeline: RefCell<QueryPipeline>,
    /// Colliders changed since the pipeline was last updated
    stale: Cell<bool>,
    /// Whether queries include sensor colliders
    hit_triggers: bool,
}

impl Physics {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: RefCell::new(QueryPipeline::new()),
            stale: Cell::new(false),
            hit_triggers: true,
        }
    }

    /// Insert a fixed box collider
    fn insert_box(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        layer: LayerMask,
        sensor: bool,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, HALF_DEPTH)
            .translation(vector![center.x, center.y, 0.0])
            .collision_groups(collider_groups(layer))
            .sensor(sensor)
            .build();

        let handle = self.collider_set.insert(collider);
        self.stale.set(true);
        ColliderHandle(handle)
    }

    /// Add a solid box and return its handle
    pub fn add_box(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask) -> ColliderHandle {
        self.insert_box(center, half_extents, layer, false)
    }

    /// Add a trigger volume and return its handle
    pub fn add_sensor_box(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        layer: LayerMask,
    ) -> ColliderHandle {
        self.insert_box(center, half_extents, layer, true)
    }

    /// Remove a collider
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        let mut island_manager = IslandManager::new();
        self.collider_set.remove(
            handle.0,
            &mut island_manager,
            &mut self.rigid_body_set,
            false,
        );
        self.stale.set(true);
    }

    /// Number of colliders in the world
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Whether the query pipeline lags behind the collider set
    pub fn queries_stale(&self) -> bool {
        self.stale.get()
    }

    /// Bring the query pipeline up to date with the collider set
    pub fn update_queries(&self) {
        if self.stale.replace(false) {
            self.query_pipeline.borrow_mut().update(&self.collider_set);
            log::trace!("Query pipeline rebuilt for {} colliders", self.collider_set.len());
        }
    }

    /// Find one collider on `mask` overlapping the box
    pub fn intersect_box(
        &self,
        center: Vec2,
        half_extents: Vec2,
        mask: LayerMask,
    ) -> Option<ColliderHandle> {
        let shape = Cuboid::new(vector![half_extents.x, half_extents.y, HALF_DEPTH]);
        let shape_pos = Isometry::translation(center.x, center.y, 0.0);

        let mut filter = QueryFilter::default().groups(query_groups(mask));
        if !self.hit_triggers {
            filter = filter.exclude_sensors();
        }

        self.update_queries();
        self.query_pipeline
            .borrow()
            .intersection_with_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &shape,
                filter,
            )
            .map(ColliderHandle)
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionQuery for Physics {
    fn overlap_box(&self, center: Vec2, half_extents: Vec2, mask: LayerMask) -> bool {
        self.intersect_box(center, half_extents, mask).is_some()
    }

    fn queries_hit_triggers(&self) -> bool {
        self.hit_triggers
    }

    fn set_queries_hit_triggers(&mut self, hit: bool) {
        self.hit_triggers = hit;
    }
}

impl StaticGeometry for Physics {
    fn add_solid(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask) {
        self.add_box(center, half_extents, layer);
    }

    fn add_trigger(&mut self, center: Vec2, half_extents: Vec2, layer: LayerMask) {
        self.add_sensor_box(center, half_extents, layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_overlap() {
        let mut physics = Physics::new();
        physics.add_box(Vec2::new(2.0, 0.0), Vec2::splat(0.5), LayerMask::GROUND);

        assert!(physics.overlap_box(Vec2::new(2.2, 0.1), Vec2::splat(0.2), LayerMask::GROUND));
        assert!(!physics.overlap_box(Vec2::new(-2.0, 0.0), Vec2::splat(0.2), LayerMask::GROUND));
        assert_eq!(physics.collider_count(), 1);
    }

    #[test]
    fn test_layer_filter() {
        let mut physics = Physics::new();
        physics.add_box(Vec2::ZERO, Vec2::splat(0.5), LayerMask::layer(3));

        assert!(!physics.overlap_box(Vec2::ZERO, Vec2::splat(0.2), LayerMask::GROUND));
        assert!(physics.overlap_box(Vec2::ZERO, Vec2::splat(0.2), LayerMask::layer(3)));
    }

    #[test]
    fn test_sensor_mode() {
        let mut physics = Physics::new();
        physics.add_sensor_box(Vec2::ZERO, Vec2::splat(0.5), LayerMask::GROUND);

        assert!(physics.overlap_box(Vec2::ZERO, Vec2::splat(0.2), LayerMask::GROUND));
        physics.set_queries_hit_triggers(false);
        assert!(!physics.overlap_box(Vec2::ZERO, Vec2::splat(0.2), LayerMask::GROUND));
    }

    #[test]
    fn test_remove_collider() {
        let mut physics = Physics::new();
        let handle = physics.add_box(Vec2::ZERO, Vec2::splat(0.5), LayerMask::GROUND);

        physics.remove_collider(handle);

        assert_eq!(physics.collider_count(), 0);
        assert!(!physics.overlap_box(Vec2::ZERO, Vec2::splat(0.2), LayerMask::GROUND));
    }

    #[test]
    fn test_queries_refresh_lazily() {
        let mut physics = Physics::new();
        for x in 0..50 {
            physics.add_box(Vec2::new(x as f32, 0.0), Vec2::splat(0.4), LayerMask::GROUND);
        }
        assert!(physics.queries_stale());

        assert!(physics.overlap_box(Vec2::new(49.0, 0.0), Vec2::splat(0.1), LayerMask::GROUND));
        assert!(!physics.queries_stale());

        // Colliders added after a query are still seen
        physics.add_box(Vec2::new(0.0, 5.0), Vec2::splat(0.4), LayerMask::GROUND);
        assert!(physics.overlap_box(Vec2::new(0.0, 5.0), Vec2::splat(0.1), LayerMask::GROUND));

        let handle = physics.add_box(Vec2::new(0.0, -5.0), Vec2::splat(0.4), LayerMask::GROUND);
        assert!(physics.overlap_box(Vec2::new(0.0, -5.0), Vec2::splat(0.1), LayerMask::GROUND));
        physics.remove_collider(handle);
        assert!(!physics.overlap_box(Vec2::new(0.0, -5.0), Vec2::splat(0.1), LayerMask::GROUND));
    }
}

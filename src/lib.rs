//! Locomotion-aware navigation for 2D platformers
//!
//! This crate provides:
//! - Grid construction from static collision geometry with vertical clearance
//! - Edge classification by required action (walk, crouch, jump, climb, fall)
//! - A* search with per-action penalties and off-grid snapping
//! - A path follower that drives any [`ai::Motor`] and defers to local sensors
//! - Static collision worlds backed by rapier3d or plain boxes

pub mod ai;
pub mod core;
pub mod nav;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentCommand, FollowerCommand, FollowerConfig, Motor, NavAgent, PathFollower,
        ProbeSensors, SensorConfig, Sensors,
    };
    pub use crate::core::{NavConfig, PlannerStats};
    pub use crate::nav::{
        Action, CellCoord, Grid, GridBuilder, GridConfig, Path, PathError, PathPlanner, Waypoint,
        find_path,
    };
    pub use crate::physics::{
        BodyConfig, BoxWorld, CollisionQuery, LayerMask, Physics, PlatformerBody, StaticGeometry,
        TileLayout,
    };
    pub use glam::Vec2;
}

//! Core module
//!
//! Configuration, simulation clock and planner statistics

mod config;
mod debug;
mod time;

pub use config::{ConfigError, NavConfig};
pub use debug::PlannerStats;
pub use time::{FixedTimestep, Interval};

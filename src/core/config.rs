//! Navigation configuration
//!
//! Aggregates the per-component configs into one document that can be saved
//! and loaded in RON (Rusty Object Notation) or JSON format.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::{FollowerConfig, RoutineConfig, SensorConfig};
use crate::nav::GridConfig;
use crate::physics::BodyConfig;

/// Complete construction-time configuration for a navigating agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Grid bounds, resolution and edge penalties
    pub grid: GridConfig,
    /// Path following cadence and tolerances
    pub follower: FollowerConfig,
    /// Local probe geometry
    pub sensors: SensorConfig,
    /// Scan routine timings
    pub routine: RoutineConfig,
    /// Simulated body tuning
    pub body: BodyConfig,
}

impl NavConfig {
    /// Replace the grid configuration
    #[must_use]
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Replace the follower configuration
    #[must_use]
    pub fn with_follower(mut self, follower: FollowerConfig) -> Self {
        self.follower = follower;
        self
    }

    /// Replace the sensor configuration
    #[must_use]
    pub fn with_sensors(mut self, sensors: SensorConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Replace the routine configuration
    #[must_use]
    pub fn with_routine(mut self, routine: RoutineConfig) -> Self {
        self.routine = routine;
        self
    }

    /// Replace the body configuration
    #[must_use]
    pub fn with_body(mut self, body: BodyConfig) -> Self {
        self.body = body;
        self
    }

    /// Parse a config from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid config document
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
    }

    /// Render the config as a pretty RON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = self.to_ron_string()?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: NavConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        Ok(config)
    }

    /// Load a config, picking the format from the file extension
    ///
    /// `.json` files are read as JSON, everything else as RON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }
}

/// Errors that can occur while persisting configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

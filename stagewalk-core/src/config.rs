use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_DEBOUNCE;
use crate::emitter::DEFAULT_RATE;
use crate::error::StageError;
use crate::physics::DEFAULT_GRAVITY;

/// Session tuning. Every field has a default, so an empty TOML table is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub gravity: Vec3,
    /// Physics sub-step length in seconds.
    pub fixed_step: f32,
    pub max_substeps: u32,
    /// Minimum seconds between two notes from the same body.
    pub note_debounce: f64,
    pub player_speed: f32,
    pub player_radius: f32,
    /// Radians per pixel of mouse movement.
    pub look_sensitivity: f32,
    pub camera_start: Vec3,
    pub seed: u64,
    /// Spawns per second for stage emitters without a `rate`. The stock
    /// values are `DEFAULT_RATE` (0.25) and `BRISK_RATE` (5.0).
    pub default_emitter_rate: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            fixed_step: 1.0 / 60.0,
            max_substeps: 3,
            note_debounce: DEFAULT_DEBOUNCE,
            player_speed: 5.0,
            player_radius: 2.0,
            look_sensitivity: 0.002,
            camera_start: Vec3::new(0.0, 2.0, 5.0),
            seed: 0x5747_414c_4b,
            default_emitter_rate: DEFAULT_RATE,
        }
    }
}

impl SessionConfig {
    pub fn from_toml(source: &str) -> Result<Self, StageError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml(&self) -> Result<String, StageError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

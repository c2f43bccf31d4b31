//! Configuration loading
//!
//! Priority order:
//! 1. `--config <path>` on the command line
//! 2. `<config dir>/flypast/config.toml` (e.g. `~/.config/flypast/config.toml`)
//! 3. Compiled defaults
//!
//! Every table and field is optional; missing values fall back to the
//! shipped intro.

use crate::cue::CueConfig;
use crate::error::{FlypastError, Result};
use crate::timeline::{PhaseTimeline, TimelineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// `false` runs the intro silently without touching the device
    pub enabled: bool,
    /// Sample rate for offline renders; the device picks its own
    pub sample_rate: u32,
    /// Output gain (0.0 to 1.0)
    pub master_gain: f32,
    /// Block size for offline processing
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 44100,
            master_gain: 1.0,
            block_size: 512,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlypastConfig {
    pub audio: AudioConfig,
    pub timeline: TimelineConfig,
    pub cues: CueConfig,
}

impl FlypastConfig {
    /// Read and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlypastError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the user config file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flypast").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FlypastError::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FlypastError::Config(format!("Failed to serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if !(8000..=192_000).contains(&audio.sample_rate) {
            return Err(FlypastError::Config(format!(
                "sample_rate must be between 8000 and 192000, got {}",
                audio.sample_rate
            )));
        }
        if !(0.0..=1.0).contains(&audio.master_gain) {
            return Err(FlypastError::Config(format!(
                "master_gain must be between 0.0 and 1.0, got {}",
                audio.master_gain
            )));
        }
        if audio.block_size == 0 {
            return Err(FlypastError::Config("block_size must be positive".into()));
        }

        // Builds and validates the full table
        self.timeline()?;
        Ok(())
    }

    pub fn timeline(&self) -> Result<PhaseTimeline> {
        PhaseTimeline::from_config(&self.timeline, &self.cues)
    }
}

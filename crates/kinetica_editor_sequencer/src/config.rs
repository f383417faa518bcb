// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline configuration.
//!
//! Settings are stored as RON next to the editor session and loaded once
//! when the timeline is created.

use crate::error::{AnimationError, Result};
use crate::export::FrameSchedule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current timeline settings format version
pub const TIMELINE_FORMAT_VERSION: u32 = 1;

/// Timeline settings file name
pub const TIMELINE_FILE_NAME: &str = "timeline.ron";

/// How `play()` behaves while already playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlayMode {
    /// `play()` pauses when already playing (transport button)
    #[default]
    Toggle,
    /// `play()` always plays; only `pause()` stops
    Explicit,
}

/// Timeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Settings format version
    pub version: u32,
    /// Timeline length in seconds
    pub duration: f64,
    /// Frames per second for export and frame display
    pub frame_rate: f64,
    /// Whether playback wraps to the start
    pub looping: bool,
    /// Behaviour of `play()` while playing
    pub play_mode: PlayMode,
    /// Playback speed multiplier
    pub speed: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            version: TIMELINE_FORMAT_VERSION,
            duration: 10.0,
            frame_rate: 30.0,
            looping: false,
            play_mode: PlayMode::Toggle,
            speed: 1.0,
        }
    }
}

impl TimelineConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TimelineConfig =
            ron::from_str(&content).map_err(|e| AnimationError::Config(e.to_string()))?;

        if config.version > TIMELINE_FORMAT_VERSION {
            return Err(AnimationError::Config(format!(
                "Timeline settings version {} is newer than supported version {}",
                config.version, TIMELINE_FORMAT_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content =
            ron::ser::to_string_pretty(self, pretty).map_err(|e| AnimationError::Config(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that the numeric settings are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(AnimationError::Config(format!("Invalid duration: {}", self.duration)));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(AnimationError::Config(format!("Invalid frame rate: {}", self.frame_rate)));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(AnimationError::Config(format!("Invalid speed: {}", self.speed)));
        }
        Ok(())
    }

    /// Number of frames an export of the whole timeline produces
    pub fn frame_count(&self) -> u32 {
        FrameSchedule::new(self.duration, self.frame_rate).len()
    }
}

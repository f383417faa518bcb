// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the sequencer.

use crate::error::{AnimationError, Result};
use crate::property::AnimatableProperty;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Easing toward the next keyframe.
///
/// Only linear interpolation is evaluated. The field travels with every
/// keyframe so documents keep their shape once more curves exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Linear interpolation
    #[default]
    Linear,
}

/// A single recorded value of one property at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Property this keyframe animates
    pub property: AnimatableProperty,
    /// Time in seconds, never negative
    pub time: f64,
    /// Value at this keyframe
    pub value: f64,
    /// Easing toward the next keyframe
    pub easing: Easing,
}

impl Keyframe {
    /// Create a new keyframe with a fresh ID.
    ///
    /// Negative times are clamped to zero. Non-finite times and values are
    /// rejected.
    pub fn new(property: AnimatableProperty, time: f64, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(AnimationError::InvalidValue { property, value });
        }
        Ok(Self {
            id: KeyframeId::new(),
            property,
            time: normalize_time(time)?,
            value,
            easing: Easing::Linear,
        })
    }

    /// Set the easing mode
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A keyframe edit as it arrives from the editor (drag-end, transform-end,
/// manual input). The ID is assigned when the edit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSpec {
    /// Property being keyed
    pub property: AnimatableProperty,
    /// Value to record
    pub value: f64,
    /// Time in seconds
    pub time: f64,
    /// Easing toward the next keyframe
    #[serde(default)]
    pub easing: Easing,
}

impl KeyframeSpec {
    /// Create a linear keyframe edit
    pub fn new(property: AnimatableProperty, time: f64, value: f64) -> Self {
        Self {
            property,
            value,
            time,
            easing: Easing::Linear,
        }
    }

    /// Turn the edit into a keyframe with a fresh ID
    pub fn into_keyframe(self) -> Result<Keyframe> {
        Ok(Keyframe::new(self.property, self.time, self.value)?.with_easing(self.easing))
    }
}

/// Clamp a keyframe time into the valid range.
///
/// `-0.0` collapses to `0.0` so exact-time lookups never see two zeros.
pub(crate) fn normalize_time(time: f64) -> Result<f64> {
    if !time.is_finite() {
        return Err(AnimationError::InvalidTime(time));
    }
    Ok(if time <= 0.0 { 0.0 } else { time })
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two values
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Forward progress of `time` through the segment `[start, end]`.
    ///
    /// Returns 0 for degenerate segments.
    pub fn progress(start: f64, end: f64, time: f64) -> f64 {
        let span = end - start;
        if span <= 0.0 {
            return 0.0;
        }
        (time - start) / span
    }
}

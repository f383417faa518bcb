// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered keyframe tracks.
//!
//! A [`KeyframeTrack`] holds every keyframe recorded for one property of one
//! object, strictly ascending by time with at most one keyframe per exact
//! time. Lookups and inserts are binary searches over index bounds.

use crate::error::Result;
use crate::keyframe::{normalize_time, Interpolation, Keyframe, KeyframeId};
use crate::property::AnimatableProperty;
use serde::{Deserialize, Serialize};

/// Result of [`KeyframeTrack::locate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Index of the matching keyframe, or where a keyframe at this time belongs
    pub index: usize,
    /// Whether a keyframe sits at exactly this time (always true on an empty track)
    pub exact: bool,
}

/// Where a keyframe landed after [`KeyframeTrack::insert_or_replace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index of the keyframe in the track
    pub index: usize,
    /// Whether an existing keyframe at the same time was replaced
    pub replaced: bool,
}

/// Keyframes of one property, sorted by time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack {
    /// Property this track animates
    property: AnimatableProperty,
    /// Keyframes, strictly ascending by time
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Create an empty track
    pub fn new(property: AnimatableProperty) -> Self {
        Self {
            property,
            keyframes: Vec::new(),
        }
    }

    /// Property this track animates
    pub fn property(&self) -> AnimatableProperty {
        self.property
    }

    /// Find the keyframe at `time`, or the index where one would be inserted
    pub fn locate(&self, time: f64) -> Location {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Location { index: 0, exact: true };
        };

        if time == first.time {
            return Location { index: 0, exact: true };
        }
        if time < first.time {
            return Location { index: 0, exact: false };
        }
        if time > last.time {
            return Location {
                index: self.keyframes.len(),
                exact: false,
            };
        }

        let mut lo = 0;
        let mut hi = self.keyframes.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_time = self.keyframes[mid].time;
            if mid_time < time {
                lo = mid + 1;
            } else if mid_time > time {
                hi = mid;
            } else {
                return Location { index: mid, exact: true };
            }
        }

        Location { index: lo, exact: false }
    }

    /// Insert a keyframe, replacing any keyframe at exactly the same time
    pub fn insert_or_replace(&mut self, keyframe: Keyframe) -> Placement {
        if self.keyframes.is_empty() {
            self.keyframes.push(keyframe);
            return Placement { index: 0, replaced: false };
        }

        let Location { index, exact } = self.locate(keyframe.time);
        if exact {
            self.keyframes[index] = keyframe;
        } else {
            self.keyframes.insert(index, keyframe);
        }

        Placement {
            index,
            replaced: exact,
        }
    }

    /// Remove a keyframe by ID
    pub fn remove(&mut self, keyframe_id: KeyframeId) -> Option<Keyframe> {
        let idx = self.keyframes.iter().position(|k| k.id == keyframe_id)?;
        Some(self.keyframes.remove(idx))
    }

    /// Move a keyframe to a new time, keeping its ID.
    ///
    /// Lands with replace semantics when another keyframe already sits at
    /// the new time. Returns `None` if the keyframe is not in this track.
    pub fn move_keyframe(&mut self, keyframe_id: KeyframeId, new_time: f64) -> Result<Option<Placement>> {
        let new_time = normalize_time(new_time)?;
        let Some(mut keyframe) = self.remove(keyframe_id) else {
            return Ok(None);
        };
        keyframe.time = new_time;
        Ok(Some(self.insert_or_replace(keyframe)))
    }

    /// Evaluate the track at `time`.
    ///
    /// Holds the first value before the first keyframe and the last value
    /// after the last one; interpolates linearly in between.
    pub fn evaluate(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }

        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        if time < first.time {
            return Some(first.value);
        }
        if time > last.time {
            return Some(last.value);
        }

        let Location { index, exact } = self.locate(time);
        if exact {
            return Some(self.keyframes[index].value);
        }

        // time > first.time and not exact, so index >= 1
        let prev = &self.keyframes[index - 1];
        let next = &self.keyframes[index];
        let t = Interpolation::progress(prev.time, next.time, time);
        Some(Interpolation::lerp(prev.value, next.value, t))
    }

    /// Get keyframe by ID
    pub fn keyframe(&self, keyframe_id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == keyframe_id)
    }

    /// Get keyframe at exactly `time` (if exists)
    pub fn keyframe_at(&self, time: f64) -> Option<&Keyframe> {
        let Location { index, exact } = self.locate(time);
        if exact {
            self.keyframes.get(index)
        } else {
            None
        }
    }

    /// Get keyframes in a time range (inclusive)
    pub fn keyframes_in_range(&self, start: f64, end: f64) -> &[Keyframe] {
        let from = self.keyframes.partition_point(|k| k.time < start);
        let to = self.keyframes.partition_point(|k| k.time <= end);
        if from >= to {
            return &[];
        }
        &self.keyframes[from..to]
    }

    /// Get nearest keyframe to time
    pub fn nearest_keyframe(&self, time: f64) -> Option<&Keyframe> {
        let Location { index, .. } = self.locate(time);
        let after = self.keyframes.get(index);
        let before = index.checked_sub(1).and_then(|i| self.keyframes.get(i));

        match (before, after) {
            (Some(a), Some(b)) => {
                if (time - a.time).abs() <= (b.time - time).abs() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(kf), None) | (None, Some(kf)) => Some(kf),
            (None, None) => None,
        }
    }

    /// First keyframe
    pub fn first(&self) -> Option<&Keyframe> {
        self.keyframes.first()
    }

    /// Last keyframe
    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    /// Get the duration (time of last keyframe)
    pub fn duration(&self) -> f64 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Get keyframe count
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the track has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Get all keyframes
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable targets: one scene object and its keyframe tracks.

use crate::binding::{ObjectId, RenderTarget};
use crate::error::{AnimationError, Result, TargetError};
use crate::keyframe::{Keyframe, KeyframeId, KeyframeSpec};
use crate::property::{AnimatableProperty, ShapeKind};
use crate::track::{KeyframeTrack, Placement};
use indexmap::IndexMap;

/// Outcome of [`AnimatableTarget::add_keyframe`].
///
/// Carries enough for callers to patch derived structures (a dopesheet row,
/// a cached segment) instead of rebuilding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeInsert {
    /// ID of the keyframe now stored
    pub keyframe_id: KeyframeId,
    /// Index of the keyframe in its track
    pub index: usize,
    /// Whether a keyframe at the same time was replaced
    pub replaced: bool,
}

/// A scene object bound to its render target and keyframe tracks
pub struct AnimatableTarget {
    object_id: ObjectId,
    kind: ShapeKind,
    handle: Box<dyn RenderTarget>,
    /// One track per property that has keyframes
    tracks: IndexMap<AnimatableProperty, KeyframeTrack>,
}

impl AnimatableTarget {
    /// Bind a render target and freeze its current property values at time 0
    pub fn new(object_id: ObjectId, kind: ShapeKind, handle: impl RenderTarget + 'static) -> Result<Self> {
        let mut target = Self {
            object_id,
            kind,
            handle: Box::new(handle),
            tracks: IndexMap::new(),
        };
        target.freeze_properties(0.0)?;
        Ok(target)
    }

    /// Record the render target's current values as keyframes at `time`.
    ///
    /// Properties the node has no value for, or that mean nothing for this
    /// shape kind, are skipped. Returns the number of keyframes recorded.
    pub fn freeze_properties(&mut self, time: f64) -> Result<usize> {
        let mut recorded = 0;

        for property in self.kind.properties() {
            let value = self
                .handle
                .get(property)
                .map_err(|source| AnimationError::DisposedRenderTarget {
                    object: self.object_id,
                    source,
                })?;

            if let Some(value) = value {
                let keyframe = Keyframe::new(property, time, value)?;
                self.tracks
                    .entry(property)
                    .or_insert_with(|| KeyframeTrack::new(property))
                    .insert_or_replace(keyframe);
                recorded += 1;
            }
        }

        Ok(recorded)
    }

    /// Record a keyframe from an editor edit
    pub fn add_keyframe(&mut self, spec: KeyframeSpec) -> Result<KeyframeInsert> {
        if !self.kind.supports(spec.property) {
            return Err(AnimationError::UnsupportedProperty {
                property: spec.property,
                kind: self.kind,
            });
        }

        let keyframe = spec.into_keyframe()?;
        let keyframe_id = keyframe.id;
        let Placement { index, replaced } = self
            .tracks
            .entry(spec.property)
            .or_insert_with(|| KeyframeTrack::new(spec.property))
            .insert_or_replace(keyframe);

        Ok(KeyframeInsert {
            keyframe_id,
            index,
            replaced,
        })
    }

    /// Delete a keyframe. The property's track is dropped once it is empty.
    pub fn delete_keyframe(&mut self, property: AnimatableProperty, keyframe_id: KeyframeId) -> Option<Keyframe> {
        let track = self.tracks.get_mut(&property)?;
        let removed = track.remove(keyframe_id)?;
        if track.is_empty() {
            self.tracks.shift_remove(&property);
        }
        Some(removed)
    }

    /// Move a keyframe to a new time within its track
    pub fn move_keyframe(
        &mut self,
        property: AnimatableProperty,
        keyframe_id: KeyframeId,
        new_time: f64,
    ) -> Result<Option<KeyframeInsert>> {
        let Some(track) = self.tracks.get_mut(&property) else {
            return Ok(None);
        };

        Ok(track
            .move_keyframe(keyframe_id, new_time)?
            .map(|Placement { index, replaced }| KeyframeInsert {
                keyframe_id,
                index,
                replaced,
            }))
    }

    /// Drive the render target to its state at `time`.
    ///
    /// Properties without keyframes are left alone, and values equal to what
    /// the node already holds are not rewritten. Returns the number of writes.
    pub fn seek(&mut self, time: f64) -> std::result::Result<usize, TargetError> {
        let mut writes = 0;

        for (&property, track) in &self.tracks {
            let Some(value) = track.evaluate(time) else {
                continue;
            };

            if self.handle.get(property)? != Some(value) {
                self.handle.set(property, value)?;
                writes += 1;
            }
        }

        Ok(writes)
    }

    /// Evaluate one property at `time` without touching the render target
    pub fn sample(&self, property: AnimatableProperty, time: f64) -> Option<f64> {
        self.tracks.get(&property)?.evaluate(time)
    }

    /// Get the track for a property
    pub fn track(&self, property: AnimatableProperty) -> Option<&KeyframeTrack> {
        self.tracks.get(&property)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &KeyframeTrack> {
        self.tracks.values()
    }

    /// Time of the latest keyframe on any track
    pub fn content_duration(&self) -> f64 {
        self.tracks
            .values()
            .map(KeyframeTrack::duration)
            .fold(0.0, f64::max)
    }

    /// Object this target animates
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Shape kind of the object
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// The render target handle
    pub fn handle(&self) -> &dyn RenderTarget {
        self.handle.as_ref()
    }
}

impl std::fmt::Debug for AnimatableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatableTarget")
            .field("object_id", &self.object_id)
            .field("kind", &self.kind)
            .field("tracks", &self.tracks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory scene node used by the engine tests
    #[derive(Debug, Default)]
    pub(crate) struct MockNode {
        pub values: HashMap<AnimatableProperty, f64>,
        pub fail_writes: bool,
    }

    impl MockNode {
        pub fn with(values: &[(AnimatableProperty, f64)]) -> Self {
            Self {
                values: values.iter().copied().collect(),
                fail_writes: false,
            }
        }

        pub fn failing(values: &[(AnimatableProperty, f64)]) -> Self {
            Self {
                fail_writes: true,
                ..Self::with(values)
            }
        }
    }

    impl RenderTarget for MockNode {
        fn get(&self, property: AnimatableProperty) -> std::result::Result<Option<f64>, TargetError> {
            Ok(self.values.get(&property).copied())
        }

        fn set(&mut self, property: AnimatableProperty, value: f64) -> std::result::Result<(), TargetError> {
            if self.fail_writes {
                return Err(TargetError::Disposed);
            }
            self.values.insert(property, value);
            Ok(())
        }
    }

    fn left_target() -> AnimatableTarget {
        AnimatableTarget::new(
            ObjectId::new(),
            ShapeKind::Rect,
            MockNode::with(&[(AnimatableProperty::Left, 0.0)]),
        )
        .unwrap()
    }

    fn left(target: &AnimatableTarget) -> Option<f64> {
        target.handle().get(AnimatableProperty::Left).unwrap()
    }

    #[test]
    fn test_freeze_records_defined_values_at_zero() {
        let node = MockNode::with(&[
            (AnimatableProperty::Left, 10.0),
            (AnimatableProperty::Opacity, 1.0),
            (AnimatableProperty::Rx, 4.0),
        ]);
        let target = AnimatableTarget::new(ObjectId::new(), ShapeKind::Ellipse, node).unwrap();

        assert_eq!(target.tracks().count(), 2);
        let left = target.track(AnimatableProperty::Left).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left.first().unwrap().time, 0.0);
        assert_eq!(left.first().unwrap().value, 10.0);
        // Corner radius means nothing on an ellipse
        assert!(target.track(AnimatableProperty::Rx).is_none());
        assert!(target.track(AnimatableProperty::Width).is_none());
    }

    #[test]
    fn test_add_keyframe_reports_placement() {
        let mut target = left_target();

        let first = target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 10.0, 100.0))
            .unwrap();
        assert_eq!((first.index, first.replaced), (1, false));

        let second = target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();
        assert_eq!((second.index, second.replaced), (1, true));
        assert_ne!(first.keyframe_id, second.keyframe_id);

        let third = target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 8.0, 10.0))
            .unwrap();
        assert_eq!((third.index, third.replaced), (1, false));

        let track = target.track(AnimatableProperty::Left).unwrap();
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 8.0, 10.0]);
        assert_eq!(track.keyframe_at(10.0).unwrap().value, 50.0);
    }

    #[test]
    fn test_add_keyframe_creates_track_lazily() {
        let mut target = left_target();
        assert!(target.track(AnimatableProperty::Angle).is_none());

        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Angle, 2.0, 90.0))
            .unwrap();
        assert_eq!(target.track(AnimatableProperty::Angle).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_property_is_dropped() {
        let mut target = AnimatableTarget::new(ObjectId::new(), ShapeKind::Text, MockNode::default()).unwrap();
        let result = target.add_keyframe(KeyframeSpec::new(AnimatableProperty::Ry, 1.0, 3.0));

        assert!(matches!(result, Err(AnimationError::UnsupportedProperty { .. })));
        assert!(target.track(AnimatableProperty::Ry).is_none());
    }

    #[test]
    fn test_seek_boundaries_and_interpolation() {
        let mut target = left_target();
        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();

        target.seek(0.0).unwrap();
        assert_eq!(left(&target), Some(0.0));

        target.seek(10.0).unwrap();
        assert_eq!(left(&target), Some(50.0));

        target.seek(4.0).unwrap();
        assert_eq!(left(&target), Some(20.0));

        target.seek(30.0).unwrap();
        assert_eq!(left(&target), Some(50.0));
    }

    #[test]
    fn test_seek_holds_first_value_before_first_keyframe() {
        let mut target = AnimatableTarget::new(ObjectId::new(), ShapeKind::Rect, MockNode::default()).unwrap();
        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Top, 2.0, 40.0))
            .unwrap();
        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Top, 4.0, 80.0))
            .unwrap();

        target.seek(1.0).unwrap();
        assert_eq!(target.handle().get(AnimatableProperty::Top).unwrap(), Some(40.0));
    }

    #[test]
    fn test_seek_is_idempotent() {
        let mut target = left_target();
        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();

        assert_eq!(target.seek(7.0).unwrap(), 1);
        let value = left(&target);
        assert_eq!(target.seek(7.0).unwrap(), 0);
        assert_eq!(left(&target), value);
    }

    #[test]
    fn test_deleting_last_keyframe_drops_track() {
        let mut target = left_target();
        let id = target.track(AnimatableProperty::Left).unwrap().first().unwrap().id;

        assert!(target.delete_keyframe(AnimatableProperty::Left, id).is_some());
        assert!(target.track(AnimatableProperty::Left).is_none());
        assert!(target.delete_keyframe(AnimatableProperty::Left, id).is_none());

        // Nothing left to drive, nothing written
        assert_eq!(target.seek(3.0).unwrap(), 0);
    }

    #[test]
    fn test_move_keyframe_and_sample() {
        let mut target = left_target();
        let inserted = target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();

        let moved = target
            .move_keyframe(AnimatableProperty::Left, inserted.keyframe_id, 5.0)
            .unwrap()
            .unwrap();
        assert_eq!(moved.index, 1);
        assert_eq!(target.sample(AnimatableProperty::Left, 2.5), Some(25.0));
        assert_eq!(target.content_duration(), 5.0);
        assert_eq!(target.sample(AnimatableProperty::Opacity, 2.5), None);
    }

    #[test]
    fn test_seek_surfaces_handle_failures() {
        let mut target = AnimatableTarget::new(
            ObjectId::new(),
            ShapeKind::Rect,
            MockNode::failing(&[(AnimatableProperty::Left, 0.0)]),
        )
        .unwrap();
        target
            .add_keyframe(KeyframeSpec::new(AnimatableProperty::Left, 1.0, 5.0))
            .unwrap();

        assert_eq!(target.seek(1.0), Err(TargetError::Disposed));
    }
}

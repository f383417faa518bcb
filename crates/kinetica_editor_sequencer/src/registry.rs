// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe registry: every animatable target in the scene, keyed by object.

use crate::binding::ObjectId;
use crate::error::{AnimationError, Result};
use crate::keyframe::{Keyframe, KeyframeId, KeyframeSpec};
use crate::property::AnimatableProperty;
use crate::target::{AnimatableTarget, KeyframeInsert};
use indexmap::IndexMap;

/// Summary of one fan-out [`KeyframeRegistry::seek`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeekReport {
    /// Targets that were driven successfully
    pub targets: usize,
    /// Property writes across all targets
    pub writes: usize,
    /// Targets whose render target failed and were dropped
    pub removed: Vec<ObjectId>,
}

/// Animatable targets in insertion (layer) order
#[derive(Debug, Default)]
pub struct KeyframeRegistry {
    targets: IndexMap<ObjectId, AnimatableTarget>,
}

impl KeyframeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target, replacing any previous target for the same object
    pub fn insert(&mut self, target: AnimatableTarget) -> ObjectId {
        let id = target.object_id();
        if self.targets.insert(id, target).is_some() {
            tracing::debug!("Replaced animatable target for object {}", id);
        }
        id
    }

    /// Remove a target
    pub fn remove(&mut self, object_id: ObjectId) -> Option<AnimatableTarget> {
        self.targets.shift_remove(&object_id)
    }

    /// Get a target
    pub fn get(&self, object_id: ObjectId) -> Option<&AnimatableTarget> {
        self.targets.get(&object_id)
    }

    /// Get a mutable target
    pub fn get_mut(&mut self, object_id: ObjectId) -> Option<&mut AnimatableTarget> {
        self.targets.get_mut(&object_id)
    }

    /// Whether a target is registered for this object
    pub fn contains(&self, object_id: ObjectId) -> bool {
        self.targets.contains_key(&object_id)
    }

    /// Get all targets
    pub fn targets(&self) -> impl Iterator<Item = &AnimatableTarget> {
        self.targets.values()
    }

    /// Get all object IDs in layer order
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.targets.keys().copied()
    }

    /// Get target count
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Record a keyframe on an object
    pub fn add_keyframe(&mut self, object_id: ObjectId, spec: KeyframeSpec) -> Result<KeyframeInsert> {
        let target = self.target_mut(object_id)?;
        let inserted = target.add_keyframe(spec)?;
        tracing::debug!(
            "Keyed {} of {} at {:.3}s (index {}, replaced: {})",
            spec.property,
            object_id,
            spec.time,
            inserted.index,
            inserted.replaced
        );
        Ok(inserted)
    }

    /// Delete a keyframe from an object
    pub fn delete_keyframe(
        &mut self,
        object_id: ObjectId,
        property: AnimatableProperty,
        keyframe_id: KeyframeId,
    ) -> Result<Option<Keyframe>> {
        Ok(self.target_mut(object_id)?.delete_keyframe(property, keyframe_id))
    }

    /// Drive one object to `time`
    pub fn seek_object(&mut self, object_id: ObjectId, time: f64) -> Result<usize> {
        let target = self.target_mut(object_id)?;
        match target.seek(time) {
            Ok(writes) => Ok(writes),
            Err(source) => {
                tracing::warn!("Dropping object {}: {}", object_id, source);
                self.targets.shift_remove(&object_id);
                Err(AnimationError::DisposedRenderTarget {
                    object: object_id,
                    source,
                })
            }
        }
    }

    /// Drive every target to `time`.
    ///
    /// A target whose render target fails is dropped from the registry; the
    /// remaining targets are still driven.
    pub fn seek(&mut self, time: f64) -> SeekReport {
        let mut report = SeekReport::default();

        for (&object_id, target) in &mut self.targets {
            match target.seek(time) {
                Ok(writes) => {
                    report.targets += 1;
                    report.writes += writes;
                }
                Err(err) => {
                    tracing::warn!("Dropping object {}: {}", object_id, err);
                    report.removed.push(object_id);
                }
            }
        }

        for object_id in &report.removed {
            self.targets.shift_remove(object_id);
        }

        report
    }

    /// Time of the latest keyframe in the scene
    pub fn content_duration(&self) -> f64 {
        self.targets
            .values()
            .map(AnimatableTarget::content_duration)
            .fold(0.0, f64::max)
    }

    fn target_mut(&mut self, object_id: ObjectId) -> Result<&mut AnimatableTarget> {
        self.targets.get_mut(&object_id).ok_or_else(|| {
            tracing::debug!("Ignoring edit for missing object {}", object_id);
            AnimationError::MissingTarget(object_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::ShapeKind;
    use crate::target::tests::MockNode;

    fn add_rect(registry: &mut KeyframeRegistry, node: MockNode) -> ObjectId {
        let target = AnimatableTarget::new(ObjectId::new(), ShapeKind::Rect, node).unwrap();
        registry.insert(target)
    }

    fn left_of(registry: &KeyframeRegistry, id: ObjectId) -> Option<f64> {
        registry.get(id)?.handle().get(AnimatableProperty::Left).unwrap()
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut registry = KeyframeRegistry::new();
        let a = add_rect(&mut registry, MockNode::default());
        let b = add_rect(&mut registry, MockNode::default());
        let c = add_rect(&mut registry, MockNode::default());

        registry.remove(b);
        assert_eq!(registry.object_ids().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_target_is_reported_not_fatal() {
        let mut registry = KeyframeRegistry::new();
        let missing = ObjectId::new();

        let result = registry.add_keyframe(missing, KeyframeSpec::new(AnimatableProperty::Left, 1.0, 1.0));
        assert!(matches!(result, Err(AnimationError::MissingTarget(id)) if id == missing));
        assert!(registry.seek_object(missing, 1.0).is_err());
        assert_eq!(registry.seek(1.0), SeekReport::default());
    }

    #[test]
    fn test_fan_out_survives_failing_target() {
        let mut registry = KeyframeRegistry::new();
        let first = add_rect(&mut registry, MockNode::with(&[(AnimatableProperty::Left, 0.0)]));
        let broken = add_rect(&mut registry, MockNode::failing(&[(AnimatableProperty::Left, 0.0)]));
        let last = add_rect(&mut registry, MockNode::with(&[(AnimatableProperty::Left, 0.0)]));

        for id in [first, broken, last] {
            registry
                .add_keyframe(id, KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
                .unwrap();
        }

        let report = registry.seek(4.0);
        assert_eq!(report.targets, 2);
        assert_eq!(report.writes, 2);
        assert_eq!(report.removed, vec![broken]);

        assert_eq!(left_of(&registry, first), Some(20.0));
        assert_eq!(left_of(&registry, last), Some(20.0));
        assert!(!registry.contains(broken));

        // Next frame only sees the healthy targets
        let report = registry.seek(10.0);
        assert_eq!(report.targets, 2);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_non_finite_value_keeps_target_alive() {
        let mut registry = KeyframeRegistry::new();
        let id = add_rect(&mut registry, MockNode::with(&[(AnimatableProperty::Left, 0.0)]));
        registry
            .add_keyframe(id, KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();

        let result = registry.add_keyframe(id, KeyframeSpec::new(AnimatableProperty::Left, 5.0, f64::NAN));
        assert!(matches!(result, Err(AnimationError::InvalidValue { .. })));
        assert_eq!(registry.get(id).unwrap().track(AnimatableProperty::Left).unwrap().len(), 2);

        let report = registry.seek(4.0);
        assert!(report.removed.is_empty());
        assert_eq!(report.writes, 1);
        assert_eq!(registry.seek(4.0).writes, 0);
        assert_eq!(left_of(&registry, id), Some(20.0));
    }

    #[test]
    fn test_seek_object_drops_failing_target() {
        let mut registry = KeyframeRegistry::new();
        let broken = add_rect(&mut registry, MockNode::failing(&[(AnimatableProperty::Left, 0.0)]));
        registry
            .add_keyframe(broken, KeyframeSpec::new(AnimatableProperty::Left, 1.0, 9.0))
            .unwrap();

        let result = registry.seek_object(broken, 1.0);
        assert!(matches!(result, Err(AnimationError::DisposedRenderTarget { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_keyframe_and_content_duration() {
        let mut registry = KeyframeRegistry::new();
        let id = add_rect(&mut registry, MockNode::with(&[(AnimatableProperty::Left, 0.0)]));
        let inserted = registry
            .add_keyframe(id, KeyframeSpec::new(AnimatableProperty::Opacity, 6.0, 0.5))
            .unwrap();
        assert_eq!(registry.content_duration(), 6.0);

        let removed = registry
            .delete_keyframe(id, AnimatableProperty::Opacity, inserted.keyframe_id)
            .unwrap();
        assert_eq!(removed.map(|k| k.value), Some(0.5));
        assert_eq!(registry.content_duration(), 0.0);
        assert!(registry.get(id).unwrap().track(AnimatableProperty::Opacity).is_none());
    }
}

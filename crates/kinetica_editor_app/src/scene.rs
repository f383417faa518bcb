// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene graph.
//!
//! Scene nodes are plain property bags. The engine drives them through
//! [`SceneNodeHandle`], the renderer and the frame dump read them through
//! [`Scene::snapshot`]. Removing a node disposes its handle so a late write
//! from the engine fails instead of touching a dead object.

use indexmap::IndexMap;
use kinetica_editor_sequencer::{AnimatableProperty, ObjectId, RenderTarget, ShapeKind, TargetError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A shape on the canvas
#[derive(Debug, Clone)]
pub struct ShapeNode {
    /// Node ID
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Shape kind
    pub kind: ShapeKind,
    values: IndexMap<AnimatableProperty, f64>,
    disposed: bool,
}

impl ShapeNode {
    /// Create a node with the neutral transform (unit scale, full opacity, no rotation)
    pub fn new(kind: ShapeKind, name: impl Into<String>) -> Self {
        let mut values = IndexMap::new();
        values.insert(AnimatableProperty::Left, 0.0);
        values.insert(AnimatableProperty::Top, 0.0);
        values.insert(AnimatableProperty::ScaleX, 1.0);
        values.insert(AnimatableProperty::ScaleY, 1.0);
        values.insert(AnimatableProperty::Opacity, 1.0);
        values.insert(AnimatableProperty::Angle, 0.0);

        Self {
            id: ObjectId::new(),
            name: name.into(),
            kind,
            values,
            disposed: false,
        }
    }

    /// Rectangle at a position with a size
    pub fn rect(name: impl Into<String>, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rect, name)
            .with(AnimatableProperty::Left, left)
            .with(AnimatableProperty::Top, top)
            .with(AnimatableProperty::Width, width)
            .with(AnimatableProperty::Height, height)
            .with(AnimatableProperty::Rx, 0.0)
            .with(AnimatableProperty::Ry, 0.0)
    }

    /// Ellipse at a position with a size
    pub fn ellipse(name: impl Into<String>, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Ellipse, name)
            .with(AnimatableProperty::Left, left)
            .with(AnimatableProperty::Top, top)
            .with(AnimatableProperty::Width, width)
            .with(AnimatableProperty::Height, height)
    }

    /// Text block at a position; its size follows the text
    pub fn text(name: impl Into<String>, left: f64, top: f64) -> Self {
        Self::new(ShapeKind::Text, name)
            .with(AnimatableProperty::Left, left)
            .with(AnimatableProperty::Top, top)
    }

    /// Set a property value
    pub fn with(mut self, property: AnimatableProperty, value: f64) -> Self {
        self.values.insert(property, value);
        self
    }

    /// Get a property value
    pub fn value(&self, property: AnimatableProperty) -> Option<f64> {
        self.values.get(&property).copied()
    }
}

/// Serializable view of a node at one moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node ID
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Shape kind
    pub kind: ShapeKind,
    /// Property values
    pub values: IndexMap<AnimatableProperty, f64>,
}

/// Shared handle to a scene node
#[derive(Debug, Clone)]
pub struct SceneNodeHandle(Arc<RwLock<ShapeNode>>);

impl SceneNodeHandle {
    /// Wrap a node
    pub fn new(node: ShapeNode) -> Self {
        Self(Arc::new(RwLock::new(node)))
    }

    /// Node ID
    pub fn id(&self) -> ObjectId {
        self.0.read().id
    }

    /// Mark the node as gone; every later read or write fails
    pub fn dispose(&self) {
        self.0.write().disposed = true;
    }

    /// Take a snapshot of the node
    pub fn snapshot(&self) -> NodeSnapshot {
        let node = self.0.read();
        NodeSnapshot {
            id: node.id,
            name: node.name.clone(),
            kind: node.kind,
            values: node.values.clone(),
        }
    }
}

impl RenderTarget for SceneNodeHandle {
    fn get(&self, property: AnimatableProperty) -> Result<Option<f64>, TargetError> {
        let node = self.0.read();
        if node.disposed {
            return Err(TargetError::Disposed);
        }
        Ok(node.value(property))
    }

    fn set(&mut self, property: AnimatableProperty, value: f64) -> Result<(), TargetError> {
        let mut node = self.0.write();
        if node.disposed {
            return Err(TargetError::Disposed);
        }
        if !value.is_finite() {
            return Err(TargetError::Rejected {
                property,
                reason: format!("non-finite value {value}"),
            });
        }
        node.values.insert(property, value);
        Ok(())
    }
}

/// All nodes on the canvas, in layer order
#[derive(Debug, Default)]
pub struct Scene {
    nodes: IndexMap<ObjectId, SceneNodeHandle>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node on top of the existing ones
    pub fn add(&mut self, node: ShapeNode) -> SceneNodeHandle {
        let handle = SceneNodeHandle::new(node);
        self.nodes.insert(handle.id(), handle.clone());
        handle
    }

    /// Remove and dispose a node
    pub fn remove(&mut self, id: ObjectId) -> bool {
        match self.nodes.shift_remove(&id) {
            Some(handle) => {
                handle.dispose();
                true
            }
            None => false,
        }
    }

    /// Snapshot every node in layer order
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes.values().map(SceneNodeHandle::snapshot).collect()
    }
}

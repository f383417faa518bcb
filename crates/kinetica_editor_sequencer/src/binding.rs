// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding of animation data to scene objects.
//!
//! The engine never touches the scene graph directly. Each animated object is
//! reached through a [`RenderTarget`] handle that only knows how to read and
//! write the fixed set of [`AnimatableProperty`] values.

use crate::error::TargetError;
use crate::property::AnimatableProperty;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scene object ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to the scene node an animatable target drives
pub trait RenderTarget: Send {
    /// Read the current value of a property, `None` if the node has no value for it
    fn get(&self, property: AnimatableProperty) -> Result<Option<f64>, TargetError>;

    /// Write a property value
    fn set(&mut self, property: AnimatableProperty, value: f64) -> Result<(), TargetError>;
}

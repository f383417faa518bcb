// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the animation engine.

use crate::binding::ObjectId;
use crate::property::{AnimatableProperty, ShapeKind};
use thiserror::Error;

/// Animation engine errors
#[derive(Debug, Error)]
pub enum AnimationError {
    /// No animatable target is registered under this object ID
    #[error("No animatable target for object {0}")]
    MissingTarget(ObjectId),

    /// Property name outside the animatable set
    #[error("Unknown animatable property: {0}")]
    UnknownProperty(String),

    /// Property exists but means nothing for this shape
    #[error("Property {property} is not supported on {} shapes", kind.name())]
    UnsupportedProperty {
        /// Offending property
        property: AnimatableProperty,
        /// Shape kind of the target
        kind: ShapeKind,
    },

    /// Time is not a finite number
    #[error("Invalid keyframe time: {0}")]
    InvalidTime(f64),

    /// Value is not a finite number
    #[error("Invalid value for {property}: {value}")]
    InvalidValue {
        /// Property being keyed
        property: AnimatableProperty,
        /// Rejected value
        value: f64,
    },

    /// The render target behind an object failed
    #[error("Render target for object {object} is unusable: {source}")]
    DisposedRenderTarget {
        /// Object whose target failed
        object: ObjectId,
        /// Underlying handle error
        #[source]
        source: TargetError,
    },

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for animation engine operations
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Errors reported by a render-target handle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    /// The underlying scene node has been disposed
    #[error("Render target has been disposed")]
    Disposed,

    /// The scene node refused a value
    #[error("Render target rejected {property}: {reason}")]
    Rejected {
        /// Property being written
        property: AnimatableProperty,
        /// Reason given by the scene graph
        reason: String,
    },
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable properties and the shape kinds that carry them.

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A numeric property of a scene object that can be keyframed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimatableProperty {
    /// Horizontal position
    Left,
    /// Vertical position
    Top,
    /// Width
    Width,
    /// Height
    Height,
    /// Horizontal scale factor
    ScaleX,
    /// Vertical scale factor
    ScaleY,
    /// Opacity (0 to 1)
    Opacity,
    /// Rotation in degrees
    Angle,
    /// Horizontal corner radius
    Rx,
    /// Vertical corner radius
    Ry,
}

impl AnimatableProperty {
    /// Every animatable property, in freeze order
    pub const ALL: [AnimatableProperty; 10] = [
        Self::Left,
        Self::Top,
        Self::Width,
        Self::Height,
        Self::ScaleX,
        Self::ScaleY,
        Self::Opacity,
        Self::Angle,
        Self::Rx,
        Self::Ry,
    ];

    /// Get the property name as used by the scene graph
    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Width => "width",
            Self::Height => "height",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Opacity => "opacity",
            Self::Angle => "angle",
            Self::Rx => "rx",
            Self::Ry => "ry",
        }
    }

    /// Whether this is a corner radius
    pub fn is_corner_radius(&self) -> bool {
        matches!(self, Self::Rx | Self::Ry)
    }
}

impl std::fmt::Display for AnimatableProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimatableProperty {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| AnimationError::UnknownProperty(s.to_string()))
    }
}

/// Kind of scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShapeKind {
    /// Rectangle, optionally with rounded corners
    #[default]
    Rect,
    /// Ellipse or circle
    Ellipse,
    /// Triangle
    Triangle,
    /// Raster image
    Image,
    /// Text block
    Text,
}

impl ShapeKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rect => "Rect",
            Self::Ellipse => "Ellipse",
            Self::Triangle => "Triangle",
            Self::Image => "Image",
            Self::Text => "Text",
        }
    }

    /// Whether `property` means anything for this kind of shape
    pub fn supports(&self, property: AnimatableProperty) -> bool {
        !property.is_corner_radius() || *self == Self::Rect
    }

    /// Properties that can be animated on this kind of shape
    pub fn properties(&self) -> impl Iterator<Item = AnimatableProperty> + '_ {
        AnimatableProperty::ALL
            .into_iter()
            .filter(move |p| self.supports(*p))
    }
}

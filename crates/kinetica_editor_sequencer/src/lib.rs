// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe animation engine for Kinetica Editor.
//!
//! This crate stores, edits and evaluates per-object, per-property keyframes
//! and drives scene objects to their state at any point on the timeline:
//! - Ordered keyframe tracks with binary-search insert/replace
//! - Animatable targets bound to opaque render-target handles
//! - A registry of targets keyed by object
//! - Timeline playback, scrubbing and frame export
//!
//! ## Architecture
//!
//! The engine is synchronous and single-threaded. Hosts own a
//! [`KeyframeRegistry`] and a [`TimelineController`] and call into them from
//! their frame callback and edit handlers; nothing is global.

pub mod binding;
pub mod config;
pub mod error;
pub mod export;
pub mod keyframe;
pub mod property;
pub mod registry;
pub mod target;
pub mod timeline;
pub mod track;

pub use binding::{ObjectId, RenderTarget};
pub use config::{PlayMode, TimelineConfig, TIMELINE_FILE_NAME, TIMELINE_FORMAT_VERSION};
pub use error::{AnimationError, Result, TargetError};
pub use export::{ExportFrame, FrameSchedule};
pub use keyframe::{Easing, Interpolation, Keyframe, KeyframeId, KeyframeSpec};
pub use property::{AnimatableProperty, ShapeKind};
pub use registry::{KeyframeRegistry, SeekReport};
pub use target::{AnimatableTarget, KeyframeInsert};
pub use timeline::{PlaybackState, SubscriptionId, TickOutcome, TimelineController};
pub use track::{KeyframeTrack, Location, Placement};

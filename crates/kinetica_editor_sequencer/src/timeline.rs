// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback controller.
//!
//! The controller owns the playhead. While playing, the host calls
//! [`TimelineController::tick`] once per frame with the frame's timestamp;
//! scrubbing goes through [`TimelineController::seek`]. Both fan the new time
//! out to every target in the [`KeyframeRegistry`] and then tell observers.

use crate::config::{PlayMode, TimelineConfig};
use crate::error::Result;
use crate::registry::{KeyframeRegistry, SeekReport};
use indexmap::IndexMap;
use std::time::Instant;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not started, or ran off the end
    #[default]
    Stopped,
    /// Advancing with the wall clock
    Playing,
    /// Interrupted by the user or a scrub
    Paused,
}

/// Handle returned by [`TimelineController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type TimeObserver = Box<dyn FnMut(f64) + Send>;

/// Outcome of one playback tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Playhead after the tick
    pub time: f64,
    /// Fan-out summary
    pub report: SeekReport,
    /// Whether playback is still running
    pub playing: bool,
}

/// Play/pause/seek clock driving the keyframe registry
pub struct TimelineController {
    current_time: f64,
    state: PlaybackState,
    duration: f64,
    frame_rate: f64,
    looping: bool,
    play_mode: PlayMode,
    speed: f64,
    /// Timestamp of the previous frame while playing
    last_tick: Option<Instant>,
    observers: IndexMap<SubscriptionId, TimeObserver>,
    next_subscription: u64,
}

impl TimelineController {
    /// Create a controller from timeline settings.
    ///
    /// Fails when the duration, frame rate or speed is not a positive number.
    pub fn new(config: &TimelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &TimelineConfig) -> Self {
        Self {
            current_time: 0.0,
            state: PlaybackState::Stopped,
            duration: config.duration,
            frame_rate: config.frame_rate,
            looping: config.looping,
            play_mode: config.play_mode,
            speed: config.speed,
            last_tick: None,
            observers: IndexMap::new(),
            next_subscription: 0,
        }
    }

    /// Start playback now, or pause in [`PlayMode::Toggle`] if already playing
    pub fn play(&mut self) -> PlaybackState {
        self.play_at(Instant::now())
    }

    /// Start playback with `now` as the first frame reference
    pub fn play_at(&mut self, now: Instant) -> PlaybackState {
        if self.state == PlaybackState::Playing {
            if self.play_mode == PlayMode::Toggle {
                self.pause();
            }
            return self.state;
        }

        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }

        self.state = PlaybackState::Playing;
        self.last_tick = Some(now);
        tracing::info!("Playback started at {:.3}s", self.current_time);
        self.state
    }

    /// Pause playback. The pending frame reference is dropped so the paused
    /// interval never counts toward elapsed time.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.last_tick = None;
            tracing::info!("Playback paused at {:.3}s", self.current_time);
        }
    }

    /// Stop and return to the beginning
    pub fn stop(&mut self, registry: &mut KeyframeRegistry) -> SeekReport {
        self.state = PlaybackState::Stopped;
        self.last_tick = None;
        self.current_time = 0.0;
        let report = registry.seek(0.0);
        self.notify();
        report
    }

    /// Advance playback to the frame at `now`.
    ///
    /// Returns `None` when not playing.
    pub fn tick(&mut self, now: Instant, registry: &mut KeyframeRegistry) -> Option<TickOutcome> {
        if self.state != PlaybackState::Playing {
            return None;
        }

        let last = self.last_tick.replace(now).unwrap_or(now);
        let dt = now.saturating_duration_since(last).as_secs_f64() * self.speed;
        self.current_time = (self.current_time + dt).min(self.duration);

        let report = registry.seek(self.current_time);
        self.notify();
        let time = self.current_time;

        if self.current_time >= self.duration {
            if self.looping {
                self.current_time = 0.0;
            } else {
                self.state = PlaybackState::Stopped;
                self.last_tick = None;
                tracing::info!("Playback reached the end at {:.3}s", self.duration);
            }
        }

        Some(TickOutcome {
            time,
            report,
            playing: self.is_playing(),
        })
    }

    /// Move the playhead to `time`, pausing playback first.
    ///
    /// The time is clamped to the timeline. Observers are told only when
    /// `notify` is set.
    pub fn seek(&mut self, time: f64, notify: bool, registry: &mut KeyframeRegistry) -> SeekReport {
        self.pause();
        self.current_time = self.clamp(time);

        let report = registry.seek(self.current_time);
        if notify {
            self.notify();
        }
        report
    }

    /// Register a "current time changed" observer
    pub fn subscribe(&mut self, observer: impl FnMut(f64) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.insert(id, Box::new(observer));
        id
    }

    /// Remove an observer
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.shift_remove(&id).is_some()
    }

    fn notify(&mut self) {
        let time = self.current_time;
        for observer in self.observers.values_mut() {
            observer(time);
        }
    }

    fn clamp(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration)
    }

    /// Current playhead time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Timeline length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Whether playback wraps to the start
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Set the playback speed multiplier (ignored unless positive and finite)
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
    }

    /// Convert time to frame number
    pub fn time_to_frame(&self, time: f64) -> u32 {
        (self.clamp(time) * self.frame_rate).floor() as u32
    }

    /// Convert frame number to time
    pub fn frame_to_time(&self, frame: u32) -> f64 {
        self.clamp(f64::from(frame) / self.frame_rate)
    }

    /// Get current frame number
    pub fn current_frame(&self) -> u32 {
        self.time_to_frame(self.current_time)
    }
}

impl std::fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineController")
            .field("current_time", &self.current_time)
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("looping", &self.looping)
            .field("play_mode", &self.play_mode)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::from_valid(&TimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ObjectId, RenderTarget};
    use crate::keyframe::KeyframeSpec;
    use crate::property::{AnimatableProperty, ShapeKind};
    use crate::target::tests::MockNode;
    use crate::target::AnimatableTarget;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn scene() -> (KeyframeRegistry, ObjectId) {
        let mut registry = KeyframeRegistry::new();
        let target = AnimatableTarget::new(
            ObjectId::new(),
            ShapeKind::Rect,
            MockNode::with(&[(AnimatableProperty::Left, 0.0)]),
        )
        .unwrap();
        let id = registry.insert(target);
        registry
            .add_keyframe(id, KeyframeSpec::new(AnimatableProperty::Left, 10.0, 50.0))
            .unwrap();
        (registry, id)
    }

    fn left(registry: &KeyframeRegistry, id: ObjectId) -> f64 {
        registry
            .get(id)
            .unwrap()
            .handle()
            .get(AnimatableProperty::Left)
            .unwrap()
            .unwrap()
    }

    fn recorder(timeline: &mut TimelineController) -> Arc<Mutex<Vec<f64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        timeline.subscribe(move |t| sink.lock().unwrap().push(t));
        seen
    }

    #[test]
    fn test_tick_advances_by_wall_clock() {
        let (mut registry, id) = scene();
        let mut timeline = TimelineController::default();
        let start = Instant::now();

        timeline.play_at(start);
        let outcome = timeline.tick(start + Duration::from_secs(4), &mut registry).unwrap();

        assert_eq!(outcome.time, 4.0);
        assert!(outcome.playing);
        assert_eq!(left(&registry, id), 20.0);
    }

    #[test]
    fn test_pause_excludes_paused_interval() {
        let (mut registry, _) = scene();
        let mut timeline = TimelineController::default();
        let start = Instant::now();

        timeline.play_at(start);
        timeline.tick(start + Duration::from_secs(1), &mut registry);
        timeline.pause();
        assert!(timeline.tick(start + Duration::from_secs(2), &mut registry).is_none());

        // Resume five seconds later: only time since resuming counts
        timeline.play_at(start + Duration::from_secs(6));
        timeline.tick(start + Duration::from_secs(7), &mut registry);
        assert_eq!(timeline.current_time(), 2.0);
    }

    #[test]
    fn test_play_toggles_in_toggle_mode() {
        let mut timeline = TimelineController::default();
        assert_eq!(timeline.play(), PlaybackState::Playing);
        assert_eq!(timeline.play(), PlaybackState::Paused);
    }

    #[test]
    fn test_play_is_idempotent_in_explicit_mode() {
        let config = TimelineConfig {
            play_mode: PlayMode::Explicit,
            ..TimelineConfig::default()
        };
        let mut timeline = TimelineController::new(&config).unwrap();
        assert_eq!(timeline.play(), PlaybackState::Playing);
        assert_eq!(timeline.play(), PlaybackState::Playing);
        timeline.pause();
        assert_eq!(timeline.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_end_stops_or_loops() {
        let (mut registry, id) = scene();
        let start = Instant::now();

        let mut timeline = TimelineController::default();
        timeline.play_at(start);
        let outcome = timeline.tick(start + Duration::from_secs(15), &mut registry).unwrap();
        assert_eq!(outcome.time, 10.0);
        assert!(!outcome.playing);
        assert_eq!(timeline.state(), PlaybackState::Stopped);
        assert_eq!(left(&registry, id), 50.0);

        let mut looping = TimelineController::new(&TimelineConfig {
            looping: true,
            ..TimelineConfig::default()
        })
        .unwrap();
        looping.play_at(start);
        let outcome = looping.tick(start + Duration::from_secs(15), &mut registry).unwrap();
        assert_eq!(outcome.time, 10.0);
        assert!(outcome.playing);
        assert_eq!(looping.current_time(), 0.0);
    }

    #[test]
    fn test_play_at_end_rewinds() {
        let (mut registry, _) = scene();
        let mut timeline = TimelineController::default();
        timeline.seek(10.0, false, &mut registry);
        timeline.play();
        assert_eq!(timeline.current_time(), 0.0);
    }

    #[test]
    fn test_seek_clamps_pauses_and_notifies() {
        let (mut registry, id) = scene();
        let mut timeline = TimelineController::default();
        let seen = recorder(&mut timeline);

        timeline.play();
        timeline.seek(-5.0, true, &mut registry);
        assert_eq!(timeline.current_time(), 0.0);
        assert_eq!(timeline.state(), PlaybackState::Paused);

        timeline.seek(99.0, false, &mut registry);
        assert_eq!(timeline.current_time(), 10.0);
        assert_eq!(left(&registry, id), 50.0);

        timeline.seek(f64::NAN, true, &mut registry);
        assert_eq!(timeline.current_time(), 0.0);

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_scrub_backwards() {
        let (mut registry, id) = scene();
        let mut timeline = TimelineController::default();

        timeline.seek(8.0, false, &mut registry);
        assert_eq!(left(&registry, id), 40.0);
        timeline.seek(2.0, false, &mut registry);
        assert_eq!(left(&registry, id), 10.0);
    }

    #[test]
    fn test_observers_fire_per_tick_and_unsubscribe() {
        let (mut registry, _) = scene();
        let mut timeline = TimelineController::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = timeline.subscribe(move |t| sink.lock().unwrap().push(t));
        let start = Instant::now();

        timeline.play_at(start);
        timeline.tick(start + Duration::from_secs(1), &mut registry);
        timeline.tick(start + Duration::from_secs(3), &mut registry);
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 3.0]);

        assert!(timeline.unsubscribe(id));
        timeline.tick(start + Duration::from_secs(4), &mut registry);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(!timeline.unsubscribe(id));
    }

    #[test]
    fn test_speed_and_frames() {
        let (mut registry, _) = scene();
        let mut timeline = TimelineController::default();
        timeline.set_speed(2.0);
        let start = Instant::now();

        timeline.play_at(start);
        timeline.tick(start + Duration::from_millis(1500), &mut registry);
        assert_eq!(timeline.current_time(), 3.0);
        assert_eq!(timeline.current_frame(), 90);
        assert_eq!(timeline.frame_to_time(15), 0.5);
    }

    #[test]
    fn test_unusable_settings_are_rejected() {
        for config in [
            TimelineConfig {
                duration: -1.0,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                duration: f64::NAN,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                frame_rate: 0.0,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                speed: f64::INFINITY,
                ..TimelineConfig::default()
            },
        ] {
            assert!(matches!(
                TimelineController::new(&config),
                Err(crate::error::AnimationError::Config(_))
            ));
        }
    }

    #[test]
    fn test_stop_rewinds_targets() {
        let (mut registry, id) = scene();
        let mut timeline = TimelineController::default();
        timeline.seek(6.0, false, &mut registry);
        assert_eq!(left(&registry, id), 30.0);

        timeline.stop(&mut registry);
        assert_eq!(timeline.state(), PlaybackState::Stopped);
        assert_eq!(left(&registry, id), 0.0);
    }
}

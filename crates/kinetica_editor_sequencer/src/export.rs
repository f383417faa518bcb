// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-by-frame export driver.
//!
//! Export walks the timeline one output frame at a time through the same
//! seek path used for scrubbing, so a preview and an exported video show
//! identical values for the same time.

use crate::registry::KeyframeRegistry;
use crate::timeline::TimelineController;

/// One output frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportFrame {
    /// Frame index from 0
    pub index: u32,
    /// Timeline time of this frame in seconds
    pub time: f64,
}

/// Times of every frame in an export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSchedule {
    frame_rate: f64,
    duration: f64,
    frames: u32,
}

impl FrameSchedule {
    /// Schedule covering `[0, duration]` at `frame_rate`, last frame included.
    ///
    /// When the duration is not a whole number of frames, a final short frame
    /// lands exactly on `duration`.
    pub fn new(duration: f64, frame_rate: f64) -> Self {
        let frames = if duration > 0.0 && frame_rate > 0.0 {
            let exact = duration * frame_rate;
            // Float noise such as 0.1 * 30 = 3.0000000000000004 is still 3 steps
            let steps = if (exact - exact.round()).abs() < 1e-9 {
                exact.round()
            } else {
                exact.ceil()
            };
            steps as u32 + 1
        } else {
            1
        };
        Self {
            frame_rate,
            duration: duration.max(0.0),
            frames,
        }
    }

    /// Number of frames
    pub fn len(&self) -> u32 {
        self.frames
    }

    /// Whether the schedule is empty (never true; frame 0 always exists)
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Frame at `index`
    pub fn frame(&self, index: u32) -> ExportFrame {
        let time = if self.frame_rate > 0.0 {
            (f64::from(index) / self.frame_rate).min(self.duration)
        } else {
            0.0
        };
        ExportFrame { index, time }
    }

    /// Iterate every frame in order
    pub fn frames(&self) -> impl Iterator<Item = ExportFrame> + '_ {
        (0..self.frames).map(move |index| self.frame(index))
    }
}

impl TimelineController {
    /// Drive every frame of the timeline and hand each one to `capture`.
    ///
    /// Playback is paused for the duration of the export and observers are
    /// not notified. Afterwards the playhead is restored and playback resumes
    /// if it was running. Returns the number of frames captured; the first
    /// capture error aborts the export.
    pub fn export_frames<E>(
        &mut self,
        registry: &mut KeyframeRegistry,
        mut capture: impl FnMut(ExportFrame, &KeyframeRegistry) -> Result<(), E>,
    ) -> Result<u32, E> {
        let schedule = FrameSchedule::new(self.duration(), self.frame_rate());
        let resume_at = self.current_time();
        let was_playing = self.is_playing();
        tracing::info!(
            "Exporting {} frames at {} fps",
            schedule.len(),
            self.frame_rate()
        );

        let mut captured = 0;
        let result = schedule.frames().try_for_each(|frame| {
            self.seek(frame.time, false, registry);
            capture(frame, registry)?;
            captured += 1;
            Ok(())
        });

        self.seek(resume_at, false, registry);
        if was_playing {
            self.play();
        }

        match result {
            Ok(()) => {
                tracing::info!("Export finished: {} frames", captured);
                Ok(captured)
            }
            Err(err) => {
                tracing::warn!("Export aborted after {} frames", captured);
                Err(err)
            }
        }
    }
}

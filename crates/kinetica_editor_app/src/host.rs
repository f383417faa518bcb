// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine host.
//!
//! Runs the scene, the keyframe registry and the timeline on a single task.
//! Everything else talks to it through [`EngineHandle`], which turns method
//! calls into [`EngineCommand`] messages and waits for the reply. Inside the
//! task all work is synchronous, so no lock guards the keyframe data.

use crate::frame_dump::{FrameDump, FrameRecord};
use crate::scene::{NodeSnapshot, Scene, ShapeNode};
use kinetica_editor_sequencer::{
    AnimatableProperty, AnimatableTarget, AnimationError, Keyframe, KeyframeId, KeyframeInsert,
    KeyframeRegistry, KeyframeSpec, ObjectId, PlaybackState, SeekReport, TimelineConfig,
    TimelineController,
};
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

/// Interval between preview frames while playing
pub const PREVIEW_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Depth of the command queue
const COMMAND_QUEUE_DEPTH: usize = 64;

/// Engine host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The engine task is no longer running
    #[error("Engine host has stopped")]
    EngineStopped,

    /// Animation engine error
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Messages accepted by the engine host
#[derive(Debug)]
pub enum EngineCommand {
    /// Add a node to the scene and start animating it
    AddObject {
        /// Node to add
        node: ShapeNode,
        /// Reply channel
        reply: oneshot::Sender<Result<ObjectId, AnimationError>>,
    },
    /// Remove a node and its keyframes
    RemoveObject {
        /// Node to remove
        id: ObjectId,
        /// Reply channel, true if the node existed
        reply: oneshot::Sender<bool>,
    },
    /// Record a keyframe
    AddKeyframe {
        /// Object being keyed
        id: ObjectId,
        /// The edit
        spec: KeyframeSpec,
        /// Reply channel
        reply: oneshot::Sender<Result<KeyframeInsert, AnimationError>>,
    },
    /// Delete a keyframe
    DeleteKeyframe {
        /// Object owning the keyframe
        id: ObjectId,
        /// Property track
        property: AnimatableProperty,
        /// Keyframe to delete
        keyframe_id: KeyframeId,
        /// Reply channel
        reply: oneshot::Sender<Result<Option<Keyframe>, AnimationError>>,
    },
    /// Start (or toggle) playback
    Play {
        /// Reply channel with the resulting state
        reply: oneshot::Sender<PlaybackState>,
    },
    /// Pause playback
    Pause {
        /// Reply channel with the playhead where playback stopped
        reply: oneshot::Sender<f64>,
    },
    /// Move the playhead
    Seek {
        /// Target time in seconds
        time: f64,
        /// Whether time observers should hear about it
        notify: bool,
        /// Reply channel with the fan-out summary
        reply: oneshot::Sender<SeekReport>,
    },
    /// Snapshot every node
    Snapshot {
        /// Reply channel
        reply: oneshot::Sender<Vec<NodeSnapshot>>,
    },
    /// Render every frame of the timeline
    Export {
        /// Reply channel
        reply: oneshot::Sender<Vec<FrameRecord>>,
    },
    /// Stop the host
    Shutdown,
}

/// The engine and everything it drives
pub struct EngineHost {
    scene: Scene,
    registry: KeyframeRegistry,
    timeline: TimelineController,
    frame_interval: Duration,
    time_tx: watch::Sender<f64>,
}

impl EngineHost {
    /// Create a host with an empty scene. Fails on unusable timeline settings.
    pub fn new(config: &TimelineConfig) -> Result<Self, AnimationError> {
        let (time_tx, _) = watch::channel(0.0);
        let mut timeline = TimelineController::new(config)?;

        let publisher = time_tx.clone();
        timeline.subscribe(move |time| {
            publisher.send_replace(time);
        });

        Ok(Self {
            scene: Scene::new(),
            registry: KeyframeRegistry::new(),
            timeline,
            frame_interval: PREVIEW_FRAME_INTERVAL,
            time_tx,
        })
    }

    /// Change the preview frame interval
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Start the host on the current tokio runtime
    pub fn spawn(self) -> EngineHandle {
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let time = self.time_tx.subscribe();
        tokio::spawn(self.run(rx));
        EngineHandle { commands, time }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Engine host started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command) {
                        break;
                    }
                }
                _ = frames.tick(), if self.timeline.is_playing() => {
                    self.on_frame(Instant::now());
                }
            }
        }

        tracing::info!("Engine host stopped");
    }

    /// Apply one command. Returns false when the host should stop.
    fn handle(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::AddObject { node, reply } => {
                let _ = reply.send(self.add_object(node));
            }
            EngineCommand::RemoveObject { id, reply } => {
                let _ = reply.send(self.remove_object(id));
            }
            EngineCommand::AddKeyframe { id, spec, reply } => {
                let _ = reply.send(self.registry.add_keyframe(id, spec));
            }
            EngineCommand::DeleteKeyframe {
                id,
                property,
                keyframe_id,
                reply,
            } => {
                let _ = reply.send(self.registry.delete_keyframe(id, property, keyframe_id));
            }
            EngineCommand::Play { reply } => {
                let _ = reply.send(self.timeline.play());
            }
            EngineCommand::Pause { reply } => {
                self.timeline.pause();
                let _ = reply.send(self.timeline.current_time());
            }
            EngineCommand::Seek { time, notify, reply } => {
                let report = self.timeline.seek(time, notify, &mut self.registry);
                self.forget_removed(&report);
                let _ = reply.send(report);
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(self.scene.snapshot());
            }
            EngineCommand::Export { reply } => {
                let _ = reply.send(self.export());
            }
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn add_object(&mut self, node: ShapeNode) -> Result<ObjectId, AnimationError> {
        let kind = node.kind;
        let handle = self.scene.add(node);
        let id = handle.id();

        match AnimatableTarget::new(id, kind, handle) {
            Ok(target) => {
                self.registry.insert(target);
                tracing::info!("Added {} {}", kind.name(), id);
                Ok(id)
            }
            Err(err) => {
                self.scene.remove(id);
                Err(err)
            }
        }
    }

    fn remove_object(&mut self, id: ObjectId) -> bool {
        let had_target = self.registry.remove(id).is_some();
        let had_node = self.scene.remove(id);
        if had_node {
            tracing::info!("Removed {}", id);
        }
        had_target || had_node
    }

    fn on_frame(&mut self, now: Instant) {
        if let Some(outcome) = self.timeline.tick(now, &mut self.registry) {
            self.forget_removed(&outcome.report);
        }
    }

    fn export(&mut self) -> Vec<FrameRecord> {
        let mut dump = FrameDump::new();
        let scene = &self.scene;
        let result = self
            .timeline
            .export_frames(&mut self.registry, |frame, _| {
                dump.capture(frame, scene);
                Ok::<_, Infallible>(())
            });

        match result {
            Ok(_) => dump.into_records(),
            Err(never) => match never {},
        }
    }

    /// Drop scene nodes whose targets the registry gave up on
    fn forget_removed(&mut self, report: &SeekReport) {
        for id in &report.removed {
            self.scene.remove(*id);
        }
    }
}

/// Client side of the engine host
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    time: watch::Receiver<f64>,
}

impl EngineHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> EngineCommand) -> Result<T, HostError> {
        let (reply, response) = oneshot::channel();
        self.send(make(reply)).await?;
        response.await.map_err(|_| HostError::EngineStopped)
    }

    async fn send(&self, command: EngineCommand) -> Result<(), HostError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HostError::EngineStopped)
    }

    /// Add a node to the scene
    pub async fn add_object(&self, node: ShapeNode) -> Result<ObjectId, HostError> {
        Ok(self.request(|reply| EngineCommand::AddObject { node, reply }).await??)
    }

    /// Remove a node from the scene
    pub async fn remove_object(&self, id: ObjectId) -> Result<bool, HostError> {
        self.request(|reply| EngineCommand::RemoveObject { id, reply }).await
    }

    /// Record a keyframe
    pub async fn add_keyframe(&self, id: ObjectId, spec: KeyframeSpec) -> Result<KeyframeInsert, HostError> {
        Ok(self
            .request(|reply| EngineCommand::AddKeyframe { id, spec, reply })
            .await??)
    }

    /// Delete a keyframe
    pub async fn delete_keyframe(
        &self,
        id: ObjectId,
        property: AnimatableProperty,
        keyframe_id: KeyframeId,
    ) -> Result<Option<Keyframe>, HostError> {
        Ok(self
            .request(|reply| EngineCommand::DeleteKeyframe {
                id,
                property,
                keyframe_id,
                reply,
            })
            .await??)
    }

    /// Start (or toggle) playback
    pub async fn play(&self) -> Result<PlaybackState, HostError> {
        self.request(|reply| EngineCommand::Play { reply }).await
    }

    /// Pause playback and return the playhead where it stopped
    pub async fn pause(&self) -> Result<f64, HostError> {
        self.request(|reply| EngineCommand::Pause { reply }).await
    }

    /// Scrub to `time` and notify time observers
    pub async fn seek(&self, time: f64) -> Result<SeekReport, HostError> {
        self.request(|reply| EngineCommand::Seek {
            time,
            notify: true,
            reply,
        })
        .await
    }

    /// Snapshot every node
    pub async fn snapshot(&self) -> Result<Vec<NodeSnapshot>, HostError> {
        self.request(|reply| EngineCommand::Snapshot { reply }).await
    }

    /// Render every frame of the timeline
    pub async fn export(&self) -> Result<Vec<FrameRecord>, HostError> {
        self.request(|reply| EngineCommand::Export { reply }).await
    }

    /// Stop the host
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.send(EngineCommand::Shutdown).await
    }

    /// Latest playhead time published by the host
    pub fn current_time(&self) -> f64 {
        *self.time.borrow()
    }

    /// Receiver for playhead updates
    pub fn time_updates(&self) -> watch::Receiver<f64> {
        self.time.clone()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Kinetica` Editor - headless editor host
//!
//! Hosts the keyframe animation engine behind a message-passing boundary:
//! - In-memory scene graph driven through render-target handles
//! - Engine host task owning the keyframe registry and timeline
//! - Frame export as JSON lines for the video encoder
//!
//! ## Usage
//!
//! `kinetica_editor [timeline.ron]` builds a small demo scene, keys an
//! animation, previews it briefly, scrubs, and writes every exported frame
//! to stdout. Logs go to stderr.

mod frame_dump;
mod host;
mod scene;

use host::{EngineHandle, EngineHost, HostError};
use kinetica_editor_sequencer::{AnimatableProperty, KeyframeSpec, TimelineConfig};
use scene::ShapeNode;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("kinetica_editor_app=debug".parse().unwrap())
        .add_directive("kinetica_editor_sequencer=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Kinetica Editor host v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => match TimelineConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Could not load timeline settings from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => TimelineConfig::default(),
    };

    if let Err(e) = run(config).await {
        tracing::error!("Editor host failed: {e}");
        std::process::exit(1);
    }
}

async fn run(config: TimelineConfig) -> Result<(), HostError> {
    let engine = EngineHost::new(&config)?
        .with_frame_interval(Duration::from_secs_f64(1.0 / config.frame_rate))
        .spawn();

    build_demo(&engine).await?;

    let mut playhead = engine.time_updates();
    tokio::spawn(async move {
        while playhead.changed().await.is_ok() {
            tracing::debug!("Playhead at {:.3}s", *playhead.borrow_and_update());
        }
    });

    engine.play().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let paused_at = engine.pause().await?;
    tracing::info!("Preview paused at {:.3}s", paused_at);

    let report = engine.seek(4.0).await?;
    tracing::info!(
        "Scrubbed to {:.3}s: {} objects, {} writes",
        engine.current_time(),
        report.targets,
        report.writes
    );

    let records = engine.export().await?;
    frame_dump::write_json_lines(&records, std::io::stdout().lock())?;

    engine.shutdown().await
}

/// A card that slides in and fades, a badge that pulses, and a caption
async fn build_demo(engine: &EngineHandle) -> Result<(), HostError> {
    let card = engine
        .add_object(ShapeNode::rect("Card", 682.5, 120.0, 240.0, 160.0))
        .await?;
    for (time, left) in [(2.0, 288.5), (3.0, 388.5), (3.5, 388.5), (12.0, 1101.5)] {
        engine
            .add_keyframe(card, KeyframeSpec::new(AnimatableProperty::Left, time, left))
            .await?;
    }
    engine
        .add_keyframe(card, KeyframeSpec::new(AnimatableProperty::Rx, 3.0, 24.0))
        .await?;
    let fade = engine
        .add_keyframe(card, KeyframeSpec::new(AnimatableProperty::Opacity, 9.0, 0.2))
        .await?;
    // Re-keying the same time replaces the value
    engine
        .add_keyframe(card, KeyframeSpec::new(AnimatableProperty::Opacity, 9.0, 0.0))
        .await?;
    tracing::debug!("Opacity key {} replaced: {}", fade.keyframe_id, fade.replaced);

    let badge = engine
        .add_object(ShapeNode::ellipse("Badge", 80.0, 80.0, 48.0, 48.0))
        .await?;
    for (time, scale) in [(1.0, 1.4), (2.0, 1.0), (3.0, 1.4)] {
        engine
            .add_keyframe(badge, KeyframeSpec::new(AnimatableProperty::ScaleX, time, scale))
            .await?;
        engine
            .add_keyframe(badge, KeyframeSpec::new(AnimatableProperty::ScaleY, time, scale))
            .await?;
    }
    let spin = engine
        .add_keyframe(badge, KeyframeSpec::new(AnimatableProperty::Angle, 5.0, 360.0))
        .await?;
    engine
        .delete_keyframe(badge, AnimatableProperty::Angle, spin.keyframe_id)
        .await?;

    let caption = engine.add_object(ShapeNode::text("Caption", 40.0, 400.0)).await?;
    engine
        .add_keyframe(caption, KeyframeSpec::new(AnimatableProperty::Top, 1.5, 360.0))
        .await?;

    let scratch = engine
        .add_object(ShapeNode::rect("Scratch", 0.0, 0.0, 10.0, 10.0))
        .await?;
    engine.remove_object(scratch).await?;

    let nodes = engine.snapshot().await?;
    tracing::info!("Demo scene ready with {} objects", nodes.len());
    Ok(())
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame dump for the export pipeline.
//!
//! The encoder lives outside the editor. Export hands it one JSON line per
//! frame with every node's property values, in layer order.

use crate::scene::{NodeSnapshot, Scene};
use kinetica_editor_sequencer::ExportFrame;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Scene state at one exported frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame index from 0
    pub frame: u32,
    /// Timeline time in seconds
    pub time: f64,
    /// Node states in layer order
    pub nodes: Vec<NodeSnapshot>,
}

/// Collected frames of one export
#[derive(Debug, Clone, Default)]
pub struct FrameDump {
    records: Vec<FrameRecord>,
}

impl FrameDump {
    /// Create an empty dump
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the scene as it stands for `frame`
    pub fn capture(&mut self, frame: ExportFrame, scene: &Scene) {
        self.records.push(FrameRecord {
            frame: frame.index,
            time: frame.time,
            nodes: scene.snapshot(),
        });
    }

    /// Consume the dump
    pub fn into_records(self) -> Vec<FrameRecord> {
        self.records
    }
}

/// Write frames as JSON lines
pub fn write_json_lines(records: &[FrameRecord], mut out: impl Write) -> std::io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ShapeNode;
    use kinetica_editor_sequencer::AnimatableProperty;

    #[test]
    fn test_capture_and_write() {
        let mut scene = Scene::new();
        scene.add(ShapeNode::rect("Card", 5.0, 0.0, 10.0, 10.0));

        let mut dump = FrameDump::new();
        dump.capture(ExportFrame { index: 0, time: 0.0 }, &scene);
        dump.capture(ExportFrame { index: 1, time: 0.5 }, &scene);
        let records = dump.into_records();
        assert_eq!(records.len(), 2);

        let mut out = Vec::new();
        write_json_lines(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: FrameRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.frame, 1);
        assert_eq!(parsed.time, 0.5);
        assert_eq!(parsed.nodes[0].values[&AnimatableProperty::Left], 5.0);
        assert!(lines[0].contains("\"left\":5.0"));
    }
}

//! Scripted and synthetic detection sources.
//!
//! Neither source touches a camera or a model; they exist so the pipeline and
//! the daemon can run end to end in tests and stub deployments.

use anyhow::Result;

use crate::detect::options::DetectorOptions;
use crate::detect::source::{DetectionSource, FrameObservation, SourceStats};
use crate::stabilize::{BoundingRegion, Detection};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

/// Replays a fixed script of per-frame detections, then reports absent
/// forever. Used by tests that need exact frame-by-frame control.
pub struct ScriptedSource {
    script: Vec<Option<Detection>>,
    cursor: usize,
    stats: SourceStats,
}

impl ScriptedSource {
    pub fn new(script: Vec<Option<Detection>>) -> Self {
        Self {
            script,
            cursor: 0,
            stats: SourceStats::default(),
        }
    }
}

impl DetectionSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn next_observation(&mut self) -> Result<FrameObservation> {
        let detection = self.script.get(self.cursor).cloned().flatten();
        self.cursor += 1;
        self.stats.frames_produced += 1;
        if detection.is_some() {
            self.stats.detections_produced += 1;
        }
        Ok(FrameObservation {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            rotation_degrees: 0,
            detection,
        })
    }

    fn stats(&self) -> SourceStats {
        self.stats
    }
}

/// Synthetic scene for stub daemon runs: cycles through a label set, holding
/// each label for a fixed number of frames with an idle gap in between, so a
/// full session (box, announce, icon, cooldown) plays out on its own.
pub struct SyntheticSource {
    options: DetectorOptions,
    labels: Vec<&'static str>,
    hold_frames: u64,
    gap_frames: u64,
    frame_count: u64,
    stats: SourceStats,
}

impl SyntheticSource {
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            labels: vec!["dog", "cat", "bottle", "chair"],
            // At 10 fps: 2 seconds on-object (enough to confirm), 1 second idle.
            hold_frames: 20,
            gap_frames: 10,
            frame_count: 0,
            stats: SourceStats::default(),
        }
    }

    fn synthesize(&self) -> Option<Detection> {
        let cycle = self.hold_frames + self.gap_frames;
        let phase = self.frame_count % cycle;
        if phase >= self.hold_frames {
            return None;
        }
        let index = ((self.frame_count / cycle) as usize) % self.labels.len();
        let confidence = 0.6 + 0.05 * (phase % 4) as f32;
        if confidence < self.options.confidence_threshold {
            return None;
        }
        Some(Detection {
            label: self.labels[index].to_string(),
            confidence,
            region: BoundingRegion {
                top: 80.0,
                left: 120.0,
                bottom: 360.0,
                right: 480.0,
            },
        })
    }
}

impl DetectionSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn next_observation(&mut self) -> Result<FrameObservation> {
        let detection = self.synthesize();
        self.frame_count += 1;
        self.stats.frames_produced += 1;
        if detection.is_some() {
            self.stats.detections_produced += 1;
        }
        Ok(FrameObservation {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            rotation_degrees: 0,
            detection,
        })
    }

    fn reconfigure(&mut self, options: &DetectorOptions) -> Result<()> {
        options.validate()?;
        self.options = *options;
        log::info!(
            "synthetic source reconfigured: threshold={:.2} threads={} backend={:?} model={}",
            options.confidence_threshold,
            options.worker_threads,
            options.backend,
            options.model.asset_name()
        );
        Ok(())
    }

    fn stats(&self) -> SourceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            region: BoundingRegion::default(),
        }
    }

    #[test]
    fn scripted_source_replays_then_goes_absent() {
        let mut source =
            ScriptedSource::new(vec![Some(detection("dog")), None, Some(detection("cat"))]);

        assert_eq!(
            source
                .next_observation()
                .unwrap()
                .detection
                .unwrap()
                .label,
            "dog"
        );
        assert!(source.next_observation().unwrap().detection.is_none());
        assert_eq!(
            source
                .next_observation()
                .unwrap()
                .detection
                .unwrap()
                .label,
            "cat"
        );
        // Script exhausted: absent forever after.
        assert!(source.next_observation().unwrap().detection.is_none());

        let stats = source.stats();
        assert_eq!(stats.frames_produced, 4);
        assert_eq!(stats.detections_produced, 2);
    }

    #[test]
    fn synthetic_source_holds_then_gaps() {
        let mut source = SyntheticSource::new(DetectorOptions::default());

        let first = source.next_observation().unwrap().detection.unwrap();
        assert_eq!(first.label, "dog");

        // Hold phase: same label for hold_frames frames.
        for _ in 1..20 {
            let obs = source.next_observation().unwrap();
            assert_eq!(obs.detection.unwrap().label, "dog");
        }
        // Gap phase: absent.
        for _ in 0..10 {
            assert!(source.next_observation().unwrap().detection.is_none());
        }
        // Next cycle moves to the next label.
        let next = source.next_observation().unwrap().detection.unwrap();
        assert_eq!(next.label, "cat");
    }

    #[test]
    fn raising_threshold_suppresses_detections() {
        let mut source = SyntheticSource::new(DetectorOptions::default());
        let strict = DetectorOptions {
            confidence_threshold: 0.8,
            ..DetectorOptions::default()
        };
        source.reconfigure(&strict).unwrap();

        for _ in 0..30 {
            assert!(source.next_observation().unwrap().detection.is_none());
        }
    }
}

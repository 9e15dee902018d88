//! Pipeline wiring.
//!
//! One `Pipeline` owns the stabilizer and both sinks and is driven with one
//! call per observation, in arrival order, from a single thread. Per frame it:
//!
//! 1. Feeds the detection (or its absence) into the stabilizer
//! 2. Forwards the resulting render command(s) to the renderer
//! 3. Hands a confirmed label to the announcer worker (never blocking)
//! 4. Publishes a fresh state snapshot for cross-thread readers
//!
//! Sink failures stay inside their component: a renderer or announcer error is
//! logged and the state machine keeps its timing and transitions regardless.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::announce::AnnouncerHandle;
use crate::detect::FrameObservation;
use crate::render::Renderer;
use crate::stabilize::{SnapshotCell, Stabilizer};
use crate::translate::Translator;

pub struct Pipeline<R: Renderer> {
    stabilizer: Stabilizer,
    renderer: R,
    announcer: AnnouncerHandle,
    snapshots: Arc<SnapshotCell>,
    frames_processed: u64,
    announcements: u64,
}

/// Counters for health logging.
#[derive(Clone, Copy, Debug)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub announcements: u64,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(translator: Arc<Translator>, renderer: R, announcer: AnnouncerHandle) -> Self {
        Self {
            stabilizer: Stabilizer::new(translator),
            renderer,
            announcer,
            snapshots: Arc::new(SnapshotCell::default()),
            frames_processed: 0,
            announcements: 0,
        }
    }

    /// Shared snapshot cell for renderer-side readers.
    pub fn snapshots(&self) -> Arc<SnapshotCell> {
        self.snapshots.clone()
    }

    /// Process one observation at monotonic time `now`.
    pub fn process(&mut self, observation: &FrameObservation, now: Instant) -> Result<()> {
        self.stabilizer
            .note_frame_dimensions(observation.width, observation.height);
        let output = self.stabilizer.on_frame(observation.detection.as_ref(), now);

        if let Some(flash) = &output.flash {
            if let Err(e) = self.renderer.render(flash) {
                log::warn!("render failed: {}", e);
            }
        }
        if let Err(e) = self.renderer.render(&output.render) {
            log::warn!("render failed: {}", e);
        }

        if let Some(label) = output.announce {
            self.announcements += 1;
            self.announcer.dispatch(&label);
        }

        self.frames_processed += 1;
        self.snapshots.publish(self.stabilizer.snapshot())?;
        Ok(())
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            frames_processed: self.frames_processed,
            announcements: self.announcements,
        }
    }
}

//! Detection source boundary.
//!
//! The inference engine and camera stack live behind this trait. A source
//! yields one observation per frame: the frame's dimensions and rotation
//! metadata plus zero or one detection already gated by the configured
//! confidence threshold.
//!
//! Sources are:
//! - Infinite and non-restartable (a failed frame is reported, not retried
//!   by the caller)
//! - Reconfigurable between frames (never mid-frame)
//! - Responsible for their own backpressure (drop-oldest)

use anyhow::Result;

use crate::detect::options::DetectorOptions;
use crate::stabilize::Detection;

/// One frame worth of detector output.
#[derive(Clone, Debug)]
pub struct FrameObservation {
    pub width: u32,
    pub height: u32,
    /// Camera rotation metadata in degrees; the source has already normalized
    /// the image, this is carried for diagnostics only.
    pub rotation_degrees: i32,
    pub detection: Option<Detection>,
}

/// Cumulative counters for health logging.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceStats {
    pub frames_produced: u64,
    pub detections_produced: u64,
}

/// Frame-detection stream the pipeline consumes.
pub trait DetectionSource: Send {
    /// Source identifier for logs.
    fn name(&self) -> &'static str;

    /// Produce the next observation. An error means this frame is lost; the
    /// caller logs it and carries on as if the detection were absent.
    fn next_observation(&mut self) -> Result<FrameObservation>;

    /// Apply new detector options before the next frame.
    fn reconfigure(&mut self, _options: &DetectorOptions) -> Result<()> {
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats;
}

//! Detection stabilization state machine.
//!
//! This module decides when a stream of per-frame detections has settled on a
//! single object long enough to count as a deliberate focus, fires a one-shot
//! announcement, and holds a cooldown before detection resumes.
//!
//! The stabilizer is the ONLY writer of its state:
//! - `on_frame` runs on the capture worker, one call per frame, never
//!   concurrently.
//! - Everything else (renderer, status reporting) reads an immutable snapshot
//!   published through `SnapshotCell`.
//!
//! `on_frame` MUST NOT:
//! - Block or perform I/O (side effects are returned as commands)
//! - Invoke the announcer or renderer directly
//! - Use wall-clock time (callers pass a monotonic `Instant`)

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::translate::Translator;

/// Minimum duration a label must persist unchanged before confirmation.
pub const STABILITY_WINDOW: Duration = Duration::from_millis(1000);

/// Duration the announcement overlay stays up before detection resumes.
pub const COOLDOWN_WINDOW: Duration = Duration::from_millis(4000);

// ----------------------------------------------------------------------------
// Detection payload
// ----------------------------------------------------------------------------

/// Bounding region in source-image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingRegion {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

/// One inference result for the current frame.
///
/// Produced fresh each frame by the detection source. The stabilizer copies
/// the label and region into its own state; the rest is dropped with the call.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub region: BoundingRegion,
}

// ----------------------------------------------------------------------------
// Output commands
// ----------------------------------------------------------------------------

/// Visual state requested from the renderer for this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Nothing to draw over the camera view.
    HideOverlay,
    /// Bounding box around the current candidate, with its translated label.
    ShowBox {
        region: BoundingRegion,
        label: String,
    },
    /// Static confirmation icon while the announcement plays out.
    ShowIcon,
}

/// Result of one `on_frame` call.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    /// One-shot box flash forwarded at the confirmation instant, before the
    /// icon switch. Cosmetic; absent on every other frame.
    pub flash: Option<RenderCommand>,
    pub render: RenderCommand,
    /// Translated label to announce. Set exactly once per session.
    pub announce: Option<String>,
}

impl FrameOutput {
    fn render(render: RenderCommand) -> Self {
        Self {
            flash: None,
            render,
            announce: None,
        }
    }
}

// ----------------------------------------------------------------------------
// State machine
// ----------------------------------------------------------------------------

/// Stabilizer mode. `Announcing` implies the candidate label has been cleared
/// and the announcement for this session has already fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Detecting,
    Announcing,
}

/// Debounce-and-announce state machine.
///
/// Consumes the per-frame detection stream and emits render/announce commands.
/// Runs for the lifetime of the session; there is no terminal state.
pub struct Stabilizer {
    translator: Arc<Translator>,
    mode: Mode,
    /// Last translated label seen; empty when idle.
    candidate_label: String,
    /// Instant of the last candidate change, reused as the announcement-entry
    /// instant once the machine enters `Announcing`.
    last_change: Option<Instant>,
    /// Last known region; meaningful only in `Detecting` with a detection.
    current_region: Option<BoundingRegion>,
    image_width: u32,
    image_height: u32,
}

impl Stabilizer {
    pub fn new(translator: Arc<Translator>) -> Self {
        Self {
            translator,
            mode: Mode::Detecting,
            candidate_label: String::new(),
            last_change: None,
            current_region: None,
            image_width: 0,
            image_height: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Record the dimensions of the frame about to be processed. The renderer
    /// derives its scale factor from these; the state machine ignores them.
    pub fn note_frame_dimensions(&mut self, width: u32, height: u32) {
        self.image_width = width;
        self.image_height = height;
    }

    /// Advance the state machine by one frame.
    ///
    /// `now` must come from a monotonic clock. Calls must be sequential and in
    /// arrival order; the caller owns the frame for the duration of the call.
    pub fn on_frame(&mut self, detection: Option<&Detection>, now: Instant) -> FrameOutput {
        match self.mode {
            Mode::Detecting => self.on_detecting_frame(detection, now),
            Mode::Announcing => self.on_announcing_frame(now),
        }
    }

    fn on_detecting_frame(&mut self, detection: Option<&Detection>, now: Instant) -> FrameOutput {
        let Some(detection) = detection else {
            // Absent detection: no state change, nothing to overlay.
            return FrameOutput::render(RenderCommand::HideOverlay);
        };

        let translated = self.translator.translate(&detection.label).to_string();

        // A label change resets the stability timer. No partial credit.
        if translated != self.candidate_label {
            self.candidate_label = translated.clone();
            self.last_change = Some(now);
        }
        self.current_region = Some(detection.region);

        let origin = self.last_change.unwrap_or(now);
        if now.duration_since(origin) >= STABILITY_WINDOW {
            // Confirmation instant: announce once, switch to the icon, and
            // reuse the timestamp field as the cooldown origin.
            self.mode = Mode::Announcing;
            self.last_change = Some(now);
            self.candidate_label.clear();
            return FrameOutput {
                flash: Some(RenderCommand::ShowBox {
                    region: detection.region,
                    label: translated.clone(),
                }),
                render: RenderCommand::ShowIcon,
                announce: Some(translated),
            };
        }

        FrameOutput::render(RenderCommand::ShowBox {
            region: detection.region,
            label: translated,
        })
    }

    fn on_announcing_frame(&mut self, now: Instant) -> FrameOutput {
        let origin = self.last_change.unwrap_or(now);
        if now.duration_since(origin) >= COOLDOWN_WINDOW {
            self.mode = Mode::Detecting;
            self.candidate_label.clear();
            self.current_region = None;
            return FrameOutput::render(RenderCommand::HideOverlay);
        }

        // Announcement already fired for this session; detections arriving
        // during the cooldown are ignored, not buffered.
        FrameOutput::render(RenderCommand::ShowIcon)
    }

    /// Immutable copy of the current state for cross-thread consumers.
    pub fn snapshot(&self) -> StabilizerSnapshot {
        StabilizerSnapshot {
            mode: self.mode,
            candidate_label: if self.candidate_label.is_empty() {
                None
            } else {
                Some(self.candidate_label.clone())
            },
            region: match self.mode {
                Mode::Detecting => self.current_region,
                Mode::Announcing => None,
            },
            image_width: self.image_width,
            image_height: self.image_height,
        }
    }
}

// ----------------------------------------------------------------------------
// Snapshot publication
// ----------------------------------------------------------------------------

/// Point-in-time copy of the stabilizer state.
#[derive(Clone, Debug)]
pub struct StabilizerSnapshot {
    pub mode: Mode,
    pub candidate_label: Option<String>,
    /// Region of the current candidate; `None` outside `Detecting`.
    pub region: Option<BoundingRegion>,
    pub image_width: u32,
    pub image_height: u32,
}

impl StabilizerSnapshot {
    pub fn idle() -> Self {
        Self {
            mode: Mode::Detecting,
            candidate_label: None,
            region: None,
            image_width: 0,
            image_height: 0,
        }
    }
}

/// Copy-on-write handoff between the capture worker and readers.
///
/// The capture worker publishes a fresh `Arc` after each update; readers clone
/// the current `Arc` and work from that. The lock is held only for the pointer
/// swap, never across rendering, so readers can never observe a half-updated
/// state.
pub struct SnapshotCell {
    inner: Mutex<Arc<StabilizerSnapshot>>,
}

impl SnapshotCell {
    pub fn new(initial: StabilizerSnapshot) -> Self {
        Self {
            inner: Mutex::new(Arc::new(initial)),
        }
    }

    pub fn publish(&self, snapshot: StabilizerSnapshot) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("snapshot cell lock poisoned"))?;
        *guard = Arc::new(snapshot);
        Ok(())
    }

    pub fn load(&self) -> Result<Arc<StabilizerSnapshot>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("snapshot cell lock poisoned"))?;
        Ok(guard.clone())
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new(StabilizerSnapshot::idle())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stabilizer() -> Stabilizer {
        Stabilizer::new(Arc::new(Translator::empty()))
    }

    fn detection(label: &str) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            region: BoundingRegion {
                top: 10.0,
                left: 20.0,
                bottom: 110.0,
                right: 220.0,
            },
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_detection_shows_box_without_announcing() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        let out = stab.on_frame(Some(&detection("dog")), t0);
        assert!(out.announce.is_none());
        assert!(out.flash.is_none());
        assert!(matches!(out.render, RenderCommand::ShowBox { .. }));
        assert_eq!(stab.mode(), Mode::Detecting);
    }

    #[test]
    fn confirmation_emits_flash_icon_and_announce() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        stab.on_frame(Some(&detection("dog")), t0);
        let out = stab.on_frame(Some(&detection("dog")), t0 + ms(1000));

        assert_eq!(out.announce.as_deref(), Some("dog"));
        assert_eq!(out.render, RenderCommand::ShowIcon);
        assert!(matches!(
            out.flash,
            Some(RenderCommand::ShowBox { .. })
        ));
        assert_eq!(stab.mode(), Mode::Announcing);
    }

    #[test]
    fn candidate_label_cleared_on_announcing_entry() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        stab.on_frame(Some(&detection("dog")), t0);
        stab.on_frame(Some(&detection("dog")), t0 + ms(1000));

        let snapshot = stab.snapshot();
        assert_eq!(snapshot.mode, Mode::Announcing);
        assert!(snapshot.candidate_label.is_none());
        assert!(snapshot.region.is_none());
    }

    #[test]
    fn label_change_restarts_stability_window() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        stab.on_frame(Some(&detection("dog")), t0);
        stab.on_frame(Some(&detection("cat")), t0 + ms(900));

        // 1000ms after the first dog frame, but only 100ms after the switch.
        let out = stab.on_frame(Some(&detection("cat")), t0 + ms(1000));
        assert!(out.announce.is_none());
        assert_eq!(stab.mode(), Mode::Detecting);

        let out = stab.on_frame(Some(&detection("cat")), t0 + ms(1900));
        assert_eq!(out.announce.as_deref(), Some("cat"));
    }

    #[test]
    fn absent_detection_leaves_timer_untouched() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        stab.on_frame(Some(&detection("dog")), t0);
        let out = stab.on_frame(None, t0 + ms(500));
        assert_eq!(out.render, RenderCommand::HideOverlay);

        // The gap did not reset the window: dog is still confirmed at 1000ms.
        let out = stab.on_frame(Some(&detection("dog")), t0 + ms(1000));
        assert_eq!(out.announce.as_deref(), Some("dog"));
    }

    #[test]
    fn cooldown_holds_icon_then_returns_to_detecting() {
        let mut stab = stabilizer();
        let t0 = Instant::now();

        stab.on_frame(Some(&detection("dog")), t0);
        stab.on_frame(Some(&detection("dog")), t0 + ms(1000));

        // Frames inside [T, T+4000) stay in Announcing with the icon up.
        for offset in [1100, 2000, 4999] {
            let out = stab.on_frame(Some(&detection("cat")), t0 + ms(offset));
            assert_eq!(out.render, RenderCommand::ShowIcon);
            assert!(out.announce.is_none());
            assert_eq!(stab.mode(), Mode::Announcing);
        }

        let out = stab.on_frame(Some(&detection("cat")), t0 + ms(5000));
        assert_eq!(out.render, RenderCommand::HideOverlay);
        assert_eq!(stab.mode(), Mode::Detecting);
    }

    #[test]
    fn snapshot_cell_publishes_fresh_arcs() {
        let cell = SnapshotCell::default();
        let before = cell.load().unwrap();
        assert_eq!(before.mode, Mode::Detecting);

        let mut stab = stabilizer();
        stab.note_frame_dimensions(640, 480);
        stab.on_frame(Some(&detection("dog")), Instant::now());
        cell.publish(stab.snapshot()).unwrap();

        let after = cell.load().unwrap();
        assert_eq!(after.candidate_label.as_deref(), Some("dog"));
        assert_eq!((after.image_width, after.image_height), (640, 480));
        // The earlier reader still holds the old state.
        assert!(before.candidate_label.is_none());
    }
}

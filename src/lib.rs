//! Scene narrator
//!
//! This crate implements the stabilization-and-announcement pipeline behind a
//! point-and-hear object narrator: a camera feed runs through an object
//! detector, and once the user has held the camera steady on one object for a
//! full second the detected label is announced exactly once, with a cooldown
//! before live detection resumes.
//!
//! # Architecture
//!
//! Data flows one way: detection source -> stabilizer -> {renderer, announcer}.
//!
//! - `translate`: English-to-localized label table, loaded once, identity
//!   fallback
//! - `stabilize`: the core state machine (stability window, one-shot
//!   announce, cooldown) plus snapshot publication
//! - `detect`: the detection-source boundary (trait, options, stub sources)
//! - `frame`: drop-oldest frame handoff between capture and processing
//! - `render` / `announce`: command sinks; slow work runs off the capture path
//! - `pipeline`: wiring and per-frame dispatch
//! - `config`: daemon configuration (file + env)
//!
//! The detector, camera stack, drawing surface, and speech engine are
//! external collaborators behind traits; the crate owns only the temporal
//! logic between them.

pub mod announce;
pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod render;
pub mod stabilize;
pub mod translate;

pub use announce::{Announcer, AnnouncerHandle, ConsoleAnnouncer};
pub use config::{CaptureSettings, NarratordConfig, ViewSettings};
pub use detect::{
    select_backend, DetectionSource, DetectorOptions, DeviceCapabilities, ExecutionBackend,
    FrameObservation, ModelKind, ScriptedSource, SourceStats, SyntheticSource,
};
pub use frame::FrameMailbox;
pub use pipeline::{Pipeline, PipelineStats};
pub use render::{ConsoleRenderer, DedupRenderer, OverlayLayout, Renderer};
pub use stabilize::{
    BoundingRegion, Detection, FrameOutput, Mode, RenderCommand, SnapshotCell, Stabilizer,
    StabilizerSnapshot, COOLDOWN_WINDOW, STABILITY_WINDOW,
};
pub use translate::Translator;

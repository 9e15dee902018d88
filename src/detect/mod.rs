mod options;
mod scripted;
mod source;

pub use options::{
    select_backend, DetectorOptions, DeviceCapabilities, ExecutionBackend, ModelKind,
    MAX_CONFIDENCE_THRESHOLD, MAX_WORKER_THREADS, MIN_CONFIDENCE_THRESHOLD, MIN_WORKER_THREADS,
};
pub use scripted::{ScriptedSource, SyntheticSource};
pub use source::{DetectionSource, FrameObservation, SourceStats};

//! Detector configuration surface.
//!
//! These options shape what the detection source reports; the stabilizer
//! algorithm itself never reads them. A source may be reconfigured between
//! frames, and the pipeline treats any transient inability to produce a
//! detection as "absent".

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.1;
pub const MAX_CONFIDENCE_THRESHOLD: f32 = 0.8;
pub const CONFIDENCE_STEP: f32 = 0.1;

pub const MIN_WORKER_THREADS: u32 = 1;
pub const MAX_WORKER_THREADS: u32 = 4;

/// Hardware delegate the detector runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionBackend {
    #[default]
    Cpu,
    Gpu,
    Nnapi,
}

impl ExecutionBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "nnapi" => Ok(Self::Nnapi),
            other => Err(anyhow!("unknown execution backend '{}'", other)),
        }
    }
}

/// The four fixed detector models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum ModelKind {
    #[default]
    #[serde(rename = "mobilenetv1")]
    MobileNetV1,
    #[serde(rename = "efficientdet-lite0")]
    EfficientDetLite0,
    #[serde(rename = "efficientdet-lite1")]
    EfficientDetLite1,
    #[serde(rename = "efficientdet-lite2")]
    EfficientDetLite2,
}

impl ModelKind {
    /// Model asset file name shipped with the application.
    pub fn asset_name(&self) -> &'static str {
        match self {
            Self::MobileNetV1 => "mobilenetv1.tflite",
            Self::EfficientDetLite0 => "efficientdet-lite0.tflite",
            Self::EfficientDetLite1 => "efficientdet-lite1.tflite",
            Self::EfficientDetLite2 => "efficientdet-lite2.tflite",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "mobilenetv1" => Ok(Self::MobileNetV1),
            "efficientdet-lite0" => Ok(Self::EfficientDetLite0),
            "efficientdet-lite1" => Ok(Self::EfficientDetLite1),
            "efficientdet-lite2" => Ok(Self::EfficientDetLite2),
            other => Err(anyhow!("unknown model '{}'", other)),
        }
    }
}

/// Options passed to the detection source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorOptions {
    /// Score below which a result does not count as a detection.
    pub confidence_threshold: f32,
    pub worker_threads: u32,
    pub backend: ExecutionBackend,
    pub model: ModelKind,
    /// At most one result per frame; the stabilizer consumes zero or one.
    pub max_results: u32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            worker_threads: 2,
            backend: ExecutionBackend::Cpu,
            model: ModelKind::MobileNetV1,
            max_results: 1,
        }
    }
}

impl DetectorOptions {
    /// Raise the threshold by one step, clamped to the allowed range.
    pub fn step_threshold_up(&mut self) {
        self.confidence_threshold =
            (self.confidence_threshold + CONFIDENCE_STEP).min(MAX_CONFIDENCE_THRESHOLD);
    }

    /// Lower the threshold by one step, clamped to the allowed range.
    pub fn step_threshold_down(&mut self) {
        self.confidence_threshold =
            (self.confidence_threshold - CONFIDENCE_STEP).max(MIN_CONFIDENCE_THRESHOLD);
    }

    pub fn add_worker_thread(&mut self) {
        if self.worker_threads < MAX_WORKER_THREADS {
            self.worker_threads += 1;
        }
    }

    pub fn remove_worker_thread(&mut self) {
        if self.worker_threads > MIN_WORKER_THREADS {
            self.worker_threads -= 1;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_CONFIDENCE_THRESHOLD..=MAX_CONFIDENCE_THRESHOLD)
            .contains(&self.confidence_threshold)
        {
            return Err(anyhow!(
                "confidence_threshold must be within [{}, {}]",
                MIN_CONFIDENCE_THRESHOLD,
                MAX_CONFIDENCE_THRESHOLD
            ));
        }
        if !(MIN_WORKER_THREADS..=MAX_WORKER_THREADS).contains(&self.worker_threads) {
            return Err(anyhow!(
                "worker_threads must be within [{}, {}]",
                MIN_WORKER_THREADS,
                MAX_WORKER_THREADS
            ));
        }
        if self.max_results != 1 {
            return Err(anyhow!("max_results is fixed at 1"));
        }
        Ok(())
    }
}

/// What the host hardware can actually run.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviceCapabilities {
    pub gpu_supported: bool,
    pub nnapi_supported: bool,
}

/// Resolve the requested backend against device capabilities.
///
/// An unsupported GPU request falls back to CPU; the caller surfaces the
/// notice to the user once, not per frame.
pub fn select_backend(
    requested: ExecutionBackend,
    capabilities: DeviceCapabilities,
) -> ExecutionBackend {
    match requested {
        ExecutionBackend::Gpu if !capabilities.gpu_supported => {
            log::warn!("GPU delegate not supported on this device; falling back to CPU");
            ExecutionBackend::Cpu
        }
        ExecutionBackend::Nnapi if !capabilities.nnapi_supported => {
            log::warn!("NNAPI delegate not supported on this device; falling back to CPU");
            ExecutionBackend::Cpu
        }
        other => other,
    }
}

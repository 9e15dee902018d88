use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::{
    DetectorOptions, ExecutionBackend, ModelKind, MAX_WORKER_THREADS, MIN_WORKER_THREADS,
};

const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_VIEW_WIDTH: u32 = 1280;
const DEFAULT_VIEW_HEIGHT: u32 = 960;

#[derive(Debug, Deserialize, Default)]
struct NarratordConfigFile {
    dictionary_path: Option<PathBuf>,
    detector: Option<DetectorConfigFile>,
    capture: Option<CaptureConfigFile>,
    view: Option<ViewConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    confidence_threshold: Option<f32>,
    worker_threads: Option<u32>,
    backend: Option<ExecutionBackend>,
    model: Option<ModelKind>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ViewConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NarratordConfig {
    /// Dictionary resource; `None` means identity translation.
    pub dictionary_path: Option<PathBuf>,
    pub detector: DetectorOptions,
    pub capture: CaptureSettings,
    pub view: ViewSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub target_fps: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewSettings {
    pub width: u32,
    pub height: u32,
}

impl NarratordConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("NARRATOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: NarratordConfigFile) -> Self {
        let defaults = DetectorOptions::default();
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorOptions {
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            worker_threads: detector_file
                .worker_threads
                .unwrap_or(defaults.worker_threads),
            backend: detector_file.backend.unwrap_or(defaults.backend),
            model: detector_file.model.unwrap_or(defaults.model),
            max_results: defaults.max_results,
        };
        let capture = CaptureSettings {
            target_fps: file
                .capture
                .and_then(|capture| capture.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let view = ViewSettings {
            width: file
                .view
                .as_ref()
                .and_then(|view| view.width)
                .unwrap_or(DEFAULT_VIEW_WIDTH),
            height: file
                .view
                .and_then(|view| view.height)
                .unwrap_or(DEFAULT_VIEW_HEIGHT),
        };
        Self {
            dictionary_path: file.dictionary_path,
            detector,
            capture,
            view,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("NARRATOR_DICTIONARY") {
            if !path.trim().is_empty() {
                self.dictionary_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(threshold) = std::env::var("NARRATOR_CONFIDENCE_THRESHOLD") {
            self.detector.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("NARRATOR_CONFIDENCE_THRESHOLD must be a float"))?;
        }
        if let Ok(threads) = std::env::var("NARRATOR_WORKER_THREADS") {
            self.detector.worker_threads = threads.parse().map_err(|_| {
                anyhow!(
                    "NARRATOR_WORKER_THREADS must be an integer in [{}, {}]",
                    MIN_WORKER_THREADS,
                    MAX_WORKER_THREADS
                )
            })?;
        }
        if let Ok(backend) = std::env::var("NARRATOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = ExecutionBackend::parse(&backend)?;
            }
        }
        if let Ok(model) = std::env::var("NARRATOR_MODEL") {
            if !model.trim().is_empty() {
                self.detector.model = ModelKind::parse(&model)?;
            }
        }
        if let Ok(fps) = std::env::var("NARRATOR_TARGET_FPS") {
            self.capture.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("NARRATOR_TARGET_FPS must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.capture.target_fps == 0 {
            return Err(anyhow!("capture target_fps must be greater than zero"));
        }
        if self.view.width == 0 || self.view.height == 0 {
            return Err(anyhow!("view dimensions must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<NarratordConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

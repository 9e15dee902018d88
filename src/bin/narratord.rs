//! narratord - scene narrator daemon
//!
//! This daemon:
//! 1. Captures observations from the configured detection source on a
//!    dedicated worker (synthetic source in stub deployments)
//! 2. Hands each one through a drop-oldest mailbox to the processing loop
//! 3. Runs the stabilizer per frame and dispatches render/announce commands
//! 4. Publishes state snapshots for any renderer-side reader
//!
//! Ctrl-C stops frame delivery first; in-flight announcements drain on the
//! announcer worker before exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use scene_narrator::{
    select_backend, AnnouncerHandle, ConsoleAnnouncer, ConsoleRenderer, DedupRenderer,
    DetectionSource, DeviceCapabilities, FrameMailbox, NarratordConfig, OverlayLayout, Pipeline,
    SyntheticSource, Translator,
};

#[derive(Parser, Debug)]
#[command(name = "narratord", about = "Detection stabilization and announcement daemon")]
struct Args {
    /// Config file path (also honored via NARRATOR_CONFIG)
    #[arg(long, env = "NARRATOR_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Dictionary file override
    #[arg(long)]
    dictionary: Option<std::path::PathBuf>,

    /// Exit after this many frames (runs forever when omitted)
    #[arg(long)]
    frames: Option<u64>,

    /// Pretend the device supports the GPU delegate
    #[arg(long)]
    gpu: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(path) = &args.config {
        std::env::set_var("NARRATOR_CONFIG", path);
    }
    let mut cfg = NarratordConfig::load()?;
    if let Some(path) = args.dictionary {
        cfg.dictionary_path = Some(path);
    }

    let translator = Arc::new(match &cfg.dictionary_path {
        Some(path) => Translator::from_file(path),
        None => Translator::empty(),
    });
    log::info!(
        "dictionary entries: {} ({})",
        translator.len(),
        cfg.dictionary_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    // Resolve the hardware delegate once; an unsupported request degrades to
    // CPU with a single notice rather than per-frame errors.
    let capabilities = DeviceCapabilities {
        gpu_supported: args.gpu,
        nnapi_supported: false,
    };
    let requested = cfg.detector.backend;
    cfg.detector.backend = select_backend(requested, capabilities);
    if requested != cfg.detector.backend {
        log::info!(
            "requested backend {:?} resolved to {:?}",
            requested,
            cfg.detector.backend
        );
    }
    log::info!(
        "detector: model={} backend={:?} threads={} threshold={:.2}",
        cfg.detector.model.asset_name(),
        cfg.detector.backend,
        cfg.detector.worker_threads,
        cfg.detector.confidence_threshold
    );

    let mut source = SyntheticSource::new(cfg.detector);
    source.reconfigure(&cfg.detector)?;

    let layout = OverlayLayout::new(cfg.view.width, cfg.view.height);
    let renderer = DedupRenderer::new(ConsoleRenderer::new(layout));
    let announcer = AnnouncerHandle::spawn(ConsoleAnnouncer::new(true));
    let mut pipeline = Pipeline::new(translator, renderer, announcer);

    let mailbox = Arc::new(FrameMailbox::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let mailbox = mailbox.clone();
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            log::info!("interrupt received; stopping frame delivery");
            shutdown.store(true, Ordering::SeqCst);
            mailbox.close();
        })?;
    }

    // Capture worker: pulls observations at the target rate and publishes the
    // newest one. A source error loses that frame only.
    let capture = {
        let mailbox = mailbox.clone();
        let shutdown = shutdown.clone();
        let frame_period = Duration::from_millis(1000 / u64::from(cfg.capture.target_fps));
        std::thread::spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                match source.next_observation() {
                    Ok(observation) => {
                        if mailbox.publish(observation).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("source failed for this frame: {}", e),
                }
                std::thread::sleep(frame_period);
            }
            mailbox.close();
            source.stats()
        })
    };

    log::info!(
        "narratord running at {} fps (view {}x{})",
        cfg.capture.target_fps,
        cfg.view.width,
        cfg.view.height
    );

    let mut last_health_log = Instant::now();
    while let Some(observation) = mailbox.take()? {
        pipeline.process(&observation, Instant::now())?;

        let stats = pipeline.stats();
        if let Some(limit) = args.frames {
            if stats.frames_processed >= limit {
                log::info!("frame limit {} reached; shutting down", limit);
                shutdown.store(true, Ordering::SeqCst);
                mailbox.close();
            }
        }
        if last_health_log.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "health: frames={} announcements={} dropped={}",
                stats.frames_processed,
                stats.announcements,
                mailbox.dropped()
            );
            last_health_log = Instant::now();
        }
    }

    match capture.join() {
        Ok(stats) => log::info!(
            "capture worker stopped: frames={} detections={}",
            stats.frames_produced,
            stats.detections_produced
        ),
        Err(_) => log::error!("capture worker panicked"),
    }

    let stats = pipeline.stats();
    log::info!(
        "narratord exiting: frames={} announcements={}",
        stats.frames_processed,
        stats.announcements
    );
    // Dropping the pipeline joins the announcer worker, draining any
    // in-flight announcement.
    Ok(())
}

//! Announcement boundary.
//!
//! Speech synthesis and toast display are slow, so the confirmed label is
//! handed to a dedicated worker thread and the capture path moves on
//! immediately. Delivery is best-effort: a failed announcement is logged and
//! retried once, never propagated, and never re-fired for the same session.

use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::Result;

/// Side-effecting announcement sink (speech engine, toast, both).
pub trait Announcer: Send {
    fn announce(&mut self, label: &str) -> Result<()>;
}

/// Log-backed announcer for stub daemon runs.
///
/// Mirrors the real presentation: the spoken label as-is, the toast text
/// upper-cased. Speech may be unavailable at init; the toast still shows.
pub struct ConsoleAnnouncer {
    speech_enabled: bool,
}

impl ConsoleAnnouncer {
    pub fn new(speech_enabled: bool) -> Self {
        if !speech_enabled {
            log::warn!("speech synthesis unavailable; announcements are toast-only");
        }
        Self { speech_enabled }
    }
}

impl Announcer for ConsoleAnnouncer {
    fn announce(&mut self, label: &str) -> Result<()> {
        if self.speech_enabled {
            log::info!("speaking: {}", label);
        }
        log::info!("toast: {}", label.to_uppercase());
        Ok(())
    }
}

/// Owns the announcer worker thread.
///
/// `dispatch` never blocks on delivery. Dropping the handle closes the
/// channel, lets the worker drain in-flight announcements, and joins it.
pub struct AnnouncerHandle {
    tx: Option<mpsc::Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl AnnouncerHandle {
    pub fn spawn<A: Announcer + 'static>(mut announcer: A) -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        let worker = std::thread::spawn(move || {
            for label in rx {
                deliver(&mut announcer, &label);
            }
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Queue a label for announcement. Fire-and-forget: a closed worker is
    /// logged, not surfaced, so teardown races cannot corrupt the caller.
    pub fn dispatch(&self, label: &str) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(label.to_string()).is_err() {
            log::warn!("announcer worker gone; dropping announcement '{}'", label);
        }
    }
}

fn deliver<A: Announcer>(announcer: &mut A, label: &str) {
    if let Err(first) = announcer.announce(label) {
        log::warn!("announcement '{}' failed ({}); retrying once", label, first);
        if let Err(second) = announcer.announce(label) {
            log::error!("announcement '{}' failed again: {}", label, second);
        }
    }
}

impl Drop for AnnouncerHandle {
    fn drop(&mut self) {
        // Close the channel first so the worker drains and exits.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("announcer worker panicked during shutdown");
            }
        }
    }
}

//! Frame handoff between capture and processing.
//!
//! The capture worker publishes each observation into a single-slot mailbox;
//! the processing side always takes the newest one. If processing falls
//! behind, older undelivered observations are silently replaced (drop-oldest)
//! and counted, never queued: the stabilizer must only ever see the live
//! scene, and the capture worker must never block on a slow consumer.

use std::sync::{Condvar, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::FrameObservation;

struct Slot {
    observation: Option<FrameObservation>,
    dropped: u64,
    closed: bool,
}

/// Single-slot, drop-oldest mailbox for frame observations.
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                observation: None,
                dropped: 0,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Publish the newest observation, replacing any undelivered one.
    pub fn publish(&self, observation: FrameObservation) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("frame mailbox lock poisoned"))?;
        if slot.closed {
            return Ok(());
        }
        if slot.observation.replace(observation).is_some() {
            slot.dropped += 1;
        }
        self.ready.notify_one();
        Ok(())
    }

    /// Block until an observation arrives. Returns `None` once the mailbox is
    /// closed and drained, which is the shutdown signal for the consumer.
    pub fn take(&self) -> Result<Option<FrameObservation>> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("frame mailbox lock poisoned"))?;
        loop {
            if let Some(observation) = slot.observation.take() {
                return Ok(Some(observation));
            }
            if slot.closed {
                return Ok(None);
            }
            slot = self
                .ready
                .wait(slot)
                .map_err(|_| anyhow!("frame mailbox lock poisoned"))?;
        }
    }

    /// Stop frame delivery. Safe to call more than once and from any thread.
    pub fn close(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.closed = true;
        }
        self.ready.notify_all();
    }

    /// Observations replaced before anyone took them.
    pub fn dropped(&self) -> u64 {
        self.slot.lock().map(|slot| slot.dropped).unwrap_or(0)
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::stabilize::{BoundingRegion, Detection};

    fn observation(label: &str) -> FrameObservation {
        FrameObservation {
            width: 640,
            height: 480,
            rotation_degrees: 0,
            detection: Some(Detection {
                label: label.to_string(),
                confidence: 0.9,
                region: BoundingRegion::default(),
            }),
        }
    }

    #[test]
    fn newest_observation_wins() {
        let mailbox = FrameMailbox::new();
        mailbox.publish(observation("stale")).unwrap();
        mailbox.publish(observation("fresh")).unwrap();

        let taken = mailbox.take().unwrap().unwrap();
        assert_eq!(taken.detection.unwrap().label, "fresh");
        assert_eq!(mailbox.dropped(), 1);
    }

    #[test]
    fn close_unblocks_consumer() {
        let mailbox = Arc::new(FrameMailbox::new());
        let consumer = {
            let mailbox = mailbox.clone();
            std::thread::spawn(move || mailbox.take().unwrap())
        };
        mailbox.close();
        assert!(consumer.join().unwrap().is_none());
    }

    #[test]
    fn publish_after_close_is_discarded() {
        let mailbox = FrameMailbox::new();
        mailbox.close();
        mailbox.publish(observation("late")).unwrap();
        assert!(mailbox.take().unwrap().is_none());
    }

    #[test]
    fn handoff_across_threads() {
        let mailbox = Arc::new(FrameMailbox::new());
        let producer = {
            let mailbox = mailbox.clone();
            std::thread::spawn(move || {
                for i in 0..5 {
                    mailbox.publish(observation(&format!("frame{}", i))).unwrap();
                }
                mailbox.close();
            })
        };

        let mut seen = 0;
        while let Some(obs) = mailbox.take().unwrap() {
            assert!(obs.detection.is_some());
            seen += 1;
        }
        producer.join().unwrap();
        assert!(seen >= 1);
        assert_eq!(seen as u64 + mailbox.dropped(), 5);
    }
}

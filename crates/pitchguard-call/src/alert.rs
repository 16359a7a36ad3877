//! **Alert scheduler** — debounced show/hide window for the detection flag.
//!
//! Every `show` supersedes any pending hide: the alert stays visible until
//! the full duration after the *most recent* trigger has elapsed, so rapid
//! back-to-back detections never make it flicker off early. Hides are
//! delivered through the session event queue, generation-stamped so a stale
//! timer firing is ignored.

use crate::session::SessionEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Transient alert flag with a debounced hide timer.
#[derive(Debug)]
pub struct AlertScheduler {
    visible: bool,
    generation: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl AlertScheduler {
    pub fn new(events_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            visible: false,
            generation: 0,
            events_tx,
        }
    }

    /// Show the alert and (re)schedule its hide for `duration` from now.
    /// Any hide scheduled by an earlier `show` becomes stale.
    pub fn show(&mut self, duration: Duration) {
        self.visible = true;
        self.generation += 1;
        let generation = self.generation;
        let tx = self.events_tx.clone();
        debug!("alert shown for {:?} (generation {})", duration, generation);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(SessionEvent::AlertElapsed { generation });
        });
    }

    /// Handle a hide timer firing. Only the timer from the most recent `show`
    /// may hide the alert.
    pub fn on_elapsed(&mut self, generation: u64) {
        if generation == self.generation {
            self.visible = false;
            debug!("alert hidden (generation {})", generation);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

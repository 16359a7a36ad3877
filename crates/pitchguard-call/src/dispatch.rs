//! **Detection dispatcher** — single-flight fact checking with timeout
//! recovery.
//!
//! At most one verdict request is ever outstanding. Each dispatch races the
//! backend against a timeout; whichever side commits first posts exactly one
//! ticketed settle event back onto the session queue, and a settle whose
//! ticket is no longer current is dropped without touching anything. The
//! timeout path guarantees the dispatcher returns to idle even if the service
//! never responds.

use crate::session::SessionEvent;
use pitchguard_verdict::{RawVerdict, VerdictBackend};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Banner text of a detection entry in the ledger.
pub const DETECTION_BANNER: &str = "🚨 BULLSHIT DETECTED!";

/// Lifecycle of the single fact-check slot.
#[derive(Debug, Clone)]
pub enum DispatchState {
    Idle,
    InFlight { text: String, started: Instant },
    Resolved,
    TimedOut,
}

/// How a dispatched fact check settled.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The service responded in time with a raw verdict.
    Analyzed(RawVerdict),
    /// Transport or parse failure; treated exactly like a timeout.
    Failed(String),
    TimedOut,
}

/// Single-flight asynchronous caller of the verdict backend.
pub struct DetectionDispatcher {
    state: DispatchState,
    ticket: u64,
    last_dispatched: Option<String>,
    timeout: Duration,
    backend: Arc<dyn VerdictBackend>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl DetectionDispatcher {
    pub fn new(
        backend: Arc<dyn VerdictBackend>,
        timeout: Duration,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            state: DispatchState::Idle,
            ticket: 0,
            last_dispatched: None,
            timeout,
            backend,
            events_tx,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DispatchState::Idle)
    }

    /// Text of the most recently dispatched utterance, for the duplicate gate.
    pub fn last_dispatched(&self) -> Option<&str> {
        self.last_dispatched.as_deref()
    }

    /// Dispatch one utterance to the verdict backend. No-op unless idle.
    pub fn dispatch(&mut self, text: &str) {
        if !self.is_idle() {
            debug!("dispatch ignored; a fact check is already in flight");
            return;
        }
        self.ticket += 1;
        let ticket = self.ticket;
        self.state = DispatchState::InFlight {
            text: text.to_string(),
            started: Instant::now(),
        };
        self.last_dispatched = Some(text.to_string());
        info!("🔍 Fact check {} dispatched: \"{}\"", ticket, text);

        let backend = Arc::clone(&self.backend);
        let timeout = self.timeout;
        let events_tx = self.events_tx.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, backend.analyze(&text)).await {
                Ok(Ok(raw)) => DispatchOutcome::Analyzed(raw),
                Ok(Err(e)) => DispatchOutcome::Failed(e.to_string()),
                Err(_) => DispatchOutcome::TimedOut,
            };
            let _ = events_tx.send(SessionEvent::DetectionSettled { ticket, outcome });
        });
    }

    /// Settle the fact check identified by `ticket`. Returns the outcome when
    /// it is current, `None` when the ticket is stale (already settled, timed
    /// out, or abandoned); stale settles must produce no side effects.
    ///
    /// The terminal states are transient: the dispatcher is idle again by the
    /// time the caller sees the outcome.
    pub fn settle(&mut self, ticket: u64, outcome: DispatchOutcome) -> Option<DispatchOutcome> {
        let DispatchState::InFlight { started, .. } = &self.state else {
            debug!("settle for ticket {} ignored; nothing in flight", ticket);
            return None;
        };
        if ticket != self.ticket {
            debug!("settle for stale ticket {} discarded", ticket);
            return None;
        }
        let elapsed = started.elapsed();
        match &outcome {
            DispatchOutcome::Analyzed(_) => {
                self.state = DispatchState::Resolved;
                debug!("fact check {} resolved in {:?}", ticket, elapsed);
            }
            DispatchOutcome::TimedOut => {
                self.state = DispatchState::TimedOut;
                warn!("fact check {} timed out after {:?}", ticket, elapsed);
            }
            DispatchOutcome::Failed(reason) => {
                self.state = DispatchState::TimedOut;
                warn!("fact check {} failed: {}", ticket, reason);
            }
        }
        self.state = DispatchState::Idle;
        Some(outcome)
    }

    /// Drop any in-flight fact check and forget the duplicate-gate memory.
    /// Called on call stop; the abandoned ticket can never settle afterwards.
    pub fn abandon(&mut self) {
        if !self.is_idle() {
            debug!("abandoning in-flight fact check {}", self.ticket);
        }
        self.ticket += 1;
        self.state = DispatchState::Idle;
        self.last_dispatched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchguard_verdict::PlaceholderVerdict;
    use tokio::time::advance;

    fn dispatcher_with(
        backend: PlaceholderVerdict,
    ) -> (
        DetectionDispatcher,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            DetectionDispatcher::new(Arc::new(backend), Duration::from_secs(10), tx),
            rx,
        )
    }

    async fn next_settle(
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    ) -> (u64, DispatchOutcome) {
        match rx.recv().await.unwrap() {
            SessionEvent::DetectionSettled { ticket, outcome } => (ticket, outcome),
            other => panic!("expected a settle event, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_resolves_and_returns_to_idle() {
        let (mut dispatcher, mut rx) = dispatcher_with(PlaceholderVerdict::with_score(0.95));
        dispatcher.dispatch("We have 500 Fortune-level clients");
        assert!(!dispatcher.is_idle());

        let (ticket, outcome) = next_settle(&mut rx).await;
        let settled = dispatcher.settle(ticket, outcome).unwrap();
        assert!(matches!(settled, DispatchOutcome::Analyzed(_)));
        assert!(dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn never_two_in_flight() {
        let backend =
            PlaceholderVerdict::with_score(0.9).with_delay(Duration::from_secs(2));
        let (mut dispatcher, mut rx) = dispatcher_with(backend);

        dispatcher.dispatch("first suspicious claim");
        dispatcher.dispatch("second suspicious claim");

        let (ticket, outcome) = next_settle(&mut rx).await;
        dispatcher.settle(ticket, outcome);
        assert!(dispatcher.is_idle());

        // Only the first dispatch ever ran.
        assert_eq!(rx.try_recv().ok().map(|_| ()), None);
        assert_eq!(
            dispatcher.last_dispatched(),
            Some("first suspicious claim")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_recovers_to_idle() {
        let backend =
            PlaceholderVerdict::with_score(0.9).with_delay(Duration::from_secs(30));
        let (mut dispatcher, mut rx) = dispatcher_with(backend);

        dispatcher.dispatch("a claim the service never answers");
        advance(Duration::from_secs(10)).await;

        let (ticket, outcome) = next_settle(&mut rx).await;
        assert!(matches!(outcome, DispatchOutcome::TimedOut));
        let settled = dispatcher.settle(ticket, outcome).unwrap();
        assert!(matches!(settled, DispatchOutcome::TimedOut));
        assert!(dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_settles_like_timeout() {
        let (mut dispatcher, mut rx) =
            dispatcher_with(PlaceholderVerdict::failing("connection refused"));
        dispatcher.dispatch("some long enough claim");

        let (ticket, outcome) = next_settle(&mut rx).await;
        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
        dispatcher.settle(ticket, outcome);
        assert!(dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_discarded() {
        let (mut dispatcher, mut rx) = dispatcher_with(PlaceholderVerdict::with_score(0.95));
        dispatcher.dispatch("claim before abandon");
        dispatcher.abandon();

        let (ticket, outcome) = next_settle(&mut rx).await;
        assert!(dispatcher.settle(ticket, outcome).is_none());
        assert!(dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_clears_duplicate_memory() {
        let (mut dispatcher, _rx) = dispatcher_with(PlaceholderVerdict::with_score(0.5));
        dispatcher.dispatch("a memorable claim");
        assert_eq!(dispatcher.last_dispatched(), Some("a memorable claim"));
        dispatcher.abandon();
        assert_eq!(dispatcher.last_dispatched(), None);
    }
}

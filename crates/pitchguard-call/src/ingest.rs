//! **Transcript ingestor** — gates raw transcription events into either a
//! fact-check dispatch or a ledger append.
//!
//! User speech is screened through three ordered gates (busy, duplicate,
//! too short) before it may cost a verdict request. Assistant speech is
//! scanned for the trigger terms; a hit means the voice agent already called
//! bullshit on its own channel, so the plain entry is upgraded in place to a
//! detection instead of being appended twice.

use crate::alert::AlertScheduler;
use crate::config::CallConfig;
use crate::dispatch::DetectionDispatcher;
use crate::ledger::{ConversationEntry, ConversationLedger};
use crate::transport::{Completeness, SpeakerRole, TranscriptEvent};
use pitchguard_verdict::Verdict;
use std::time::Duration;
use tracing::{debug, info};

/// Assistant utterances containing any of these (case-insensitive) count as a
/// self-reported detection.
pub const TRIGGER_TERMS: [&str; 2] = ["bullshit", "bull shit"];

/// Filters transcript events; holds no conversation state of its own.
#[derive(Debug)]
pub struct TranscriptIngestor {
    min_claim_chars: usize,
    alert_duration: Duration,
}

impl TranscriptIngestor {
    pub fn new(config: &CallConfig) -> Self {
        Self {
            min_claim_chars: config.min_claim_chars,
            alert_duration: config.alert_duration,
        }
    }

    /// Consume one transcript event. Partial fragments are ignored outright.
    pub fn on_event(
        &self,
        event: TranscriptEvent,
        dispatcher: &mut DetectionDispatcher,
        ledger: &mut ConversationLedger,
        alert: &mut AlertScheduler,
    ) {
        if event.completeness == Completeness::Partial {
            return;
        }
        match event.role {
            SpeakerRole::User => self.on_user_final(&event.text, dispatcher),
            SpeakerRole::Assistant => self.on_assistant_final(event.text, ledger, alert),
        }
    }

    /// Gates, in order: a fact check already in flight, a byte-identical
    /// repeat of the last dispatched text, or an utterance too short to be a
    /// claim. A dropped event leaves no trace in the ledger.
    fn on_user_final(&self, text: &str, dispatcher: &mut DetectionDispatcher) {
        if !dispatcher.is_idle() {
            debug!("user utterance dropped; fact check in flight");
            return;
        }
        if dispatcher.last_dispatched() == Some(text) {
            debug!("user utterance dropped; identical to last dispatched text");
            return;
        }
        if text.chars().count() < self.min_claim_chars {
            debug!("user utterance dropped; too short to fact-check");
            return;
        }
        dispatcher.dispatch(text);
    }

    fn on_assistant_final(
        &self,
        text: String,
        ledger: &mut ConversationLedger,
        alert: &mut AlertScheduler,
    ) {
        if contains_trigger_term(&text) {
            info!("🚨 Voice agent called bullshit: \"{}\"", text);
            let verdict = Verdict::self_detected(&text);
            ledger.replace_last(ConversationEntry::detector(text, verdict));
            alert.show(self.alert_duration);
        } else {
            ledger.append(ConversationEntry::assistant(text));
        }
    }
}

fn contains_trigger_term(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRIGGER_TERMS.iter().any(|term| lowered.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;
    use pitchguard_verdict::PlaceholderVerdict;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Fixture {
        ingestor: TranscriptIngestor,
        dispatcher: DetectionDispatcher,
        ledger: ConversationLedger,
        alert: AlertScheduler,
        _events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    }

    fn fixture() -> Fixture {
        let config = CallConfig::default();
        let (tx, rx) = mpsc::unbounded_channel();
        Fixture {
            ingestor: TranscriptIngestor::new(&config),
            dispatcher: DetectionDispatcher::new(
                Arc::new(PlaceholderVerdict::with_score(0.9)),
                config.dispatch_timeout,
                tx.clone(),
            ),
            ledger: ConversationLedger::new(),
            alert: AlertScheduler::new(tx),
            _events_rx: rx,
        }
    }

    fn ingest(f: &mut Fixture, event: TranscriptEvent) {
        f.ingestor
            .on_event(event, &mut f.dispatcher, &mut f.ledger, &mut f.alert);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_events_are_ignored() {
        let mut f = fixture();
        let mut event = TranscriptEvent::user_final("We have 500 Fortune-level clients", 1);
        event.completeness = Completeness::Partial;
        ingest(&mut f, event);
        assert!(f.dispatcher.is_idle());
        assert!(f.ledger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_user_text_never_dispatches() {
        let mut f = fixture();
        ingest(&mut f, TranscriptEvent::user_final("ok", 1));
        assert!(f.dispatcher.is_idle());
        assert!(f.ledger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn long_user_text_dispatches() {
        let mut f = fixture();
        ingest(
            &mut f,
            TranscriptEvent::user_final("Goldman Sachs invested in our seed round", 1),
        );
        assert!(!f.dispatcher.is_idle());
        assert!(f.ledger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_dispatcher_drops_user_text() {
        let mut f = fixture();
        ingest(
            &mut f,
            TranscriptEvent::user_final("Goldman Sachs invested in our seed round", 1),
        );
        ingest(
            &mut f,
            TranscriptEvent::user_final("Sequoia led our five hundred million round", 2),
        );
        assert_eq!(
            f.dispatcher.last_dispatched(),
            Some("Goldman Sachs invested in our seed round")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn identical_text_dispatches_at_most_once() {
        let mut f = fixture();
        let text = "Goldman Sachs invested in our seed round";
        ingest(&mut f, TranscriptEvent::user_final(text, 1));

        // Settle the first check so the dispatcher is idle again.
        let (ticket, outcome) = match f._events_rx.recv().await.unwrap() {
            SessionEvent::DetectionSettled { ticket, outcome } => (ticket, outcome),
            other => panic!("expected a settle event, got {:?}", other),
        };
        f.dispatcher.settle(ticket, outcome);
        assert!(f.dispatcher.is_idle());

        ingest(&mut f, TranscriptEvent::user_final(text, 2));
        assert!(f.dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn case_variant_is_not_a_duplicate() {
        let mut f = fixture();
        let text = "Goldman Sachs invested in our seed round";
        ingest(&mut f, TranscriptEvent::user_final(text, 1));
        let (ticket, outcome) = match f._events_rx.recv().await.unwrap() {
            SessionEvent::DetectionSettled { ticket, outcome } => (ticket, outcome),
            other => panic!("expected a settle event, got {:?}", other),
        };
        f.dispatcher.settle(ticket, outcome);

        ingest(
            &mut f,
            TranscriptEvent::user_final("GOLDMAN SACHS INVESTED IN OUR SEED ROUND", 2),
        );
        assert!(!f.dispatcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn plain_assistant_text_is_appended() {
        let mut f = fixture();
        ingest(
            &mut f,
            TranscriptEvent::assistant_final("Tell me about your traction.", 1),
        );
        assert_eq!(f.ledger.len(), 1);
        assert!(!f.ledger.last().unwrap().is_bullshit);
        assert!(!f.alert.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_term_upgrades_last_entry() {
        let mut f = fixture();
        ingest(
            &mut f,
            TranscriptEvent::assistant_final("Tell me about your traction.", 1),
        );
        ingest(
            &mut f,
            TranscriptEvent::assistant_final("Bullshiiit... that's BULLSHIT!", 2),
        );

        // Same length as appending the plain entry would have produced.
        assert_eq!(f.ledger.len(), 2);
        let last = f.ledger.last().unwrap();
        assert!(last.is_bullshit);
        let verdict = last.verdict.as_ref().unwrap();
        assert_eq!(verdict.category, "voice_agent_detection");
        assert_eq!(verdict.challenge, "Bullshiiit... that's BULLSHIT!");
        assert!(f.alert.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn split_trigger_term_matches() {
        let mut f = fixture();
        ingest(
            &mut f,
            TranscriptEvent::assistant_final("Hold on, that is bull shit.", 1),
        );
        assert_eq!(f.ledger.len(), 1);
        assert!(f.ledger.last().unwrap().is_bullshit);
    }
}

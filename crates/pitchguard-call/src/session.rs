//! **Call session** — lifecycle coordination and the single-threaded event
//! loop that everything else hangs off.
//!
//! Transcript events, timer firings and verdict completions are all
//! serialized onto one `tokio::select!` loop; handlers run to completion and
//! never block, so the ledger, dispatch state and session need no locks. The
//! coordinator owns the mute choreography: the assistant voice is muted when
//! the call starts and re-muted after every utterance it finishes, so the
//! only way it speaks is a detection-triggered `interrupt`.

use crate::alert::AlertScheduler;
use crate::config::CallConfig;
use crate::dispatch::{DetectionDispatcher, DispatchOutcome, DETECTION_BANNER};
use crate::error::{CallError, CallResult};
use crate::ingest::TranscriptIngestor;
use crate::ledger::{ConversationEntry, ConversationLedger};
use crate::transport::{
    AssistantControl, CallTransport, SpeakerRole, TransportEvent, TransportMessage,
};
use chrono::{DateTime, Utc};
use pitchguard_verdict::{Verdict, VerdictBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const STATUS_READY: &str = "Ready to join meeting";
pub const STATUS_JOINING: &str = "Joining meeting...";
pub const STATUS_CALL_STARTED: &str = "Call started";
pub const STATUS_SPEAKING: &str = "Assistant speaking...";
pub const STATUS_LISTENING: &str = "Listening...";
pub const STATUS_CALL_ENDED: &str = "Call ended";
pub const STATUS_CONFIG_MISSING: &str = "Configuration missing";
pub const STATUS_NOT_INITIALIZED: &str = "AI assistant not initialized";
pub const STATUS_CHECK_TIMED_OUT: &str = "Fact check timed out, listening";

/// Where the session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLifecycle {
    Idle,
    Joining,
    Active,
    Ended,
}

/// Live session state, mutated only by the coordinator.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub lifecycle: CallLifecycle,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_secs: u64,
    pub muted: bool,
    pub volume_level: f32,
}

impl Default for CallSession {
    fn default() -> Self {
        Self {
            lifecycle: CallLifecycle::Idle,
            started_at: None,
            duration_secs: 0,
            muted: false,
            volume_level: 0.0,
        }
    }
}

/// Internal events posted back onto the session loop by spawned timers and
/// the dispatch race.
#[derive(Debug)]
pub enum SessionEvent {
    DetectionSettled {
        ticket: u64,
        outcome: DispatchOutcome,
    },
    AlertElapsed {
        generation: u64,
    },
}

/// Tracks session lifecycle and issues transport commands. Handlers query
/// this one shared value instead of capturing lifecycle snapshots, so nothing
/// can go stale across the session's lifetime.
pub struct CallStateCoordinator {
    transport: Option<Arc<dyn CallTransport>>,
    assistant_id: Option<String>,
    session: CallSession,
    status: String,
}

impl CallStateCoordinator {
    pub fn new(assistant_id: Option<String>, transport: Option<Arc<dyn CallTransport>>) -> Self {
        Self {
            transport,
            assistant_id,
            session: CallSession::default(),
            status: STATUS_READY.to_string(),
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn is_active(&self) -> bool {
        self.session.lifecycle == CallLifecycle::Active
    }

    /// Join the call. Fails without touching the lifecycle when configuration
    /// or the transport handle is missing; a transport error reverts to idle.
    /// Every failure is surfaced as status text, never a crash.
    pub fn start(&mut self) -> CallResult<()> {
        let Some(assistant_id) = self.assistant_id.clone() else {
            self.status = STATUS_CONFIG_MISSING.to_string();
            return Err(CallError::ConfigMissing("assistant id".to_string()));
        };
        let Some(transport) = self.transport.clone() else {
            self.status = STATUS_NOT_INITIALIZED.to_string();
            return Err(CallError::NotInitialized);
        };

        self.status = STATUS_JOINING.to_string();
        self.session.duration_secs = 0;
        self.session.lifecycle = CallLifecycle::Joining;
        info!("📞 Joining call as assistant {}", assistant_id);

        if let Err(e) = transport.start(&assistant_id) {
            self.session.lifecycle = CallLifecycle::Idle;
            self.status = format!("Error: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Transport reported the call is live. The assistant joins muted; it is
    /// only unmuted deliberately, by `interrupt`.
    pub fn on_call_started(&mut self) {
        self.session.lifecycle = CallLifecycle::Active;
        self.session.started_at = Some(Utc::now());
        self.status = STATUS_CALL_STARTED.to_string();
        info!("📞 Call started");
        self.send_control(AssistantControl::Mute);
    }

    pub fn on_call_ended(&mut self, reason: Option<String>) {
        self.session.lifecycle = CallLifecycle::Ended;
        self.session.started_at = None;
        self.status = match reason {
            Some(r) => format!("{}: {}", STATUS_CALL_ENDED, r),
            None => STATUS_CALL_ENDED.to_string(),
        };
        info!("📞 {}", self.status);
    }

    pub fn on_speech_started(&mut self) {
        self.status = STATUS_SPEAKING.to_string();
    }

    /// The assistant finished an utterance: back to listening, and re-mute so
    /// it stays silent between turns. Spoken output is verdict-driven only.
    pub fn on_speech_ended(&mut self) {
        self.status = STATUS_LISTENING.to_string();
        self.send_control(AssistantControl::Mute);
    }

    pub fn on_volume(&mut self, level: f32) {
        self.session.volume_level = level;
    }

    /// One second of active call time elapsed.
    pub fn on_duration_tick(&mut self) {
        if self.is_active() {
            self.session.duration_secs += 1;
        }
    }

    /// Leave the call. Errors surface as status text only.
    pub fn stop_transport(&mut self) {
        if let Some(transport) = &self.transport {
            if let Err(e) = transport.stop() {
                warn!("transport stop failed: {}", e);
                self.status = format!("Error: {}", e);
            }
        }
        self.session.duration_secs = 0;
    }

    /// Interrupt ongoing synthesis with a spoken challenge. Valid only while
    /// the call is active: unmute the assistant channel, then speak.
    pub fn interrupt(&mut self, challenge: &str) {
        if !self.is_active() {
            debug!("interrupt skipped; call not active");
            return;
        }
        info!("🗣️ Interrupting with challenge: \"{}\"", challenge);
        self.send_control(AssistantControl::Unmute);
        if let Some(transport) = &self.transport {
            if let Err(e) = transport.say(challenge) {
                warn!("speak command failed: {}", e);
            }
        }
    }

    /// Flip the local microphone mute flag and forward it to the transport.
    /// Independent of the assistant mute channel.
    pub fn toggle_mute(&mut self) {
        self.session.muted = !self.session.muted;
        if let Some(transport) = &self.transport {
            if let Err(e) = transport.set_muted(self.session.muted) {
                warn!("set_muted failed: {}", e);
            }
        }
    }

    fn send_control(&mut self, control: AssistantControl) {
        if let Some(transport) = &self.transport {
            if let Err(e) = transport.send_control(control) {
                warn!("{} control failed: {}", control.as_str(), e);
            }
        }
    }
}

/// The session engine: owns every component and runs the event loop.
pub struct SessionEngine {
    config: CallConfig,
    coordinator: CallStateCoordinator,
    ledger: ConversationLedger,
    alert: AlertScheduler,
    dispatcher: DetectionDispatcher,
    ingestor: TranscriptIngestor,
}

impl SessionEngine {
    /// Build an engine. Returns the receiver for internal session events;
    /// hand it back to [`SessionEngine::run`], or drive
    /// [`SessionEngine::handle_session_event`] with it directly when
    /// embedding the engine in an existing loop.
    pub fn new(
        config: CallConfig,
        transport: Option<Arc<dyn CallTransport>>,
        backend: Arc<dyn VerdictBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let coordinator = CallStateCoordinator::new(config.assistant_id.clone(), transport);
        let engine = Self {
            coordinator,
            ledger: ConversationLedger::new(),
            alert: AlertScheduler::new(events_tx.clone()),
            dispatcher: DetectionDispatcher::new(backend, config.dispatch_timeout, events_tx),
            ingestor: TranscriptIngestor::new(&config),
            config,
        };
        (engine, events_rx)
    }

    pub fn ledger(&self) -> &ConversationLedger {
        &self.ledger
    }

    pub fn alert(&self) -> &AlertScheduler {
        &self.alert
    }

    pub fn dispatcher(&self) -> &DetectionDispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &CallSession {
        self.coordinator.session()
    }

    pub fn status(&self) -> &str {
        self.coordinator.status()
    }

    /// Join the call (see [`CallStateCoordinator::start`]).
    pub fn start(&mut self) -> CallResult<()> {
        self.coordinator.start()
    }

    /// Stop the call: leave the transport, discard the conversation, drop any
    /// in-flight fact check so a late verdict cannot repopulate the cleared
    /// ledger.
    pub fn stop(&mut self) {
        self.coordinator.stop_transport();
        self.ledger.clear();
        self.dispatcher.abandon();
        info!("🛑 Call stopped; conversation cleared");
    }

    pub fn toggle_mute(&mut self) {
        self.coordinator.toggle_mute();
    }

    /// Run the session loop until the transport event channel closes.
    pub async fn run(
        &mut self,
        mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        mut events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                event = transport_rx.recv() => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => {
                        info!("transport channel closed; session loop exiting");
                        break;
                    }
                },
                event = events_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_session_event(event);
                    }
                },
                _ = ticker.tick() => self.coordinator.on_duration_tick(),
            }
        }
    }

    /// Handle one event from the transport feed.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CallStarted => self.coordinator.on_call_started(),
            TransportEvent::CallEnded => self.coordinator.on_call_ended(None),
            TransportEvent::SpeechStarted => self.coordinator.on_speech_started(),
            TransportEvent::SpeechEnded => self.coordinator.on_speech_ended(),
            TransportEvent::VolumeLevel(level) => self.coordinator.on_volume(level),
            TransportEvent::Message(message) => self.handle_transport_message(message),
            TransportEvent::Error(message) => {
                warn!("transport error: {}", message);
                self.coordinator.set_status(format!("Error: {}", message));
            }
        }
    }

    /// Handle one internal event (dispatch settle or alert expiry).
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DetectionSettled { ticket, outcome } => {
                self.on_detection_settled(ticket, outcome)
            }
            SessionEvent::AlertElapsed { generation } => self.alert.on_elapsed(generation),
        }
    }

    fn handle_transport_message(&mut self, message: TransportMessage) {
        match message {
            TransportMessage::Transcript(event) => self.ingestor.on_event(
                event,
                &mut self.dispatcher,
                &mut self.ledger,
                &mut self.alert,
            ),
            TransportMessage::SpeechUpdate {
                role: SpeakerRole::Assistant,
                started: true,
            } => self.coordinator.on_speech_started(),
            TransportMessage::SpeechUpdate { started: false, .. } => {
                self.coordinator.on_speech_ended()
            }
            TransportMessage::SpeechUpdate { .. } => {}
            TransportMessage::StatusUpdate {
                status,
                ended_reason,
            } => {
                if status == "ended" {
                    self.coordinator.on_call_ended(ended_reason);
                }
            }
        }
    }

    /// The verdict result handler: normalize, then either fire the full
    /// detection path or do nothing at all. A stale settle was already
    /// discarded by the dispatcher and reaches neither branch.
    fn on_detection_settled(&mut self, ticket: u64, outcome: DispatchOutcome) {
        let Some(outcome) = self.dispatcher.settle(ticket, outcome) else {
            return;
        };
        match outcome {
            DispatchOutcome::Analyzed(raw) => {
                let verdict = Verdict::from_raw(raw);
                if verdict.score > self.config.score_threshold {
                    info!(
                        "🚨 Detection: score {:.2}, category {}",
                        verdict.score, verdict.category
                    );
                    let challenge = verdict.challenge.clone();
                    self.ledger
                        .append(ConversationEntry::detector(DETECTION_BANNER, verdict));
                    self.alert.show(self.config.alert_duration);
                    self.coordinator.interrupt(&challenge);
                } else {
                    debug!(
                        "score {:.2} at or below threshold; claim passes",
                        verdict.score
                    );
                }
            }
            DispatchOutcome::TimedOut => {
                self.coordinator.set_status(STATUS_CHECK_TIMED_OUT);
            }
            DispatchOutcome::Failed(reason) => {
                warn!("fact check failed, resuming: {}", reason);
                self.coordinator.set_status(STATUS_LISTENING);
            }
        }
    }
}

//! **Call transport seam** — events consumed from and commands issued to the
//! voice-call provider.
//!
//! The transport owns audio, speech recognition and synthesis; this crate
//! only consumes its event feed and sends it commands. `PlaceholderTransport`
//! records every issued command so tests and demos can assert on the exact
//! choreography (mute on speech end, unmute before a challenge, ...).

use crate::error::{CallError, CallResult};
use std::sync::Mutex;

/// Which side of the conversation produced a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    User,
    Assistant,
}

/// Whether a transcript fragment is still being revised or is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Partial,
    Final,
}

/// One speech-to-text fragment from the transport. Consumed immediately,
/// never stored.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    pub role: SpeakerRole,
    pub completeness: Completeness,
    pub text: String,
    pub turn: u32,
}

impl TranscriptEvent {
    /// Final user utterance (the common case in tests).
    pub fn user_final(text: impl Into<String>, turn: u32) -> Self {
        Self {
            role: SpeakerRole::User,
            completeness: Completeness::Final,
            text: text.into(),
            turn,
        }
    }

    /// Final assistant utterance.
    pub fn assistant_final(text: impl Into<String>, turn: u32) -> Self {
        Self {
            role: SpeakerRole::Assistant,
            completeness: Completeness::Final,
            text: text.into(),
            turn,
        }
    }
}

/// Structured payloads carried inside a transport `message` event.
#[derive(Debug, Clone)]
pub enum TransportMessage {
    Transcript(TranscriptEvent),
    /// Speech activity on a channel changed (`started` false = stopped).
    SpeechUpdate { role: SpeakerRole, started: bool },
    /// Call status changed; `ended_reason` accompanies `status == "ended"`.
    StatusUpdate {
        status: String,
        ended_reason: Option<String>,
    },
}

/// Events the transport pushes into the session loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    CallStarted,
    CallEnded,
    SpeechStarted,
    SpeechEnded,
    VolumeLevel(f32),
    Message(TransportMessage),
    Error(String),
}

/// Side-channel control of the assistant voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantControl {
    Mute,
    Unmute,
}

impl AssistantControl {
    /// Wire name of the control message.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantControl::Mute => "mute-assistant",
            AssistantControl::Unmute => "unmute-assistant",
        }
    }
}

/// Commands the session core issues to the call provider.
pub trait CallTransport: Send + Sync {
    /// Join the call as the given assistant.
    fn start(&self, assistant_id: &str) -> CallResult<()>;
    /// Leave the call.
    fn stop(&self) -> CallResult<()>;
    /// Mute or unmute the local microphone.
    fn set_muted(&self, muted: bool) -> CallResult<()>;
    /// Mute or unmute the assistant's synthesized voice.
    fn send_control(&self, control: AssistantControl) -> CallResult<()>;
    /// Speak the given text on the assistant channel immediately.
    fn say(&self, text: &str) -> CallResult<()>;
}

/// A command recorded by `PlaceholderTransport`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Start(String),
    Stop,
    SetMuted(bool),
    Control(AssistantControl),
    Say(String),
}

/// Placeholder transport: records every command instead of touching a real
/// call. Use in tests and demos to assert the exact command choreography.
#[derive(Debug, Default)]
pub struct PlaceholderTransport {
    commands: Mutex<Vec<TransportCommand>>,
    start_error: Option<String>,
}

impl PlaceholderTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start()` fail with the given message.
    pub fn with_start_error(message: impl Into<String>) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            start_error: Some(message.into()),
        }
    }

    /// Snapshot of every command issued so far, in order.
    pub fn commands(&self) -> Vec<TransportCommand> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, command: TransportCommand) -> CallResult<()> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        Ok(())
    }
}

impl CallTransport for PlaceholderTransport {
    fn start(&self, assistant_id: &str) -> CallResult<()> {
        if let Some(message) = &self.start_error {
            return Err(CallError::Transport(message.clone()));
        }
        self.record(TransportCommand::Start(assistant_id.to_string()))
    }

    fn stop(&self) -> CallResult<()> {
        self.record(TransportCommand::Stop)
    }

    fn set_muted(&self, muted: bool) -> CallResult<()> {
        self.record(TransportCommand::SetMuted(muted))
    }

    fn send_control(&self, control: AssistantControl) -> CallResult<()> {
        self.record(TransportCommand::Control(control))
    }

    fn say(&self, text: &str) -> CallResult<()> {
        self.record(TransportCommand::Say(text.to_string()))
    }
}

//! # PitchGuard Call — real-time fact-check orchestration for live calls
//!
//! This crate sits between a voice-call transport and an external claim
//! analyzer and turns streaming transcripts into spoken challenges. It owns
//! no audio: the transport captures, transcribes and synthesizes; the
//! analyzer judges. Everything here is the coordination in between.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Session Engine                          │
//! │  ┌────────────┐   ┌─────────────┐   ┌────────────────────┐  │
//! │  │ Transport  │ → │  Transcript │ → │     Detection      │  │
//! │  │   events   │   │   Ingestor  │   │ Dispatcher (1-way) │  │
//! │  └────────────┘   └─────────────┘   └────────────────────┘  │
//! │        ↓                 ↓                     ↓             │
//! │  ┌────────────┐   ┌─────────────┐   ┌────────────────────┐  │
//! │  │ Call State │ ← │Conversation │ ← │   Result handler   │  │
//! │  │Coordinator │   │   Ledger    │   │  (alert+interrupt) │  │
//! │  └────────────┘   └─────────────┘   └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One logical thread of control: every handler runs to completion on the
//! session loop, so there are no locks and no interleaving. The only
//! suspending operation is the verdict call, held to a single outstanding
//! ticket by the dispatcher.

pub mod alert;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod session;
pub mod transport;

pub use alert::AlertScheduler;
pub use config::CallConfig;
pub use dispatch::{DetectionDispatcher, DispatchOutcome, DispatchState, DETECTION_BANNER};
pub use error::{CallError, CallResult};
pub use ingest::{TranscriptIngestor, TRIGGER_TERMS};
pub use ledger::{ConversationEntry, ConversationLedger, Speaker};
pub use session::{
    CallLifecycle, CallSession, CallStateCoordinator, SessionEngine, SessionEvent,
};
pub use transport::{
    AssistantControl, CallTransport, Completeness, PlaceholderTransport, SpeakerRole,
    TranscriptEvent, TransportCommand, TransportEvent, TransportMessage,
};

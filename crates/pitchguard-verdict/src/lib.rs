//! # PitchGuard Verdict — claim-analysis bridge
//!
//! Wire types and HTTP client for the external analysis service that judges
//! whether an utterance is bullshit, plus the centralized normalization that
//! turns its sparse responses into a fully-populated [`Verdict`].
//!
//! The bridge is deliberately dumb: no retries, no queueing, no timeout of
//! its own beyond the HTTP client's. Single-flight discipline and the
//! 10-second race live in `pitchguard-call`'s dispatcher.

pub mod bridge;
pub mod error;
pub mod model;

pub use bridge::{DetectorBridge, PlaceholderVerdict, VerdictBackend};
pub use error::{VerdictError, VerdictResult};
pub use model::{AnalyzeEnvelope, RawClaim, RawVerdict, Severity, Verdict};

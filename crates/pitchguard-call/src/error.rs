//! Error types for the call-session core.

use thiserror::Error;

/// Result type alias for call-session operations.
pub type CallResult<T> = Result<T, CallError>;

/// Errors surfaced by the session core. All of them are recoverable: they
/// become status text on the session, never a crash.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Transport not initialized")]
    NotInitialized,

    #[error("Transport command failed: {0}")]
    Transport(String),
}

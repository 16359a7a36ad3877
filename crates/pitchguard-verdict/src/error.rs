//! Error types for the verdict bridge.

use thiserror::Error;

/// Result type alias for verdict-service operations.
pub type VerdictResult<T> = Result<T, VerdictError>;

/// Errors that can occur while talking to the claim-analysis service.
///
/// None of these are fatal to a call session: the dispatcher treats every
/// variant like a timeout and returns to idle.
#[derive(Error, Debug)]
pub enum VerdictError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis request failed: {0}")]
    Request(String),

    #[error("Analysis API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed analysis response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let e = VerdictError::Api {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(e.to_string(), "Analysis API error 503: overloaded");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<VerdictError>();
        assert_sync::<VerdictError>();
    }
}

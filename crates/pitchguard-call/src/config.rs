//! Session configuration loaded from environment.
//!
//! Everything has a production default; set `PITCHGUARD_*` vars to override
//! behavior without code edits. `.env` loading is the caller's job (see the
//! `scripted_pitch` example).

use std::time::Duration;

/// Tunables for the call-session core.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | PITCHGUARD_ASSISTANT_ID | unset | Voice-assistant identity passed to `transport.start()`. |
/// | PITCHGUARD_DISPATCH_TIMEOUT_MS | 10000 | How long one fact check may stay in flight. |
/// | PITCHGUARD_ALERT_DURATION_MS | 5000 | Visibility window of the detection alert. |
/// | PITCHGUARD_SCORE_THRESHOLD | 0.7 | Scores above this trigger a detection. |
/// | PITCHGUARD_MIN_CLAIM_CHARS | 10 | Shorter user utterances are never dispatched. |
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Assistant identity; `start()` fails with `ConfigMissing` when unset.
    pub assistant_id: Option<String>,
    /// Fact-check in-flight budget before timeout recovery kicks in.
    pub dispatch_timeout: Duration,
    /// How long the detection alert stays visible after each trigger.
    pub alert_duration: Duration,
    /// Verdict scores strictly above this fire the detection path.
    pub score_threshold: f64,
    /// Minimum utterance length (in characters) worth fact-checking.
    pub min_claim_chars: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            assistant_id: None,
            dispatch_timeout: Duration::from_millis(10_000),
            alert_duration: Duration::from_millis(5_000),
            score_threshold: 0.7,
            min_claim_chars: 10,
        }
    }
}

impl CallConfig {
    /// Load from environment. Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            assistant_id: env_opt_string("PITCHGUARD_ASSISTANT_ID"),
            dispatch_timeout: Duration::from_millis(env_u64(
                "PITCHGUARD_DISPATCH_TIMEOUT_MS",
                defaults.dispatch_timeout.as_millis() as u64,
            )),
            alert_duration: Duration::from_millis(env_u64(
                "PITCHGUARD_ALERT_DURATION_MS",
                defaults.alert_duration.as_millis() as u64,
            )),
            score_threshold: env_f64("PITCHGUARD_SCORE_THRESHOLD", defaults.score_threshold),
            min_claim_chars: env_u64(
                "PITCHGUARD_MIN_CLAIM_CHARS",
                defaults.min_claim_chars as u64,
            ) as usize,
        }
    }

    /// Set the assistant identity (e.g. for tests and demos).
    pub fn with_assistant_id(mut self, id: impl Into<String>) -> Self {
        self.assistant_id = Some(id.into());
        self
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let c = CallConfig::default();
        assert_eq!(c.assistant_id, None);
        assert_eq!(c.dispatch_timeout, Duration::from_secs(10));
        assert_eq!(c.alert_duration, Duration::from_secs(5));
        assert!((c.score_threshold - 0.7).abs() < 1e-9);
        assert_eq!(c.min_claim_chars, 10);
    }

    #[test]
    fn with_assistant_id_sets_identity() {
        let c = CallConfig::default().with_assistant_id("asst-123");
        assert_eq!(c.assistant_id.as_deref(), Some("asst-123"));
    }
}

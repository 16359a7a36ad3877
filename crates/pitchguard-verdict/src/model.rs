//! **Verdict model** — the analysis service's raw wire format and the
//! normalized `Verdict` every other component consumes.
//!
//! The service leaves most response fields optional and sometimes tucks the
//! interesting ones inside a `claims` array. `Verdict::from_raw` is the single
//! place raw responses are filled in; nothing downstream has to reason about
//! missing fields.

use serde::{Deserialize, Serialize};

/// Default score when the service omits `bullshit_score`.
const DEFAULT_SCORE: f64 = 0.9;
const DEFAULT_CATEGORY: &str = "suspicious_claim";
const DEFAULT_EXPLANATION: &str =
    "this claim appears to be false or misleading based on our analysis";
const DEFAULT_CHALLENGE: &str = "can you provide evidence for this claim?";

fn default_red_flags() -> Vec<String> {
    vec![
        "Unverifiable claim".to_string(),
        "Suspicious metrics".to_string(),
    ]
}

/// How severe a detected claim is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Extreme,
}

impl Severity {
    /// Parse a wire severity string. Unknown or empty values map to `High`,
    /// the same fallback used when the field is absent entirely.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "extreme" => Severity::Extreme,
            _ => Severity::High,
        }
    }
}

/// Fully-populated judgment of one utterance. `score` is always in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Confidence that the claim is false, clamped into [0, 1].
    pub score: f64,
    /// Category of lie (e.g. "fake_partnerships", "impossible_metrics").
    pub category: String,
    pub severity: Severity,
    pub explanation: String,
    /// Specific red flags, in the order the service reported them.
    pub red_flags: Vec<String>,
    /// The rebuttal to speak into the call when this verdict fires.
    pub challenge: String,
}

impl Verdict {
    /// Normalize a raw service response. Absent fields receive fixed defaults;
    /// `explanation`, `red_flags` and the challenge fall back to the first
    /// entry of `claims` before defaulting, matching where the service puts
    /// them when it analyzes claim-by-claim.
    pub fn from_raw(raw: RawVerdict) -> Self {
        let first = raw.claims.into_iter().next().unwrap_or_default();
        Self {
            score: raw.bullshit_score.unwrap_or(DEFAULT_SCORE).clamp(0.0, 1.0),
            category: raw
                .bullshit_type
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            severity: raw
                .severity
                .as_deref()
                .map(Severity::parse)
                .unwrap_or(Severity::High),
            explanation: raw
                .explanation
                .or(first.explanation)
                .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
            red_flags: raw
                .red_flags
                .or(first.red_flags)
                .unwrap_or_else(default_red_flags),
            challenge: raw
                .voice_response
                .or(first.voice_response)
                .unwrap_or_else(|| DEFAULT_CHALLENGE.to_string()),
        }
    }

    /// Verdict for an assistant utterance that itself called bullshit: the
    /// voice agent already judged the claim, so the score is fixed high and
    /// the challenge is the utterance the agent spoke.
    pub fn self_detected(utterance: &str) -> Self {
        Self {
            score: 0.95,
            category: "voice_agent_detection".to_string(),
            severity: Severity::High,
            explanation: "the voice agent detected a false or misleading claim".to_string(),
            red_flags: vec![
                "AI-detected suspicious claim".to_string(),
                "Requires evidence".to_string(),
                "Potentially false information".to_string(),
            ],
            challenge: utterance.to_string(),
        }
    }
}

/// Success envelope from `POST /api/analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeEnvelope {
    pub result: Option<RawVerdict>,
}

/// Verdict exactly as the analysis service reports it. Every field may be
/// absent; see `Verdict::from_raw` for the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVerdict {
    pub bullshit_score: Option<f64>,
    pub bullshit_type: Option<String>,
    pub severity: Option<String>,
    pub explanation: Option<String>,
    pub red_flags: Option<Vec<String>>,
    pub voice_response: Option<String>,
    #[serde(default)]
    pub claims: Vec<RawClaim>,
}

/// Per-claim detail inside a raw verdict.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClaim {
    pub explanation: Option<String>,
    pub red_flags: Option<Vec<String>>,
    pub voice_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_raw_gets_every_default() {
        let v = Verdict::from_raw(RawVerdict::default());
        assert_eq!(v.score, 0.9);
        assert_eq!(v.category, "suspicious_claim");
        assert_eq!(v.severity, Severity::High);
        assert_eq!(
            v.explanation,
            "this claim appears to be false or misleading based on our analysis"
        );
        assert_eq!(v.red_flags, vec!["Unverifiable claim", "Suspicious metrics"]);
        assert_eq!(v.challenge, "can you provide evidence for this claim?");
    }

    #[test]
    fn populated_raw_passes_through() {
        let raw = RawVerdict {
            bullshit_score: Some(0.95),
            bullshit_type: Some("fake_customers".to_string()),
            severity: Some("extreme".to_string()),
            explanation: Some("Goldman Sachs is not a customer".to_string()),
            red_flags: Some(vec!["Unnamed Fortune 500 customers".to_string()]),
            voice_response: Some("Which Fortune 500 companies? Name them!".to_string()),
            claims: Vec::new(),
        };
        let v = Verdict::from_raw(raw);
        assert_eq!(v.score, 0.95);
        assert_eq!(v.category, "fake_customers");
        assert_eq!(v.severity, Severity::Extreme);
        assert_eq!(v.challenge, "Which Fortune 500 companies? Name them!");
    }

    #[test]
    fn claim_fields_fill_in_before_defaults() {
        let raw = RawVerdict {
            bullshit_score: Some(0.8),
            claims: vec![RawClaim {
                explanation: Some("from the first claim".to_string()),
                red_flags: Some(vec!["claim flag".to_string()]),
                voice_response: Some("claim challenge".to_string()),
            }],
            ..Default::default()
        };
        let v = Verdict::from_raw(raw);
        assert_eq!(v.explanation, "from the first claim");
        assert_eq!(v.red_flags, vec!["claim flag"]);
        assert_eq!(v.challenge, "claim challenge");
    }

    #[test]
    fn top_level_fields_win_over_claims() {
        let raw = RawVerdict {
            explanation: Some("top level".to_string()),
            claims: vec![RawClaim {
                explanation: Some("claim level".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(Verdict::from_raw(raw).explanation, "top level");
    }

    #[test]
    fn score_is_clamped() {
        let over = RawVerdict {
            bullshit_score: Some(1.7),
            ..Default::default()
        };
        assert_eq!(Verdict::from_raw(over).score, 1.0);

        let under = RawVerdict {
            bullshit_score: Some(-0.2),
            ..Default::default()
        };
        assert_eq!(Verdict::from_raw(under).score, 0.0);
    }

    #[test]
    fn severity_parsing() {
        assert_eq!(Severity::parse("low"), Severity::Low);
        assert_eq!(Severity::parse("MEDIUM"), Severity::Medium);
        assert_eq!(Severity::parse(" extreme "), Severity::Extreme);
        assert_eq!(Severity::parse("catastrophic"), Severity::High);
        assert_eq!(Severity::parse(""), Severity::High);
    }

    #[test]
    fn self_detected_shape() {
        let v = Verdict::self_detected("That's complete bullshit.");
        assert_eq!(v.score, 0.95);
        assert_eq!(v.category, "voice_agent_detection");
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.red_flags.len(), 3);
        assert_eq!(v.challenge, "That's complete bullshit.");
    }

    #[test]
    fn envelope_deserializes_service_response() {
        let json = r#"{
            "status": "analyzed",
            "result": {
                "bullshit_score": 0.92,
                "bullshit_type": "funding_lies",
                "red_flags": ["Sequoia round unannounced"]
            }
        }"#;
        let envelope: AnalyzeEnvelope = serde_json::from_str(json).unwrap();
        let raw = envelope.result.unwrap();
        assert_eq!(raw.bullshit_score, Some(0.92));
        assert_eq!(raw.bullshit_type.as_deref(), Some("funding_lies"));
    }
}

//! **Detector Bridge** — async HTTP client for the external claim-analysis
//! service.
//!
//! The bridge never judges anything itself; it ships one utterance to
//! `POST {base_url}/api/analyze` and hands back the raw verdict for
//! normalization. Implement `VerdictBackend` for other services, or use
//! `PlaceholderVerdict` to exercise the session loop without a detector.

use crate::error::{VerdictError, VerdictResult};
use crate::model::{AnalyzeEnvelope, RawVerdict};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const DEFAULT_DETECTOR_URL: &str = "http://localhost:8000";

/// Backend that judges a single utterance. The dispatcher races this call
/// against its own timeout, so implementations may take as long as they like.
#[async_trait]
pub trait VerdictBackend: Send + Sync {
    /// Analyze one utterance and return the service's raw verdict.
    async fn analyze(&self, text: &str) -> VerdictResult<RawVerdict>;
}

/// Production backend for the claim-analysis HTTP service.
///
/// Uses `DETECTOR_API_URL` (default `http://localhost:8000`); the analyze
/// endpoint lives at `/api/analyze` under that base.
#[derive(Debug, Clone)]
pub struct DetectorBridge {
    /// Base URL without trailing slash.
    base_url: String,
    client: reqwest::Client,
}

impl DetectorBridge {
    /// Build from environment: `DETECTOR_API_URL`, falling back to localhost.
    pub fn from_env() -> VerdictResult<Self> {
        let base_url = std::env::var("DETECTOR_API_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DETECTOR_URL.to_string());
        Self::new(base_url)
    }

    /// Create with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> VerdictResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VerdictError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VerdictBackend for DetectorBridge {
    async fn analyze(&self, text: &str) -> VerdictResult<RawVerdict> {
        let url = format!("{}/api/analyze", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({ "text": text });
        debug!("analyzing {} chars via {}", text.len(), url);

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VerdictError::Request(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(VerdictError::Api { status, body });
        }

        let envelope: AnalyzeEnvelope = res
            .json()
            .await
            .map_err(|e| VerdictError::Malformed(e.to_string()))?;
        envelope
            .result
            .ok_or_else(|| VerdictError::Malformed("missing result object".to_string()))
    }
}

/// Placeholder backend: returns a canned raw verdict, optionally after an
/// artificial delay (for timeout tests) or as a forced failure.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderVerdict {
    /// The raw verdict every `analyze` call returns.
    pub raw: RawVerdict,
    /// Artificial latency before responding.
    pub delay: Option<Duration>,
    /// When set, every call fails with this reason instead of responding.
    pub fail: Option<String>,
}

impl PlaceholderVerdict {
    /// Canned verdict with the given score and defaults everywhere else.
    pub fn with_score(score: f64) -> Self {
        Self {
            raw: RawVerdict {
                bullshit_score: Some(score),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Add artificial latency before each response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every call fail with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl VerdictBackend for PlaceholderVerdict {
    async fn analyze(&self, _text: &str) -> VerdictResult<RawVerdict> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.fail {
            return Err(VerdictError::Request(reason.clone()));
        }
        Ok(self.raw.clone())
    }
}

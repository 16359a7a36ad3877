//! **Conversation ledger** — append-only ordered history of the call.
//!
//! Owned exclusively by the session loop, so there is no locking; entries are
//! never reordered after insertion. The one sanctioned mutation besides
//! append is `replace_last`, used when the assistant's own utterance upgrades
//! the entry that would have been appended plainly.

use chrono::{DateTime, Utc};
use pitchguard_verdict::Verdict;
use serde::Serialize;

/// Who a ledger entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    Detector,
}

/// One line of conversation history.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub speaker: Speaker,
    pub text: String,
    pub verdict: Option<Verdict>,
    pub is_bullshit: bool,
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Speaker::Assistant, text)
    }

    /// Detection entry: carries the verdict and flags the claim.
    pub fn detector(text: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            timestamp: Utc::now(),
            speaker: Speaker::Detector,
            text: text.into(),
            verdict: Some(verdict),
            is_bullshit: true,
        }
    }

    fn plain(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            speaker,
            text: text.into(),
            verdict: None,
            is_bullshit: false,
        }
    }
}

/// Ordered conversation history, cleared when the call stops.
#[derive(Debug, Default)]
pub struct ConversationLedger {
    entries: Vec<ConversationEntry>,
}

impl ConversationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an entry to the end of the history.
    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Remove the most recent entry, if any, and push `entry` in its place.
    /// On an empty ledger the entry is simply pushed, so the length always
    /// matches what a plain `append` would have produced.
    pub fn replace_last(&mut self, entry: ConversationEntry) {
        self.entries.pop();
        self.entries.push(entry);
    }

    /// Discard all history (call stop).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

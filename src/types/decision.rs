//! Decision, outcome, and verdict types

use serde::{Deserialize, Serialize};

/// Whether the current moment is a loud event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Loud,
    Quiet,
}

impl Decision {
    /// The conservative decision used whenever the classifier cannot be
    /// trusted. Never forces a volume change.
    pub const SAFE_FALLBACK: Decision = Decision::Quiet;

    /// Parse a classifier token.
    ///
    /// Surrounding whitespace and case are ignored. Anything other than
    /// `YES` or `NO` yields `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("YES") {
            Some(Decision::Loud)
        } else if token.eq_ignore_ascii_case("NO") {
            Some(Decision::Quiet)
        } else {
            None
        }
    }

    /// Wire token: `YES` for loud, `NO` for quiet.
    pub fn as_token(&self) -> &'static str {
        match self {
            Decision::Loud => "YES",
            Decision::Quiet => "NO",
        }
    }

    /// Lowercase label for metrics.
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            Decision::Loud => "yes",
            Decision::Quiet => "no",
        }
    }
}

/// How a decision was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Served from the decision cache without contacting upstream.
    CacheHit,
    /// The upstream classifier answered with a valid token.
    Upstream,
    /// An identical request was already in flight; fallback returned.
    Duplicate,
    /// Upstream exceeded its time bound; fallback returned.
    Timeout,
    /// Upstream call failed at the transport or API level; fallback returned.
    TransportFailure,
    /// Upstream answered with something other than `YES`/`NO`; fallback returned.
    Malformed,
    /// Mock mode: local rules decided.
    Rules,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CacheHit => "cache_hit",
            Outcome::Upstream => "upstream",
            Outcome::Duplicate => "duplicate",
            Outcome::Timeout => "timeout",
            Outcome::TransportFailure => "transport_failure",
            Outcome::Malformed => "malformed",
            Outcome::Rules => "rules",
        }
    }

    /// Whether this outcome carries the safe fallback rather than a real
    /// classification.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Outcome::Duplicate | Outcome::Timeout | Outcome::TransportFailure | Outcome::Malformed
        )
    }
}

/// A decision together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub outcome: Outcome,
    /// Confidence in [0, 1]. Only populated on the audio path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Verdict {
    pub fn new(decision: Decision, outcome: Outcome) -> Self {
        Self {
            decision,
            outcome,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

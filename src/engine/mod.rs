//! Decision engine: live or mock mode behind one entry point.

mod builder;

pub use builder::{Crest, CrestBuilder};

use serde::Serialize;
use tracing::debug;

use crate::resolver::DecisionResolver;
use crate::rules;
use crate::telemetry;
use crate::types::{AudioSample, DecisionInput, Outcome, Verdict, VolumeDirective};

/// Where decisions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Upstream classifier behind the cache and in-flight guard.
    Live,
    /// Local keyword and spike rules.
    Mock,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Live => "live",
            Mode::Mock => "mock",
        }
    }
}

enum Backend {
    Live(DecisionResolver),
    Mock,
}

/// Produces verdicts and volume directives.
///
/// The mode is fixed at construction. Create with [`Crest::builder()`].
pub struct DecisionEngine {
    backend: Backend,
}

impl DecisionEngine {
    pub(crate) fn live(resolver: DecisionResolver) -> Self {
        Self {
            backend: Backend::Live(resolver),
        }
    }

    /// An engine that answers from local rules only.
    pub fn mock() -> Self {
        Self {
            backend: Backend::Mock,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.backend {
            Backend::Live(_) => Mode::Live,
            Backend::Mock => Mode::Mock,
        }
    }

    /// The resolver in live mode.
    pub fn resolver(&self) -> Option<&DecisionResolver> {
        match &self.backend {
            Backend::Live(resolver) => Some(resolver),
            Backend::Mock => None,
        }
    }

    /// Decide on any input. Audio verdicts carry a confidence.
    pub async fn decide(&self, input: &DecisionInput) -> Verdict {
        let verdict = match &self.backend {
            Backend::Live(resolver) => resolver.resolve(input).await,
            Backend::Mock => {
                let decision = match input {
                    DecisionInput::Subtitle(text) => rules::subtitle_decision(text),
                    DecisionInput::Audio(sample) => rules::audio_decision(sample),
                };
                debug!(
                    input = input.kind(),
                    decision = decision.as_token(),
                    mode = "mock",
                    "rule-based decision"
                );
                Verdict::new(decision, Outcome::Rules)
            }
        };

        let verdict = match input {
            DecisionInput::Audio(sample) => {
                verdict.with_confidence(rules::audio_confidence(sample, verdict.decision))
            }
            DecisionInput::Subtitle(_) => verdict,
        };

        metrics::counter!(telemetry::DECISIONS_TOTAL,
            "input" => input.kind(),
            "decision" => verdict.decision.as_label(),
            "outcome" => verdict.outcome.as_str(),
        )
        .increment(1);
        verdict
    }

    pub async fn decide_subtitle(&self, text: &str) -> Verdict {
        self.decide(&DecisionInput::subtitle(text)).await
    }

    pub async fn decide_audio(&self, sample: AudioSample) -> Verdict {
        self.decide(&DecisionInput::audio(sample)).await
    }

    /// Decide on subtitle text and shape the volume directive.
    pub async fn subtitle_directive(&self, text: &str) -> (Verdict, VolumeDirective) {
        let verdict = self.decide_subtitle(text).await;
        let directive = VolumeDirective::for_subtitle(verdict.decision);
        if directive.is_lowering() {
            metrics::counter!(telemetry::LOUD_EVENTS_TOTAL, "input" => "subtitle").increment(1);
        }
        (verdict, directive)
    }

    /// Decide on an audio tick and shape the volume directive.
    pub async fn audio_directive(&self, sample: AudioSample) -> (Verdict, VolumeDirective) {
        let verdict = self.decide_audio(sample).await;
        let directive = VolumeDirective::for_audio(verdict.decision);
        if directive.is_lowering() {
            metrics::counter!(telemetry::LOUD_EVENTS_TOTAL, "input" => "audio").increment(1);
        }
        (verdict, directive)
    }
}

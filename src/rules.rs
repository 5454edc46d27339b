//! Deterministic rules for mock mode.
//!
//! Used when no classifier credentials are configured. Subtitles are
//! matched against a fixed keyword list; audio ticks are judged on spike
//! size and absolute volume.

use crate::types::{AudioSample, Decision};

/// Substrings that mark a subtitle as describing a loud event.
const LOUD_KEYWORDS: &[&str] = &[
    "[explosion]",
    "[gunshot]",
    "[dramatic music]",
    "[thunder]",
    "[crash]",
    "[bang]",
    "[boom]",
    "[screaming]",
    "[shouting]",
    "explosion",
    "gunshot",
    "thunder",
    "crash",
    "bang",
    "boom",
];

/// A spike above this is loud regardless of volume.
pub const LARGE_SPIKE: f64 = 0.4;
/// A spike above this is loud when the absolute volume is also high.
pub const MEDIUM_SPIKE: f64 = 0.25;
pub const HIGH_VOLUME: f64 = 0.6;

/// Keyword match over trimmed, lowercased text.
pub fn subtitle_decision(text: &str) -> Decision {
    let text = text.trim().to_lowercase();
    if LOUD_KEYWORDS.iter().any(|k| text.contains(k)) {
        Decision::Loud
    } else {
        Decision::Quiet
    }
}

/// Spike thresholds.
pub fn audio_decision(sample: &AudioSample) -> Decision {
    if sample.spike > LARGE_SPIKE || (sample.spike > MEDIUM_SPIKE && sample.volume > HIGH_VOLUME) {
        Decision::Loud
    } else {
        Decision::Quiet
    }
}

/// Confidence in `decision` given the measured spike.
///
/// Spike strength is `spike / LARGE_SPIKE`, clamped to [0, 1]. A loud
/// decision is as confident as the spike is strong; a quiet one the
/// reverse. A quiet fallback on a huge spike therefore reports near-zero
/// confidence.
pub fn audio_confidence(sample: &AudioSample, decision: Decision) -> f32 {
    let strength = if sample.spike.is_finite() {
        (sample.spike / LARGE_SPIKE).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    match decision {
        Decision::Loud => strength,
        Decision::Quiet => 1.0 - strength,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_sound_cues_are_loud() {
        assert_eq!(subtitle_decision("[explosion]"), Decision::Loud);
        assert_eq!(subtitle_decision("  [Dramatic Music] "), Decision::Loud);
    }

    #[test]
    fn bare_keywords_are_loud() {
        assert_eq!(subtitle_decision("A loud BANG outside"), Decision::Loud);
        assert_eq!(subtitle_decision("thunderstorm tonight"), Decision::Loud);
    }

    #[test]
    fn dialogue_is_quiet() {
        assert_eq!(subtitle_decision("Hello there"), Decision::Quiet);
        assert_eq!(subtitle_decision(""), Decision::Quiet);
    }

    #[test]
    fn large_spike_is_loud() {
        assert_eq!(audio_decision(&AudioSample::new(0.2, 0.1, 0.45)), Decision::Loud);
    }

    #[test]
    fn medium_spike_needs_high_volume() {
        assert_eq!(audio_decision(&AudioSample::new(0.7, 0.4, 0.3)), Decision::Loud);
        assert_eq!(audio_decision(&AudioSample::new(0.5, 0.2, 0.3)), Decision::Quiet);
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(audio_decision(&AudioSample::new(0.1, 0.0, 0.4)), Decision::Quiet);
        assert_eq!(audio_decision(&AudioSample::new(0.6, 0.3, 0.25)), Decision::Quiet);
    }

    #[test]
    fn confidence_tracks_spike_strength() {
        let big = AudioSample::new(0.9, 0.1, 0.8);
        assert_eq!(audio_confidence(&big, Decision::Loud), 1.0);
        assert_eq!(audio_confidence(&big, Decision::Quiet), 0.0);

        let half = AudioSample::new(0.3, 0.1, 0.2);
        assert!((audio_confidence(&half, Decision::Loud) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn confidence_handles_degenerate_spikes() {
        let neg = AudioSample::new(0.0, 0.5, -0.5);
        assert_eq!(audio_confidence(&neg, Decision::Quiet), 1.0);
        let nan = AudioSample::new(0.0, 0.0, f64::NAN);
        assert_eq!(audio_confidence(&nan, Decision::Loud), 0.0);
    }
}

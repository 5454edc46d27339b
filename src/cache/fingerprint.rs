//! Content fingerprints used as cache and dedup keys.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::{AudioSample, DecisionInput};

/// Audio features are quantized to this many steps per unit (two decimals)
/// so that jitter below 0.005 collapses onto the same key.
const AUDIO_STEPS_PER_UNIT: f64 = 100.0;

/// Deterministic 64-bit identifier of normalized input content.
///
/// Equal logical inputs always produce equal fingerprints. Distinct inputs
/// that happen to collide share cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint any decision input.
    pub fn of(input: &DecisionInput) -> Self {
        match input {
            DecisionInput::Subtitle(text) => Self::of_subtitle(text),
            DecisionInput::Audio(sample) => Self::of_audio(sample),
        }
    }

    /// Fingerprint subtitle text. Trimmed and lowercased before hashing.
    pub fn of_subtitle(text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        "subtitle".hash(&mut hasher);
        normalize_text(text).hash(&mut hasher);
        Fingerprint(hasher.finish())
    }

    /// Fingerprint an audio tuple. Each feature is quantized first.
    pub fn of_audio(sample: &AudioSample) -> Self {
        let mut hasher = DefaultHasher::new();
        "audio".hash(&mut hasher);
        quantize(sample.volume).hash(&mut hasher);
        quantize(sample.baseline).hash(&mut hasher);
        quantize(sample.spike).hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

pub(crate) fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// NaN quantizes to 0; out-of-range values saturate.
fn quantize(value: f64) -> i64 {
    (value * AUDIO_STEPS_PER_UNIT).round() as i64
}

//! Request inputs

use serde::{Deserialize, Serialize};

/// Audio-level telemetry for one tick, as reported by the extension.
///
/// All values are normalized volume levels; `spike` is the rise of
/// `volume` above the running `baseline`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSample {
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub baseline: f64,
    #[serde(default)]
    pub spike: f64,
}

impl AudioSample {
    pub fn new(volume: f64, baseline: f64, spike: f64) -> Self {
        Self {
            volume,
            baseline,
            spike,
        }
    }
}

/// Anything the service can be asked to decide on.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionInput {
    Subtitle(String),
    Audio(AudioSample),
}

impl DecisionInput {
    pub fn subtitle(text: impl Into<String>) -> Self {
        DecisionInput::Subtitle(text.into())
    }

    pub fn audio(sample: AudioSample) -> Self {
        DecisionInput::Audio(sample)
    }

    /// Label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionInput::Subtitle(_) => "subtitle",
            DecisionInput::Audio(_) => "audio",
        }
    }
}

impl From<&str> for DecisionInput {
    fn from(text: &str) -> Self {
        DecisionInput::Subtitle(text.to_string())
    }
}

impl From<AudioSample> for DecisionInput {
    fn from(sample: AudioSample) -> Self {
        DecisionInput::Audio(sample)
    }
}

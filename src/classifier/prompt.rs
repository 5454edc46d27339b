//! Prompt templates sent to the upstream classifier.

use crate::types::{AudioSample, DecisionInput};

/// Build the classifier prompt for any input.
pub fn for_input(input: &DecisionInput) -> String {
    match input {
        DecisionInput::Subtitle(text) => for_subtitle(text),
        DecisionInput::Audio(sample) => for_audio(sample),
    }
}

pub fn for_subtitle(text: &str) -> String {
    format!("Does the following text describe a loud noise: '{text}'? Respond only with YES or NO.")
}

pub fn for_audio(sample: &AudioSample) -> String {
    format!(
        "Analyze this audio data for loud events:\n\
         Current Volume: {:.3}\n\
         Baseline Volume: {:.3}\n\
         Volume Spike: {:.3}\n\n\
         This represents real-time audio analysis. A spike > 0.3 usually indicates sudden \
         loud sounds like explosions, gunshots, crashes, or dramatic music.\n\n\
         Should the volume be lowered? Respond only with YES or NO.",
        sample.volume, sample.baseline, sample.spike
    )
}

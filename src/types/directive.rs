//! Volume directives returned to the extension

use serde::{Deserialize, Serialize};

use super::Decision;

/// Level and duration for a subtitle-triggered reduction.
const SUBTITLE_LEVEL: f32 = 0.3;
const SUBTITLE_DURATION_MS: u64 = 5000;

/// Audio spikes get a deeper, shorter reduction.
const AUDIO_LEVEL: f32 = 0.25;
const AUDIO_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeAction {
    LowerVolume,
    None,
}

/// What the extension should do with the tab's volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeDirective {
    pub action: VolumeAction,
    /// Target volume multiplier while lowered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    /// How long to hold the lowered volume, in milliseconds.
    #[serde(
        default,
        rename = "duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
}

impl VolumeDirective {
    pub fn none() -> Self {
        Self {
            action: VolumeAction::None,
            level: None,
            duration_ms: None,
        }
    }

    pub fn lower(level: f32, duration_ms: u64) -> Self {
        Self {
            action: VolumeAction::LowerVolume,
            level: Some(level),
            duration_ms: Some(duration_ms),
        }
    }

    /// Directive for a subtitle decision.
    pub fn for_subtitle(decision: Decision) -> Self {
        match decision {
            Decision::Loud => Self::lower(SUBTITLE_LEVEL, SUBTITLE_DURATION_MS),
            Decision::Quiet => Self::none(),
        }
    }

    /// Directive for an audio decision.
    pub fn for_audio(decision: Decision) -> Self {
        match decision {
            Decision::Loud => Self::lower(AUDIO_LEVEL, AUDIO_DURATION_MS),
            Decision::Quiet => Self::none(),
        }
    }

    pub fn is_lowering(&self) -> bool {
        self.action == VolumeAction::LowerVolume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_loud_lowers_for_five_seconds() {
        let d = VolumeDirective::for_subtitle(Decision::Loud);
        assert!(d.is_lowering());
        assert_eq!(d.level, Some(0.3));
        assert_eq!(d.duration_ms, Some(5000));
    }

    #[test]
    fn audio_loud_lowers_deeper() {
        let d = VolumeDirective::for_audio(Decision::Loud);
        assert_eq!(d.level, Some(0.25));
        assert_eq!(d.duration_ms, Some(3000));
    }

    #[test]
    fn quiet_serializes_without_level() {
        let json = serde_json::to_value(VolumeDirective::for_audio(Decision::Quiet)).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "NONE" }));
    }

    #[test]
    fn lower_serializes_wire_names() {
        let json = serde_json::to_value(VolumeDirective::for_subtitle(Decision::Loud)).unwrap();
        assert_eq!(json["action"], "LOWER_VOLUME");
        assert_eq!(json["duration"], 5000);
    }
}

//! Structured visual-prompt template types.
//!
//! The analysis step fills a JSON template describing the desired shot; the
//! filled document travels with each scene as text and may be hand-edited.
//! Parsing is deliberately lenient: only the fields the prompt flattener
//! consumes are typed, everything else is carried as raw JSON so a partially
//! filled or extended document still round-trips.

use serde::{Deserialize, Serialize};

/// Sentinel value marking template fields the analysis step did not fill.
pub const PLACEHOLDER: &str = "SWAP_ME";

/// The canonical placeholder-filled template injected into analysis prompts.
pub const TEMPLATE_JSON: &str = r##"{
  "scene": "SWAP_ME",
  "style": "SWAP_ME",
  "shot": {
    "composition": "SWAP_ME",
    "camera_motion": "SWAP_ME",
    "frame_rate": "24 fps",
    "resolution": "1920 x 1080",
    "lens": "SWAP_ME",
    "look": "SWAP_ME"
  },
  "voice_over": {
    "language": "English",
    "tone": "SWAP_ME",
    "mode": "Narrative, explanatory",
    "emotion": "SWAP_ME",
    "narration_text": "SWAP_ME",
    "duration_sec": "SWAP_ME"
  },
  "timeline": [
    { "time": "0.0-1.5 s", "action": "SWAP_ME" },
    { "time": "1.5-3.0 s", "action": "SWAP_ME" },
    { "time": "3.0-4.0 s", "action": "SWAP_ME" },
    { "time": "4.0-5.5 s", "action": "SWAP_ME" },
    { "time": "5.5-6.5 s", "action": "SWAP_ME" },
    { "time": "6.5-7.5 s", "action": "SWAP_ME" },
    { "time": "7.5-END", "action": "SWAP_ME" }
  ],
  "lighting": {
    "primary": "SWAP_ME",
    "secondary": "SWAP_ME",
    "accents": "SWAP_ME"
  },
  "audio": {
    "ambient": "SWAP_ME",
    "sfx": ["SWAP_ME", "SWAP_ME", "SWAP_ME"],
    "music": {
      "track": "SWAP_ME",
      "description": "SWAP_ME",
      "tempo": "SWAP_ME",
      "key": "SWAP_ME",
      "dynamic_curve": "SWAP_ME"
    },
    "mix": {
      "integrated_loudness": "-14 LUFS",
      "sidechain_music_db_on_impacts": -3,
      "natural_reverb": true
    }
  },
  "text_rules": {
    "emoji_policy": "no emojis",
    "contrast": "SWAP_ME"
  },
  "color_palette": {
    "background": "SWAP_ME",
    "ink_primary": "#111111",
    "ink_secondary": "#444444",
    "text_primary": "#111111"
  },
  "transitions": {
    "between_scenes": "SWAP_ME",
    "impact_frame_usage": "SWAP_ME",
    "forbidden": ["glitch", "marker squeaks", "cartoon pops"]
  },
  "visual_rules": {
    "prohibited_elements": ["cartoon outlines", "logos"],
    "grain": "SWAP_ME",
    "sharpen": "SWAP_ME"
  },
  "export": {
    "preset": "1920x1080_h264_high",
    "target_duration_sec": "SWAP_ME"
  },
  "metadata": {
    "series": "SWAP_ME",
    "task": "SWAP_ME",
    "scene_number": "SWAP_ME",
    "tags": ["SWAP_ME", "SWAP_ME", "SWAP_ME"]
  }
}"##;

/// A parsed visual specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualSpec {
    /// Top-level scene summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,

    /// Style directive filled by the analysis step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Shot composition block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<ShotSpec>,

    /// Lighting block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<LightingSpec>,

    /// Timed sub-actions, ordered as given
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<TimelineEntry>,

    /// Remaining template blocks (voice-over, audio, palette, export, ...)
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Shot composition and camera settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_motion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look: Option<String>,

    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Scene lighting description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accents: Option<String>,
}

/// One timed action on the scene timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Re-serialize a JSON document with indentation, if it parses.
///
/// Analysis models tend to return minified specs; pretty-printing keeps the
/// stored prompt readable and hand-editable. Non-JSON input returns `None`.
pub fn prettify_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

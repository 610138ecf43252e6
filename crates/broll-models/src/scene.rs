//! Scene definitions and the generation lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    /// Generate a new random scene ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scene lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SceneStatus {
    /// No generation attempted yet
    #[default]
    Pending,
    /// An image call is in flight
    GeneratingImage,
    /// A video job is in flight
    GeneratingVideo,
    /// Generation finished with a media asset attached
    Completed,
    /// Generation failed; cause recorded on the scene
    Error,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::GeneratingImage => "generating-image",
            SceneStatus::GeneratingVideo => "generating-video",
            SceneStatus::Completed => "completed",
            SceneStatus::Error => "error",
        }
    }

    /// Check if a generation call is currently in flight.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            SceneStatus::GeneratingImage | SceneStatus::GeneratingVideo
        )
    }

    /// Check if this is a terminal state (until re-triggered).
    pub fn is_terminal(&self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Error)
    }
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which class of media a generation pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Image,
    Video,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Image => "image",
            GenerationMode::Video => "video",
        }
    }

    /// The in-flight status for this mode.
    pub fn generating_status(&self) -> SceneStatus {
        match self {
            GenerationMode::Image => SceneStatus::GeneratingImage,
            GenerationMode::Video => SceneStatus::GeneratingVideo,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of source content paired with a visual generation target.
///
/// A scene visualizes as either a still or a clip, never both: completing
/// with one medium clears the other, and the terminal error/pending states
/// carry no media at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene ID, stable for the scene's lifetime
    pub id: SceneId,

    /// The source excerpt this scene visualizes
    pub original_text: String,

    /// Structured visual specification, serialized as text (may be hand-edited)
    pub visual_prompt: String,

    /// Lifecycle state
    #[serde(default)]
    pub status: SceneStatus,

    /// Generated still, as a locally addressable resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Generated clip, as a locally addressable resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Human-readable failure cause, present only in the error state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Scene {
    /// Create a fresh pending scene.
    pub fn new(original_text: impl Into<String>, visual_prompt: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            original_text: original_text.into(),
            visual_prompt: visual_prompt.into(),
            status: SceneStatus::Pending,
            image_url: None,
            video_url: None,
            error: None,
        }
    }

    /// Enter the in-flight state for `mode`, clearing any prior error.
    pub fn start(mut self, mode: GenerationMode) -> Self {
        self.status = mode.generating_status();
        self.error = None;
        self
    }

    /// Attach a finished still and complete the scene.
    pub fn complete_with_image(mut self, url: impl Into<String>) -> Self {
        self.status = SceneStatus::Completed;
        self.image_url = Some(url.into());
        self.video_url = None;
        self.error = None;
        self
    }

    /// Attach a finished clip and complete the scene.
    pub fn complete_with_video(mut self, url: impl Into<String>) -> Self {
        self.status = SceneStatus::Completed;
        self.video_url = Some(url.into());
        self.image_url = None;
        self.error = None;
        self
    }

    /// Record a failure. The error state carries no media.
    pub fn fail(mut self, cause: impl Into<String>) -> Self {
        self.status = SceneStatus::Error;
        self.error = Some(cause.into());
        self.image_url = None;
        self.video_url = None;
        self
    }

    /// Replace the source text and visual prompt after a user edit.
    ///
    /// A content change invalidates any prior visual result, so the scene
    /// returns to pending with media and error cleared.
    pub fn rewrite(mut self, original_text: impl Into<String>, visual_prompt: impl Into<String>) -> Self {
        self.original_text = original_text.into();
        self.visual_prompt = visual_prompt.into();
        self.status = SceneStatus::Pending;
        self.image_url = None;
        self.video_url = None;
        self.error = None;
        self
    }

    /// Replace only the visual prompt, leaving lifecycle state untouched.
    pub fn with_prompt(mut self, visual_prompt: impl Into<String>) -> Self {
        self.visual_prompt = visual_prompt.into();
        self
    }

    /// The media slot for `mode`, if populated.
    pub fn media_for(&self, mode: GenerationMode) -> Option<&str> {
        match mode {
            GenerationMode::Image => self.image_url.as_deref(),
            GenerationMode::Video => self.video_url.as_deref(),
        }
    }

    /// Check whether status and media presence agree.
    ///
    /// Completed requires exactly one media slot set; every other state
    /// requires both empty.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            SceneStatus::Completed => self.image_url.is_some() != self.video_url.is_some(),
            _ => self.image_url.is_none() && self.video_url.is_none(),
        }
    }
}

//! Analysis session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Scene;

/// Where a session's scenes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Script,
    Video,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Script => "script",
            SourceType::Video => "video",
        }
    }

    /// Label used when rendering prompt exports.
    pub fn segment_label(&self) -> &'static str {
        match self {
            SourceType::Script => "SCRIPT SEGMENT",
            SourceType::Video => "VIDEO SEGMENT",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable historical record of one analysis run.
///
/// Owned by history once created; the live scene collection belongs to the
/// scene store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Source type the scenes were derived from
    pub source: SourceType,

    /// Display name
    pub name: String,

    /// The scene collection as it stood at analysis time
    pub scenes: Vec<Scene>,
}

impl Session {
    /// Create a new session record.
    pub fn new(source: SourceType, name: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            source,
            name: name.into(),
            scenes,
        }
    }

    /// Clone with large media payloads removed, for storage.
    pub fn stripped(&self) -> Session {
        let scenes = self
            .scenes
            .iter()
            .cloned()
            .map(|mut s| {
                s.image_url = None;
                s.video_url = None;
                s
            })
            .collect();
        Session {
            scenes,
            ..self.clone()
        }
    }
}

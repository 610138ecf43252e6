//! Shared data models for the B-Roll Director pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and their generation lifecycle
//! - Visual styles and aspect ratios
//! - Analysis sessions (history records)
//! - The structured visual-prompt template

pub mod scene;
pub mod session;
pub mod style;
pub mod visual;

// Re-export common types
pub use scene::{GenerationMode, Scene, SceneId, SceneStatus};
pub use session::{Session, SourceType};
pub use style::{
    AspectRatio, AspectRatioParseError, ImageStyle, StyleLookupError, VideoAspect, VISUAL_STYLES,
};
pub use visual::{
    prettify_json, LightingSpec, ShotSpec, TimelineEntry, VisualSpec, PLACEHOLDER, TEMPLATE_JSON,
};

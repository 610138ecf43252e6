//! The abstract generation-service boundary.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

use broll_models::AspectRatio;

use crate::error::GatewayResult;

/// A narrative source handed to analysis.
#[derive(Debug, Clone)]
pub enum AnalysisSource {
    /// A plain text script.
    Script(String),
    /// A video clip to recreate shot-for-shot.
    Video { data: Vec<u8>, mime_type: String },
}

/// One analyzed scene as returned by the service: the source excerpt and the
/// filled-out visual template, both plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSeed {
    pub original_text: String,
    pub visual_prompt: String,
}

/// A generated media payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MediaAsset {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Decode a base64 payload as delivered by the image API.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, base64::DecodeError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Render as a `data:` URL for in-memory consumption.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Handle for a long-running video generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoJobHandle(pub String);

impl VideoJobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoJobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a video job as reported by one poll.
#[derive(Debug, Clone, Default)]
pub struct VideoJobStatus {
    /// The job reached a terminal state.
    pub done: bool,
    /// Failure the job itself reported, if any.
    pub error: Option<String>,
    /// Download URI of the finished asset, when the job succeeded.
    pub asset_uri: Option<String>,
}

/// Boundary to the external generation service.
///
/// Calls are one-shot: there is no retry layer here, and per-scene failure
/// handling belongs to the orchestrator. Image generation is a single
/// request/response; video generation is submit-then-poll with a separate
/// authenticated fetch of the finished asset.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Verify credentials are usable for video generation.
    ///
    /// An out-of-band precondition checked once per batch or submission,
    /// never per poll.
    async fn ensure_video_credentials(&self) -> GatewayResult<()>;

    /// Break a narrative source into ordered scene seeds.
    async fn analyze(&self, source: AnalysisSource) -> GatewayResult<Vec<SceneSeed>>;

    /// Produce a fresh filled-out visual template for one edited segment.
    async fn generate_visual_prompt(&self, segment_text: &str) -> GatewayResult<String>;

    /// Generate one still for a scene.
    async fn generate_image(
        &self,
        visual_prompt: &str,
        style_modifier: &str,
        ratio: AspectRatio,
    ) -> GatewayResult<MediaAsset>;

    /// Submit a video generation job; completion is observed via polling.
    async fn submit_video(
        &self,
        visual_prompt: &str,
        style_modifier: &str,
        ratio: AspectRatio,
    ) -> GatewayResult<VideoJobHandle>;

    /// Read the current state of a video job.
    async fn poll_video_job(&self, handle: &VideoJobHandle) -> GatewayResult<VideoJobStatus>;

    /// Download a finished video asset.
    async fn fetch_video(&self, uri: &str) -> GatewayResult<MediaAsset>;
}

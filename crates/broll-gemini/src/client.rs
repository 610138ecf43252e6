//! Google generative API client.
//!
//! Implements [`GenerationGateway`] over raw HTTP: Gemini `generateContent`
//! for analysis, Imagen `predict` for stills, and the Veo long-running
//! operation protocol for clips. The base URL is overridable for tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use broll_models::{prettify_json, AspectRatio};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    AnalysisSource, GenerationGateway, MediaAsset, SceneSeed, VideoJobHandle, VideoJobStatus,
};
use crate::prompts;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Analysis models, tried in order until one succeeds.
const ANALYSIS_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.5-pro",
];

const IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Gateway implementation backed by the Google generative APIs.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> GatewayResult<Self> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| GatewayError::MissingCredentials)?;
        if api_key.is_empty() {
            return Err(GatewayError::MissingCredentials);
        }
        Ok(Self::new(api_key))
    }

    /// Create a client pointed at a non-default endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::new(api_key)
        }
    }

    async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> GatewayResult<String> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        Self::read_success(response).await
    }

    async fn read_success(response: reqwest::Response) -> GatewayResult<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Call `generateContent` and return the first candidate's text.
    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        response_schema: Value,
    ) -> GatewayResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(response_schema),
            },
        };

        let body = self.post_json(&url, &request).await?;
        let response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::decode(e.to_string()))?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| GatewayError::empty("No content in model response"))?;

        Ok(strip_code_fences(text).to_string())
    }

    /// Run an analysis prompt through the model fallback chain.
    async fn analyze_with_fallback(&self, parts: Vec<Part>) -> GatewayResult<Vec<SceneSeed>> {
        let mut last_error = None;

        for model in ANALYSIS_MODELS {
            info!(model = *model, "Running scene analysis");
            let result = self
                .generate_content(model, parts.clone(), prompts::analysis_response_schema())
                .await
                .and_then(|text| decode_analysis(&text));

            match result {
                Ok(seeds) => {
                    info!(model = *model, scenes = seeds.len(), "Analysis succeeded");
                    return Ok(seeds);
                }
                Err(e) => {
                    warn!(model = *model, error = %e, "Analysis attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::empty("All analysis models failed. Please try again later.")))
    }
}

#[async_trait]
impl GenerationGateway for GeminiClient {
    async fn ensure_video_credentials(&self) -> GatewayResult<()> {
        if self.api_key.is_empty() {
            return Err(GatewayError::MissingCredentials);
        }
        Ok(())
    }

    async fn analyze(&self, source: AnalysisSource) -> GatewayResult<Vec<SceneSeed>> {
        let parts = match source {
            AnalysisSource::Script(script) => vec![Part::text(prompts::script_analysis_prompt(&script))],
            AnalysisSource::Video { data, mime_type } => vec![
                Part::inline(mime_type, &data),
                Part::text(prompts::video_analysis_prompt()),
            ],
        };
        self.analyze_with_fallback(parts).await
    }

    async fn generate_visual_prompt(&self, segment_text: &str) -> GatewayResult<String> {
        let text = self
            .generate_content(
                ANALYSIS_MODELS[0],
                vec![Part::text(prompts::visual_prompt_regeneration_prompt(
                    segment_text,
                ))],
                prompts::visual_prompt_response_schema(),
            )
            .await?;

        // The schema asks for a {"visualPrompt": ...} wrapper, but the model
        // sometimes returns the filled template directly.
        if let Ok(envelope) = serde_json::from_str::<VisualPromptEnvelope>(&text) {
            if let Some(inner) = envelope.visual_prompt {
                return Ok(prettify_json(&inner).unwrap_or(inner));
            }
        }
        Ok(prettify_json(&text).unwrap_or(text))
    }

    async fn generate_image(
        &self,
        visual_prompt: &str,
        style_modifier: &str,
        ratio: AspectRatio,
    ) -> GatewayResult<MediaAsset> {
        let full_prompt = broll_prompt::flatten(visual_prompt, style_modifier);
        let url = format!("{}/models/{}:predict", self.base_url, IMAGE_MODEL);
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: full_prompt,
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: ratio.as_str().to_string(),
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let body = self.post_json(&url, &request).await?;
        let response: PredictResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::decode(e.to_string()))?;

        let (encoded, mime_type) = match response.predictions.into_iter().next() {
            Some(ImagePrediction {
                bytes_base64_encoded: Some(encoded),
                mime_type,
            }) => (encoded, mime_type),
            _ => return Err(GatewayError::empty("No image generated")),
        };

        MediaAsset::from_base64(
            mime_type.unwrap_or_else(|| "image/jpeg".to_string()),
            &encoded,
        )
        .map_err(|e| GatewayError::decode(format!("Invalid image payload: {e}")))
    }

    async fn submit_video(
        &self,
        visual_prompt: &str,
        style_modifier: &str,
        ratio: AspectRatio,
    ) -> GatewayResult<VideoJobHandle> {
        let full_prompt = broll_prompt::flatten(visual_prompt, style_modifier);
        info!(aspect = %ratio.video_bucket(), "Submitting video generation job");

        let url = format!("{}/models/{}:predictLongRunning", self.base_url, VIDEO_MODEL);
        let request = VideoPredictRequest {
            instances: vec![PredictInstance {
                prompt: full_prompt,
            }],
            parameters: VideoParameters {
                sample_count: 1,
                aspect_ratio: ratio.video_bucket().as_str().to_string(),
                resolution: "1080p".to_string(),
            },
        };

        let body = self.post_json(&url, &request).await?;
        let operation: OperationHandle =
            serde_json::from_str(&body).map_err(|e| GatewayError::decode(e.to_string()))?;
        Ok(VideoJobHandle(operation.name))
    }

    async fn poll_video_job(&self, handle: &VideoJobHandle) -> GatewayResult<VideoJobStatus> {
        let url = format!("{}/{}", self.base_url, handle.as_str());
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let body = Self::read_success(response).await?;

        let operation: VideoOperation =
            serde_json::from_str(&body).map_err(|e| GatewayError::decode(e.to_string()))?;

        let error = operation.error.map(|e| {
            e.message
                .unwrap_or_else(|| format!("operation error code {}", e.code.unwrap_or_default()))
        });
        let asset_uri = operation
            .response
            .and_then(|r| r.generated_videos.into_iter().next())
            .and_then(|v| v.video)
            .and_then(|v| v.uri);

        Ok(VideoJobStatus {
            done: operation.done,
            error,
            asset_uri,
        })
    }

    async fn fetch_video(&self, uri: &str) -> GatewayResult<MediaAsset> {
        let mut url = Url::parse(uri)
            .map_err(|e| GatewayError::decode(format!("Invalid asset uri {uri}: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: format!("Failed to fetch video: {status}"),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        Ok(MediaAsset::new("video/mp4", bytes))
    }
}

/// Strip a markdown code fence the model sometimes wraps JSON in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

fn decode_analysis(text: &str) -> GatewayResult<Vec<SceneSeed>> {
    let response: AnalysisResponse =
        serde_json::from_str(text).map_err(|e| GatewayError::decode(e.to_string()))?;
    Ok(response.scenes)
}

// --- Wire types ---

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(mime_type: String, data: &[u8]) -> Self {
        use base64::Engine as _;
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type,
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    scenes: Vec<SceneSeed>,
}

#[derive(Debug, Deserialize)]
struct VisualPromptEnvelope {
    #[serde(rename = "visualPrompt", default)]
    visual_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: ImageParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct ImageParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "outputMimeType")]
    output_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Deserialize)]
struct ImagePrediction {
    #[serde(rename = "bytesBase64Encoded", default)]
    bytes_base64_encoded: Option<String>,
    #[serde(rename = "mimeType", default)]
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct VideoPredictRequest {
    instances: Vec<PredictInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    resolution: String,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct VideoOperation {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    // Raw operations sometimes deliver the payload under `result`.
    #[serde(default, alias = "result")]
    response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResult {
    #[serde(rename = "generatedVideos", default)]
    generated_videos: Vec<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideo {
    #[serde(default)]
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    #[serde(default)]
    uri: Option<String>,
}

//! Long-running video job driver.
//!
//! Video generation is submit-then-poll: the gateway returns a handle, and
//! completion is observed by polling at a fixed interval until the job
//! reports terminal state, after which the finished asset is fetched. There
//! is no backoff; the interval matches the service's recommended cadence.

use std::time::Duration;

use tracing::debug;

use broll_models::AspectRatio;

use broll_gemini::{GatewayError, GatewayResult, GenerationGateway, MediaAsset};

use crate::config::EngineConfig;

/// Drives one video job from submission to a fetched asset.
#[derive(Debug, Clone)]
pub struct OperationPoller {
    interval: Duration,
    max_polls: Option<u32>,
}

impl OperationPoller {
    pub fn new(interval: Duration, max_polls: Option<u32>) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.poll_interval, config.max_polls)
    }

    /// Submit a video job and drive it to a terminal outcome.
    ///
    /// Every failure stage — submit, poll, job-reported error, filtered
    /// output, fetch — surfaces as an error; a partial or missing asset
    /// reference is never returned as success.
    pub async fn run(
        &self,
        gateway: &dyn GenerationGateway,
        visual_prompt: &str,
        style_modifier: &str,
        ratio: AspectRatio,
    ) -> GatewayResult<MediaAsset> {
        let handle = gateway
            .submit_video(visual_prompt, style_modifier, ratio)
            .await?;

        let mut polls: u32 = 0;
        let status = loop {
            tokio::time::sleep(self.interval).await;
            polls += 1;

            let status = gateway.poll_video_job(&handle).await?;
            if status.done {
                break status;
            }

            debug!(job = %handle, polls, "Video job still running");
            if let Some(max) = self.max_polls {
                if polls >= max {
                    return Err(GatewayError::JobFailed(format!(
                        "job did not finish within {max} polls"
                    )));
                }
            }
        };

        if let Some(message) = status.error {
            return Err(GatewayError::JobFailed(message));
        }

        let uri = status.asset_uri.ok_or_else(|| {
            GatewayError::Blocked(
                "No video generated. The content may have been filtered by safety guidelines."
                    .to_string(),
            )
        })?;

        gateway.fetch_video(&uri).await
    }
}

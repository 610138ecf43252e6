//! Programmable gateway double shared by the engine test suites.
//!
//! Scenes opt into failure behavior through markers embedded in their visual
//! prompt: `FAIL_IMAGE`, `FAIL_SUBMIT`, `JOB_ERROR`, `FILTERED`, and
//! `FAIL_FETCH` each trip the corresponding stage.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use broll_engine::EngineConfig;
use broll_gemini::{
    AnalysisSource, GatewayError, GatewayResult, GenerationGateway, MediaAsset, SceneSeed,
    VideoJobHandle, VideoJobStatus,
};
use broll_models::AspectRatio;

#[derive(Default)]
pub struct MockGateway {
    seeds: Mutex<Vec<SceneSeed>>,
    analyze_fails: AtomicBool,
    pub analyze_calls: AtomicUsize,

    credentials_denied: AtomicBool,
    pub credential_checks: AtomicUsize,

    pub image_calls: AtomicUsize,
    active_images: AtomicUsize,
    pub peak_images: AtomicUsize,

    pub video_submits: AtomicUsize,
    active_videos: AtomicUsize,
    pub peak_videos: AtomicUsize,
    pub total_polls: AtomicUsize,

    polls_until_done: u32,
    poll_counts: Mutex<HashMap<String, u32>>,
    jobs: Mutex<HashMap<String, String>>,
    next_job_id: AtomicUsize,

    regenerated_prompt: String,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            polls_until_done: 1,
            regenerated_prompt: r#"{"scene":"regenerated"}"#.to_string(),
            ..Self::default()
        }
    }

    pub fn with_seeds(self, seeds: Vec<SceneSeed>) -> Self {
        *self.seeds.lock().unwrap() = seeds;
        self
    }

    pub fn with_polls_until_done(mut self, polls: u32) -> Self {
        self.polls_until_done = polls.max(1);
        self
    }

    pub fn failing_analysis(self) -> Self {
        self.analyze_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn denying_credentials(self) -> Self {
        self.credentials_denied.store(true, Ordering::SeqCst);
        self
    }

    pub fn peak_video_concurrency(&self) -> usize {
        self.peak_videos.load(Ordering::SeqCst)
    }

    pub fn peak_image_concurrency(&self) -> usize {
        self.peak_images.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationGateway for MockGateway {
    async fn ensure_video_credentials(&self) -> GatewayResult<()> {
        self.credential_checks.fetch_add(1, Ordering::SeqCst);
        if self.credentials_denied.load(Ordering::SeqCst) {
            return Err(GatewayError::MissingCredentials);
        }
        Ok(())
    }

    async fn analyze(&self, _source: AnalysisSource) -> GatewayResult<Vec<SceneSeed>> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if self.analyze_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Http {
                status: 500,
                body: "analysis unavailable".into(),
            });
        }
        Ok(self.seeds.lock().unwrap().clone())
    }

    async fn generate_visual_prompt(&self, _segment_text: &str) -> GatewayResult<String> {
        Ok(self.regenerated_prompt.clone())
    }

    async fn generate_image(
        &self,
        visual_prompt: &str,
        _style_modifier: &str,
        _ratio: AspectRatio,
    ) -> GatewayResult<MediaAsset> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_images.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_images.fetch_max(active, Ordering::SeqCst);

        // Yield so chunk-mates overlap before anyone finishes.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.active_images.fetch_sub(1, Ordering::SeqCst);

        if visual_prompt.contains("FAIL_IMAGE") {
            return Err(GatewayError::Http {
                status: 500,
                body: "image backend down".into(),
            });
        }
        Ok(MediaAsset::new("image/jpeg", b"img".to_vec()))
    }

    async fn submit_video(
        &self,
        visual_prompt: &str,
        _style_modifier: &str,
        _ratio: AspectRatio,
    ) -> GatewayResult<VideoJobHandle> {
        if visual_prompt.contains("FAIL_SUBMIT") {
            return Err(GatewayError::Http {
                status: 503,
                body: "submission refused".into(),
            });
        }

        self.video_submits.fetch_add(1, Ordering::SeqCst);
        let active = self.active_videos.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_videos.fetch_max(active, Ordering::SeqCst);

        let handle = format!("operations/job-{}", self.next_job_id.fetch_add(1, Ordering::SeqCst));
        self.jobs
            .lock()
            .unwrap()
            .insert(handle.clone(), visual_prompt.to_string());
        Ok(VideoJobHandle(handle))
    }

    async fn poll_video_job(&self, handle: &VideoJobHandle) -> GatewayResult<VideoJobStatus> {
        self.total_polls.fetch_add(1, Ordering::SeqCst);

        let prompt = self
            .jobs
            .lock()
            .unwrap()
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::JobFailed(format!("unknown job {handle}")))?;

        let polls = {
            let mut counts = self.poll_counts.lock().unwrap();
            let entry = counts.entry(handle.as_str().to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if polls < self.polls_until_done {
            return Ok(VideoJobStatus::default());
        }
        if polls == self.polls_until_done {
            self.active_videos.fetch_sub(1, Ordering::SeqCst);
        }

        let status = if prompt.contains("JOB_ERROR") {
            VideoJobStatus {
                done: true,
                error: Some("quota exhausted".into()),
                asset_uri: None,
            }
        } else if prompt.contains("FILTERED") {
            VideoJobStatus {
                done: true,
                error: None,
                asset_uri: None,
            }
        } else if prompt.contains("FAIL_FETCH") {
            VideoJobStatus {
                done: true,
                error: None,
                asset_uri: Some("mock://fail".into()),
            }
        } else {
            VideoJobStatus {
                done: true,
                error: None,
                asset_uri: Some(format!("mock://asset/{handle}")),
            }
        };
        Ok(status)
    }

    async fn fetch_video(&self, uri: &str) -> GatewayResult<MediaAsset> {
        if uri == "mock://fail" {
            return Err(GatewayError::Http {
                status: 500,
                body: "download failed".into(),
            });
        }
        Ok(MediaAsset::new("video/mp4", b"vid".to_vec()))
    }
}

/// Seeds whose visual prompt is a minimal spec named after the text.
pub fn seeds(texts: &[&str]) -> Vec<SceneSeed> {
    texts
        .iter()
        .map(|t| SceneSeed {
            original_text: t.to_string(),
            visual_prompt: format!(r#"{{"scene":"{t}"}}"#),
        })
        .collect()
}

/// Engine config rooted in a temp dir, with a fast poll cadence for tests.
pub fn test_config(root: &std::path::Path) -> EngineConfig {
    EngineConfig {
        poll_interval: Duration::from_millis(1),
        media_dir: root.join("media"),
        history_dir: root.join("history"),
        ..EngineConfig::default()
    }
}

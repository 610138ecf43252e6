//! Concurrency-limited batch scheduler.
//!
//! Eligible scenes are marked in flight up front, partitioned into fixed-size
//! chunks, and each chunk's gateway calls run concurrently while chunks
//! themselves run strictly in sequence. Every task writes its own scene's
//! terminal state through the store's replace-by-id primitive, so one scene's
//! failure never aborts or corrupts its siblings.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tracing::{info, warn};

use broll_gemini::{GenerationGateway, MediaAsset};
use broll_models::{AspectRatio, GenerationMode, ImageStyle, Scene, SceneId};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::poller::OperationPoller;
use crate::store::SharedSceneStore;

/// Outcome counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Scenes marked in flight and dispatched
    pub dispatched: usize,
    /// Scenes that reached completed
    pub completed: usize,
    /// Scenes that reached error
    pub failed: usize,
}

/// Drives batches of generation jobs against the gateway.
pub struct BatchOrchestrator {
    gateway: Arc<dyn GenerationGateway>,
    store: SharedSceneStore,
    config: EngineConfig,
    poller: OperationPoller,
    // One generation class may run at a time, system-wide.
    busy: Arc<Mutex<Option<GenerationMode>>>,
}

impl BatchOrchestrator {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        store: SharedSceneStore,
        config: EngineConfig,
    ) -> Self {
        let poller = OperationPoller::from_config(&config);
        Self {
            gateway,
            store,
            config,
            poller,
            busy: Arc::new(Mutex::new(None)),
        }
    }

    /// The generation class currently holding the batch lock, if any.
    pub fn current_busy(&self) -> Option<GenerationMode> {
        *lock_busy(&self.busy)
    }

    /// Run one batch pass over every eligible scene.
    ///
    /// A scene is eligible iff it lacks the mode's media output and has no
    /// call in flight. With zero eligible scenes this is a no-op, so
    /// re-entrant calls after the in-flight marking are free.
    pub async fn run_batch(
        &self,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<BatchReport> {
        let _guard = self.acquire_busy(mode)?;

        if mode == GenerationMode::Video {
            self.gateway.ensure_video_credentials().await?;
        }

        // Snapshot and mark under one write lock, so callers observe the
        // whole set as in flight before the first dispatch.
        let eligible: Vec<Scene> = {
            let mut store = self.store.write().await;
            let eligible = store.eligible_for(mode);
            let ids: Vec<SceneId> = eligible.iter().map(|s| s.id.clone()).collect();
            store.mark_generating(&ids, mode);
            eligible
        };

        if eligible.is_empty() {
            return Ok(BatchReport::default());
        }

        let chunk_size = self.config.batch_size(mode);
        info!(
            mode = %mode,
            scenes = eligible.len(),
            chunk_size,
            "Starting generation batch"
        );

        let mut report = BatchReport {
            dispatched: eligible.len(),
            ..Default::default()
        };

        for chunk in eligible.chunks(chunk_size) {
            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|scene| self.drive_scene(scene, mode, style, ratio)),
            )
            .await;

            for succeeded in outcomes {
                if succeeded {
                    report.completed += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        info!(
            mode = %mode,
            completed = report.completed,
            failed = report.failed,
            "Generation batch finished"
        );
        Ok(report)
    }

    /// Generate media for a single scene — the batch-of-one case.
    ///
    /// Image singles may run alongside an image batch; video singles respect
    /// the batch busy gate because of the stricter video quota.
    pub async fn generate_one(
        &self,
        id: &SceneId,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<()> {
        if mode == GenerationMode::Video {
            if let Some(active) = self.current_busy() {
                return Err(EngineError::Busy(active));
            }
            self.gateway.ensure_video_credentials().await?;
        }

        let scene = {
            let mut store = self.store.write().await;
            let scene = store
                .get(id)
                .cloned()
                .ok_or_else(|| EngineError::SceneNotFound(id.clone()))?;
            if scene.status.is_generating() {
                return Err(EngineError::SceneInFlight(id.clone()));
            }
            store.mark_generating(std::slice::from_ref(id), mode);
            scene
        };

        self.drive_scene(&scene, mode, style, ratio).await;
        Ok(())
    }

    /// Drive one scene to a terminal state, isolating its failure.
    ///
    /// Returns whether the scene completed. The terminal update is written
    /// unconditionally; a scene never stays stuck in a generating state.
    async fn drive_scene(
        &self,
        scene: &Scene,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> bool {
        let result = self.generate_media(scene, mode, style, ratio).await;

        let mut store = self.store.write().await;
        match result {
            Ok(url) => {
                store.replace_by_id(&scene.id, |s| match mode {
                    GenerationMode::Image => s.complete_with_image(url),
                    GenerationMode::Video => s.complete_with_video(url),
                });
                true
            }
            Err(e) => {
                warn!(scene_id = %scene.id, mode = %mode, error = %e, "Scene generation failed");
                let message = scene_error_message(mode, &e);
                store.replace_by_id(&scene.id, |s| s.fail(message));
                false
            }
        }
    }

    async fn generate_media(
        &self,
        scene: &Scene,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<String> {
        match mode {
            GenerationMode::Image => {
                let asset = self
                    .gateway
                    .generate_image(&scene.visual_prompt, style.prompt_modifier, ratio)
                    .await?;
                Ok(asset.to_data_url())
            }
            GenerationMode::Video => {
                let asset = self
                    .poller
                    .run(
                        self.gateway.as_ref(),
                        &scene.visual_prompt,
                        style.prompt_modifier,
                        ratio,
                    )
                    .await?;
                self.store_video(&scene.id, &asset).await
            }
        }
    }

    /// Write a fetched clip into the media directory and return its path.
    async fn store_video(&self, id: &SceneId, asset: &MediaAsset) -> EngineResult<String> {
        tokio::fs::create_dir_all(&self.config.media_dir).await?;
        let path = self.config.media_dir.join(format!("{id}.mp4"));
        tokio::fs::write(&path, &asset.bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn acquire_busy(&self, mode: GenerationMode) -> EngineResult<BusyGuard> {
        let mut busy = lock_busy(&self.busy);
        if let Some(active) = *busy {
            return Err(EngineError::Busy(active));
        }
        *busy = Some(mode);
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

/// Clears the batch lock when a run finishes, on every exit path.
struct BusyGuard {
    busy: Arc<Mutex<Option<GenerationMode>>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        *lock_busy(&self.busy) = None;
    }
}

fn lock_busy(busy: &Mutex<Option<GenerationMode>>) -> std::sync::MutexGuard<'_, Option<GenerationMode>> {
    busy.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Choose the message written onto a failed scene.
///
/// Domain errors carry meaning the service expressed and are surfaced
/// verbatim; transport-class failures collapse to a generic message.
fn scene_error_message(mode: GenerationMode, err: &EngineError) -> String {
    if let EngineError::Gateway(gateway_err) = err {
        if gateway_err.is_domain() {
            return gateway_err.to_string();
        }
    }
    match mode {
        GenerationMode::Image => "Failed to generate image".to_string(),
        GenerationMode::Video => "Failed to generate video".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broll_gemini::GatewayError;

    #[test]
    fn test_scene_error_message_classification() {
        let transport = EngineError::Gateway(GatewayError::Http {
            status: 500,
            body: "oops".into(),
        });
        assert_eq!(
            scene_error_message(GenerationMode::Image, &transport),
            "Failed to generate image"
        );
        assert_eq!(
            scene_error_message(GenerationMode::Video, &transport),
            "Failed to generate video"
        );

        let blocked = EngineError::Gateway(GatewayError::Blocked(
            "No video generated. The content may have been filtered by safety guidelines.".into(),
        ));
        assert!(scene_error_message(GenerationMode::Video, &blocked).contains("safety guidelines"));

        let io = EngineError::Io(std::io::Error::other("disk full"));
        assert_eq!(
            scene_error_message(GenerationMode::Video, &io),
            "Failed to generate video"
        );
    }
}

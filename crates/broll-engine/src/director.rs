//! Top-level workflow facade.
//!
//! Ties analysis, the scene store, batch orchestration, history, and export
//! together behind one handle the binary (or an embedding application)
//! drives.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use broll_gemini::{AnalysisSource, GenerationGateway, SceneSeed};
use broll_models::{
    prettify_json, AspectRatio, GenerationMode, ImageStyle, Scene, SceneId, Session, SourceType,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::export::render_prompts;
use crate::history::HistoryStore;
use crate::orchestrator::{BatchOrchestrator, BatchReport};
use crate::store::{shared, SceneStore, SharedSceneStore};

/// One working session over a scene collection.
pub struct Director {
    gateway: Arc<dyn GenerationGateway>,
    store: SharedSceneStore,
    orchestrator: BatchOrchestrator,
    history: HistoryStore,
    config: EngineConfig,
    source: Mutex<SourceType>,
}

impl Director {
    pub fn new(gateway: Arc<dyn GenerationGateway>, config: EngineConfig) -> EngineResult<Self> {
        let history = HistoryStore::open(&config.history_dir)?;
        let store = shared(SceneStore::new());
        let orchestrator =
            BatchOrchestrator::new(Arc::clone(&gateway), Arc::clone(&store), config.clone());
        Ok(Self {
            gateway,
            store,
            orchestrator,
            history,
            config,
            source: Mutex::new(SourceType::Script),
        })
    }

    /// Handle to the live scene collection.
    pub fn store(&self) -> &SharedSceneStore {
        &self.store
    }

    /// Cloned snapshot of the live scenes.
    pub async fn scenes(&self) -> Vec<Scene> {
        self.store.read().await.snapshot()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Break a script into pending scenes and record the session.
    ///
    /// An analysis failure aborts the whole operation; the live collection
    /// is only replaced once the full scene list exists.
    pub async fn analyze_script(&self, script: &str) -> EngineResult<Session> {
        if script.trim().is_empty() {
            return Err(EngineError::invalid_input("script is empty"));
        }
        let seeds = self
            .gateway
            .analyze(AnalysisSource::Script(script.to_string()))
            .await?;
        self.install_scenes(SourceType::Script, script_session_name(script), seeds)
            .await
    }

    /// Break an uploaded video into pending scenes and record the session.
    pub async fn analyze_video(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> EngineResult<Session> {
        if data.len() as u64 > self.config.max_video_upload_bytes {
            return Err(EngineError::invalid_input(format!(
                "video exceeds the {} MB upload limit",
                self.config.max_video_upload_bytes / (1024 * 1024)
            )));
        }
        let seeds = self
            .gateway
            .analyze(AnalysisSource::Video {
                data,
                mime_type: mime_type.to_string(),
            })
            .await?;
        self.install_scenes(SourceType::Video, format!("Video: {file_name}"), seeds)
            .await
    }

    async fn install_scenes(
        &self,
        source: SourceType,
        name: String,
        seeds: Vec<SceneSeed>,
    ) -> EngineResult<Session> {
        let scenes: Vec<Scene> = seeds
            .into_iter()
            .map(|seed| {
                // Analysis models tend to return minified specs; keep the
                // stored prompt hand-editable.
                let prompt =
                    prettify_json(&seed.visual_prompt).unwrap_or(seed.visual_prompt);
                Scene::new(seed.original_text, prompt)
            })
            .collect();

        info!(source = %source, scenes = scenes.len(), "Analysis complete");

        self.store.write().await.replace_all(scenes.clone());
        *lock_source(&self.source) = source;

        let session = Session::new(source, name, scenes);
        // A history write failure costs only the record, not the analysis.
        if let Err(e) = self.history.save(&session) {
            warn!(error = %e, "Failed to record session history");
        }
        Ok(session)
    }

    /// Replace a stored session into the live collection.
    pub async fn load_session(&self, id: &str) -> EngineResult<Session> {
        let session = self
            .history
            .load(id)?
            .ok_or_else(|| EngineError::history(format!("no session with id {id}")))?;
        self.store.write().await.replace_all(session.scenes.clone());
        *lock_source(&self.source) = session.source;
        Ok(session)
    }

    /// Replace one scene's visual prompt in place.
    pub async fn update_prompt(&self, id: &SceneId, visual_prompt: &str) -> EngineResult<()> {
        let mut store = self.store.write().await;
        if store.replace_by_id(id, |s| s.with_prompt(visual_prompt)) {
            Ok(())
        } else {
            Err(EngineError::SceneNotFound(id.clone()))
        }
    }

    /// Re-derive a scene's visual spec after its source text was edited.
    ///
    /// The content change invalidates any prior visual result: the scene
    /// returns to pending with media and error cleared.
    pub async fn rewrite_scene(&self, id: &SceneId, new_text: &str) -> EngineResult<()> {
        if self.store.read().await.get(id).is_none() {
            return Err(EngineError::SceneNotFound(id.clone()));
        }

        let raw = self.gateway.generate_visual_prompt(new_text).await?;
        let prompt = prettify_json(&raw).unwrap_or(raw);

        let mut store = self.store.write().await;
        if store.replace_by_id(id, |s| s.rewrite(new_text, prompt)) {
            Ok(())
        } else {
            Err(EngineError::SceneNotFound(id.clone()))
        }
    }

    /// Run a generation batch over every eligible scene.
    pub async fn run_batch(
        &self,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<BatchReport> {
        self.orchestrator.run_batch(mode, style, ratio).await
    }

    /// Generate media for one scene.
    pub async fn generate_one(
        &self,
        id: &SceneId,
        mode: GenerationMode,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<()> {
        self.orchestrator.generate_one(id, mode, style, ratio).await
    }

    /// Render every scene's prompt as plain text.
    pub async fn export_prompts(&self, style: &ImageStyle, ratio: AspectRatio) -> String {
        let scenes = self.store.read().await.snapshot();
        render_prompts(&scenes, *lock_source(&self.source), style, ratio)
    }

    /// Write the rendered prompts to a file.
    pub async fn export_prompts_file(
        &self,
        path: impl AsRef<Path>,
        style: &ImageStyle,
        ratio: AspectRatio,
    ) -> EngineResult<()> {
        let text = self.export_prompts(style, ratio).await;
        std::fs::write(path, text)?;
        Ok(())
    }
}

fn lock_source(source: &Mutex<SourceType>) -> std::sync::MutexGuard<'_, SourceType> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session display name derived from the script's opening words.
fn script_session_name(script: &str) -> String {
    let prefix: String = script.chars().take(30).collect();
    if script.chars().count() > 30 {
        format!("Script: {prefix}...")
    } else {
        format!("Script: {prefix}")
    }
}

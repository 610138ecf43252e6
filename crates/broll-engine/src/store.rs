//! The live scene collection.
//!
//! Many in-flight tasks write results concurrently; the only legal way to do
//! so is a replace-by-id update, so two tasks resolving close together can
//! never clobber each other's scenes. Whole-collection replacement is
//! reserved for analysis completion and session loading.

use std::sync::Arc;

use tokio::sync::RwLock;

use broll_models::{GenerationMode, Scene, SceneId};

/// Single source of truth for the current working session's scenes.
#[derive(Debug, Default)]
pub struct SceneStore {
    scenes: Vec<Scene>,
}

/// Store handle shared across async tasks.
///
/// Writers lock, apply their own scene's update, and release; the lock is
/// never held across an await point.
pub type SharedSceneStore = Arc<RwLock<SceneStore>>;

/// Wrap a store for sharing.
pub fn shared(store: SceneStore) -> SharedSceneStore {
    Arc::new(RwLock::new(store))
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenes(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Ordered view of the live scenes.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Cloned snapshot for use outside the lock.
    pub fn snapshot(&self) -> Vec<Scene> {
        self.scenes.clone()
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    /// Replace the whole collection (analysis completion, session load).
    pub fn replace_all(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
    }

    /// Apply an update to exactly the scene with `id`.
    ///
    /// Returns false when no such scene exists (e.g. the collection was
    /// replaced while a task was in flight); the update is dropped.
    pub fn replace_by_id(&mut self, id: &SceneId, update: impl FnOnce(Scene) -> Scene) -> bool {
        match self.scenes.iter_mut().find(|s| &s.id == id) {
            Some(slot) => {
                *slot = update(slot.clone());
                true
            }
            None => false,
        }
    }

    /// Scenes eligible for a generation pass: missing the mode's media and
    /// not currently in flight.
    pub fn eligible_for(&self, mode: GenerationMode) -> Vec<Scene> {
        self.scenes
            .iter()
            .filter(|s| s.media_for(mode).is_none() && !s.status.is_generating())
            .cloned()
            .collect()
    }

    /// Atomically mark every listed scene as in flight for `mode`.
    ///
    /// One state update before dispatch, so callers observe the whole set as
    /// busy immediately and re-entrant batch calls find nothing eligible.
    pub fn mark_generating(&mut self, ids: &[SceneId], mode: GenerationMode) -> usize {
        let mut marked = 0;
        for scene in &mut self.scenes {
            if ids.contains(&scene.id) {
                *scene = scene.clone().start(mode);
                marked += 1;
            }
        }
        marked
    }
}

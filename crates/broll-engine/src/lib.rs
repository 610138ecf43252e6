//! Scene generation engine.
//!
//! Drives many independent generation jobs to completion with bounded
//! concurrency: the scene store is the single source of truth, the batch
//! orchestrator partitions eligible scenes into sequential chunks, and the
//! operation poller runs the submit/poll/fetch protocol for long-running
//! video jobs. Per-scene failures stay per-scene.

pub mod config;
pub mod director;
pub mod error;
pub mod export;
pub mod history;
pub mod orchestrator;
pub mod poller;
pub mod store;

pub use config::EngineConfig;
pub use director::Director;
pub use error::{EngineError, EngineResult};
pub use export::{render_prompts, write_prompts_file};
pub use history::HistoryStore;
pub use orchestrator::{BatchOrchestrator, BatchReport};
pub use poller::OperationPoller;
pub use store::{shared, SceneStore, SharedSceneStore};

//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for batching, polling, and local storage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scenes dispatched concurrently per image chunk
    pub image_batch_size: usize,
    /// Scenes dispatched concurrently per video chunk (video jobs are far
    /// more expensive and rate-limited)
    pub video_batch_size: usize,
    /// Fixed delay between video job polls
    pub poll_interval: Duration,
    /// Optional cap on polls per job; unbounded when unset
    pub max_polls: Option<u32>,
    /// Directory finished video assets are written into
    pub media_dir: PathBuf,
    /// Directory session history records are written into
    pub history_dir: PathBuf,
    /// Upload ceiling for video analysis sources
    pub max_video_upload_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image_batch_size: 3,
            video_batch_size: 2,
            poll_interval: Duration::from_secs(10),
            max_polls: None,
            media_dir: PathBuf::from("media"),
            history_dir: PathBuf::from(".broll-history"),
            max_video_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            image_batch_size: env_parse("BROLL_IMAGE_BATCH_SIZE", defaults.image_batch_size),
            video_batch_size: env_parse("BROLL_VIDEO_BATCH_SIZE", defaults.video_batch_size),
            poll_interval: Duration::from_secs(env_parse(
                "BROLL_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )),
            max_polls: std::env::var("BROLL_MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok()),
            media_dir: std::env::var("BROLL_MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            history_dir: std::env::var("BROLL_HISTORY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_dir),
            max_video_upload_bytes: env_parse(
                "BROLL_MAX_VIDEO_UPLOAD_BYTES",
                defaults.max_video_upload_bytes,
            ),
        }
    }

    /// Chunk size for the given generation mode.
    pub fn batch_size(&self, mode: broll_models::GenerationMode) -> usize {
        match mode {
            broll_models::GenerationMode::Image => self.image_batch_size.max(1),
            broll_models::GenerationMode::Video => self.video_batch_size.max(1),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

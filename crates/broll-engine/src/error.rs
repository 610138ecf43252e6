//! Engine error types.

use thiserror::Error;

use broll_gemini::GatewayError;
use broll_models::{GenerationMode, SceneId};

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Rejected: {0}")]
    InvalidInput(String),

    #[error("A {0} batch is already running")]
    Busy(GenerationMode),

    #[error("Scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("Scene {0} already has a generation call in flight")]
    SceneInFlight(SceneId),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("History error: {0}")]
    History(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }
}

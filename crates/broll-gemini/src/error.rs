//! Gateway error types.

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures crossing the generation-service boundary.
///
/// Transport-class variants cover the network and decoding layers; domain
/// variants carry a meaning the external service expressed (safety filters,
/// missing output, a job reporting its own failure) and are surfaced to the
/// user with their specific message.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API key not configured: set GEMINI_API_KEY")]
    MissingCredentials,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    EmptyResponse(String),

    #[error("{0}")]
    Blocked(String),

    #[error("Video generation failed: {0}")]
    JobFailed(String),
}

impl GatewayError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }

    /// Check whether the external service itself expressed this failure.
    ///
    /// Domain errors keep their specific message when written onto a scene;
    /// transport-class errors are replaced by a generic one.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            GatewayError::EmptyResponse(_) | GatewayError::Blocked(_) | GatewayError::JobFailed(_)
        )
    }
}

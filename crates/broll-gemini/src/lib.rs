//! Generation gateway for the B-Roll Director pipeline.
//!
//! Defines the abstract [`GenerationGateway`] boundary the orchestrator
//! drives, plus the production implementation backed by the Google
//! generative APIs: Gemini for scene analysis, Imagen for stills, and Veo
//! for long-running video jobs.

pub mod client;
pub mod error;
pub mod gateway;
pub mod prompts;

pub use client::GeminiClient;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{
    AnalysisSource, GenerationGateway, MediaAsset, SceneSeed, VideoJobHandle, VideoJobStatus,
};

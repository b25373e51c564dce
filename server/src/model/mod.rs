//! Generative model access
//!
//! Handlers only see [`LanguageModel`]; [`GeminiClient`] is the production
//! implementation.

mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// An uploaded audio clip passed to the model inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// A text-in, text-out model that can also listen to audio
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run `prompt`, optionally with an audio clip, and return the raw text
    async fn generate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<String, ModelError>;
}

/// Errors from the model provider
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no text")]
    EmptyResponse,
}

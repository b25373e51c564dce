//! Remote intent service
//!
//! The agent loop hands each finished sample, together with the current
//! [`AgentMode`], to an [`IntentService`] and acts on the decoded
//! [`AgentResponse`].

mod client;

use async_trait::async_trait;
use ginger_protocol::{AgentMode, AgentResponse};

use crate::audio::AudioSample;

pub use client::{normalize_base_url, ServerClient};

/// Classifies audio as a wake word or an intent
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Upload `sample` for classification under `mode`
    async fn resolve(&self, sample: AudioSample, mode: AgentMode) -> Result<AgentResponse, IntentError>;
}

/// Errors that can occur talking to the server
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server reported failure: {0}")]
    Rejected(String),
}

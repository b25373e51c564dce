//! Shared application state for the ginger server.

use std::sync::Arc;

use crate::config::Config;
use crate::model::{GeminiClient, LanguageModel, ModelError};
use crate::store::{MemoryNoteStore, NoteStore};

/// State handed to every handler.
///
/// Holds no per-request data: every intent call is classified from the
/// request alone.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn LanguageModel>,
    pub notes: Arc<dyn NoteStore>,
}

impl AppState {
    /// Build production state: Gemini for the model, notes kept in memory.
    pub fn new(config: &Config) -> Result<Self, ModelError> {
        let model = GeminiClient::new(&config.model)?;
        Ok(Self::with_parts(
            Arc::new(model),
            Arc::new(MemoryNoteStore::new()),
        ))
    }

    /// Assemble state from existing components.
    pub fn with_parts(model: Arc<dyn LanguageModel>, notes: Arc<dyn NoteStore>) -> Self {
        Self { model, notes }
    }
}

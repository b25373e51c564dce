//! Note persistence

use async_trait::async_trait;
use chrono::Utc;
use ginger_protocol::Note;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors from the note store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Please provide content for this note.")]
    EmptyContent,

    #[error("note store unavailable: {0}")]
    Unavailable(String),
}

/// Where notes live
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a note, stamping its id and creation time
    async fn create(&self, content: &str) -> Result<Note, StoreError>;

    /// All notes, newest first
    async fn list(&self) -> Result<Vec<Note>, StoreError>;
}

/// Process-local note store
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: RwLock<Vec<Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create(&self, content: &str) -> Result<Note, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }

        let note = Note {
            id: Uuid::new_v4(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.notes.write().await.push(note.clone());
        Ok(note)
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        // Reverse first so notes stamped in the same instant stay newest-first
        let mut notes: Vec<Note> = self.notes.read().await.iter().rev().cloned().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

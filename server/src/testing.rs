//! Test doubles shared by the server's unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ginger_protocol::Note;

use crate::model::{AudioClip, LanguageModel, ModelError};
use crate::store::{NoteStore, StoreError};

const BOUNDARY: &str = "ginger-test-boundary";

enum Reply {
    Text(String),
    Fail,
}

/// Model that returns a fixed reply and records what it was asked
pub struct FakeModel {
    reply: Reply,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_audio: Mutex<Option<AudioClip>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_audio: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    pub fn last_audio(&self) -> Option<AudioClip> {
        self.last_audio.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn generate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        *self.last_audio.lock().unwrap() = audio.cloned();
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(ModelError::Status {
                status: 503,
                body: "model overloaded".to_string(),
            }),
        }
    }
}

/// Store whose every call fails
pub struct FailingStore;

#[async_trait]
impl NoteStore for FailingStore {
    async fn create(&self, _content: &str) -> Result<Note, StoreError> {
        Err(StoreError::Unavailable("write refused".to_string()))
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        Err(StoreError::Unavailable("read refused".to_string()))
    }
}

/// Build a multipart form the way the daemon sends it. Returns the
/// content-type header value and the body.
pub fn multipart_body(audio: Option<&[u8]>, state: Option<&str>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    if let Some(state) = state {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"state\"\r\n\r\n{state}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(audio) = audio {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"clip.m4a\"\r\nContent-Type: audio/m4a\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

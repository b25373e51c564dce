//! ginger-protocol: HTTP wire types shared by the daemon and the server
//!
//! The daemon posts audio to [`routes::AGENT`] as a multipart form with an
//! `audio` part and a `state` part (see [`AgentMode`]). The server answers
//! with an [`AgentResponse`] envelope.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Route paths, relative to the `/api` prefix unless noted
pub mod routes {
    /// Prefix every API route is mounted under
    pub const API_PREFIX: &str = "/api";
    /// Intent resolution endpoint
    pub const AGENT: &str = "/chat/agent";
    /// Text chat endpoint
    pub const CHAT: &str = "/chat";
    /// Notes collection
    pub const NOTES: &str = "/notes";
    /// Liveness probe (not under the API prefix)
    pub const HEALTH: &str = "/health";
}

/// Multipart field names for the intent call
pub mod fields {
    pub const AUDIO: &str = "audio";
    pub const STATE: &str = "state";
}

/// MIME type assumed for uploaded audio when none is declared
pub const DEFAULT_AUDIO_MIME: &str = "audio/m4a";

/// The mode the server should classify a clip under
///
/// Sent as the `state` form field. Anything other than `IDLE` is treated as
/// active by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentMode {
    /// Only listen for the wake word
    #[default]
    Idle,
    /// Interpret speech as a command
    Active,
}

impl AgentMode {
    /// Wire tag for the `state` form field
    pub fn as_tag(&self) -> &'static str {
        match self {
            AgentMode::Idle => "IDLE",
            AgentMode::Active => "ACTIVE",
        }
    }

    /// Parse a declared state tag. A missing tag means idle, any non-idle
    /// value means active.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            None | Some("") | Some("IDLE") => AgentMode::Idle,
            Some(_) => AgentMode::Active,
        }
    }

    /// Mode for the given active-mode flag
    pub fn from_active(active: bool) -> Self {
        if active {
            AgentMode::Active
        } else {
            AgentMode::Idle
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// The three actions the active prompt permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentAction {
    CreateNote,
    Stop,
    Unknown,
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentAction::CreateNote => write!(f, "CREATE_NOTE"),
            IntentAction::Stop => write!(f, "STOP"),
            IntentAction::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Envelope returned by the intent endpoint
///
/// On success it echoes whatever the classification produced: `detected` for
/// an idle check, `action`/`reply`/`content` for an active one. On failure
/// `success` is false and `error` carries a human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<IntentAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    /// Successful wake-word check
    pub fn wake(detected: bool) -> Self {
        Self {
            success: true,
            detected: Some(detected),
            ..Default::default()
        }
    }

    /// Successful intent classification
    pub fn intent(action: IntentAction, reply: String, content: Option<String>) -> Self {
        Self {
            success: true,
            action: Some(action),
            reply: Some(reply),
            content,
            ..Default::default()
        }
    }

    /// Failure envelope
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// A saved text note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/notes`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub content: String,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Reply of `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generic `{ success, data | error }` envelope used by the notes routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

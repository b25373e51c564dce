//! HTTP request handlers for the ginger server.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    Json,
};
use ginger_protocol::{
    fields, AgentMode, AgentResponse, ChatRequest, ChatResponse, CreateNoteRequest,
    DataResponse, Note, DEFAULT_AUDIO_MIME,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::intent::{parse_response, prompt_for, Classification};
use crate::model::AudioClip;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Form fields of an intent upload
#[derive(Debug, Default)]
struct AgentUpload {
    audio: Option<AudioClip>,
    state: Option<String>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<AgentUpload> {
    let mut upload = AgentUpload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(fields::AUDIO) => {
                let mime_type = field
                    .content_type()
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or(DEFAULT_AUDIO_MIME)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                upload.audio = Some(AudioClip {
                    data: data.to_vec(),
                    mime_type,
                });
            }
            Some(fields::STATE) => {
                let state = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                upload.state = Some(state);
            }
            _ => {}
        }
    }
    Ok(upload)
}

/// Classify one audio clip under the declared mode.
///
/// Idle requests are checked for the wake word; active requests are mapped
/// to an intent. A `CREATE_NOTE` intent with non-empty content is saved
/// before the response is sent.
pub async fn resolve_intent(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AgentResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let upload = read_upload(&mut multipart).await?;

    let audio = upload
        .audio
        .filter(|clip| !clip.data.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("No audio".to_string()))?;
    let mode = AgentMode::from_tag(upload.state.as_deref());

    debug!(%mode, bytes = audio.data.len(), mime = %audio.mime_type, "classifying audio");
    let raw = state.model.generate(prompt_for(mode), Some(&audio)).await?;
    debug!(%mode, raw = %raw, "model response");

    let classification = parse_response(mode, &raw)?;
    let mut response = AgentResponse::from(classification.clone());
    if let Classification::Intent(intent) = &classification {
        info!(action = %intent.action, "intent resolved");
        if let Some(content) = intent.note_content() {
            response.content = Some(content.to_string());
            match state.notes.create(content).await {
                Ok(note) => {
                    info!(id = %note.id, "note saved");
                    response.content = Some(note.content);
                }
                Err(source) => {
                    return Err(ApiError::Persistence {
                        source,
                        intent: response,
                    })
                }
            }
        }
    }

    Ok(Json(response))
}

/// Plain text chat with the model.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::InvalidRequest("Message is required".to_string()));
    }

    let reply = state.model.generate(message, None).await?;
    Ok(Json(ChatResponse {
        success: true,
        reply: Some(reply),
        error: None,
    }))
}

/// All notes, newest first.
pub async fn list_notes(State(state): State<Arc<AppState>>) -> Result<Json<DataResponse<Vec<Note>>>> {
    let notes = state.notes.list().await?;
    Ok(Json(DataResponse::ok(notes)))
}

/// Save a note from a JSON body.
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Note>>)> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let note = state.notes.create(&request.content).await?;
    info!(id = %note.id, "note saved");
    Ok((StatusCode::CREATED, Json(DataResponse::ok(note))))
}

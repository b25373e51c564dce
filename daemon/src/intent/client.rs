//! HTTP client for the ginger server
//!
//! Besides the intent call used by the agent loop this also covers the
//! text chat and notes routes for the CLI.

use std::time::Duration;

use async_trait::async_trait;
use ginger_protocol::{
    fields, routes, AgentMode, AgentResponse, ChatRequest, ChatResponse, CreateNoteRequest,
    DataResponse, Note,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{IntentError, IntentService};
use crate::audio::AudioSample;

/// Client for the ginger server API
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: Client,
    base_url: String,
}

impl ServerClient {
    /// Create a client with a per-request timeout
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, IntentError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(server_url),
        })
    }

    /// Base URL every route is resolved against (always ends in `/api`)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// Send a text message to the model and return its reply
    pub async fn chat(&self, message: &str) -> Result<String, IntentError> {
        let response = self
            .http
            .post(self.endpoint(routes::CHAT))
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let body: ChatResponse = read_json(response).await?;
        match (body.success, body.reply) {
            (true, Some(reply)) => Ok(reply),
            (_, _) => Err(IntentError::Rejected(
                body.error.unwrap_or_else(|| "no reply".to_string()),
            )),
        }
    }

    /// Save a note directly
    pub async fn create_note(&self, content: &str) -> Result<Note, IntentError> {
        let response = self
            .http
            .post(self.endpoint(routes::NOTES))
            .json(&CreateNoteRequest {
                content: content.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let body: DataResponse<Note> = read_json(response).await?;
        unwrap_data(body)
    }

    /// List notes, newest first
    pub async fn list_notes(&self) -> Result<Vec<Note>, IntentError> {
        let response = self
            .http
            .get(self.endpoint(routes::NOTES))
            .send()
            .await
            .map_err(transport)?;

        let body: DataResponse<Vec<Note>> = read_json(response).await?;
        unwrap_data(body)
    }
}

#[async_trait]
impl IntentService for ServerClient {
    async fn resolve(&self, sample: AudioSample, mode: AgentMode) -> Result<AgentResponse, IntentError> {
        let url = self.endpoint(routes::AGENT);
        debug!(%url, %mode, bytes = sample.data.len(), "sending audio");

        let audio = Part::bytes(sample.data)
            .file_name(sample.file_name)
            .mime_str(&sample.mime_type)?;
        let form = Form::new()
            .part(fields::AUDIO, audio)
            .text(fields::STATE, mode.as_tag());

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let body: AgentResponse = read_json(response).await?;
        if !body.success {
            return Err(IntentError::Rejected(
                body.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        Ok(body)
    }
}

/// Resolve a configured server URL to the API base, appending `/api`
/// when it is missing
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(routes::API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{}", routes::API_PREFIX)
    }
}

fn transport(e: reqwest::Error) -> IntentError {
    if e.is_timeout() {
        IntentError::Timeout
    } else {
        IntentError::Transport(e)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IntentError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);
        return Err(IntentError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn unwrap_data<T>(body: DataResponse<T>) -> Result<T, IntentError> {
    match (body.success, body.data) {
        (true, Some(data)) => Ok(data),
        (_, _) => Err(IntentError::Rejected(
            body.error.unwrap_or_else(|| "no data".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use ginger_protocol::IntentAction;

    fn sample() -> AudioSample {
        AudioSample {
            data: b"RIFF....WAVE".to_vec(),
            mime_type: "audio/wav".to_string(),
            file_name: "audio.wav".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> ServerClient {
        ServerClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://h:3000"), "http://h:3000/api");
        assert_eq!(normalize_base_url("http://h:3000/"), "http://h:3000/api");
        assert_eq!(normalize_base_url("http://h:3000/api"), "http://h:3000/api");
        assert_eq!(normalize_base_url("http://h:3000/api/"), "http://h:3000/api");
    }

    #[tokio::test]
    async fn test_resolve_posts_audio_and_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/agent"))
            .and(body_string_contains("name=\"audio\""))
            .and(body_string_contains("ACTIVE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "action": "STOP",
                "reply": "Deactivating agent."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response =
            tokio_test::assert_ok!(client_for(&server).resolve(sample(), AgentMode::Active).await);
        assert_eq!(response.action, Some(IntentAction::Stop));
        assert_eq!(response.reply.as_deref(), Some("Deactivating agent."));
    }

    #[tokio::test]
    async fn test_resolve_server_error_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/agent"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "error": "Failed to interpret model response"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .resolve(sample(), AgentMode::Idle)
            .await
            .unwrap_err();
        match err {
            IntentError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to interpret model response");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .resolve(sample(), AgentMode::Idle)
            .await
            .unwrap_err();
        assert!(matches!(err, IntentError::Decode(_)));
    }

    #[tokio::test]
    async fn test_resolve_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "detected": false }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ServerClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.resolve(sample(), AgentMode::Idle).await.unwrap_err();
        assert!(matches!(err, IntentError::Timeout));
    }

    #[tokio::test]
    async fn test_chat_and_notes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "reply": "Hi!" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{
                    "id": "00000000-0000-0000-0000-000000000000",
                    "content": "buy milk",
                    "createdAt": "2026-01-01T00:00:00Z"
                }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(tokio_test::assert_ok!(client.chat("hello").await), "Hi!");

        let notes = client.list_notes().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "buy milk");
    }

    #[tokio::test]
    async fn test_create_note_decodes_saved_note() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes"))
            .and(body_string_contains("buy milk"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {
                    "id": "00000000-0000-0000-0000-000000000000",
                    "content": "buy milk",
                    "createdAt": "2026-01-01T00:00:00Z"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let note = tokio_test::assert_ok!(client_for(&server).create_note("buy milk").await);
        assert_eq!(note.content, "buy milk");
        assert_eq!(note.created_at.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_create_note_without_data_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let err = client_for(&server).create_note("buy milk").await.unwrap_err();
        assert!(matches!(err, IntentError::Rejected(_)));
    }
}

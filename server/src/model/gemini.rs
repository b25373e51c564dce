//! Gemini `generateContent` client

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AudioClip, LanguageModel, ModelError};
use crate::config::ModelConfig;

/// Calls the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a client for the configured model
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url, config.model
        );
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<String, ModelError> {
        let mut parts = vec![RequestPart::Text { text: prompt }];
        if let Some(audio) = audio {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: &audio.mime_type,
                    data: STANDARD.encode(&audio.data),
                },
            });
        }
        let body = GenerateRequest {
            contents: vec![RequestContent { parts }],
        };

        debug!(endpoint = %self.endpoint, with_audio = audio.is_some(), "calling model");
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&ModelConfig {
            api_key: "test-key".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_with_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{
                    "parts": [
                        { "text": "Is the wake word present?" },
                        { "inline_data": { "mime_type": "audio/m4a", "data": "AQID" } }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"detected\": " }, { "text": "true}" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let audio = AudioClip {
            data: vec![1, 2, 3],
            mime_type: "audio/m4a".to_string(),
        };
        let text = client_for(&server)
            .generate("Is the wake word present?", Some(&audio))
            .await
            .unwrap();
        assert_eq!(text, "{\"detected\": true}");
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("hello", None).await.unwrap_err();
        match err {
            ModelError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("API key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("hello", None).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }
}

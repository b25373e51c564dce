//! Error types for the ginger server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ginger_protocol::AgentResponse;
use thiserror::Error;

use crate::intent::UpstreamParseError;
use crate::model::ModelError;
use crate::store::StoreError;

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors a request can end in. Every variant becomes a JSON envelope with
/// `success: false`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request is missing something or is malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The model answered with something other than the requested JSON.
    #[error(transparent)]
    UpstreamParse(#[from] UpstreamParseError),

    /// The model provider could not be reached or refused the call.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A valid note intent was classified but the note could not be saved.
    #[error("failed to save note: {source}")]
    Persistence {
        #[source]
        source: StoreError,
        /// The classification that was received
        intent: AgentResponse,
    },

    /// Note store error outside the intent flow.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidRequest(message) => {
                tracing::warn!(%message, "invalid request");
                (StatusCode::BAD_REQUEST, AgentResponse::failure(message))
            }
            Self::UpstreamParse(e) => {
                tracing::error!(error = %e, "unparseable model response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AgentResponse::failure("Failed to interpret model response"),
                )
            }
            Self::Model(e) => {
                tracing::error!(error = %e, "model provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    AgentResponse::failure("Model provider request failed"),
                )
            }
            Self::Persistence { source, intent } => {
                tracing::error!(error = %source, "note persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AgentResponse {
                        success: false,
                        error: Some("Failed to save note".to_string()),
                        ..intent
                    },
                )
            }
            Self::Store(StoreError::EmptyContent) => (
                StatusCode::BAD_REQUEST,
                AgentResponse::failure(StoreError::EmptyContent.to_string()),
            ),
            Self::Store(e) => {
                tracing::error!(error = %e, "note store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AgentResponse::failure("Note store unavailable"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

//! Route definitions for the ginger server.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use ginger_protocol::routes;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

/// Largest request body accepted, sized for a few seconds of audio
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Creates the Axum router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The mobile client and local tools call from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(routes::AGENT, post(handlers::resolve_intent))
        .route(routes::CHAT, post(handlers::chat))
        .route(
            routes::NOTES,
            get(handlers::list_notes).post(handlers::create_note),
        );

    Router::new()
        .route(routes::HEALTH, get(handlers::health))
        .nest(routes::API_PREFIX, api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

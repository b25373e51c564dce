//! ginger-server: backend for the ginger assistant
//!
//! Provides:
//! - Stateless intent resolution for recorded audio (`POST /api/chat/agent`)
//! - Text chat and a notes collection
//! - A Gemini client behind the [`model::LanguageModel`] trait

pub mod config;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod model;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use routes::create_router;
pub use server::GingerServer;
pub use state::AppState;

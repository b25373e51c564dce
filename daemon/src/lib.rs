//! ginger-daemon: voice-activated agent for the ginger assistant
//!
//! Provides:
//! - The agent loop: record, classify, speak, repeat
//! - Adapters for microphone capture, speech output and the ginger server
//! - IPC server for UI control and state notifications

pub mod audio;
pub mod config;
pub mod events;
pub mod intent;
pub mod ipc;
pub mod lifecycle;
pub mod speech;
pub mod state;

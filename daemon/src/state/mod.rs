//! State machine module for the voice agent
//!
//! Provides the agent loop and its four states:
//! - Idle: between cycles, or stopped
//! - Listening: microphone open for one sample window
//! - Processing: sample uploaded, waiting on the intent service
//! - Talking: speaking an acknowledgement or reply

mod machine;

pub use machine::{AgentLoop, AgentState, StateObserver, WAKE_ACKNOWLEDGEMENT};

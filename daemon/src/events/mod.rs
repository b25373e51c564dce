//! Events pushed to subscribed IPC clients
//!
//! The daemon registers the agent loop's single state observer and fans
//! each transition out as an [`AgentEvent`] on a broadcast channel.

use serde::{Deserialize, Serialize};

use crate::state::AgentState;

/// Events emitted while the agent loop runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The loop moved to a new state
    StateChanged { state: AgentState },
}

impl std::fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentEvent::StateChanged { state } => write!(f, "STATE_CHANGED ({state})"),
        }
    }
}

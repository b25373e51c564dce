//! Control socket messages
//!
//! Each frame is a JSON document preceded by its length as a 4-byte
//! little-endian integer. Subscribed clients also receive
//! [`AgentEvent`](crate::events::AgentEvent) frames pushed between responses.

use serde::{Deserialize, Serialize};

use crate::state::AgentState;

/// Largest frame either side will accept
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Commands a client can send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Snapshot of the agent
    GetStatus,

    /// Start the agent loop
    Start,

    /// Stop the agent loop
    Stop,

    /// Liveness check
    Ping,

    /// Receive a push for every state change on this connection
    Subscribe,
}

/// Replies, one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Reply to `GetStatus`
    Status(DaemonStatus),

    /// Start/stop applied
    Ok,

    /// Reply to `Ping`
    Pong,

    /// Reply to `Subscribe`
    Subscribed,

    /// The request could not be decoded or applied
    Error { code: String, message: String },
}

/// Agent status as reported over the socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Crate version
    pub version: String,

    /// Current agent state
    pub state: AgentState,

    /// Whether the wake word has been heard
    pub active_mode: bool,

    /// Whether the agent loop is running
    pub running: bool,

    /// Seconds since the daemon started
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: AgentState::default(),
            active_mode: false,
            running: false,
            uptime_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_string(&Request::Subscribe).unwrap();
        assert_eq!(json, r#"{"type":"subscribe"}"#);

        let req: Request = serde_json::from_str(r#"{"type":"get_status"}"#).unwrap();
        assert_eq!(req, Request::GetStatus);
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(DaemonStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""state":"IDLE""#));
    }

    #[test]
    fn test_error_response_serialization() {
        let resp = Response::Error {
            code: "bad_request".to_string(),
            message: "unknown request".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("bad_request"));
    }
}

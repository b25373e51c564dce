//! Prompts for the intent endpoint and validation of what the model sends
//! back
//!
//! The model is asked for bare JSON but often wraps it in a markdown code
//! fence. Fences are stripped, then the text must decode into exactly the
//! shape the prompt asked for; anything else is an [`UpstreamParseError`].

use ginger_protocol::{AgentMode, AgentResponse, IntentAction};
use serde::Deserialize;
use thiserror::Error;

const WAKE_PROMPT: &str = r#"Listen to this audio. Does the user clearly say the name "Ginger" (or something similar sounding like "Jinger")?
If YES, return JSON: {"detected": true}.
If NO, return JSON: {"detected": false}.
Only return the JSON."#;

const INTENT_PROMPT: &str = r#"You are an AI agent named Ginger. Use the audio to determine the user's intent.
Available actions:
1. "CREATE_NOTE": If the user wants to create a note, save it. Return {"action": "CREATE_NOTE", "content": "note text", "reply": "Saving note..."}
2. "STOP": If the user says "Stop" or "Cancel". Return {"action": "STOP", "reply": "Deactivating agent."}
3. "UNKNOWN": If unclear. Return {"action": "UNKNOWN", "reply": "I didn't catch that."}

Return ONLY the JSON, with no other text."#;

/// The model's reply did not match the requested shape
#[derive(Debug, Error)]
#[error("model response is not valid {expected}: {source}")]
pub struct UpstreamParseError {
    expected: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Result of a wake-word check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WakeCheck {
    pub detected: bool,
}

/// Result of intent extraction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Intent {
    pub action: IntentAction,
    pub reply: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl Intent {
    /// Note text to persist, if this intent asks for one
    pub fn note_content(&self) -> Option<&str> {
        match self.action {
            IntentAction::CreateNote => self
                .content
                .as_deref()
                .map(str::trim)
                .filter(|content| !content.is_empty()),
            _ => None,
        }
    }
}

/// A validated classification for either mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Wake(WakeCheck),
    Intent(Intent),
}

impl From<Classification> for AgentResponse {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Wake(check) => AgentResponse::wake(check.detected),
            Classification::Intent(intent) => {
                AgentResponse::intent(intent.action, intent.reply, intent.content)
            }
        }
    }
}

/// Prompt to run for the declared mode
pub fn prompt_for(mode: AgentMode) -> &'static str {
    match mode {
        AgentMode::Idle => WAKE_PROMPT,
        AgentMode::Active => INTENT_PROMPT,
    }
}

/// Remove markdown code fence markers
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Validate raw model text against the shape expected for `mode`
pub fn parse_response(mode: AgentMode, raw: &str) -> Result<Classification, UpstreamParseError> {
    let text = strip_code_fences(raw);
    match mode {
        AgentMode::Idle => serde_json::from_str::<WakeCheck>(text)
            .map(Classification::Wake)
            .map_err(|source| UpstreamParseError {
                expected: "wake-word result",
                source,
            }),
        AgentMode::Active => serde_json::from_str::<Intent>(text)
            .map(Classification::Intent)
            .map_err(|source| UpstreamParseError {
                expected: "intent",
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_by_mode() {
        assert!(prompt_for(AgentMode::Idle).contains("\"detected\""));
        let active = prompt_for(AgentMode::Active);
        assert!(active.contains("CREATE_NOTE"));
        assert!(active.contains("STOP"));
        assert!(active.contains("UNKNOWN"));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_wake() {
        let parsed = parse_response(AgentMode::Idle, "```json {\"detected\": true} ```").unwrap();
        assert_eq!(parsed, Classification::Wake(WakeCheck { detected: true }));
    }

    #[test]
    fn test_parse_wake_rejects_wrong_shape() {
        assert!(parse_response(AgentMode::Idle, "{\"detected\": \"yes\"}").is_err());
        assert!(parse_response(AgentMode::Idle, "{}").is_err());
        assert!(parse_response(AgentMode::Idle, "Yes, they said Ginger").is_err());
    }

    #[test]
    fn test_parse_unknown_intent() {
        let raw = "```json {\"action\":\"UNKNOWN\",\"reply\":\"I didn't catch that.\"} ```";
        let parsed = parse_response(AgentMode::Active, raw).unwrap();
        match parsed {
            Classification::Intent(intent) => {
                assert_eq!(intent.action, IntentAction::Unknown);
                assert_eq!(intent.note_content(), None);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_parse_intent_rejects_unknown_action() {
        let raw = r#"{"action":"DANCE","reply":"ok"}"#;
        assert!(parse_response(AgentMode::Active, raw).is_err());
    }

    #[test]
    fn test_parse_intent_requires_reply() {
        let raw = r#"{"action":"STOP"}"#;
        assert!(parse_response(AgentMode::Active, raw).is_err());
    }

    #[test]
    fn test_note_content_only_for_create_note() {
        let create = Intent {
            action: IntentAction::CreateNote,
            reply: "Saving note...".to_string(),
            content: Some("  buy milk ".to_string()),
        };
        assert_eq!(create.note_content(), Some("buy milk"));

        let empty = Intent {
            content: Some("   ".to_string()),
            ..create.clone()
        };
        assert_eq!(empty.note_content(), None);

        let stop = Intent {
            action: IntentAction::Stop,
            ..create
        };
        assert_eq!(stop.note_content(), None);
    }
}

//! Speech output module
//!
//! [`SpeechOutput::speak`] resolves when the phrase has finished playing;
//! that completion is what lets the agent loop leave the talking state.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

const TEXT_PLACEHOLDER: &str = "{text}";

/// Speaks text aloud
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, returning once playback has completed
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Errors that can occur while speaking
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech command is empty")]
    NoCommand,

    #[error("failed to start speech command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("speech command exited with {0}")]
    Failed(std::process::ExitStatus),
}

/// Speech output backed by a synthesiser command line (espeak, say, ...)
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Create a speaker from a whitespace-separated command line.
    ///
    /// `{text}` is replaced by the phrase as a single argument; when no
    /// argument carries it the phrase is appended.
    pub fn new(command_line: &str) -> Result<Self, SpeechError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(SpeechError::NoCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn build_args(&self, text: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg == TEXT_PLACEHOLDER {
                    text.to_string()
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !self.args.iter().any(|arg| arg == TEXT_PLACEHOLDER) {
            args.push(text.to_string());
        }
        args
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        debug!(program = %self.program, %text, "speaking");
        let status = Command::new(&self.program)
            .args(self.build_args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(SpeechError::Spawn)?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Failed(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_single_argument() {
        let speaker = CommandSpeaker::new("espeak -v en {text}").unwrap();
        assert_eq!(
            speaker.build_args("I'm listening."),
            vec!["-v", "en", "I'm listening."]
        );
    }

    #[test]
    fn test_text_appended_without_placeholder() {
        let speaker = CommandSpeaker::new("say").unwrap();
        assert_eq!(speaker.build_args("hello there"), vec!["hello there"]);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(CommandSpeaker::new(""), Err(SpeechError::NoCommand)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_status() {
        let speaker = CommandSpeaker::new("false").unwrap();
        assert!(matches!(speaker.speak("hi").await, Err(SpeechError::Failed(_))));
    }
}

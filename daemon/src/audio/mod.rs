//! Audio capture module
//!
//! The agent loop opens one [`Recording`] per cycle through an
//! [`AudioCapture`] adapter and either finishes it into an [`AudioSample`]
//! or discards it. A recording is consumed by either call, so the loop
//! can never hold two at once.

mod recorder;

use async_trait::async_trait;

pub use recorder::CommandRecorder;

/// One finished capture, uploaded and dropped within the same cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    /// Encoded audio bytes
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime_type: String,
    /// File name used for the upload
    pub file_name: String,
}

/// Starts microphone captures
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Open the microphone and start recording
    async fn begin(&self) -> Result<Box<dyn Recording>, CaptureError>;
}

/// A capture in progress
#[async_trait]
pub trait Recording: Send {
    /// Stop recording and hand over the sample
    async fn finish(self: Box<Self>) -> Result<AudioSample, CaptureError>;

    /// Stop recording and throw the audio away
    async fn discard(self: Box<Self>);
}

/// Errors that can occur while capturing audio
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("recorder command is empty")]
    NoCommand,

    #[error("failed to start recorder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to prepare sample file: {0}")]
    SampleFile(#[source] std::io::Error),

    #[error("failed to read recorded sample: {0}")]
    Read(#[source] std::io::Error),

    #[error("recorder produced no audio")]
    Empty,

    #[error("microphone unavailable: {0}")]
    Unavailable(String),
}

/// MIME type for a recorder output format
pub fn mime_for_format(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "m4a" => ginger_protocol::DEFAULT_AUDIO_MIME,
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_format() {
        assert_eq!(mime_for_format("wav"), "audio/wav");
        assert_eq!(mime_for_format("M4A"), "audio/m4a");
        assert_eq!(mime_for_format("xyz"), "application/octet-stream");
    }
}

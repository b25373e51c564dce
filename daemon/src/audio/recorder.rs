//! Microphone capture through an external recorder process
//!
//! The recorder (arecord, sox, ffmpeg, ...) writes into a temporary file.
//! Finishing interrupts it with SIGINT so it can close the container
//! cleanly, then reads the file back. The file is removed when the
//! recording is dropped.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{mime_for_format, AudioCapture, AudioSample, CaptureError, Recording};

/// How long a recorder gets to exit after SIGINT before it is killed
const STOP_GRACE: Duration = Duration::from_millis(1500);

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Audio capture adapter backed by a recorder command line
#[derive(Debug, Clone)]
pub struct CommandRecorder {
    program: String,
    args: Vec<String>,
    format: String,
}

impl CommandRecorder {
    /// Create a recorder from a whitespace-separated command line.
    ///
    /// `{output}` in the arguments is replaced with the sample path; when no
    /// argument carries it the path is appended.
    pub fn new(command_line: &str, format: &str) -> Result<Self, CaptureError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(CaptureError::NoCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            format: format.trim_start_matches('.').to_string(),
        })
    }

    fn build_args(&self, output: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, output))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            args.push(output.to_string());
        }
        args
    }
}

#[async_trait]
impl AudioCapture for CommandRecorder {
    async fn begin(&self) -> Result<Box<dyn Recording>, CaptureError> {
        let path = tempfile::Builder::new()
            .prefix("ginger-")
            .suffix(&format!(".{}", self.format))
            .tempfile()
            .map_err(CaptureError::SampleFile)?
            .into_temp_path();

        let output = path.to_string_lossy().into_owned();
        let child = Command::new(&self.program)
            .args(self.build_args(&output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(CaptureError::Spawn)?;

        debug!(program = %self.program, %output, "recorder started");

        Ok(Box::new(CommandRecording {
            child,
            path,
            mime_type: mime_for_format(&self.format).to_string(),
            file_name: format!("audio.{}", self.format),
        }))
    }
}

struct CommandRecording {
    child: Child,
    path: TempPath,
    mime_type: String,
    file_name: String,
}

impl CommandRecording {
    async fn interrupt(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
                debug!(error = %e, "failed to interrupt recorder");
            }
        }

        match tokio::time::timeout(STOP_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "recorder exited"),
            Ok(Err(e)) => warn!(error = %e, "failed to wait for recorder"),
            Err(_) => {
                warn!("recorder ignored SIGINT, killing it");
                self.kill().await;
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "recorder already gone");
        }
        let _ = self.child.wait().await;
    }
}

#[async_trait]
impl Recording for CommandRecording {
    async fn finish(mut self: Box<Self>) -> Result<AudioSample, CaptureError> {
        self.interrupt().await;

        let data = tokio::fs::read(&self.path).await.map_err(CaptureError::Read)?;
        if data.is_empty() {
            return Err(CaptureError::Empty);
        }

        debug!(bytes = data.len(), "sample captured");
        Ok(AudioSample {
            data,
            mime_type: self.mime_type.clone(),
            file_name: self.file_name.clone(),
        })
    }

    async fn discard(mut self: Box<Self>) {
        self.kill().await;
        debug!("recording discarded");
    }
}

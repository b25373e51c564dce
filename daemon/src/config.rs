//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000/api";
const DEFAULT_RECORD_CMD: &str = "arecord -q -f S16_LE -r 16000 -c 1 -t wav {output}";
const DEFAULT_SPEAK_CMD: &str = "espeak {text}";

/// Pacing of the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTimings {
    /// How long each capture is held open
    pub sample_window: Duration,
    /// Re-check interval while still talking at the top of a cycle
    pub talk_cooldown: Duration,
    /// Hold after the wake acknowledgement starts
    pub wake_hold: Duration,
    /// Hold after an intent reply starts
    pub reply_hold: Duration,
    /// Wait after a failed capture or request
    pub error_backoff: Duration,
    /// Upper bound on one intent round trip
    pub request_timeout: Duration,
}

impl Default for LoopTimings {
    fn default() -> Self {
        Self {
            sample_window: Duration::from_millis(2500),
            talk_cooldown: Duration::from_millis(1000),
            wake_hold: Duration::from_millis(2000),
            reply_hold: Duration::from_millis(3000),
            error_backoff: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(5000),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ginger server
    pub server_url: String,

    /// Loop pacing
    pub timings: LoopTimings,

    /// Recorder command line, `{output}` is replaced by the sample path
    pub record_command: String,

    /// Container format the recorder writes (wav, m4a, ...)
    pub record_format: String,

    /// Speech command line, `{text}` is replaced by the phrase
    pub speak_command: String,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Start the agent loop as soon as the daemon is up
    pub autostart: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("ginger");

        let socket_path = lookup("GINGER_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let defaults = LoopTimings::default();
        let timings = LoopTimings {
            sample_window: millis(&lookup, "GINGER_SAMPLE_WINDOW_MS", defaults.sample_window)?,
            talk_cooldown: millis(&lookup, "GINGER_TALK_COOLDOWN_MS", defaults.talk_cooldown)?,
            wake_hold: millis(&lookup, "GINGER_WAKE_HOLD_MS", defaults.wake_hold)?,
            reply_hold: millis(&lookup, "GINGER_REPLY_HOLD_MS", defaults.reply_hold)?,
            error_backoff: millis(&lookup, "GINGER_ERROR_BACKOFF_MS", defaults.error_backoff)?,
            request_timeout: millis(&lookup, "GINGER_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
        };

        let autostart = match lookup("GINGER_AUTOSTART") {
            Some(value) => value
                .parse::<bool>()
                .with_context(|| format!("GINGER_AUTOSTART must be true or false, got {value:?}"))?,
            None => true,
        };

        Ok(Self {
            server_url: lookup("GINGER_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            timings,
            record_command: lookup("GINGER_RECORD_CMD").unwrap_or_else(|| DEFAULT_RECORD_CMD.to_string()),
            record_format: lookup("GINGER_RECORD_FORMAT").unwrap_or_else(|| "wav".to_string()),
            speak_command: lookup("GINGER_SPEAK_CMD").unwrap_or_else(|| DEFAULT_SPEAK_CMD.to_string()),
            socket_path,
            data_dir,
            autostart,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match lookup(key) {
        Some(value) => {
            let ms = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{key} must be a number of milliseconds, got {value:?}"))?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[("HOME", "/home/test")])).unwrap();
        assert!(config.socket_path.to_string_lossy().contains("ginger"));
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.timings, LoopTimings::default());
        assert_eq!(config.timings.request_timeout, Duration::from_secs(5));
        assert!(config.autostart);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOME", "/home/test"),
            ("GINGER_SAMPLE_WINDOW_MS", "1200"),
            ("GINGER_SERVER_URL", "http://10.0.0.2:3000"),
            ("GINGER_AUTOSTART", "false"),
        ]))
        .unwrap();
        assert_eq!(config.timings.sample_window, Duration::from_millis(1200));
        assert_eq!(config.server_url, "http://10.0.0.2:3000");
        assert!(!config.autostart);
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let result = Config::from_lookup(lookup(&[
            ("HOME", "/home/test"),
            ("GINGER_REPLY_HOLD_MS", "soon"),
        ]));
        assert!(result.is_err());
    }
}

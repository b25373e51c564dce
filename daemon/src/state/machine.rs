//! Voice-activated agent loop
//!
//! Each cycle captures a fixed-length sample, uploads it with the current
//! mode and acts on the reply:
//!
//! ```text
//! Idle -> Listening -> Processing -> Talking -> Idle
//!                           \-----------------> Idle
//! ```
//!
//! The loop runs as one tokio task per session. `stop()` cancels the
//! session token, which every suspension point (capture window, request,
//! holds, backoff) selects on, then waits for the task to release the
//! microphone. `start()` and `stop()` take the same control lock, so a start
//! issued while a stop is draining waits for the old session to finish.
//! Transitions from a stale session are ignored so nothing the old task does
//! after `stop()` can leak out to observers.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ginger_protocol::{AgentMode, AgentResponse, IntentAction};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::{AudioCapture, AudioSample};
use crate::config::LoopTimings;
use crate::intent::{IntentError, IntentService};
use crate::speech::SpeechOutput;

/// Spoken when the wake word is heard
pub const WAKE_ACKNOWLEDGEMENT: &str = "I'm listening.";

/// The four states of the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Between cycles, or stopped
    #[default]
    Idle,
    /// Microphone open
    Listening,
    /// Waiting on the intent service
    Processing,
    /// Speaking a reply
    Talking,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Idle => write!(f, "IDLE"),
            AgentState::Listening => write!(f, "LISTENING"),
            AgentState::Processing => write!(f, "PROCESSING"),
            AgentState::Talking => write!(f, "TALKING"),
        }
    }
}

/// Callback invoked on every state transition
pub type StateObserver = Arc<dyn Fn(AgentState) + Send + Sync>;

/// Handle to the agent loop. Clones share the same loop.
#[derive(Clone)]
pub struct AgentLoop {
    inner: Arc<Inner>,
}

struct Inner {
    capture: Arc<dyn AudioCapture>,
    speech: Arc<dyn SpeechOutput>,
    intent: Arc<dyn IntentService>,
    timings: LoopTimings,
    shared: Mutex<Shared>,
    observer: Mutex<Option<StateObserver>>,
    /// Held for the whole of a start or stop, including the join
    control: tokio::sync::Mutex<Option<RunningTask>>,
}

struct Shared {
    state: AgentState,
    active_mode: bool,
    running: bool,
    /// Bumped on every start and stop; a task only mutates state while its
    /// session is current
    session: u64,
    state_entered_at: Instant,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AgentLoop {
    /// Create a stopped agent loop
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        speech: Arc<dyn SpeechOutput>,
        intent: Arc<dyn IntentService>,
        timings: LoopTimings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                capture,
                speech,
                intent,
                timings,
                shared: Mutex::new(Shared {
                    state: AgentState::Idle,
                    active_mode: false,
                    running: false,
                    session: 0,
                    state_entered_at: Instant::now(),
                }),
                observer: Mutex::new(None),
                control: tokio::sync::Mutex::new(None),
            }),
        }
    }

    /// Get the current state
    pub fn state(&self) -> AgentState {
        self.inner.shared.lock().state
    }

    /// Whether the wake word has been heard and not yet cancelled
    pub fn is_active_mode(&self) -> bool {
        self.inner.shared.lock().active_mode
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.inner.shared.lock().running
    }

    /// Register the state observer, replacing any previous one
    pub fn on_state_change<F>(&self, observer: F)
    where
        F: Fn(AgentState) + Send + Sync + 'static,
    {
        *self.inner.observer.lock() = Some(Arc::new(observer));
    }

    /// Start the loop. Does nothing if it is already running.
    ///
    /// Waits for a stop in progress to release the microphone first.
    pub async fn start(&self) {
        let mut control = self.inner.control.lock().await;
        let id = {
            let mut shared = self.inner.shared.lock();
            if shared.running {
                debug!("agent loop already running");
                return;
            }
            shared.running = true;
            shared.session += 1;
            shared.session
        };

        let cancel = CancellationToken::new();
        let session = Session {
            inner: Arc::clone(&self.inner),
            id,
            cancel: cancel.clone(),
            speaking: None,
        };
        let handle = tokio::spawn(session.run());
        *control = Some(RunningTask { cancel, handle });
    }

    /// Stop the loop, discarding any open capture, forcing the state to
    /// idle and leaving active mode. Does nothing if already stopped.
    ///
    /// Returns once the microphone has been released. The stop runs on its
    /// own task and completes even if this future is dropped.
    pub async fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::spawn(async move { inner.stop().await }).await {
            warn!(error = %e, "agent loop stop task failed");
        }
    }
}

impl Inner {
    async fn stop(&self) {
        let mut control = self.control.lock().await;
        let id = {
            let mut shared = self.shared.lock();
            if !shared.running {
                return;
            }
            shared.running = false;
            shared.session += 1;
            if shared.active_mode {
                info!("active mode cleared by stop");
            }
            shared.active_mode = false;
            shared.session
        };

        if let Some(task) = control.take() {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                warn!(error = %e, "agent loop task ended abnormally");
            }
        }

        self.settle_idle(id);
        info!("agent loop stopped");
    }

    /// Transition on behalf of `session`, ignored when the session is stale
    fn transition(&self, session: u64, new_state: AgentState) {
        let observer = {
            let mut shared = self.shared.lock();
            if shared.session != session || !shared.running {
                return;
            }
            if !self.apply_state(&mut shared, new_state) {
                return;
            }
            self.observer.lock().clone()
        };
        if let Some(observer) = observer {
            observer(new_state);
        }
    }

    /// Return to idle after the stop that moved the loop to `session`,
    /// unless a later start has taken over
    fn settle_idle(&self, session: u64) {
        let observer = {
            let mut shared = self.shared.lock();
            if shared.session != session || shared.running {
                return;
            }
            if !self.apply_state(&mut shared, AgentState::Idle) {
                return;
            }
            self.observer.lock().clone()
        };
        if let Some(observer) = observer {
            observer(AgentState::Idle);
        }
    }

    fn apply_state(&self, shared: &mut Shared, new_state: AgentState) -> bool {
        let old_state = shared.state;
        if old_state == new_state {
            return false;
        }

        let duration_ms = shared.state_entered_at.elapsed().as_millis() as u64;
        debug!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "state transition"
        );

        shared.state = new_state;
        shared.state_entered_at = Instant::now();
        true
    }

    fn set_active_mode(&self, session: u64, active: bool) {
        let mut shared = self.shared.lock();
        if shared.session != session || !shared.running {
            return;
        }
        if shared.active_mode != active {
            info!(active, "active mode changed");
        }
        shared.active_mode = active;
    }
}

/// Outcome of holding a capture open
enum Capture {
    Sample(AudioSample),
    Failed,
    Cancelled,
}

/// One run of the loop between `start()` and `stop()`
struct Session {
    inner: Arc<Inner>,
    id: u64,
    cancel: CancellationToken,
    /// Completion of the phrase being spoken, if any
    speaking: Option<JoinHandle<()>>,
}

impl Session {
    async fn run(mut self) {
        info!(session = self.id, "agent loop started");

        while !self.cancel.is_cancelled() {
            if self.cycle().await.is_break() {
                break;
            }
        }

        if let Some(speaking) = self.speaking.take() {
            speaking.abort();
        }
        debug!(session = self.id, "agent loop task exiting");
    }

    fn transition(&self, state: AgentState) {
        self.inner.transition(self.id, state);
    }

    fn state(&self) -> AgentState {
        self.inner.shared.lock().state
    }

    /// Run one listen/process/respond cycle
    async fn cycle(&mut self) -> ControlFlow<()> {
        let timings = self.inner.timings;

        if self.state() == AgentState::Talking {
            if !self.speech_finished() {
                return self.pause(timings.talk_cooldown).await;
            }
            self.transition(AgentState::Idle);
        }

        self.transition(AgentState::Listening);
        let sample = match self.capture(timings.sample_window).await {
            Capture::Sample(sample) => sample,
            Capture::Failed => {
                self.transition(AgentState::Idle);
                return self.pause(timings.error_backoff).await;
            }
            Capture::Cancelled => return ControlFlow::Break(()),
        };

        self.transition(AgentState::Processing);
        let mode = AgentMode::from_active(self.inner.shared.lock().active_mode);

        let request = tokio::time::timeout(
            timings.request_timeout,
            self.inner.intent.resolve(sample, mode),
        );
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return ControlFlow::Break(()),
            result = request => result.unwrap_or(Err(IntentError::Timeout)),
        };

        match result {
            Ok(response) => {
                if self.respond(mode, response).await.is_break() {
                    return ControlFlow::Break(());
                }
            }
            Err(e) => {
                warn!(error = %e, %mode, "intent request failed");
                if self.pause(timings.error_backoff).await.is_break() {
                    return ControlFlow::Break(());
                }
                self.transition(AgentState::Idle);
            }
        }

        // Nothing moved us on (no detection, no reply): don't get stuck
        if self.state() == AgentState::Processing {
            self.transition(AgentState::Idle);
        }
        ControlFlow::Continue(())
    }

    /// Open the microphone for `window` and collect the sample
    async fn capture(&mut self, window: Duration) -> Capture {
        let recording = match self.inner.capture.begin().await {
            Ok(recording) => recording,
            Err(e) => {
                warn!(error = %e, "failed to start capture, skipping cycle");
                return Capture::Failed;
            }
        };

        if self.pause(window).await.is_break() {
            recording.discard().await;
            return Capture::Cancelled;
        }

        match recording.finish().await {
            Ok(sample) => Capture::Sample(sample),
            Err(e) => {
                warn!(error = %e, "failed to finish capture, skipping cycle");
                Capture::Failed
            }
        }
    }

    /// Act on a decoded server reply
    async fn respond(&mut self, mode: AgentMode, response: AgentResponse) -> ControlFlow<()> {
        let timings = self.inner.timings;

        match mode {
            AgentMode::Idle => {
                if response.detected == Some(true) {
                    info!("wake word detected");
                    self.inner.set_active_mode(self.id, true);
                    return self.talk(WAKE_ACKNOWLEDGEMENT, timings.wake_hold).await;
                }
            }
            AgentMode::Active => {
                if response.action == Some(IntentAction::Stop) {
                    self.inner.set_active_mode(self.id, false);
                }
                info!(action = ?response.action, "intent received");
                if let Some(reply) = response.reply.as_deref().filter(|r| !r.trim().is_empty()) {
                    return self.talk(reply, timings.reply_hold).await;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Speak `text` and hold for `hold`. Leaves the talking state only if
    /// the phrase has finished by then.
    async fn talk(&mut self, text: &str, hold: Duration) -> ControlFlow<()> {
        self.transition(AgentState::Talking);

        let speech = Arc::clone(&self.inner.speech);
        let text = text.to_string();
        if let Some(previous) = self.speaking.take() {
            previous.abort();
        }
        self.speaking = Some(tokio::spawn(async move {
            if let Err(e) = speech.speak(&text).await {
                warn!(error = %e, "speech output failed");
            }
        }));

        if self.pause(hold).await.is_break() {
            return ControlFlow::Break(());
        }
        if self.speech_finished() {
            self.transition(AgentState::Idle);
        }
        ControlFlow::Continue(())
    }

    fn speech_finished(&mut self) -> bool {
        match &self.speaking {
            Some(handle) if !handle.is_finished() => false,
            _ => {
                self.speaking = None;
                true
            }
        }
    }

    /// Sleep for `duration` unless the session is cancelled first
    async fn pause(&self, duration: Duration) -> ControlFlow<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => ControlFlow::Break(()),
            _ = tokio::time::sleep(duration) => ControlFlow::Continue(()),
        }
    }
}

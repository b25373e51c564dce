//! Unix domain socket server for IPC
//!
//! Provides request-response control of the agent loop and push
//! notifications of state changes to subscribed clients.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::events::AgentEvent;
use crate::state::AgentLoop;

use super::protocol::{DaemonStatus, Request, Response, MAX_FRAME_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    context: ClientContext,
    shutdown_tx: broadcast::Sender<()>,
}

/// What each connection handler needs
#[derive(Clone)]
struct ClientContext {
    agent: AgentLoop,
    events: broadcast::Sender<AgentEvent>,
    start_time: Instant,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        agent: AgentLoop,
        events: broadcast::Sender<AgentEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            context: ClientContext {
                agent,
                events,
                start_time: Instant::now(),
            },
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = self.context.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = context.handle_client(stream) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

impl ClientContext {
    /// Handle a single client connection
    async fn handle_client(self, stream: UnixStream) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Frames are read on their own task so a pending read is never
        // cancelled halfway by an outgoing notification.
        let (request_tx, mut request_rx) = mpsc::channel::<Result<Request, String>>(8);
        let reader_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(frame)) => {
                        let request =
                            serde_json::from_slice::<Request>(&frame).map_err(|e| e.to_string());
                        if request_tx.send(request).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("client disconnected");
                        break;
                    }
                    Err(e) => {
                        warn!(%e, "closing client connection");
                        break;
                    }
                }
            }
        });

        let mut notifications: Option<broadcast::Receiver<AgentEvent>> = None;

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else { break Ok(()) };
                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            if request == Request::Subscribe && notifications.is_none() {
                                notifications = Some(self.events.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            self.process_request(request).await
                        }
                        Err(message) => Response::Error {
                            code: "bad_request".to_string(),
                            message,
                        },
                    };
                    if let Err(e) = write_frame(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = next_event(&mut notifications) => {
                    match event {
                        Ok(event) => {
                            if let Err(e) = write_frame(&mut writer, &event).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "notification receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            notifications = None;
                        }
                    }
                }
            }
        };

        reader_task.abort();
        result
    }

    /// Process a request and return a response
    async fn process_request(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => Response::Status(self.status()),

            Request::Start => {
                info!("agent start requested via IPC");
                self.agent.start().await;
                Response::Ok
            }

            Request::Stop => {
                info!("agent stop requested via IPC");
                self.agent.stop().await;
                Response::Ok
            }

            Request::Subscribe => Response::Subscribed,
        }
    }

    fn status(&self) -> DaemonStatus {
        DaemonStatus {
            state: self.agent.state(),
            active_mode: self.agent.is_active_mode(),
            running: self.agent.is_running(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            ..DaemonStatus::default()
        }
    }
}

async fn next_event(
    notifications: &mut Option<broadcast::Receiver<AgentEvent>>,
) -> Result<AgentEvent, broadcast::error::RecvError> {
    match notifications {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read one length-prefixed frame. `None` on a clean disconnect.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        bail!("message too large: {len} bytes");
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}

/// Send a length-prefixed JSON message
pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, msg: &T) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}

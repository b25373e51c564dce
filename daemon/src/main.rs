//! ginger-daemon: background voice agent
//!
//! `run` starts the agent loop and the IPC server; the remaining
//! subcommands are one-shot calls against the ginger server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ginger_daemon::audio::CommandRecorder;
use ginger_daemon::config::Config;
use ginger_daemon::events::AgentEvent;
use ginger_daemon::intent::ServerClient;
use ginger_daemon::ipc::Server;
use ginger_daemon::lifecycle::ShutdownSignal;
use ginger_daemon::speech::CommandSpeaker;
use ginger_daemon::state::AgentLoop;

#[derive(Parser)]
#[command(name = "ginger-daemon", version, about = "Voice-activated agent for the ginger assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent loop and IPC server until interrupted (default)
    Run,

    /// Send a text message and print the reply
    Chat {
        /// Message text
        message: String,
    },

    /// Save a note
    Note {
        /// Note content
        content: String,
    },

    /// List saved notes, newest first
    Notes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Chat { message } => {
            let client = client(&config)?;
            let reply = client.chat(&message).await.context("chat request failed")?;
            println!("{reply}");
            Ok(())
        }
        Commands::Note { content } => {
            let client = client(&config)?;
            let note = client.create_note(&content).await.context("failed to save note")?;
            println!("{} {}", note.created_at.to_rfc3339(), note.content);
            Ok(())
        }
        Commands::Notes => {
            let client = client(&config)?;
            for note in client.list_notes().await.context("failed to list notes")? {
                println!("{} {}", note.created_at.to_rfc3339(), note.content);
            }
            Ok(())
        }
    }
}

fn client(config: &Config) -> Result<ServerClient> {
    ServerClient::new(&config.server_url, config.timings.request_timeout)
        .context("failed to build HTTP client")
}

async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "ginger-daemon starting"
    );
    config.ensure_dirs()?;
    info!(server_url = %config.server_url, socket = ?config.socket_path, "configuration loaded");

    let mut shutdown = ShutdownSignal::new()?;

    let recorder = CommandRecorder::new(&config.record_command, &config.record_format)
        .context("invalid GINGER_RECORD_CMD")?;
    let speaker = CommandSpeaker::new(&config.speak_command).context("invalid GINGER_SPEAK_CMD")?;
    let server_client = client(&config)?;
    info!(base_url = %server_client.base_url(), "intent service configured");

    let agent = AgentLoop::new(
        Arc::new(recorder),
        Arc::new(speaker),
        Arc::new(server_client),
        config.timings,
    );

    // Agent loop -> IPC subscribers
    let (event_tx, _event_rx) = broadcast::channel::<AgentEvent>(64);
    let observer_tx = event_tx.clone();
    agent.on_state_change(move |state| {
        info!(%state, "agent state");
        let _ = observer_tx.send(AgentEvent::StateChanged { state });
    });

    let server = Server::new(&config.socket_path, agent.clone(), event_tx)?;

    if config.autostart {
        agent.start().await;
    } else {
        info!("autostart disabled, waiting for a start request");
    }

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    agent.stop().await;
    server.shutdown().await;

    info!("ginger-daemon stopped");

    Ok(())
}

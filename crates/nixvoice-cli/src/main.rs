//! nixvoice CLI — standalone voice guide server.
//!
//! ```text
//! nixvoice serve [--port 2004] [--host 127.0.0.1] [--backend auto] [--enabled]
//! nixvoice speak "hello world" [--server http://localhost:2004]
//! nixvoice announce settings / toggle / enable / disable / stop / status
//! nixvoice listen start|stop / recognize "go to dashboard"
//! nixvoice voices [--backend auto]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use nixvoice_lib::guide::VoiceGuide;
use nixvoice_lib::nixvoice_core::pages::Page;
use nixvoice_lib::nixvoice_core::types::{Backend, NarrationConfig};
use nixvoice_lib::recognition::ChannelRecognizer;
use nixvoice_lib::server;

const DEFAULT_SERVER: &str = "http://localhost:2004";

/// How long `voices` waits for the backend to enumerate its voices.
const VOICE_LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// nixvoice — spoken guidance for the NixSpot UI
#[derive(Parser)]
#[command(name = "nixvoice", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the voice guide server
    Serve {
        /// Listen port
        #[arg(long, default_value = "2004")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// JSON config file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Speech backend: auto, speech-dispatcher, espeak, none
        #[arg(long)]
        backend: Option<Backend>,
        /// Speaking rate multiplier
        #[arg(long)]
        rate: Option<f32>,
        /// Pitch multiplier
        #[arg(long)]
        pitch: Option<f32>,
        /// Start with narration enabled
        #[arg(long)]
        enabled: bool,
    },
    /// Speak text through the running server
    Speak {
        /// Text to speak
        text: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Speak a page's guidance prompt
    Announce {
        /// Page name, e.g. repositories, pull-requests, settings
        page: Page,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Flip narration on or off
    Toggle {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Turn narration on
    Enable {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Turn narration off
    Disable {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Cancel the current utterance
    Stop {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Start or stop listening for spoken commands
    Listen {
        #[arg(value_enum)]
        action: ListenAction,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Send a phrase as if it had been recognized
    Recognize {
        /// Recognized phrase
        text: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Get server status
    Status {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// List local voices and show which one would be selected
    Voices {
        #[arg(long, default_value = "auto")]
        backend: Backend,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListenAction {
    Start,
    Stop,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nixvoice=info,nixvoice_lib=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            config,
            backend,
            rate,
            pitch,
            enabled,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => NarrationConfig::default(),
            };
            if let Some(backend) = backend {
                config.backend = backend;
            }
            if let Some(rate) = rate {
                config.rate = rate;
            }
            if let Some(pitch) = pitch {
                config.pitch = pitch;
            }
            config.start_enabled |= enabled;

            let phrases = ChannelRecognizer::new();
            let guide = VoiceGuide::detect(config, Some(phrases.clone()));
            let app = server::router(guide.clone(), Some(phrases));

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!("nixvoice listening on {addr}");

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("server error")?;

            guide.shutdown();
        }

        Command::Speak { text, server } => {
            post_json(&server, "speak", serde_json::json!({ "text": text })).await?
        }
        Command::Announce { page, server } => {
            post_json(&server, "announce", serde_json::json!({ "page": page })).await?
        }
        Command::Recognize { text, server } => {
            post_json(&server, "recognize", serde_json::json!({ "text": text })).await?
        }

        Command::Toggle { server } => post_simple(&server, "toggle").await?,
        Command::Enable { server } => post_simple(&server, "enable").await?,
        Command::Disable { server } => post_simple(&server, "disable").await?,
        Command::Stop { server } => post_simple(&server, "stop").await?,
        Command::Listen { action, server } => {
            let endpoint = match action {
                ListenAction::Start => "listen/start",
                ListenAction::Stop => "listen/stop",
            };
            post_simple(&server, endpoint).await?
        }

        Command::Status { server } => {
            let resp = reqwest::Client::new()
                .get(format!("{server}/status"))
                .send()
                .await
                .context("request failed")?;
            println!("{}", resp.text().await.unwrap_or_default());
        }

        Command::Voices { backend } => list_voices(backend).await,
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<NarrationConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

async fn list_voices(backend: Backend) {
    let guide = VoiceGuide::detect(
        NarrationConfig {
            backend,
            ..Default::default()
        },
        None,
    );

    if !guide.status().available {
        println!("no speech backend available");
        return;
    }

    let mut status = guide.subscribe_status();
    let _ = tokio::time::timeout(VOICE_LOAD_TIMEOUT, status.wait_for(|s| s.voice.is_some())).await;

    let selected = guide.selected_voice();
    for voice in guide.voices() {
        let marker = if Some(&voice) == selected.as_ref() { "*" } else { " " };
        println!("{marker} {:<32} {:<12} {}", voice.name, voice.lang, voice.id);
    }
    if selected.is_none() {
        println!("no voices reported by backend");
    }
}

async fn post_json(server: &str, endpoint: &str, body: serde_json::Value) -> anyhow::Result<()> {
    let resp = reqwest::Client::new()
        .post(format!("{server}/{endpoint}"))
        .json(&body)
        .send()
        .await
        .context("request failed")?;
    println!("{}", resp.text().await.unwrap_or_default());
    Ok(())
}

async fn post_simple(server: &str, endpoint: &str) -> anyhow::Result<()> {
    let resp = reqwest::Client::new()
        .post(format!("{server}/{endpoint}"))
        .send()
        .await
        .context("request failed")?;
    println!("{}", resp.text().await.unwrap_or_default());
    Ok(())
}

//! Coach CLI - stdio front door for the analysis pipeline.
//!
//! `coach analyze` boots the pipeline and speaks JSON lines: inbound
//! `analyze-move` messages on stdin, lifecycle/result events on stdout.
//! Logs go to stderr so stdout stays a clean protocol stream.
//! `coach opening` answers a one-shot opening lookup for a FEN.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use chess::PlayerColor;
use engine::{OracleConfig, SearchLimits};
use openings::{FsSource, OpeningIndex};
use pipeline::{AnalysisPipeline, AnalysisRequest, PipelineConfig};

#[derive(Parser)]
#[command(name = "coach", about = "Move-quality analysis and opening lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis pipeline over stdin/stdout JSON lines.
    Analyze {
        /// Path to the search engine executable (probed when omitted).
        #[arg(long)]
        engine: Option<PathBuf>,
        /// Per-search think time in milliseconds.
        #[arg(long, default_value_t = 1000)]
        movetime: u64,
        /// Fixed search depth; overrides --movetime when set.
        #[arg(long)]
        depth: Option<u8>,
        /// Full-move cap past which blunders are not recorded.
        #[arg(long, default_value_t = analysis::RECORDING_MOVE_CAP)]
        recording_cap: u32,
    },
    /// Look up the named opening for a position.
    Opening {
        /// FEN of the position to look up.
        #[arg(long)]
        fen: String,
        /// Directory holding the opening dataset files.
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
}

/// Messages accepted on stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum InboundMessage {
    AnalyzeMove(IncomingRequest),
    Terminate,
}

/// An `analyze-move` payload. The id is optional on the wire; one is
/// generated when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingRequest {
    #[serde(default)]
    id: Option<String>,
    fen: String,
    #[serde(rename = "move")]
    mv: String,
    player_color: PlayerColor,
    #[serde(default)]
    move_index: Option<i64>,
    #[serde(default)]
    legal_move_count: Option<u32>,
}

impl IncomingRequest {
    fn into_request(self) -> AnalysisRequest {
        AnalysisRequest {
            id: self
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            fen: self.fen,
            mv: self.mv,
            player_color: self.player_color,
            move_index: self.move_index,
            legal_move_count: self.legal_move_count,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            engine,
            movetime,
            depth,
            recording_cap,
        } => {
            let config = PipelineConfig {
                oracle: OracleConfig {
                    executable: engine,
                    ..Default::default()
                },
                limits: SearchLimits {
                    movetime: depth.is_none().then_some(movetime),
                    depth,
                },
                recording_cap,
            };
            run_analyze(config).await
        }
        Commands::Opening { fen, dir } => run_opening_lookup(&fen, dir).await,
    }
}

async fn run_analyze(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = AnalysisPipeline::start(config);
    let mut events = pipeline.subscribe();

    // Event pump: everything the pipeline emits becomes one stdout line.
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to encode event: {}", e),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event consumer lagged, {} events dropped", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(line) {
            Ok(InboundMessage::AnalyzeMove(incoming)) => {
                let request = incoming.into_request();
                tracing::debug!(id = %request.id, mv = %request.mv, "Submitting request");
                if pipeline.submit(request).await.is_err() {
                    tracing::warn!("Pipeline closed, ignoring request");
                    break;
                }
            }
            Ok(InboundMessage::Terminate) => break,
            Err(e) => tracing::warn!("Ignoring unparseable message: {}", e),
        }
    }

    pipeline.terminate();
    printer.abort();
    Ok(())
}

async fn run_opening_lookup(fen: &str, dir: PathBuf) -> anyhow::Result<()> {
    let index = OpeningIndex::new(FsSource::new(dir));
    let found = index
        .lookup(fen)
        .await
        .with_context(|| format!("opening lookup failed for \"{}\"", fen))?;
    match found {
        Some(opening) => println!("{}", serde_json::to_string(&opening)?),
        None => println!("null"),
    }
    Ok(())
}

//! Async adapter around the external search process.
//!
//! The process is a black box speaking a line protocol: it accepts a
//! position plus a move sequence, streams `info` lines while it thinks,
//! and terminates each search with one `bestmove` line. The adapter owns
//! the process exclusively and enforces the single-flight rule: at most
//! one search is in flight, and a search requested while one is active
//! stops the running search and settles its caller first.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chess::EngineScore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};

use crate::uci::{parse_uci_line, UciLine};
use crate::{OracleError, SearchOutcome};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MOVETIME_MS: u64 = 1000;

/// Per-search budget. The engine's own think-time bound is the only
/// latency limit the adapter enforces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub movetime: Option<u64>,
    pub depth: Option<u8>,
}

/// Configuration for spawning the search process.
#[derive(Debug, Clone, Default)]
pub struct OracleConfig {
    /// Explicit engine executable. When unset, common install locations
    /// are probed.
    pub executable: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

/// The awaitable search seam. The production implementation wraps the
/// external process; tests substitute a scripted oracle.
#[async_trait]
pub trait SearchOracle: Send + 'static {
    async fn search(
        &mut self,
        fen: &str,
        moves: &[String],
        limits: SearchLimits,
    ) -> Result<SearchOutcome, OracleError>;

    async fn shutdown(self: Box<Self>);
}

struct SearchRequest {
    fen: String,
    moves: Vec<String>,
    limits: SearchLimits,
    reply: oneshot::Sender<Result<SearchOutcome, OracleError>>,
}

/// Handle to a running search process.
pub struct Oracle {
    process: Child,
    search_tx: mpsc::Sender<SearchRequest>,
}

impl Oracle {
    /// Spawn the search process and complete the protocol handshake.
    ///
    /// Boot failure is terminal for this instance; the caller decides
    /// whether to construct a fresh one.
    #[tracing::instrument(level = "info")]
    pub async fn spawn(config: OracleConfig) -> Result<Self, OracleError> {
        let path = match config.executable {
            Some(ref path) => path.clone(),
            None => find_engine_path().ok_or(OracleError::ExecutableNotFound)?,
        };
        tracing::info!("Spawning search engine at {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(OracleError::Spawn)?;

        let stdin = process.stdin.take().ok_or(OracleError::BootClosed)?;
        let stdout = process.stdout.take().ok_or(OracleError::BootClosed)?;

        let (line_tx, mut line_rx) = mpsc::channel::<UciLine>(64);
        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(32);

        spawn_reader(stdout, line_tx);
        spawn_writer(stdin, stdin_rx);

        stdin_tx
            .send("uci\n".to_string())
            .await
            .map_err(|_| OracleError::BootClosed)?;
        wait_for(&mut line_rx, |line| matches!(line, UciLine::UciOk)).await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            let _ = stdin_tx
                .send(format!("setoption name Threads value {}\n", threads))
                .await;
        }
        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            let _ = stdin_tx
                .send(format!("setoption name Hash value {}\n", hash_mb))
                .await;
        }

        stdin_tx
            .send("isready\n".to_string())
            .await
            .map_err(|_| OracleError::BootClosed)?;
        wait_for(&mut line_rx, |line| matches!(line, UciLine::ReadyOk)).await?;

        let (search_tx, search_rx) = mpsc::channel::<SearchRequest>(32);
        tokio::spawn(run_oracle_actor(search_rx, line_rx, stdin_tx));

        tracing::info!("Search engine booted and ready");
        Ok(Self { process, search_tx })
    }

    /// Search a position. Suspends until the engine reports a terminal
    /// best move for this request (or an earlier stop is honored).
    pub async fn search(
        &self,
        fen: &str,
        moves: &[String],
        limits: SearchLimits,
    ) -> Result<SearchOutcome, OracleError> {
        let (reply, response) = oneshot::channel();
        self.search_tx
            .send(SearchRequest {
                fen: fen.to_string(),
                moves: moves.to_vec(),
                limits,
                reply,
            })
            .await
            .map_err(|_| OracleError::EngineClosed)?;
        response.await.map_err(|_| OracleError::EngineClosed)?
    }

    /// Quit the engine and release the process. Safe to call whether or
    /// not a search is active.
    pub async fn shutdown(mut self) {
        drop(self.search_tx);
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

#[async_trait]
impl SearchOracle for Oracle {
    async fn search(
        &mut self,
        fen: &str,
        moves: &[String],
        limits: SearchLimits,
    ) -> Result<SearchOutcome, OracleError> {
        Oracle::search(self, fen, moves, limits).await
    }

    async fn shutdown(self: Box<Self>) {
        Oracle::shutdown(*self).await;
    }
}

fn spawn_reader(stdout: tokio::process::ChildStdout, line_tx: mpsc::Sender<UciLine>) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::warn!("Engine stdout EOF");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    tracing::trace!("UCI << {}", trimmed);
                    match parse_uci_line(trimmed) {
                        UciLine::Other => {}
                        parsed => {
                            if line_tx.send(parsed).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading engine stdout: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("Engine reader task exiting");
    });
}

fn spawn_writer(mut stdin: tokio::process::ChildStdin, mut stdin_rx: mpsc::Receiver<String>) {
    tokio::spawn(async move {
        while let Some(cmd) = stdin_rx.recv().await {
            tracing::trace!("UCI >> {}", cmd.trim());
            if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                tracing::error!("Failed to write to engine stdin: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                tracing::error!("Failed to flush engine stdin: {}", e);
                break;
            }
        }
        tracing::debug!("Engine writer task exiting");
    });
}

async fn wait_for(
    line_rx: &mut mpsc::Receiver<UciLine>,
    pred: impl Fn(&UciLine) -> bool,
) -> Result<(), OracleError> {
    let wait = async {
        while let Some(line) = line_rx.recv().await {
            if pred(&line) {
                return Ok(());
            }
        }
        Err(OracleError::BootClosed)
    };
    tokio::time::timeout(HANDSHAKE_TIMEOUT, wait)
        .await
        .map_err(|_| OracleError::BootTimeout)?
}

struct ActiveSearch {
    reply: oneshot::Sender<Result<SearchOutcome, OracleError>>,
    last_score: Option<EngineScore>,
}

impl ActiveSearch {
    fn observe(&mut self, line: &UciLine) {
        if let UciLine::Info(info) = line {
            if let Some(score) = info.score {
                self.last_score = Some(score);
            }
        }
    }

    fn resolve(self, best_move: Option<String>) {
        let _ = self.reply.send(Ok(SearchOutcome {
            best_move,
            score: self.last_score,
        }));
    }

    fn fail(self) {
        let _ = self.reply.send(Err(OracleError::EngineClosed));
    }
}

/// The actor that owns the engine conversation. Requests arrive through
/// the mailbox; output lines arrive from the reader task. Exactly one
/// `ActiveSearch` exists at a time.
async fn run_oracle_actor(
    mut search_rx: mpsc::Receiver<SearchRequest>,
    mut line_rx: mpsc::Receiver<UciLine>,
    stdin_tx: mpsc::Sender<String>,
) {
    let mut active: Option<ActiveSearch> = None;

    loop {
        tokio::select! {
            req = search_rx.recv() => match req {
                None => {
                    tracing::debug!("Oracle handle dropped, quitting engine");
                    let _ = stdin_tx.send("quit\n".to_string()).await;
                    break;
                }
                Some(req) => {
                    if let Some(current) = active.take() {
                        // Single-flight: stop the running search and settle
                        // its caller with the best data gathered so far
                        // before the board state changes.
                        tracing::debug!("New search while one is active, sending stop");
                        let _ = stdin_tx.send("stop\n".to_string()).await;
                        if !settle(&mut line_rx, current).await {
                            ActiveSearch { reply: req.reply, last_score: None }.fail();
                            break;
                        }
                    }

                    let mut position = format!("position fen {}", req.fen);
                    if !req.moves.is_empty() {
                        position.push_str(" moves");
                        for mv in &req.moves {
                            position.push(' ');
                            position.push_str(mv);
                        }
                    }
                    position.push('\n');
                    tracing::debug!(fen = %req.fen, moves = req.moves.len(), "Starting search");

                    if stdin_tx.send(position).await.is_err()
                        || stdin_tx.send(go_command(req.limits)).await.is_err()
                    {
                        ActiveSearch { reply: req.reply, last_score: None }.fail();
                        break;
                    }
                    active = Some(ActiveSearch {
                        reply: req.reply,
                        last_score: None,
                    });
                }
            },

            line = line_rx.recv() => match line {
                None => {
                    tracing::warn!("Engine output stream closed");
                    if let Some(current) = active.take() {
                        current.fail();
                    }
                    break;
                }
                Some(UciLine::BestMove(best_move)) => match active.take() {
                    Some(current) => {
                        tracing::debug!(best_move = ?best_move, "Search finished");
                        current.resolve(best_move);
                    }
                    None => tracing::warn!("Unsolicited bestmove line ignored"),
                },
                Some(line) => {
                    if let Some(current) = active.as_mut() {
                        current.observe(&line);
                    }
                }
            }
        }
    }

    tracing::debug!("Oracle actor exiting");
}

/// Drain output lines until the active search's terminal bestmove arrives,
/// then resolve its caller. Returns false if the engine died first.
async fn settle(line_rx: &mut mpsc::Receiver<UciLine>, mut active: ActiveSearch) -> bool {
    while let Some(line) = line_rx.recv().await {
        match line {
            UciLine::BestMove(best_move) => {
                active.resolve(best_move);
                return true;
            }
            other => active.observe(&other),
        }
    }
    active.fail();
    false
}

fn go_command(limits: SearchLimits) -> String {
    if let Some(movetime) = limits.movetime {
        format!("go movetime {}\n", movetime)
    } else if let Some(depth) = limits.depth {
        format!("go depth {}\n", depth)
    } else {
        format!("go movetime {}\n", DEFAULT_MOVETIME_MS)
    }
}

/// Probe common install locations for a UCI engine executable.
fn find_engine_path() -> Option<PathBuf> {
    let candidates = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // in PATH
    ];

    for candidate in candidates {
        let path = Path::new(candidate);
        if path.exists() || candidate == "stockfish" {
            if std::process::Command::new(candidate)
                .arg("--help")
                .output()
                .is_ok()
            {
                return Some(PathBuf::from(candidate));
            }
        }
    }

    None
}

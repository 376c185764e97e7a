//! The pipeline's worker loop.
//!
//! One actor task owns the oracle and drains the request mailbox strictly
//! sequentially: the next request starts only after the current one's
//! result (or early exit) has been emitted. Requests submitted while the
//! engine boots sit in the mailbox and drain FIFO once it is ready.

use std::sync::Arc;

use analysis::{
    classify_move, compute_move_report, is_blunder, is_within_recording_cap_at, MoveComparison,
};
use engine::{OracleError, SearchOracle};
use tokio::sync::{broadcast, mpsc, watch};

use crate::correlation::CorrelationMap;
use crate::messages::{AnalysisRequest, AnalysisResult, PipelineEvent};
use crate::PipelineConfig;

/// Positions with this many legal replies or fewer are treated as forced;
/// a forced move is never a punishable blunder.
const FORCED_REPLY_MAX: usize = 2;

pub(crate) async fn run_pipeline_actor<F>(
    config: PipelineConfig,
    boot: F,
    mut cmd_rx: mpsc::Receiver<AnalysisRequest>,
    mut terminate_rx: watch::Receiver<bool>,
    event_tx: broadcast::Sender<PipelineEvent>,
    correlation: Arc<CorrelationMap>,
) where
    F: std::future::Future<Output = Result<Box<dyn SearchOracle>, OracleError>> + Send + 'static,
{
    let _ = event_tx.send(PipelineEvent::Log {
        message: "booting search engine".to_string(),
    });

    let mut oracle = match boot.await {
        Ok(oracle) => oracle,
        Err(e) => {
            tracing::error!("Engine boot failed: {}", e);
            let _ = event_tx.send(PipelineEvent::Error {
                id: None,
                message: format!("engine failed to start: {}", e),
            });
            run_error_state(&mut cmd_rx, &mut terminate_rx, &event_tx, &correlation).await;
            correlation.clear();
            return;
        }
    };

    tracing::info!("Analysis pipeline ready");
    let _ = event_tx.send(PipelineEvent::Ready);

    loop {
        tokio::select! {
            biased;

            _ = terminate_rx.changed() => {
                tracing::info!("Pipeline terminating, discarding pending requests");
                break;
            }

            req = cmd_rx.recv() => {
                let Some(req) = req else { break };

                let _ = event_tx.send(PipelineEvent::AnalysisStarted {
                    id: req.id.clone(),
                    mv: req.mv.clone(),
                });

                match analyze_request(oracle.as_mut(), &config, &req).await {
                    Ok(mut result) => {
                        result.move_index = correlation.take(&req.id);
                        tracing::debug!(
                            id = %result.id,
                            delta = ?result.delta,
                            blunder = result.blunder,
                            "Analysis complete"
                        );
                        let _ = event_tx.send(PipelineEvent::Analysis(result));
                    }
                    Err(AnalyzeError::Request(message)) => {
                        // A bad request does not poison the queue.
                        correlation.take(&req.id);
                        tracing::warn!(id = %req.id, "Request rejected: {}", message);
                        let _ = event_tx.send(PipelineEvent::Error {
                            id: Some(req.id),
                            message,
                        });
                    }
                    Err(AnalyzeError::Oracle(e)) => {
                        correlation.take(&req.id);
                        let message = format!("engine failure: {}", e);
                        tracing::error!(id = %req.id, "{}", message);
                        let _ = event_tx.send(PipelineEvent::Error { id: None, message });
                        run_error_state(&mut cmd_rx, &mut terminate_rx, &event_tx, &correlation)
                            .await;
                        break;
                    }
                }
            }
        }
    }

    correlation.clear();
    oracle.shutdown().await;
    tracing::info!("Pipeline actor exited");
}

/// Terminal error state: report every buffered and subsequently submitted
/// request without contacting the oracle, until the handle goes away.
async fn run_error_state(
    cmd_rx: &mut mpsc::Receiver<AnalysisRequest>,
    terminate_rx: &mut watch::Receiver<bool>,
    event_tx: &broadcast::Sender<PipelineEvent>,
    correlation: &CorrelationMap,
) {
    loop {
        tokio::select! {
            biased;

            _ = terminate_rx.changed() => break,

            req = cmd_rx.recv() => match req {
                None => break,
                Some(req) => {
                    correlation.take(&req.id);
                    let _ = event_tx.send(PipelineEvent::Error {
                        id: Some(req.id),
                        message: "analysis pipeline is in a failed state".to_string(),
                    });
                }
            }
        }
    }
}

enum AnalyzeError {
    /// Bad input; the queue keeps going.
    Request(String),
    /// Oracle-level failure; the queue enters the terminal error state.
    Oracle(OracleError),
}

impl From<OracleError> for AnalyzeError {
    fn from(e: OracleError) -> Self {
        Self::Oracle(e)
    }
}

/// Run the up-to-three searches for one request and fold them into a
/// result. All searches evaluate positions *after* a move was appended,
/// so the two sides of the comparison were searched under the same rules.
async fn analyze_request(
    oracle: &mut dyn SearchOracle,
    config: &PipelineConfig,
    req: &AnalysisRequest,
) -> Result<AnalysisResult, AnalyzeError> {
    let side = chess::side_to_move(&req.fen)
        .map_err(|e| AnalyzeError::Request(format!("invalid fen \"{}\": {}", req.fen, e)))?;
    let player = req.player_color.to_color();

    // 1. Bare search: what would the engine play here?
    let base = oracle.search(&req.fen, &[], config.limits).await?;
    let Some(best_move) = base.best_move else {
        // No legal replies (mate/stalemate already on the board). A
        // defined result, not an error.
        return Ok(AnalysisResult {
            id: req.id.clone(),
            mv: req.mv.clone(),
            best_move: None,
            best_eval: None,
            played_eval: None,
            delta: None,
            blunder: false,
            quality: None,
            move_index: None,
        });
    };

    // 2. Evaluate the position after the played move; after the best move
    // too when it differs. Identical moves reuse the played-move search.
    let played_outcome = oracle
        .search(&req.fen, std::slice::from_ref(&req.mv), config.limits)
        .await?;
    let best_outcome = if best_move == req.mv {
        None
    } else {
        Some(
            oracle
                .search(&req.fen, std::slice::from_ref(&best_move), config.limits)
                .await?,
        )
    };

    let report = compute_move_report(&MoveComparison {
        best_move: &best_move,
        played_move: &req.mv,
        post_played_score: played_outcome.score,
        post_best_score: best_outcome.as_ref().and_then(|o| o.score),
        side_to_move: !side,
        player,
    });

    // 3. Forced-move and recording-cap short-circuits, then the scaled
    // threshold. The best-move eval doubles as the pre-move evaluation.
    let replies = match req.legal_move_count {
        Some(n) => Some(n as usize),
        None => chess::legal_reply_count(&req.fen),
    };
    let forced = replies.is_some_and(|n| n <= FORCED_REPLY_MAX);
    let recordable = is_within_recording_cap_at(req.move_index, config.recording_cap);
    let blunder = !forced && recordable && is_blunder(report.delta, report.best_eval);

    Ok(AnalysisResult {
        id: req.id.clone(),
        mv: req.mv.clone(),
        best_move: Some(best_move),
        best_eval: report.best_eval,
        played_eval: report.played_eval,
        delta: report.delta,
        blunder,
        quality: classify_move(report.delta),
        move_index: None,
    })
}

//! Wire types crossing the pipeline boundary.
//!
//! Field names are camelCase to match the browser-facing protocol; events
//! are tagged with a `type` discriminator.

use analysis::MoveQuality;
use chess::PlayerColor;
use serde::{Deserialize, Serialize};

/// One "evaluate this played move" request.
///
/// `id` is the only join key between a request and its result; it must be
/// unique for the lifetime of the queue. `move_index` is the ply number
/// (0 = first move of the game), used for ordered bookkeeping by the
/// caller and for the recording cap — it never enters the scoring math.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub id: String,
    pub fen: String,
    #[serde(rename = "move")]
    pub mv: String,
    pub player_color: PlayerColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_index: Option<i64>,
    /// Caller-supplied legal-reply count for the position. When absent it
    /// is computed locally from the FEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_move_count: Option<u32>,
}

/// The judgment for one played move.
///
/// All evaluations are centipawns in the player's perspective. `None`
/// means no evaluation was available (e.g. no legal replies) and is
/// distinct from a dead-equal `0`. When `best_move == mv`, `delta` is `0`
/// by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    #[serde(rename = "move")]
    pub mv: String,
    pub best_move: Option<String>,
    pub best_eval: Option<i32>,
    pub played_eval: Option<i32>,
    pub delta: Option<i32>,
    pub blunder: bool,
    /// Live-scale annotation derived from `delta`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<MoveQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_index: Option<i64>,
}

/// Lifecycle and result messages emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PipelineEvent {
    /// The search engine booted; buffered requests are draining.
    Ready,
    /// Echoed as soon as a request starts processing, for UI feedback.
    AnalysisStarted {
        id: String,
        #[serde(rename = "move")]
        mv: String,
    },
    Analysis(AnalysisResult),
    /// `id` is present for request-scoped failures, absent for fatal
    /// pipeline-level ones.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        message: String,
    },
    /// Diagnostic only; consumers must not depend on its contents.
    Log { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_camel_case() {
        let json = r#"{
            "id": "r1",
            "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "move": "e2e4",
            "playerColor": "white",
            "moveIndex": 0,
            "legalMoveCount": 20
        }"#;
        let req: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.mv, "e2e4");
        assert_eq!(req.player_color, PlayerColor::White);
        assert_eq!(req.move_index, Some(0));
        assert_eq!(req.legal_move_count, Some(20));
    }

    #[test]
    fn optional_request_fields_default() {
        let json = r#"{"id": "r2", "fen": "f", "move": "e2e4", "playerColor": "black"}"#;
        let req: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.move_index, None);
        assert_eq!(req.legal_move_count, None);
    }

    #[test]
    fn events_carry_a_type_tag() {
        let ready = serde_json::to_value(&PipelineEvent::Ready).unwrap();
        assert_eq!(ready["type"], "ready");

        let started = serde_json::to_value(&PipelineEvent::AnalysisStarted {
            id: "r1".into(),
            mv: "e2e4".into(),
        })
        .unwrap();
        assert_eq!(started["type"], "analysis-started");
        assert_eq!(started["move"], "e2e4");

        let error = serde_json::to_value(&PipelineEvent::Error {
            id: None,
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(error["type"], "error");
        assert!(error.get("id").is_none());
    }

    #[test]
    fn result_event_flattens_result_fields() {
        let event = PipelineEvent::Analysis(AnalysisResult {
            id: "r1".into(),
            mv: "e2e4".into(),
            best_move: Some("d2d4".into()),
            best_eval: Some(30),
            played_eval: Some(20),
            delta: Some(10),
            blunder: false,
            quality: analysis::classify_move(Some(10)),
            move_index: Some(4),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "analysis");
        assert_eq!(value["bestEval"], 30);
        assert_eq!(value["moveIndex"], 4);
        assert_eq!(value["quality"], "good");
    }
}

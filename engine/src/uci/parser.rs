//! Line parser for the engine's text protocol.
//!
//! The engine speaks a line-oriented protocol: zero or more `info` lines
//! while it searches, then exactly one `bestmove` line. Lines that carry
//! nothing we consume parse to `UciLine::Other`.

use chess::{format_uci_move, parse_uci_move, EngineScore};

/// One parsed line from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciLine {
    UciOk,
    ReadyOk,
    Id { field: String, value: String },
    /// `bestmove <move>`; `bestmove (none)` (no legal replies) is `None`.
    BestMove(Option<String>),
    Info(InfoLine),
    /// Anything we do not consume (option listings, debug strings).
    Other,
}

/// Search-progress fields from an `info` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub score: Option<EngineScore>,
    /// Principal variation as engine-notation move strings.
    pub pv: Vec<String>,
}

/// Parse one line of engine output. Never fails: unrecognized lines are
/// `Other` so the reader can skip them at trace level.
pub fn parse_uci_line(line: &str) -> UciLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => UciLine::UciOk,
        Some(&"readyok") => UciLine::ReadyOk,

        Some(&"id") if tokens.len() >= 3 => UciLine::Id {
            field: tokens[1].to_string(),
            value: tokens[2..].join(" "),
        },

        Some(&"bestmove") => match tokens.get(1) {
            None | Some(&"(none)") => UciLine::BestMove(None),
            // Canonicalize through the move codec so downstream string
            // comparison is not sensitive to engine quirks.
            Some(tok) => match parse_uci_move(tok) {
                Ok(mv) => UciLine::BestMove(Some(format_uci_move(mv))),
                Err(_) => UciLine::Other,
            },
        },

        Some(&"info") => UciLine::Info(parse_info_line(&tokens[1..])),

        _ => UciLine::Other,
    }
}

fn parse_info_line(tokens: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&kind) = tokens.get(i) {
                    i += 1;
                    if let Some(value) = tokens.get(i) {
                        info.score = match kind {
                            "cp" => value.parse().ok().map(EngineScore::Centipawns),
                            "mate" => value.parse().ok().map(EngineScore::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                // Collect all moves until the next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if let Ok(mv) = parse_uci_move(tokens[i]) {
                        info.pv.push(format_uci_move(mv));
                    }
                    i += 1;
                }
                continue;
            }
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

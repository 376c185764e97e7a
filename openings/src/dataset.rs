//! Dataset file formats and the transport seam they are fetched through.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resource name of the flat opening list.
pub const ENTRIES_RESOURCE: &str = "openings.json";

/// Resource name of the precomputed position index.
pub const POSITIONS_RESOURCE: &str = "openings_by_position.json";

/// One named opening line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningEntry {
    pub eco: String,
    pub name: String,
    pub pgn: String,
    pub uci: String,
    pub epd: String,
}

/// The winning `{eco, name}` pair for one normalized position, chosen at
/// dataset-build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub eco: String,
    pub name: String,
}

/// Manifest + payload of the flat entry list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntriesFile {
    pub dataset: String,
    pub source_commit: String,
    pub entry_count: usize,
    pub entries: Vec<OpeningEntry>,
}

/// Manifest + payload of the position index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsFile {
    pub dataset: String,
    pub source_commit: String,
    pub position_count: usize,
    pub by_position: HashMap<String, PositionRecord>,
}

/// A transport failure, naming the resource that could not be fetched.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch dataset resource {resource}: {message}")]
pub struct SourceError {
    pub resource: String,
    pub message: String,
}

/// Where dataset documents come from. Production reads them from disk;
/// tests substitute an in-memory source that counts fetches.
#[async_trait]
pub trait DatasetSource: Send + Sync + 'static {
    async fn fetch(&self, resource: &str) -> Result<String, SourceError>;
}

/// Filesystem-backed dataset source.
pub struct FsSource {
    dir: PathBuf,
}

impl FsSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DatasetSource for FsSource {
    async fn fetch(&self, resource: &str) -> Result<String, SourceError> {
        let path = self.dir.join(resource);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceError {
                resource: resource.to_string(),
                message: format!("{} ({})", e, path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("openings.json"), "{}").unwrap();
        let source = FsSource::new(dir.path());
        assert_eq!(source.fetch("openings.json").await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn fs_source_error_names_the_resource() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path());
        let err = source.fetch("openings.json").await.unwrap_err();
        assert_eq!(err.resource, "openings.json");
    }

    #[test]
    fn dataset_files_round_trip() {
        let json = r#"{
            "dataset": "eco-openings",
            "source_commit": "abc123",
            "entry_count": 1,
            "entries": [
                {"eco": "B20", "name": "Sicilian Defense", "pgn": "1. e4 c5",
                 "uci": "e2e4 c7c5",
                 "epd": "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -"}
            ]
        }"#;
        let file: EntriesFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.entry_count, 1);
        assert_eq!(file.entries[0].eco, "B20");
    }
}

//! The runtime lookup side of the opening index.

use std::collections::HashMap;
use std::sync::Arc;

use chess::epd_key;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::dataset::{
    DatasetSource, EntriesFile, OpeningEntry, PositionRecord, PositionsFile, ENTRIES_RESOURCE,
    POSITIONS_RESOURCE,
};
use crate::OpeningError;

/// Fixed tag identifying where a match came from.
pub const OPENING_SOURCE_TAG: &str = "book";

/// A matched opening for a queried position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningMatch {
    pub eco: String,
    pub name: String,
    /// Text after the ':' separator in the name. Derived at lookup time,
    /// never stored in the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub source: &'static str,
}

impl OpeningMatch {
    fn from_record(record: &PositionRecord) -> Self {
        let variation = record
            .name
            .split_once(':')
            .map(|(_, rest)| rest.trim().to_string());
        Self {
            eco: record.eco.clone(),
            name: record.name.clone(),
            variation,
            source: OPENING_SOURCE_TAG,
        }
    }
}

/// The verified, immutable dataset held for the process lifetime.
struct OpeningBook {
    dataset: String,
    source_commit: String,
    entries: Vec<OpeningEntry>,
    by_position: HashMap<String, PositionRecord>,
}

/// Lazily-loaded opening index with a per-position result memo.
///
/// The book mutex is held across the dataset fetch, so concurrent first
/// lookups collapse into a single load. A failed load leaves the slot
/// empty; the next lookup retries from scratch.
pub struct OpeningIndex<S> {
    source: S,
    book: Mutex<Option<Arc<OpeningBook>>>,
    /// Lookup memo, including explicit misses. Never evicted.
    memo: std::sync::Mutex<HashMap<String, Option<OpeningMatch>>>,
}

impl<S: DatasetSource> OpeningIndex<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            book: Mutex::new(None),
            memo: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Map a live FEN to its named opening, or `None` when the position is
    /// out of book. Both hits and misses are memoized for the life of the
    /// process.
    pub async fn lookup(&self, fen: &str) -> Result<Option<OpeningMatch>, OpeningError> {
        let key = epd_key(fen)?;

        if let Some(cached) = self.memo.lock().expect("memo lock").get(&key) {
            return Ok(cached.clone());
        }

        let book = self.ensure_loaded().await?;
        let result = book.by_position.get(&key).map(OpeningMatch::from_record);

        self.memo
            .lock()
            .expect("memo lock")
            .insert(key, result.clone());
        Ok(result)
    }

    /// Number of openings in the loaded book, if loaded.
    pub async fn entry_count(&self) -> Option<usize> {
        self.book.lock().await.as_ref().map(|b| b.entries.len())
    }

    /// Test/reset hook: drop the loaded book and the lookup memo so the
    /// next lookup loads from scratch.
    pub async fn reset(&self) {
        *self.book.lock().await = None;
        self.memo.lock().expect("memo lock").clear();
    }

    async fn ensure_loaded(&self) -> Result<Arc<OpeningBook>, OpeningError> {
        let mut slot = self.book.lock().await;
        if let Some(book) = slot.as_ref() {
            return Ok(book.clone());
        }

        let book = Arc::new(load_book(&self.source).await?);
        tracing::info!(
            dataset = %book.dataset,
            source_commit = %book.source_commit,
            entries = book.entries.len(),
            positions = book.by_position.len(),
            "Opening dataset loaded"
        );
        *slot = Some(book.clone());
        Ok(book)
    }
}

async fn load_book<S: DatasetSource>(source: &S) -> Result<OpeningBook, OpeningError> {
    let entries_raw = source.fetch(ENTRIES_RESOURCE).await?;
    let entries: EntriesFile =
        serde_json::from_str(&entries_raw).map_err(|e| OpeningError::Parse {
            resource: ENTRIES_RESOURCE.to_string(),
            source: e,
        })?;

    let positions_raw = source.fetch(POSITIONS_RESOURCE).await?;
    let positions: PositionsFile =
        serde_json::from_str(&positions_raw).map_err(|e| OpeningError::Parse {
            resource: POSITIONS_RESOURCE.to_string(),
            source: e,
        })?;

    if entries.dataset != positions.dataset || entries.source_commit != positions.source_commit {
        return Err(OpeningError::IdentityMismatch {
            entries_dataset: entries.dataset,
            entries_commit: entries.source_commit,
            positions_dataset: positions.dataset,
            positions_commit: positions.source_commit,
        });
    }
    if entries.entry_count != entries.entries.len() {
        return Err(OpeningError::EntryCountMismatch {
            declared: entries.entry_count,
            actual: entries.entries.len(),
        });
    }
    if positions.position_count != positions.by_position.len() {
        return Err(OpeningError::PositionCountMismatch {
            declared: positions.position_count,
            actual: positions.by_position.len(),
        });
    }

    Ok(OpeningBook {
        dataset: entries.dataset,
        source_commit: entries.source_commit,
        entries: entries.entries,
        by_position: positions.by_position,
    })
}

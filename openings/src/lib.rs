//! Opening Transposition Index: maps a live position to a named opening.
//!
//! The dataset ships as two co-versioned JSON documents built offline: a
//! flat entry list and a position index whose transposition tie-breaks
//! were already resolved at build time. The runtime's job is to load and
//! verify them once, normalize query positions consistently, and answer
//! lookups from memory.

pub mod dataset;
pub mod index;

pub use dataset::{
    DatasetSource, EntriesFile, FsSource, OpeningEntry, PositionRecord, PositionsFile,
    SourceError, ENTRIES_RESOURCE, POSITIONS_RESOURCE,
};
pub use index::{OpeningIndex, OpeningMatch, OPENING_SOURCE_TAG};

/// Errors from loading or querying the opening index.
#[derive(Debug, thiserror::Error)]
pub enum OpeningError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to parse dataset resource {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "dataset identity mismatch: entries are {entries_dataset}@{entries_commit}, \
         positions are {positions_dataset}@{positions_commit}"
    )]
    IdentityMismatch {
        entries_dataset: String,
        entries_commit: String,
        positions_dataset: String,
        positions_commit: String,
    },

    #[error("entry count mismatch: manifest declares {declared}, file holds {actual}")]
    EntryCountMismatch { declared: usize, actual: usize },

    #[error("position count mismatch: manifest declares {declared}, file holds {actual}")]
    PositionCountMismatch { declared: usize, actual: usize },

    #[error(transparent)]
    Fen(#[from] chess::FenError),
}

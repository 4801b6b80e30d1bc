//! folio search library
//!
//! Builds the `search-index.json` aggregate: one entry per published page
//! and an inverted term index with CJK-aware tokenization.

pub mod index;

pub use index::{MAX_INDEX_SIZE, SearchIndex, SearchIndexEntry};
use thiserror::Error;

/// Search-related errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

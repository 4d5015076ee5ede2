pub mod collection;
pub mod filter;
pub mod hnsw_index;
pub mod sqlite_repo;

pub use collection::ResumeCollection;
pub use filter::SearchFilter;

use resume_model::{ResumeId, ResumePayload};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Vector size contract violated. Fatal; never retried.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Index/storage backend unavailable or misbehaving. Transient.
    #[error("backend error: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// One similarity hit: stored payload plus its cosine-type score in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResume {
    pub id: ResumeId,
    pub score: f32,
    pub payload: ResumePayload,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum number of hits returned.
    pub limit: usize,
    /// KNN overfetch multiplier so post-filtering still fills `limit`.
    pub fetch_factor: usize,
    /// Post-hoc score floor. When every hit falls below it, the unfloored
    /// set is returned instead of an empty list.
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { limit: 50, fetch_factor: 10, min_score: 0.3 }
    }
}

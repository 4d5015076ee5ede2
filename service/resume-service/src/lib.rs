pub mod blob;
pub mod extract;
pub mod keywords;
pub mod oracle;
pub mod rank;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use embedding_provider::config::default_hashing_config;
use embedding_provider::embedder::{Embedder, HashingConfig, HashingEmbedder};
use resume_model::{ResumeId, ResumePayload, ResumeRecord};
use resume_store::filter::FilterError;
use resume_store::{ResumeCollection, SearchFilter, SearchOptions, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::blob::{BlobStore, FsBlobStore};
use crate::extract::{DocumentExtractor, PlainTextExtractor};
use crate::keywords::KeywordExpander;
use crate::oracle::{HttpKeywordOracle, KeywordOracle, NullOracle};
use crate::rank::SearchResult;

/// Stage-qualified service error: every external-call failure names the
/// stage it happened in, so callers can report which step of an upload or
/// search went wrong.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("blob store error: {0}")]
    Store(String),
    #[error("extraction error: {0}")]
    Extract(String),
    #[error("embedder error: {0}")]
    Embed(String),
    #[error("index error: {0}")]
    Index(#[from] StoreError),
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure of the raw-file store. Fatal to the single upload.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of text/field extraction. Fatal to the single upload.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported file type {0:?}, only PDF and DOCX are supported")]
    UnsupportedFormat(String),
    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Keyword-oracle failure. Non-fatal; searches degrade to query tokens.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Payload DB path; the HNSW snapshot lives next to it.
    pub db_path: PathBuf,
    /// Directory for stored upload blobs (filesystem reference store).
    pub blob_dir: PathBuf,
    pub embedder: HashingConfig,
    /// Maximum hits returned per search.
    pub search_limit: usize,
    /// KNN overfetch multiplier so filtering still fills the limit.
    pub fetch_factor: usize,
    /// Similarity floor; when every hit is below it the unfloored set is
    /// returned instead of nothing.
    pub min_score: f32,
    /// Keyword-oracle endpoint; `None` disables expansion.
    pub oracle_endpoint: Option<String>,
    pub oracle_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("target/demo/resumes.db"),
            blob_dir: PathBuf::from("target/demo/blobs"),
            embedder: default_hashing_config(),
            search_limit: 50,
            fetch_factor: 10,
            min_score: 0.3,
            oracle_endpoint: None,
            oracle_timeout: Duration::from_secs(10),
        }
    }
}

/// Optional caller-provided values that win over extracted ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadOverrides {
    pub department: Option<String>,
    pub experience_years: Option<String>,
}

/// Declarative search filters as they arrive from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub experience: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub message: String,
    pub id: ResumeId,
    pub data: ResumePayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Expanded vocabulary, for client-side highlighting.
    pub highlight_words: Vec<String>,
}

/// Display-safe listing row (payload fields, no vector).
#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub id: ResumeId,
    pub candidate_name: String,
    pub email: String,
    pub experience_years: u32,
    pub department: String,
    pub s3_url: String,
    pub resume_text: String,
}

/// The resume ingestion-and-search service.
///
/// Stateless per request: the collection, embedder and oracle are shared
/// across threads; each upload or search runs to completion or fails as a
/// whole.
pub struct ResumeService {
    cfg: ServiceConfig,
    collection: ResumeCollection,
    embedder: Arc<dyn Embedder>,
    blob_store: Arc<dyn BlobStore>,
    extractor: Arc<dyn DocumentExtractor>,
    expander: KeywordExpander,
}

impl ResumeService {
    /// Build the service with the reference collaborators: hashing embedder,
    /// filesystem blob store, plain-text extractor, and the HTTP oracle when
    /// an endpoint is configured.
    pub fn new(cfg: ServiceConfig) -> Result<Self, ServiceError> {
        let embedder = HashingEmbedder::new(cfg.embedder.clone())
            .map_err(|e| ServiceError::Embed(e.to_string()))?;
        let oracle: Arc<dyn KeywordOracle> = match &cfg.oracle_endpoint {
            Some(endpoint) => Arc::new(
                HttpKeywordOracle::new(endpoint.clone(), cfg.oracle_timeout)
                    .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?,
            ),
            None => Arc::new(NullOracle),
        };
        let blob_store = Arc::new(FsBlobStore::new(cfg.blob_dir.clone()));
        Self::with_collaborators(cfg, Arc::new(embedder), blob_store, Arc::new(PlainTextExtractor), oracle)
    }

    /// Build the service with explicit collaborators (production adapters,
    /// test doubles).
    pub fn with_collaborators(
        cfg: ServiceConfig,
        embedder: Arc<dyn Embedder>,
        blob_store: Arc<dyn BlobStore>,
        extractor: Arc<dyn DocumentExtractor>,
        oracle: Arc<dyn KeywordOracle>,
    ) -> Result<Self, ServiceError> {
        let collection = ResumeCollection::open(&cfg.db_path, embedder.info().dimension)?;
        Ok(Self {
            cfg,
            collection,
            embedder,
            blob_store,
            extractor,
            expander: KeywordExpander::new(oracle),
        })
    }

    pub fn collection(&self) -> &ResumeCollection {
        &self.collection
    }

    /// Ingest one upload: blob store, extract, build the record, embed,
    /// upsert. Each stage failure is attributable; a failed index write
    /// leaves no partial record (the already-stored blob is not rolled
    /// back).
    pub fn upload(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        content_type: &str,
        overrides: &UploadOverrides,
    ) -> Result<UploadReceipt, ServiceError> {
        if file_bytes.is_empty() {
            return Err(ServiceError::InvalidRequest("no resume file provided".into()));
        }

        let s3_url = self
            .blob_store
            .store(file_bytes, file_name, content_type)
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let extracted = self
            .extractor
            .extract(file_bytes, file_name)
            .map_err(|e| ServiceError::Extract(e.to_string()))?;

        let payload = ResumePayload::compose(
            &extracted,
            s3_url,
            overrides.department.as_deref(),
            overrides.experience_years.as_deref(),
        );

        let vector = self
            .embedder
            .embed(&payload.resume_text)
            .map_err(|e| ServiceError::Embed(e.to_string()))?;

        let id = new_resume_id(&payload.resume_text);
        debug!(id = %id, file_name, "ingesting resume");
        let record = ResumeRecord { id: id.clone(), vector, payload: payload.clone() };
        self.collection.upsert(&record)?;

        Ok(UploadReceipt {
            message: "Upload and processing complete!".into(),
            id,
            data: payload,
        })
    }

    /// Embed the query, run the filtered similarity search, expand the
    /// keyword vocabulary and re-rank. Oracle unavailability never fails the
    /// request; embedder and index failures do, stage-qualified.
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchResponse, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidRequest("a search query is required".into()));
        }

        let filter = SearchFilter::compile(&filters.department, &filters.experience)?;

        let query_vector = self
            .embedder
            .embed(query)
            .map_err(|e| ServiceError::Embed(e.to_string()))?;

        let opts = SearchOptions {
            limit: self.cfg.search_limit,
            fetch_factor: self.cfg.fetch_factor,
            min_score: self.cfg.min_score,
        };
        let hits = self.collection.search(&query_vector, filter.as_ref(), &opts)?;
        debug!(hits = hits.len(), "similarity search complete");

        let vocabulary = self.expander.expand(query);
        let results = rank::rank(hits, &vocabulary);

        Ok(SearchResponse {
            results,
            highlight_words: vocabulary.into_iter().collect(),
        })
    }

    /// Display-safe payload fields of every stored record.
    pub fn list(&self) -> Result<Vec<ResumeSummary>, ServiceError> {
        let records = self.collection.scan_all()?;
        Ok(records
            .into_iter()
            .map(|r| ResumeSummary {
                id: r.id,
                candidate_name: r.payload.candidate_name,
                email: r.payload.email,
                experience_years: r.payload.experience_years,
                department: r.payload.department,
                s3_url: r.payload.s3_url,
                resume_text: r.payload.resume_text,
            })
            .collect())
    }
}

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque, unique, immutable id: content hash + timestamp + process-wide
/// sequence (identical texts uploaded in the same millisecond still get
/// distinct ids).
fn new_resume_id(text: &str) -> ResumeId {
    let digest = Sha256::digest(text.as_bytes());
    let ts = Utc::now().timestamp_millis();
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    ResumeId(format!(
        "resume-{ts:x}-{:02x}{:02x}{:02x}{:02x}-{seq}",
        digest[0], digest[1], digest[2], digest[3],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_ids_are_unique_for_identical_text() {
        let a = new_resume_id("same text");
        let b = new_resume_id("same text");
        assert_ne!(a, b);
        assert!(a.0.starts_with("resume-"));
    }
}

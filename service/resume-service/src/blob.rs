use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::BlobError;

/// Durable storage for the raw uploaded file; returns a retrievable URL.
pub trait BlobStore: Send + Sync {
    fn store(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<String, BlobError>;
}

/// Filesystem-backed blob store. Object keys mirror the production layout
/// (`resumes/<digest>.<ext>`); the returned URL is a `file://` path.
pub struct FsBlobStore {
    root: PathBuf,
    seq: AtomicU64,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), seq: AtomicU64::new(0) }
    }
}

impl BlobStore for FsBlobStore {
    fn store(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        _content_type: &str,
    ) -> Result<String, BlobError> {
        let extension = file_name
            .rsplit('.')
            .next()
            .filter(|e| !e.is_empty())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        // Content digest + timestamp + sequence keeps keys unique even for
        // byte-identical uploads in the same millisecond.
        let mut hasher = Sha256::new();
        hasher.update(file_bytes);
        hasher.update(Utc::now().timestamp_millis().to_le_bytes());
        hasher.update(self.seq.fetch_add(1, Ordering::Relaxed).to_le_bytes());
        let digest = hasher.finalize();
        let key = format!(
            "resumes/{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}.{extension}",
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        );

        let path = self.root.join(&key);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| BlobError::Unavailable(e.to_string()))?;
        }
        std::fs::write(&path, file_bytes).map_err(|e| BlobError::Unavailable(e.to_string()))?;
        Ok(format!("file://{}", path.display()))
    }
}

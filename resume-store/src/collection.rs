use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use resume_model::{ResumeId, ResumeRecord};

use crate::hnsw_index::HnswVectorIndex;
use crate::sqlite_repo::ResumeRepo;
use crate::{ScoredResume, SearchFilter, SearchOptions, StoreError};

/// The single collection abstraction over payload rows + HNSW vectors.
///
/// The payload repo is opened per operation; the HNSW index stays resident
/// behind a lock so the collection is safe to share across request threads.
pub struct ResumeCollection {
    db_path: PathBuf,
    hnsw_dir: PathBuf,
    dim: usize,
    hnsw: RwLock<Option<HnswVectorIndex>>,
}

impl ResumeCollection {
    /// Open (and provision if absent) the collection rooted at `db_path`
    /// with the given vector dimension. The dimension is fixed for the
    /// collection's lifetime; changing the embedder means re-embedding.
    pub fn open(db_path: impl Into<PathBuf>, dim: usize) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let hnsw_dir = derive_hnsw_dir(&db_path);
        let collection = Self { db_path, hnsw_dir, dim, hnsw: RwLock::new(None) };
        collection.ensure_collection()?;
        Ok(collection)
    }

    /// Idempotent provisioning: payload schema + secondary indexes, and the
    /// resident HNSW index (loaded from its snapshot when one exists).
    /// Cheap no-op once provisioned; called before every operation so
    /// callers never track provisioning state themselves.
    pub fn ensure_collection(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        // Schema init is IF NOT EXISTS all the way down.
        let _ = self.open_repo()?;
        let mut guard = self.hnsw_guard_mut()?;
        if guard.is_none() {
            let index = if HnswVectorIndex::snapshot_exists(&self.hnsw_dir) {
                HnswVectorIndex::load(&self.hnsw_dir, self.dim)?
            } else {
                HnswVectorIndex::new(self.dim, 10_000)
            };
            *guard = Some(index);
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Upsert one record. Fails with `DimensionMismatch` when the vector
    /// does not match the collection dimension; an existing record with the
    /// same id is overwritten. The record is visible to searches as soon as
    /// this returns.
    pub fn upsert(&self, record: &ResumeRecord) -> Result<(), StoreError> {
        self.ensure_collection()?;
        if record.vector.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: record.vector.len(),
            });
        }
        let repo = self.open_repo()?;
        repo.upsert_resume(record)?;
        let mut guard = self.hnsw_guard_mut()?;
        let index = guard
            .as_mut()
            .ok_or_else(|| StoreError::Backend("hnsw index not provisioned".into()))?;
        index.upsert(&record.id, &record.vector);
        if let Err(e) = index.save(&self.hnsw_dir) {
            // Roll the row back so a failed upsert leaves no partial record.
            let _ = repo.delete_resume(&record.id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Filtered nearest-neighbor search ordered by descending similarity,
    /// truncated to `opts.limit`.
    ///
    /// Candidates are overfetched from the HNSW graph, restricted by the
    /// filter's native predicate at the repo, and re-checked in process
    /// against the same filter definition. Hits below `opts.min_score` are
    /// dropped afterwards, unless that would empty the result set, in
    /// which case the unfloored set is returned (approximate matches beat
    /// zero results).
    pub fn search(
        &self,
        query: &[f32],
        filter: Option<&SearchFilter>,
        opts: &SearchOptions,
    ) -> Result<Vec<ScoredResume>, StoreError> {
        self.ensure_collection()?;
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let knn_k = opts
            .limit
            .saturating_mul(opts.fetch_factor.max(1))
            .max(opts.limit)
            .max(1);
        let hits: Vec<(ResumeId, f32)> = {
            let guard = self.hnsw_guard()?;
            match guard.as_ref() {
                Some(index) => index.knn(query, knn_k),
                None => Vec::new(),
            }
        };
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let mut score_map: HashMap<String, f32> = HashMap::with_capacity(hits.len());
        let ids: Vec<ResumeId> = hits
            .into_iter()
            .map(|(id, score)| {
                score_map.insert(id.0.clone(), score);
                id
            })
            .collect();

        let repo = self.open_repo()?;
        let records = repo.get_by_ids_filtered(&ids, filter)?;

        let mut out: Vec<ScoredResume> = Vec::with_capacity(records.len());
        for rec in records {
            let Some(&score) = score_map.get(&rec.id.0) else { continue };
            // Re-check with the same filter definition the repo applied;
            // a record must pass both identically or it is excluded.
            if let Some(f) = filter {
                if !f.matches(&rec.payload) {
                    continue;
                }
            }
            out.push(ScoredResume {
                id: rec.id,
                score: score.clamp(0.0, 1.0),
                payload: rec.payload,
            });
        }
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        out.truncate(opts.limit);

        let floored: Vec<ScoredResume> =
            out.iter().filter(|s| s.score >= opts.min_score).cloned().collect();
        if floored.is_empty() {
            return Ok(out);
        }
        Ok(floored)
    }

    /// Every stored record without vector comparison. No ordering guarantee.
    pub fn scan_all(&self) -> Result<Vec<ResumeRecord>, StoreError> {
        self.ensure_collection()?;
        let repo = self.open_repo()?;
        repo.scan_all()
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        self.ensure_collection()?;
        let repo = self.open_repo()?;
        repo.count()
    }

    fn open_repo(&self) -> Result<ResumeRepo, StoreError> {
        ResumeRepo::open(&self.db_path)
    }

    fn hnsw_guard(&self) -> Result<std::sync::RwLockReadGuard<'_, Option<HnswVectorIndex>>, StoreError> {
        self.hnsw
            .read()
            .map_err(|_| StoreError::Backend("hnsw lock poisoned".into()))
    }

    fn hnsw_guard_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Option<HnswVectorIndex>>, StoreError> {
        self.hnsw
            .write()
            .map_err(|_| StoreError::Backend("hnsw lock poisoned".into()))
    }
}

fn derive_hnsw_dir(db_path: &Path) -> PathBuf {
    let mut s = db_path.as_os_str().to_string_lossy().to_string();
    s.push_str(".hnsw");
    PathBuf::from(s)
}

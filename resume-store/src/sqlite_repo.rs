use std::path::Path;

use chrono::Utc;
use resume_model::{ResumeId, ResumePayload, ResumeRecord};
use rusqlite::{params, Connection};

use crate::{SearchFilter, StoreError};

/// SQLite-backed payload repository. Vector similarity lives in
/// `hnsw_index`; this store owns the payload rows and the secondary indexes
/// on the filterable fields.
pub struct ResumeRepo {
    conn: Connection,
}

impl ResumeRepo {
    /// Open a file-backed repository at `path`, initializing the schema if
    /// absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.init()?;
        Ok(repo)
    }

    /// Open an in-memory repository (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.init()?;
        Ok(repo)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "FULL")?;

        // Payload rows plus secondary indexes on the filterable fields.
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS resumes (
                id TEXT PRIMARY KEY,
                candidate_name TEXT NOT NULL,
                email TEXT NOT NULL,
                experience_years INTEGER NOT NULL CHECK (experience_years >= 0),
                department TEXT NOT NULL CHECK (department <> ''),
                s3_url TEXT NOT NULL,
                resume_text TEXT NOT NULL,
                vector BLOB NOT NULL,
                ingested_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_resumes_experience ON resumes(experience_years);
            CREATE INDEX IF NOT EXISTS idx_resumes_department ON resumes(department);
            "#,
        )?;
        Ok(())
    }

    /// Upsert one record; an existing row with the same id is overwritten
    /// (last write wins).
    pub fn upsert_resume(&self, record: &ResumeRecord) -> Result<(), StoreError> {
        let vector_bytes: &[u8] = bytemuck::cast_slice(&record.vector[..]);
        self.conn.execute(
            r#"
            INSERT INTO resumes (
                id, candidate_name, email, experience_years, department,
                s3_url, resume_text, vector, ingested_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                candidate_name = excluded.candidate_name,
                email = excluded.email,
                experience_years = excluded.experience_years,
                department = excluded.department,
                s3_url = excluded.s3_url,
                resume_text = excluded.resume_text,
                vector = excluded.vector,
                ingested_at = excluded.ingested_at
            "#,
            params![
                record.id.0,
                record.payload.candidate_name,
                record.payload.email,
                i64::from(record.payload.experience_years),
                record.payload.department,
                record.payload.s3_url,
                record.payload.resume_text,
                vector_bytes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete one record by id. Used to roll back a half-applied upsert.
    pub fn delete_resume(&self, id: &ResumeId) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM resumes WHERE id = ?1", params![id.0])?;
        Ok(())
    }

    /// Fetch records for the given ids, restricted by the compiled filter's
    /// native predicate when present. Order is unspecified.
    pub fn get_by_ids_filtered(
        &self,
        ids: &[ResumeId],
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ResumeRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut sql = format!(
            "SELECT id, candidate_name, email, experience_years, department, \
             s3_url, resume_text, vector FROM resumes WHERE id IN ({placeholders})"
        );
        let mut values: Vec<rusqlite::types::Value> =
            ids.iter().map(|id| id.0.clone().into()).collect();
        if let Some(f) = filter {
            let (pred, mut params) = f.sql_predicate();
            if !pred.is_empty() {
                sql.push_str(" AND ");
                sql.push_str(&pred);
                values.append(&mut params);
            }
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_record)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Every stored record, without vector comparison or ordering guarantee.
    pub fn scan_all(&self) -> Result<Vec<ResumeRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, candidate_name, email, experience_years, department, \
             s3_url, resume_text, vector FROM resumes",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM resumes", [], |r| r.get::<_, i64>(0))?;
        Ok(n)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResumeRecord> {
    let id: String = row.get(0)?;
    let experience_years: i64 = row.get(3)?;
    let vector_bytes: Vec<u8> = row.get(7)?;
    let vector: Vec<f32> = bytemuck::cast_slice(&vector_bytes).to_vec();
    Ok(ResumeRecord {
        id: ResumeId(id),
        vector,
        payload: ResumePayload {
            candidate_name: row.get(1)?,
            email: row.get(2)?,
            experience_years: experience_years.max(0) as u32,
            department: row.get(4)?,
            s3_url: row.get(5)?,
            resume_text: row.get(6)?,
        },
    })
}

use std::collections::HashMap;
use std::sync::Arc;

use embedding_provider::embedder::HashingEmbedder;
use resume_service::blob::FsBlobStore;
use resume_service::extract::PlainTextExtractor;
use resume_service::oracle::{KeywordOracle, StaticOracle};
use resume_service::{
    OracleError, ResumeService, SearchFilters, ServiceConfig, ServiceError, UploadOverrides,
};

const RESUME_TEXT: &str = "Jane Doe\n\
    a@b.com\n\
    Backend engineer with 5 years of experience.\n\
    Built services in python, postgres and kubernetes.\n";

fn config(dir: &tempfile::TempDir) -> ServiceConfig {
    ServiceConfig {
        db_path: dir.path().join("resumes.db"),
        blob_dir: dir.path().join("blobs"),
        min_score: 0.0,
        ..ServiceConfig::default()
    }
}

fn service_with_oracle(
    dir: &tempfile::TempDir,
    oracle: Arc<dyn KeywordOracle>,
) -> ResumeService {
    let cfg = config(dir);
    let embedder = Arc::new(
        HashingEmbedder::new(cfg.embedder.clone()).expect("embedder config is valid"),
    );
    let blob_store = Arc::new(FsBlobStore::new(cfg.blob_dir.clone()));
    ResumeService::with_collaborators(
        cfg,
        embedder,
        blob_store,
        Arc::new(PlainTextExtractor),
        oracle,
    )
    .expect("service opens")
}

fn service(dir: &tempfile::TempDir) -> ResumeService {
    service_with_oracle(dir, Arc::new(StaticOracle::new(HashMap::new())))
}

struct FailingOracle;
impl KeywordOracle for FailingOracle {
    fn related_terms(&self, _term: &str) -> Result<Vec<String>, OracleError> {
        Err(OracleError::Unavailable("boom".into()))
    }
}

#[test]
fn upload_extracts_fields_and_search_honors_the_experience_filter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service(&dir);

    let receipt = svc
        .upload(RESUME_TEXT.as_bytes(), "jane.txt", "text/plain", &UploadOverrides::default())
        .expect("upload succeeds");
    assert_eq!(receipt.data.experience_years, 5);
    assert_eq!(receipt.data.email, "a@b.com");
    assert_eq!(receipt.data.department, "General");
    assert!(receipt.data.s3_url.starts_with("file://"));

    let filters = SearchFilters { department: String::new(), experience: "3-5".into() };
    let response = svc.search("python developer", &filters).expect("search succeeds");
    assert!(
        response.results.iter().any(|r| r.id == receipt.id),
        "ingested resume should match the 3-5 bucket"
    );
    let hit = response
        .results
        .iter()
        .find(|r| r.id == receipt.id)
        .expect("hit present");
    assert!(hit.matched_keywords.contains(&"python".to_string()));

    // The same record must not match the neighboring bucket.
    let filters = SearchFilters { department: String::new(), experience: "6-10".into() };
    let response = svc.search("python developer", &filters).expect("search succeeds");
    assert!(response.results.iter().all(|r| r.id != receipt.id));
}

#[test]
fn overrides_win_over_extracted_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service(&dir);

    let overrides = UploadOverrides {
        department: Some("Engineering".into()),
        experience_years: Some("11".into()),
    };
    let receipt = svc
        .upload(RESUME_TEXT.as_bytes(), "jane.txt", "text/plain", &overrides)
        .expect("upload succeeds");
    assert_eq!(receipt.data.experience_years, 11);
    assert_eq!(receipt.data.department, "Engineering");

    let filters = SearchFilters { department: "Engineering".into(), experience: "10+".into() };
    let response = svc.search("python", &filters).expect("search succeeds");
    assert!(response.results.iter().any(|r| r.id == receipt.id));
}

#[test]
fn oracle_failure_degrades_to_query_tokens() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service_with_oracle(&dir, Arc::new(FailingOracle));

    svc.upload(RESUME_TEXT.as_bytes(), "jane.txt", "text/plain", &UploadOverrides::default())
        .expect("upload succeeds");

    let response = svc
        .search("python developer", &SearchFilters::default())
        .expect("search survives a dead oracle");
    assert!(!response.results.is_empty());
    let mut words = response.highlight_words.clone();
    words.sort();
    assert_eq!(words, ["developer", "python"]);
}

#[test]
fn oracle_terms_show_up_as_matched_keywords() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut map = HashMap::new();
    map.insert("python".to_string(), vec!["postgres".to_string(), "rails".to_string()]);
    let svc = service_with_oracle(&dir, Arc::new(StaticOracle::new(map)));

    svc.upload(RESUME_TEXT.as_bytes(), "jane.txt", "text/plain", &UploadOverrides::default())
        .expect("upload succeeds");

    let response = svc.search("python", &SearchFilters::default()).expect("search succeeds");
    let hit = &response.results[0];
    assert!(hit.matched_keywords.contains(&"postgres".to_string()));
    assert!(
        !hit.matched_keywords.contains(&"rails".to_string()),
        "terms absent from the text are not evidence"
    );
    assert!(response.highlight_words.contains(&"rails".to_string()));
}

#[test]
fn final_scores_stay_in_band() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service(&dir);

    for (name, years) in [("a", "0"), ("b", "40")] {
        let overrides = UploadOverrides {
            department: None,
            experience_years: Some(years.to_string()),
        };
        svc.upload(RESUME_TEXT.as_bytes(), &format!("{name}.txt"), "text/plain", &overrides)
            .expect("upload succeeds");
    }

    let response = svc
        .search("python postgres kubernetes backend engineer", &SearchFilters::default())
        .expect("search succeeds");
    assert!(!response.results.is_empty());
    for r in &response.results {
        assert!((0.0..=100.0).contains(&r.score), "score {} out of band", r.score);
    }
}

#[test]
fn identical_texts_upload_as_independent_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service(&dir);

    let a = svc
        .upload(RESUME_TEXT.as_bytes(), "a.txt", "text/plain", &UploadOverrides::default())
        .expect("first upload");
    let b = svc
        .upload(RESUME_TEXT.as_bytes(), "b.txt", "text/plain", &UploadOverrides::default())
        .expect("second upload");
    assert_ne!(a.id, b.id);

    let listed = svc.list().expect("list succeeds");
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|r| r.id == a.id));
    assert!(listed.iter().any(|r| r.id == b.id));
}

#[test]
fn failures_name_their_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = service(&dir);

    let err = svc
        .upload(&[], "jane.txt", "text/plain", &UploadOverrides::default())
        .expect_err("empty upload is rejected");
    assert!(matches!(err, ServiceError::InvalidRequest(_)));

    let err = svc
        .upload(b"binary", "jane.exe", "application/octet-stream", &UploadOverrides::default())
        .expect_err("exe is not extractable");
    assert!(matches!(err, ServiceError::Extract(_)));

    let err = svc
        .search("", &SearchFilters::default())
        .expect_err("empty query is rejected");
    assert!(matches!(err, ServiceError::InvalidRequest(_)));

    let filters = SearchFilters { department: String::new(), experience: "4-7".into() };
    let err = svc
        .search("python", &filters)
        .expect_err("malformed bucket is rejected before the index");
    assert!(matches!(err, ServiceError::Filter(_)));
}

#[test]
fn low_similarity_hits_still_return_via_the_score_floor_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = ServiceConfig {
        db_path: dir.path().join("resumes.db"),
        blob_dir: dir.path().join("blobs"),
        min_score: 0.95,
        ..ServiceConfig::default()
    };
    let embedder = Arc::new(
        HashingEmbedder::new(cfg.embedder.clone()).expect("embedder config is valid"),
    );
    let blob_store = Arc::new(FsBlobStore::new(cfg.blob_dir.clone()));
    let svc = ResumeService::with_collaborators(
        cfg,
        embedder,
        blob_store,
        Arc::new(PlainTextExtractor),
        Arc::new(StaticOracle::new(HashMap::new())),
    )
    .expect("service opens");

    svc.upload(RESUME_TEXT.as_bytes(), "jane.txt", "text/plain", &UploadOverrides::default())
        .expect("upload succeeds");

    // The query barely overlaps the stored text, so similarity sits far
    // below the 0.95 floor; the fallback must surface the hit anyway.
    let response = svc
        .search("underwater basket weaving python", &SearchFilters::default())
        .expect("search succeeds");
    assert!(!response.results.is_empty(), "floor fallback should prevent empty results");
}

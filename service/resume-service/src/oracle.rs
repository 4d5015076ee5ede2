use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::OracleError;

/// Best-effort provider of terms related to a query term.
///
/// Callers must treat every failure as "zero additional terms"; an oracle
/// outage is never allowed to fail a search request.
pub trait KeywordOracle: Send + Sync {
    fn related_terms(&self, term: &str) -> Result<Vec<String>, OracleError>;
}

/// Oracle that never suggests anything. Default for offline deployments.
pub struct NullOracle;

impl KeywordOracle for NullOracle {
    fn related_terms(&self, _term: &str) -> Result<Vec<String>, OracleError> {
        Ok(Vec::new())
    }
}

/// Fixed in-memory expansion map (tests and canned vocabularies).
pub struct StaticOracle {
    map: HashMap<String, Vec<String>>,
}

impl StaticOracle {
    pub fn new(map: HashMap<String, Vec<String>>) -> Self {
        Self { map }
    }
}

impl KeywordOracle for StaticOracle {
    fn related_terms(&self, term: &str) -> Result<Vec<String>, OracleError> {
        Ok(self.map.get(term).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct RelatedTermsResponse {
    keywords: Vec<String>,
}

/// HTTP-backed oracle with an explicit request timeout.
///
/// POSTs `{"query": term}` and expects `{"keywords": [...]}` back. A
/// timeout, transport error or malformed body surfaces as an [`OracleError`]
/// for the expander to degrade on.
pub struct HttpKeywordOracle {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpKeywordOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("oracle http client: {e}")))?;
        Ok(Self { endpoint: endpoint.into(), client })
    }
}

impl KeywordOracle for HttpKeywordOracle {
    fn related_terms(&self, term: &str) -> Result<Vec<String>, OracleError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": term }))
            .send()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::Unavailable(format!(
                "oracle returned status {}",
                response.status()
            )));
        }
        let body: RelatedTermsResponse = response
            .json()
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        Ok(body.keywords)
    }
}

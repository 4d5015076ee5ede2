use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::oracle::KeywordOracle;
use crate::OracleError;

/// Expands a raw query into the keyword vocabulary used for boosting and
/// highlighting: the query's own lowercase tokens plus whatever the oracle
/// suggests.
///
/// Oracle failures degrade to query tokens only and are logged, never
/// surfaced. Successful expansions are memoized per normalized query;
/// failures are not cached so a recovering oracle gets retried.
pub struct KeywordExpander {
    oracle: Arc<dyn KeywordOracle>,
    cache: RwLock<HashMap<String, Vec<String>>>,
}

impl KeywordExpander {
    pub fn new(oracle: Arc<dyn KeywordOracle>) -> Self {
        Self { oracle, cache: RwLock::new(HashMap::new()) }
    }

    /// Lowercase query tokens UNION oracle-related terms.
    pub fn expand(&self, query: &str) -> BTreeSet<String> {
        let mut terms: BTreeSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        match self.related_terms_cached(query) {
            Ok(extra) => terms.extend(extra),
            Err(e) => warn!("keyword expansion degraded to query tokens: {e}"),
        }
        terms
    }

    fn related_terms_cached(&self, query: &str) -> Result<Vec<String>, OracleError> {
        let key = query.trim().to_lowercase();
        if key.is_empty() {
            return Ok(Vec::new());
        }
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }
        let terms: Vec<String> = self
            .oracle
            .related_terms(&key)?
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, terms.clone());
        }
        Ok(terms)
    }
}

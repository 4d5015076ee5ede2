use crate::embedder::HashingConfig;

/// Default settings for the reference hashing embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashingDefaults {
    pub embedding_dimension: usize,
    pub max_input_chars: usize,
    pub embedding_model_id: &'static str,
    pub text_repr_version: &'static str,
}

/// Shared defaults so the service, tools and tests stay in sync. The
/// dimension is the contract for every vector in the collection; changing
/// it means re-embedding all stored records.
pub const HASHING_DEFAULTS: HashingDefaults = HashingDefaults {
    embedding_dimension: 384,
    max_input_chars: 8192,
    embedding_model_id: "hashing-bow",
    text_repr_version: "v1",
};

/// Convenience helper to build a [`HashingConfig`] from the shared defaults.
pub fn default_hashing_config() -> HashingConfig {
    HashingConfig {
        dimension: HASHING_DEFAULTS.embedding_dimension,
        max_input_length: HASHING_DEFAULTS.max_input_chars,
        embedding_model_id: HASHING_DEFAULTS.embedding_model_id.into(),
        text_repr_version: HASHING_DEFAULTS.text_repr_version.into(),
    }
}

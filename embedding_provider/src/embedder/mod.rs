use sha2::{Digest, Sha256};
use thiserror::Error;

/// Identifies the backing implementation that powers an embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    HashingBow,
}

/// Static metadata describing a particular embedder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderInfo {
    pub provider: ProviderKind,
    pub embedding_model_id: String,
    pub dimension: usize,
    pub text_repr_version: String,
}

/// Errors that can be produced by embedder operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedderError {
    #[error("invalid embedder configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("input text exceeds max length of {max_length} chars, actual length: {actual_length}")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },
    #[error("provider failure: {message}")]
    ProviderFailure { message: String },
}

/// Core interface for all embedder implementations.
///
/// Implementations must be deterministic for identical input and emit
/// vectors of exactly `info().dimension` components.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;
    fn info(&self) -> &EmbedderInfo;
}

/// Configuration for the reference hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub dimension: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

/// Deterministic bag-of-words embedder: tokens are hashed into a
/// fixed-dimension histogram which is then L2-normalized.
///
/// Every component is non-negative, so cosine similarity between any two
/// outputs lands in [0, 1]. This is the reference provider and test double;
/// production deployments plug a model-backed implementation in behind the
/// same [`Embedder`] trait.
#[derive(Debug)]
pub struct HashingEmbedder {
    info: EmbedderInfo,
    max_input_length: usize,
}

impl HashingEmbedder {
    pub fn new(config: HashingConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
            });
        }
        if config.max_input_length == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "max_input_length must be greater than zero".into(),
            });
        }
        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::HashingBow,
                embedding_model_id: config.embedding_model_id,
                dimension: config.dimension,
                text_repr_version: config.text_repr_version,
            },
            max_input_length: config.max_input_length,
        })
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.info.dimension as u64) as usize
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let actual_length = text.chars().count();
        if actual_length > self.max_input_length {
            return Err(EmbedderError::InputTooLong {
                max_length: self.max_input_length,
                actual_length,
            });
        }
        if text.trim().is_empty() {
            return Err(EmbedderError::ProviderFailure {
                message: "input text is empty".into(),
            });
        }

        let mut histogram = vec![0.0f32; self.info.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            histogram[self.bucket(token)] += 1.0;
        }
        let norm: f32 = histogram.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut histogram {
                *x /= norm;
            }
        }
        Ok(histogram)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

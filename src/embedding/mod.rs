//! Text-to-vector embedding backends.
//!
//! Provides the [`EmbeddingProvider`] trait, the [`EmbeddingStrategy`] registry
//! that maps a configured strategy name onto a backend, and
//! [`create_provider`] which builds the selected backend from configuration.
//! Every provider the memory store uses is wrapped in a
//! [`retry::RetryingProvider`].

mod http;
#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod ollama;
pub mod openai;
pub mod retry;

use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, MemoryError};

/// Ollama models accepted as embedding strategies.
pub const OLLAMA_MODELS: &[&str] = &[
    "llama2",
    "mxbai-embed-large",
    "nomic-embed-text",
    "all-minilm",
    "stable-code",
    "bge-m3",
    "bge-large",
    "paraphrase-multilingual",
    "snowflake-arctic-embed",
];

/// Trait for embedding text into vectors.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize;

    /// Stable identifier recorded alongside stored vectors, e.g. `ollama/nomic-embed-text`.
    fn model_id(&self) -> String;
}

/// Backend selected by the `embedding.strategy` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingStrategy {
    /// A model served by Ollama, restricted to [`OLLAMA_MODELS`].
    Ollama(String),
    OpenAi,
    AzureOpenAi,
    /// `"none"`: no real embeddings, every text maps to the same vector.
    Disabled,
    /// Anything else: the local ONNX model.
    Local,
}

impl EmbeddingStrategy {
    pub fn from_name(name: &str) -> Self {
        if OLLAMA_MODELS.contains(&name) {
            return Self::Ollama(name.to_string());
        }
        match name {
            "openai" => Self::OpenAi,
            "azureopenai" => Self::AzureOpenAi,
            _ if name.eq_ignore_ascii_case("none") => Self::Disabled,
            _ => Self::Local,
        }
    }

    /// Build the backend for this strategy.
    pub fn build(&self, config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, MemoryError> {
        match self {
            Self::Ollama(model) => Ok(Box::new(ollama::OllamaEmbeddingProvider::new(
                model, config,
            )?)),
            Self::OpenAi => Ok(Box::new(openai::OpenAiEmbeddingProvider::openai(config)?)),
            Self::AzureOpenAi => Ok(Box::new(openai::OpenAiEmbeddingProvider::azure(config)?)),
            Self::Disabled => Ok(Box::new(NoopEmbeddingProvider)),
            Self::Local => build_local(config),
        }
    }
}

impl std::fmt::Display for EmbeddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama(model) => write!(f, "ollama ({model})"),
            Self::OpenAi => f.write_str("openai"),
            Self::AzureOpenAi => f.write_str("azureopenai"),
            Self::Disabled => f.write_str("none"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Create an embedding provider from config.
///
/// Fails with [`MemoryError::MissingDependency`] when the local backend is
/// selected but unavailable, and with [`MemoryError::Config`] when a hosted
/// backend is missing required connection settings.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, MemoryError> {
    let strategy = EmbeddingStrategy::from_name(&config.strategy);
    let provider = strategy.build(config)?;
    tracing::info!(
        strategy = %strategy,
        model = %provider.model_id(),
        dimensions = provider.dimensions(),
        "embedding provider ready"
    );
    Ok(provider)
}

#[cfg(feature = "local-embeddings")]
fn build_local(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, MemoryError> {
    Ok(Box::new(local::LocalEmbeddingProvider::new(config)?))
}

#[cfg(not(feature = "local-embeddings"))]
fn build_local(_config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, MemoryError> {
    Err(MemoryError::MissingDependency(
        "local embeddings are not compiled in. Rebuild with `--features local-embeddings` \
         or choose a hosted embedding strategy"
            .into(),
    ))
}

/// Provider for the `"none"` strategy: a constant one-dimensional vector.
///
/// Similarity search still works but every document ties, so results come
/// back in insertion order.
pub struct NoopEmbeddingProvider;

impl EmbeddingProvider for NoopEmbeddingProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.0])
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn model_id(&self) -> String {
        "none".into()
    }
}

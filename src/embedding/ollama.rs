//! Embeddings served by a local or remote Ollama instance.

use serde::{Deserialize, Serialize};

use super::http::HttpTransport;
use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, MemoryError};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    mirostat: u8,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct OllamaEmbeddingProvider {
    transport: HttpTransport,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    pub fn new(model: &str, config: &EmbeddingConfig) -> Result<Self, MemoryError> {
        let dimensions = config
            .dimensions
            .or_else(|| default_dimensions(model))
            .ok_or_else(|| {
                MemoryError::Config(format!(
                    "no known vector width for ollama model {model}; set embedding.dimensions"
                ))
            })?;
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL)
            .trim_end_matches('/');

        Ok(Self {
            transport: HttpTransport::new(config.timeout_secs)?,
            endpoint: format!("{base_url}/api/embeddings"),
            model: model.to_string(),
            dimensions,
        })
    }
}

impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
            options: OllamaOptions { mirostat: 0 },
        };
        let response: OllamaEmbeddingResponse = self
            .transport
            .send(self.transport.client().post(&self.endpoint).json(&request))?;
        Ok(response.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        format!("ollama/{}", self.model)
    }
}

/// Published vector widths of the allow-listed models.
fn default_dimensions(model: &str) -> Option<usize> {
    match model {
        "all-minilm" => Some(384),
        "nomic-embed-text" | "paraphrase-multilingual" => Some(768),
        "mxbai-embed-large" | "bge-m3" | "bge-large" | "snowflake-arctic-embed" => Some(1024),
        "stable-code" => Some(2560),
        "llama2" => Some(4096),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_allow_listed_model_has_a_width() {
        for model in super::super::OLLAMA_MODELS {
            assert!(default_dimensions(model).is_some(), "{model} has no width");
        }
    }

    #[tokio::test]
    async fn explicit_dimensions_override_defaults() {
        let config = EmbeddingConfig {
            strategy: "nomic-embed-text".into(),
            dimensions: Some(512),
            base_url: Some("http://ollama.internal:11434/".into()),
            ..Default::default()
        };
        let provider = OllamaEmbeddingProvider::new("nomic-embed-text", &config).unwrap();
        assert_eq!(provider.dimensions(), 512);
        assert_eq!(provider.endpoint, "http://ollama.internal:11434/api/embeddings");
        assert_eq!(provider.model_id(), "ollama/nomic-embed-text");
    }

    #[test]
    fn building_outside_a_runtime_fails() {
        let config = EmbeddingConfig::default();
        let err = OllamaEmbeddingProvider::new("all-minilm", &config).err().unwrap();
        assert!(matches!(err, MemoryError::Runtime(_)));
    }
}

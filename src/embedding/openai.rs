//! OpenAI and Azure OpenAI embedding endpoints.
//!
//! Both speak the same request/response shape; they differ in URL layout and
//! in how the API key is sent.

use serde::{Deserialize, Serialize};

use super::http::HttpTransport;
use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, MemoryError};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    OpenAi,
    Azure,
}

pub struct OpenAiEmbeddingProvider {
    transport: HttpTransport,
    flavor: Flavor,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    /// The public OpenAI API. Requires `embedding.api_key`.
    pub fn openai(config: &EmbeddingConfig) -> Result<Self, MemoryError> {
        let api_key = required(&config.api_key, "api_key", "openai")?;
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/');
        let model = config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.into());

        Ok(Self {
            transport: HttpTransport::new(config.timeout_secs)?,
            flavor: Flavor::OpenAi,
            endpoint: format!("{base_url}/embeddings"),
            api_key,
            dimensions: dimensions_for(&model, config)?,
            model,
        })
    }

    /// An Azure OpenAI deployment. Requires `base_url` (the resource endpoint),
    /// `deployment_name` and `api_key`.
    pub fn azure(config: &EmbeddingConfig) -> Result<Self, MemoryError> {
        let api_key = required(&config.api_key, "api_key", "azureopenai")?;
        let endpoint = required(&config.base_url, "base_url", "azureopenai")?;
        let deployment = required(&config.deployment_name, "deployment_name", "azureopenai")?;
        let api_version = config
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_AZURE_API_VERSION);
        let model = config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.into());

        Ok(Self {
            transport: HttpTransport::new(config.timeout_secs)?,
            flavor: Flavor::Azure,
            endpoint: format!(
                "{}/openai/deployments/{deployment}/embeddings?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
            api_key,
            dimensions: dimensions_for(&model, config)?,
            model,
        })
    }
}

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let body = OpenAiEmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let request = self.transport.client().post(&self.endpoint).json(&body);
        let request = match self.flavor {
            Flavor::OpenAi => request.bearer_auth(&self.api_key),
            Flavor::Azure => request.header("api-key", &self.api_key),
        };

        let mut response: OpenAiEmbeddingResponse = self.transport.send(request)?;
        if response.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        match self.flavor {
            Flavor::OpenAi => format!("openai/{}", self.model),
            Flavor::Azure => format!("azureopenai/{}", self.model),
        }
    }
}

fn required(value: &Option<String>, key: &str, strategy: &str) -> Result<String, MemoryError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MemoryError::Config(format!("embedding.{key} is required for {strategy}")))
}

fn dimensions_for(model: &str, config: &EmbeddingConfig) -> Result<usize, MemoryError> {
    if let Some(dims) = config.dimensions {
        return Ok(dims);
    }
    match model {
        "text-embedding-ada-002" | "text-embedding-3-small" => Ok(1536),
        "text-embedding-3-large" => Ok(3072),
        other => Err(MemoryError::Config(format!(
            "no known vector width for model {other}; set embedding.dimensions"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure_config() -> EmbeddingConfig {
        EmbeddingConfig {
            strategy: "azureopenai".into(),
            base_url: Some("https://acme.openai.azure.com/".into()),
            deployment_name: Some("embeddings".into()),
            api_key: Some("secret".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn azure_endpoint_includes_deployment_and_version() {
        let provider = OpenAiEmbeddingProvider::azure(&azure_config()).unwrap();
        assert_eq!(
            provider.endpoint,
            "https://acme.openai.azure.com/openai/deployments/embeddings/embeddings?api-version=2024-02-01"
        );
        assert_eq!(provider.dimensions(), 1536);
        assert_eq!(provider.model_id(), "azureopenai/text-embedding-ada-002");
    }

    #[tokio::test]
    async fn azure_requires_deployment_name() {
        let config = EmbeddingConfig {
            deployment_name: None,
            ..azure_config()
        };
        let err = OpenAiEmbeddingProvider::azure(&config).err().unwrap();
        assert!(err.to_string().contains("deployment_name"));
    }

    #[tokio::test]
    async fn openai_requires_api_key() {
        let config = EmbeddingConfig {
            strategy: "openai".into(),
            ..Default::default()
        };
        let err = OpenAiEmbeddingProvider::openai(&config).err().unwrap();
        assert!(matches!(err, MemoryError::Config(_)));
    }

    #[tokio::test]
    async fn unknown_model_needs_explicit_dimensions() {
        let mut config = EmbeddingConfig {
            strategy: "openai".into(),
            api_key: Some("sk".into()),
            model: Some("custom-embedder".into()),
            ..Default::default()
        };
        assert!(OpenAiEmbeddingProvider::openai(&config).is_err());

        config.dimensions = Some(256);
        let provider = OpenAiEmbeddingProvider::openai(&config).unwrap();
        assert_eq!(provider.dimensions(), 256);
        assert_eq!(provider.endpoint, "https://api.openai.com/v1/embeddings");
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LongmemConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub memory: MemoryConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Embedding backend selection and connection parameters.
///
/// `strategy` picks the backend (see [`crate::embedding::EmbeddingStrategy`]);
/// the remaining fields are read only by the backends that need them.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub strategy: String,
    /// Model override. Each backend has its own default when unset.
    pub model: Option<String>,
    /// Ollama server URL, or the Azure OpenAI endpoint.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub deployment_name: Option<String>,
    pub api_version: Option<String>,
    /// Vector width override for models the backend has no default for.
    pub dimensions: Option<usize>,
    pub timeout_secs: u64,
    /// Where the local ONNX model and tokenizer live.
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of index writes allowed to run at once.
    pub max_concurrent_inserts: usize,
    pub default_k: usize,
}

/// Retry limits for embedding calls that fail with transient provider errors.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub num_retries: u32,
    pub min_wait_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_longmem_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_longmem_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            strategy: "local".into(),
            model: None,
            base_url: None,
            api_key: None,
            deployment_name: None,
            api_version: None,
            dimensions: None,
            timeout_secs: 60,
            cache_dir,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_inserts: 1,
            default_k: 10,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            num_retries: 10,
            min_wait_secs: 3,
            max_wait_secs: 300,
        }
    }
}

/// Returns `~/.longmem/`
pub fn default_longmem_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".longmem")
}

/// Returns the default config file path: `~/.longmem/config.toml`
pub fn default_config_path() -> PathBuf {
    default_longmem_dir().join("config.toml")
}

impl LongmemConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LongmemConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LONGMEM_DB, LONGMEM_LOG_LEVEL,
    /// LONGMEM_EMBEDDING_STRATEGY, LONGMEM_EMBEDDING_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LONGMEM_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LONGMEM_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("LONGMEM_EMBEDDING_STRATEGY") {
            self.embedding.strategy = val;
        }
        if let Ok(val) = std::env::var("LONGMEM_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LongmemConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.embedding.strategy, "local");
        assert_eq!(config.memory.max_concurrent_inserts, 1);
        assert_eq!(config.memory.default_k, 10);
        assert_eq!(config.retry.num_retries, 10);
        assert_eq!(config.retry.min_wait_secs, 3);
        assert_eq!(config.retry.max_wait_secs, 300);
        assert!(config.storage.db_path.ends_with("memory.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[embedding]
strategy = "azureopenai"
base_url = "https://example.openai.azure.com"
deployment_name = "embed"

[retry]
num_retries = 3
"#;
        let config: LongmemConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.embedding.strategy, "azureopenai");
        assert_eq!(config.embedding.deployment_name.as_deref(), Some("embed"));
        assert_eq!(config.retry.num_retries, 3);
        // defaults still apply for unset fields
        assert_eq!(config.retry.max_wait_secs, 300);
        assert_eq!(config.embedding.timeout_secs, 60);
        assert_eq!(config.memory.max_concurrent_inserts, 1);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = LongmemConfig::default();
        std::env::set_var("LONGMEM_DB", "/tmp/override.db");
        std::env::set_var("LONGMEM_LOG_LEVEL", "trace");
        std::env::set_var("LONGMEM_EMBEDDING_STRATEGY", "openai");
        std::env::set_var("LONGMEM_EMBEDDING_API_KEY", "sk-test");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.embedding.strategy, "openai");
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));

        // Clean up
        std::env::remove_var("LONGMEM_DB");
        std::env::remove_var("LONGMEM_LOG_LEVEL");
        std::env::remove_var("LONGMEM_EMBEDDING_STRATEGY");
        std::env::remove_var("LONGMEM_EMBEDDING_API_KEY");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/x.db"), PathBuf::from("/var/lib/x.db"));
    }
}

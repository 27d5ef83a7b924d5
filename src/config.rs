use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CortexConfig {
    pub log_level: String,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"openai"` or `"ollama"`.
    pub provider: String,
    /// Unset fields fall back to the defaults of the selected provider.
    pub model: Option<String>,
    pub dimensions: Option<usize>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Deadline for a single embedding round-trip.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    pub min_score: f64,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_cortex_dir()
            .join("cortex.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: None,
            dimensions: None,
            api_key: None,
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Model, vector width and base URL a provider uses when the config leaves them unset.
struct ProviderDefaults {
    model: &'static str,
    dimensions: usize,
    base_url: &'static str,
}

const OPENAI_DEFAULTS: ProviderDefaults = ProviderDefaults {
    model: "text-embedding-3-small",
    dimensions: 1536,
    base_url: "https://api.openai.com",
};

const OLLAMA_DEFAULTS: ProviderDefaults = ProviderDefaults {
    model: "nomic-embed-text",
    dimensions: 768,
    base_url: "http://localhost:11434",
};

impl EmbeddingConfig {
    fn provider_defaults(&self) -> &'static ProviderDefaults {
        match self.provider.as_str() {
            "ollama" => &OLLAMA_DEFAULTS,
            _ => &OPENAI_DEFAULTS,
        }
    }

    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_defaults().model.to_string())
    }

    pub fn resolved_dimensions(&self) -> usize {
        self.dimensions.unwrap_or(self.provider_defaults().dimensions)
    }

    /// Base URL without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider_defaults().base_url)
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            min_score: 0.3,
        }
    }
}

/// Returns `~/.cortex/`, or `./.cortex/` when no home directory is known.
pub fn default_cortex_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cortex")
}

/// Returns the default config file path: `~/.cortex/config.toml`
pub fn default_config_path() -> PathBuf {
    default_cortex_dir().join("config.toml")
}

impl CortexConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CortexConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (CORTEX_DB, CORTEX_LOG_LEVEL, CORTEX_EMBEDDING_PROVIDER, OPENAI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CORTEX_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CORTEX_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Ok(val) = std::env::var("CORTEX_EMBEDDING_PROVIDER") {
            self.embedding.provider = val;
        }
        if self.embedding.api_key.is_none() {
            if let Ok(val) = std::env::var("OPENAI_API_KEY") {
                self.embedding.api_key = Some(val);
            }
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

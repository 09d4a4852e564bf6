
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::embeddings::MAX_SEQUENCE_TOKENS;

pub const ENV_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_DATA_PATH: &str = "HR_ASSISTANT_DATA";
pub const ENV_MODEL_DIR: &str = "HR_ASSISTANT_MODEL_DIR";
pub const ENV_LLM_URL: &str = "HR_ASSISTANT_LLM_URL";
pub const ENV_LLM_MODEL: &str = "HR_ASSISTANT_LLM_MODEL";
pub const ENV_HOST: &str = "HR_ASSISTANT_HOST";
pub const ENV_PORT: &str = "HR_ASSISTANT_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// JSON array of HR question/answer entries
    pub path: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/knowledge_base.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 loaded from `model_dir`
    MiniLm,
    /// Feature hashing, no model files required
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model_dir: PathBuf,
    pub max_tokens: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::MiniLm,
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_tokens: MAX_SEQUENCE_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completion API
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    /// Only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            timeout_seconds: 30,
            retry_attempts: 3,
            api_key: None,
        }
    }
}

/// Language of the reply when nothing is retrieved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoMatchLanguage {
    /// Always French, whatever the question language
    #[default]
    French,
    /// Same language as the question
    Detected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub no_match_language: NoMatchLanguage,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            no_match_language: NoMatchLanguage::French,
        }
    }
}

impl RetrievalConfig {
    /// Accept a neighbour count in `1..=50`.
    #[inline]
    pub fn check_top_k(top_k: usize) -> Result<usize, ConfigError> {
        if (1..=50).contains(&top_k) {
            Ok(top_k)
        } else {
            Err(ConfigError::InvalidTopK(top_k))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("GROQ_API_KEY is not set; define it in the environment or in a .env file")]
    MissingApiKey,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid max output tokens: {0} (must be between 1 and 32768)")]
    InvalidMaxTokens(u32),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid top_k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid embedding token limit: {0} (must be between 1 and 512)")]
    InvalidEmbeddingTokens(usize),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid listen address: {0}")]
    InvalidHost(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".hr-assistant"))
            .or_else(|| dirs::data_dir().map(|data| data.join("hr-assistant")))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the effective configuration: the TOML file (`path` or the default
    /// location), then environment overrides, then validation.
    #[inline]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path().context("Failed to determine config file path")?,
        };

        let mut config = Self::from_file(&config_path)?;
        config
            .apply_env(|name| std::env::var(name).ok())
            .context("Invalid environment override")?;
        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    /// Read a TOML file without environment overrides. A missing file
    /// yields the defaults.
    #[inline]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    #[inline]
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(ConfigError::from)
            .context("Failed to serialize config to TOML")?;
        fs::write(path, content)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Override file values from environment variables, read through
    /// `lookup` so callers decide where variables come from.
    #[inline]
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.trim().is_empty()) {
            self.llm.api_key = Some(key.trim().to_string());
        }
        if let Some(path) = lookup(ENV_DATA_PATH) {
            self.knowledge.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            self.embedding.model_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_LLM_URL) {
            self.llm.api_url = url;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue {
                    name: ENV_PORT,
                    value: port.clone(),
                })?;
        }
        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.validate()?;

        RetrievalConfig::check_top_k(self.retrieval.top_k)?;

        if !(1..=MAX_SEQUENCE_TOKENS).contains(&self.embedding.max_tokens) {
            return Err(ConfigError::InvalidEmbeddingTokens(
                self.embedding.max_tokens,
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port));
        }

        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(self.server.host.clone()));
        }

        Ok(())
    }

    /// The chat API credential. Its absence is fatal for every command that
    /// talks to the model.
    #[inline]
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey)
    }

    #[inline]
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = || ConfigError::InvalidHost(self.server.host.clone());
        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }
}

impl LlmConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(1..=32_768).contains(&self.max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.max_tokens));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        Ok(())
    }

    /// API base URL, always ending in `/` so endpoint paths join below it
    #[inline]
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|_| ConfigError::InvalidUrl(self.api_url.clone()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_api_url(&mut self, api_url: String) -> Result<(), ConfigError> {
        let candidate = Self {
            api_url: api_url.clone(),
            ..self.clone()
        };
        candidate.api_url()?;
        self.api_url = api_url;
        Ok(())
    }
}

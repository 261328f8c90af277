use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Entry lifetime in seconds. Hours-scale; must be > 0.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Path to the shared SQLite cache file. When unset (or unreachable)
    /// the cache runs tier-1-only.
    #[serde(default)]
    pub shared_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            shared_path: None,
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_rate_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendsConfig {
    /// Upstream request timeout in seconds, applied to every adapter.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub cse: CseConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            gemini: GeminiConfig::default(),
            cse: CseConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CseConfig {
    /// Default search engine id (`cx`) used when a request selects the
    /// web index without naming a specific engine.
    #[serde(default)]
    pub engine: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
/// Credentials come from the environment either way, so a missing file
/// is not an error for this tool.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        let config = Config::default();
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs must be > 0");
    }
    if config.backends.timeout_secs == 0 {
        anyhow::bail!("backends.timeout_secs must be > 0");
    }
    if config.server.rate_limit_per_minute == 0 {
        anyhow::bail!("server.rate_limit_per_minute must be >= 1");
    }
    Ok(())
}

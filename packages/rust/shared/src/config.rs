//! Application configuration for crawlqa.
//!
//! User config lives at `~/.crawlqa/crawlqa.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CrawlQaError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "crawlqa.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".crawlqa";

// ---------------------------------------------------------------------------
// Config structs (matching crawlqa.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP scraping settings.
    #[serde(default)]
    pub scrape: ScrapeSection,

    /// Masked-language model settings.
    #[serde(default)]
    pub model: ModelSection,
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSection {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    concat!("crawlqa/", env!("CARGO_PKG_VERSION")).into()
}
fn default_max_redirects() -> usize {
    5
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Hugging Face Hub model repository.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Repository revision (branch, tag, or commit).
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Token budget for a single encoder pass, special tokens included.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Characters of scraped context kept before tokenization.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    /// Override for the Hugging Face cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            revision: default_revision(),
            max_input_tokens: default_max_input_tokens(),
            context_chars: default_context_chars(),
            cache_dir: None,
        }
    }
}

fn default_model_id() -> String {
    "bert-base-uncased".into()
}
fn default_revision() -> String {
    "main".into()
}
fn default_max_input_tokens() -> usize {
    512
}
fn default_context_chars() -> usize {
    512
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Redirect limit.
    pub max_redirects: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.scrape.timeout_secs),
            user_agent: config.scrape.user_agent.clone(),
            max_redirects: config.scrape.max_redirects,
        }
    }
}

/// Runtime model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Hugging Face Hub model repository.
    pub model_id: String,
    /// Repository revision.
    pub revision: String,
    /// Token budget for one forward pass.
    pub max_input_tokens: usize,
    /// Characters of scraped context kept for the draft stage.
    pub context_chars: usize,
    /// Hugging Face cache directory override.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ModelConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            model_id: config.model.model_id.clone(),
            revision: config.model.revision.clone(),
            max_input_tokens: config.model.max_input_tokens,
            context_chars: config.model.context_chars,
            cache_dir: config.model.cache_dir.as_ref().map(PathBuf::from),
        }
    }
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.scrape.timeout_secs == 0 {
            return Err(CrawlQaError::config("scrape.timeout_secs must be positive"));
        }
        if self.model.model_id.trim().is_empty() {
            return Err(CrawlQaError::config("model.model_id must not be empty"));
        }
        // [CLS] and [SEP] alone take two tokens.
        if self.model.max_input_tokens < 2 {
            return Err(CrawlQaError::config(
                "model.max_input_tokens must be at least 2",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.crawlqa/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CrawlQaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.crawlqa/crawlqa.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CrawlQaError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        CrawlQaError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CrawlQaError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CrawlQaError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CrawlQaError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

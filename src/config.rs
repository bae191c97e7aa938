//! Configuration loading for the `vedr` command.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.vedrfolnir/config.toml` (user)
//! 3. `/etc/vedrfolnir/config.toml` (system)
//!
//! Every field has a default, so running without any file is valid.
//!
//! The API key is resolved separately, with a mandatory permission check on
//! the secrets file:
//! 1. `~/.vedrfolnir/secrets.toml` (user, must be 0600)
//! 2. `OPENAI_API_KEY` environment variable (a `.env` file is honoured by the binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::dataset::{self, Columns};
use crate::engine::{self, EvaluationSettings};
use crate::providers::{ChatProvider, OpenAiClient, RetryConfig, RetryingChatProvider, openai};
use crate::selection;
use crate::types::ChatOptions;
use crate::{Result, VedrError};

/// Environment variable holding the decision service API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub retry: RetrySection,
}

/// Decision service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible base URL (default: https://api.openai.com/v1).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model to query (default: gpt-4).
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature (default: 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Request `json_object` response format (default: false).
    #[serde(default)]
    pub json_mode: bool,
    /// Cap on reply tokens (default: unset, service default).
    #[serde(default)]
    pub max_tokens: Option<usize>,
    /// Sampling seed for repeatable runs (default: unset).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            json_mode: false,
            max_tokens: None,
            seed: None,
        }
    }
}

fn default_base_url() -> String {
    openai::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    selection::DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    selection::DEFAULT_TEMPERATURE
}

fn default_timeout() -> u64 {
    60
}

/// Evaluation run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Selection calls in flight at once (default: 1).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Minimum prompt length, in characters, for report examples (default: 50).
    #[serde(default = "default_example_min_chars")]
    pub example_min_chars: usize,
    /// Examples listed per outcome kind (default: 3).
    #[serde(default = "default_example_limit")]
    pub example_limit: usize,
    #[serde(default = "default_prompt_column")]
    pub prompt_column: String,
    #[serde(default = "default_expected_column")]
    pub expected_column: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            example_min_chars: default_example_min_chars(),
            example_limit: default_example_limit(),
            prompt_column: default_prompt_column(),
            expected_column: default_expected_column(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_example_min_chars() -> usize {
    engine::DEFAULT_EXAMPLE_MIN_CHARS
}

fn default_example_limit() -> usize {
    engine::DEFAULT_EXAMPLE_LIMIT
}

fn default_prompt_column() -> String {
    dataset::DEFAULT_PROMPT_COLUMN.to_string()
}

fn default_expected_column() -> String {
    dataset::DEFAULT_EXPECTED_COLUMN.to_string()
}

/// Retry settings for transient provider errors.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts including the first; 1 disables retry (default: 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Config {
    /// Load configuration from the standard locations, falling back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VedrError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(VedrError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vedrfolnir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/vedrfolnir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn settings(&self) -> EvaluationSettings {
        EvaluationSettings::default()
            .concurrency(self.evaluation.concurrency)
            .example_min_chars(self.evaluation.example_min_chars)
            .example_limit(self.evaluation.example_limit)
    }

    pub fn columns(&self) -> Columns {
        Columns {
            prompt: self.evaluation.prompt_column.clone(),
            expected: self.evaluation.expected_column.clone(),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            model: self.provider.model.clone(),
            temperature: Some(self.provider.temperature),
            max_tokens: self.provider.max_tokens,
            seed: self.provider.seed,
            json_mode: self.provider.json_mode,
        }
    }

    /// Build the chat provider, wrapped for retry when more than one attempt is allowed.
    pub fn build_provider(&self, api_key: &str) -> Result<Arc<dyn ChatProvider>> {
        let client: Arc<dyn ChatProvider> = Arc::new(OpenAiClient::with_timeout(
            api_key,
            self.provider.base_url.as_str(),
            Duration::from_secs(self.provider.timeout_secs),
        )?);
        let retry = self.retry_config();
        if retry.is_enabled() {
            return Ok(Arc::new(RetryingChatProvider::new(client, retry)));
        }
        Ok(client)
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Secrets {
    /// Load `~/.vedrfolnir/secrets.toml` if it exists (must be 0600 or 0400).
    ///
    /// Returns empty secrets if no file exists; the key may come from the environment.
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".vedrfolnir").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }
        Ok(Secrets::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VedrError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            VedrError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(VedrError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// API key from the secrets file, falling back to [`API_KEY_ENV`].
    pub fn api_key(&self) -> Option<String> {
        self.openai
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Like [`api_key`](Self::api_key), but a missing key is a configuration error.
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            VedrError::Configuration(format!(
                "{API_KEY_ENV} not found. Set it in the environment, a .env file, \
                 or ~/.vedrfolnir/secrets.toml"
            ))
        })
    }
}

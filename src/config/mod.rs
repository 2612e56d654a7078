//! Configuration management for taskplan.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::cache::PlanCache;
use crate::core::keychain;
use crate::core::retry::RetryPolicy;
use crate::core::{GeminiClient, PlanGenerator, PlanService};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini model settings.
    pub gemini: GeminiConfig,

    /// Generation pipeline settings.
    pub planner: PlannerConfig,

    /// API configuration.
    pub api: ApiConfig,

    /// TUI configuration.
    pub tui: TuiConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Loads global config first, then merges project-local config if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let global_path = Self::config_path()?;
        let mut config = if global_path.exists() {
            Self::from_file(&global_path)?
        } else {
            Self::default()
        };

        if let Ok(project_path) = Self::project_config_path() {
            if project_path.exists() {
                config.merge(Self::from_file(&project_path)?);
            }
        }

        Ok(config)
    }

    fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
    }

    /// Get the project-local configuration file path.
    ///
    /// Looks for `.taskplan/config.toml` in the current directory.
    pub fn project_config_path() -> anyhow::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(cwd.join(".taskplan").join("config.toml"))
    }

    /// Merge another config into this one (project overrides global).
    ///
    /// Only values that differ from the defaults are taken from `other`.
    fn merge(&mut self, other: Self) {
        let gemini = GeminiConfig::default();
        if other.gemini.model != gemini.model {
            self.gemini.model = other.gemini.model;
        }
        if other.gemini.base_url != gemini.base_url {
            self.gemini.base_url = other.gemini.base_url;
        }
        if other.gemini.api_key_env != gemini.api_key_env {
            self.gemini.api_key_env = other.gemini.api_key_env;
        }
        if other.gemini.timeout_secs != gemini.timeout_secs {
            self.gemini.timeout_secs = other.gemini.timeout_secs;
        }
        if other.gemini.temperature.is_some() {
            self.gemini.temperature = other.gemini.temperature;
        }
        if other.gemini.system_instruction.is_some() {
            self.gemini.system_instruction = other.gemini.system_instruction;
        }

        let planner = PlannerConfig::default();
        if other.planner.save_last != planner.save_last {
            self.planner.save_last = other.planner.save_last;
        }
        if other.planner.max_retries != planner.max_retries {
            self.planner.max_retries = other.planner.max_retries;
        }
        if other.planner.retry_base_delay_ms != planner.retry_base_delay_ms {
            self.planner.retry_base_delay_ms = other.planner.retry_base_delay_ms;
        }
        if other.planner.retry_max_delay_ms != planner.retry_max_delay_ms {
            self.planner.retry_max_delay_ms = other.planner.retry_max_delay_ms;
        }
        if other.planner.cache_capacity != planner.cache_capacity {
            self.planner.cache_capacity = other.planner.cache_capacity;
        }
        if other.planner.cache_ttl_secs != planner.cache_ttl_secs {
            self.planner.cache_ttl_secs = other.planner.cache_ttl_secs;
        }

        if other.api.port != ApiConfig::default().port {
            self.api.port = other.api.port;
        }
        if other.api.host != ApiConfig::default().host {
            self.api.host = other.api.host;
        }
        if other.api.token.is_some() {
            self.api.token = other.api.token;
        }

        if other.tui.mouse != TuiConfig::default().mouse {
            self.tui.mouse = other.tui.mouse;
        }
    }

    /// Get the configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the config directory path (`~/.config/taskplan/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config_home).join("taskplan"));
        }

        if cfg!(target_os = "macos") {
            if let Ok(home) = std::env::var("HOME") {
                return Ok(PathBuf::from(home).join(".config").join("taskplan"));
            }
        }

        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

        Ok(base.config_dir().join("taskplan"))
    }

    /// Get the data directory path (`~/.local/share/taskplan/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine data directory"))?;

        Ok(base.data_dir().join("taskplan"))
    }

    /// Log file used while the TUI owns the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn log_path() -> anyhow::Result<PathBuf> {
        Ok(Self::data_dir()?.join("taskplan.log"))
    }

    /// Resolve the Gemini API key.
    ///
    /// Checks the configured environment variable first, then the keychain.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        // Env first so development builds never trigger keychain prompts
        if let Ok(key) = std::env::var(&self.gemini.api_key_env) {
            if !key.trim().is_empty() {
                return Some(key);
            }
        }

        keychain::gemini_key()
    }

    /// Create the configured plan generator.
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured or the HTTP client fails to build.
    pub fn create_generator(&self) -> anyhow::Result<Arc<dyn PlanGenerator>> {
        let key = self.resolve_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "No Gemini API key configured.\n\n\
                 Set {} or run `taskplan auth login` to store one.",
                self.gemini.api_key_env
            )
        })?;

        Ok(Arc::new(GeminiClient::new(key, &self.gemini)?))
    }

    /// Create the generation pipeline for the configured generator.
    ///
    /// # Errors
    ///
    /// Returns error if the generator cannot be created.
    pub fn create_service(&self) -> anyhow::Result<PlanService> {
        let generator = self.create_generator()?;
        Ok(PlanService::from_config(generator, &self.planner))
    }
}

/// Gemini model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model identifier.
    pub model: String,

    /// API base URL, up to and including the version segment.
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature (model default when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Replacement for the built-in system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: None,
            system_instruction: None,
        }
    }
}

/// Generation pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Save generated plans to history.
    pub save_last: bool,

    /// Retries after the first failed attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub retry_base_delay_ms: u64,

    /// Upper bound on any retry delay.
    pub retry_max_delay_ms: u64,

    /// Cached prompts (0 disables the cache).
    pub cache_capacity: usize,

    /// Seconds a cached plan stays fresh.
    pub cache_ttl_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            save_last: true,
            max_retries: 2,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8000,
            cache_capacity: 64,
            cache_ttl_secs: 600,
        }
    }
}

impl PlannerConfig {
    /// Retry policy described by this section.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
            ..RetryPolicy::default()
        }
    }

    /// Prompt cache described by this section, if enabled.
    #[must_use]
    pub fn build_cache(&self) -> Option<PlanCache> {
        (self.cache_capacity > 0).then(|| {
            PlanCache::new(
                self.cache_capacity,
                Duration::from_secs(self.cache_ttl_secs),
            )
        })
    }
}

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// API token for authentication (optional, but required for remote access).
    /// Can also be set via `TASKPLAN_API_TOKEN` environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            token: None,
        }
    }
}

impl ApiConfig {
    /// Get the API token, preferring env var over config file.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        std::env::var("TASKPLAN_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
    }

    /// Generate a new random API token.
    #[must_use]
    pub fn generate_token() -> String {
        use rand::Rng;
        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        format!("taskplan_{}", hex::encode(bytes))
    }
}

/// TUI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Enable mouse support.
    pub mouse: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { mouse: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.api.port, 5000);
        assert!(config.planner.save_last);
        assert!(config.tui.mouse);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[gemini]
model = "gemini-2.5-pro"
temperature = 0.2

[planner]
cache_capacity = 0
"#,
        )
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.temperature, Some(0.2));
        assert_eq!(config.gemini.timeout_secs, 60);
        assert_eq!(config.planner.cache_capacity, 0);
        assert_eq!(config.planner.max_retries, 2);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn merge_overrides_only_non_default_values() {
        let mut global: Config = toml::from_str(
            r#"
[gemini]
model = "gemini-2.5-pro"

[api]
port = 8080
"#,
        )
        .unwrap();
        let project: Config = toml::from_str(
            r#"
[planner]
save_last = false

[api]
host = "0.0.0.0"
"#,
        )
        .unwrap();

        global.merge(project);
        assert_eq!(global.gemini.model, "gemini-2.5-pro");
        assert_eq!(global.api.port, 8080);
        assert_eq!(global.api.host, "0.0.0.0");
        assert!(!global.planner.save_last);
    }

    #[test]
    fn serialized_config_round_trips() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("temperature"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn retry_policy_from_planner_section() {
        let planner = PlannerConfig {
            max_retries: 5,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 1000,
            ..PlannerConfig::default()
        };
        let policy = planner.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay_ms, 100);
        assert_eq!(policy.max_delay_ms, 1000);
    }

    #[test]
    fn cache_disabled_at_zero_capacity() {
        assert!(PlannerConfig::default().build_cache().is_some());
        let planner = PlannerConfig {
            cache_capacity: 0,
            ..PlannerConfig::default()
        };
        assert!(planner.build_cache().is_none());
    }

    #[test]
    fn api_key_env_is_consulted_first() {
        // HOME is always set in test environments
        let config = Config {
            gemini: GeminiConfig {
                api_key_env: "HOME".to_string(),
                ..GeminiConfig::default()
            },
            ..Config::default()
        };
        assert_eq!(config.resolve_api_key(), std::env::var("HOME").ok());
    }

    #[test]
    fn generated_tokens_are_prefixed_and_unique() {
        let a = ApiConfig::generate_token();
        let b = ApiConfig::generate_token();
        assert!(a.starts_with("taskplan_"));
        assert_eq!(a.len(), "taskplan_".len() + 64);
        assert_ne!(a, b);
    }
}

//! Configuration loading, validation, and management for CrossClaw.
//!
//! Loads configuration from `~/.crossclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.crossclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (the deployment name when the provider is Azure)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Temperature for solver turns
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Orchestrator loop settings
    #[serde(default)]
    pub solver: SolverConfig,

    /// Candidate generation settings
    #[serde(default)]
    pub candidates: CandidateConfig,

    /// Backend retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Event feed settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("solver", &self.solver)
            .field("candidates", &self.candidates)
            .field("retry", &self.retry)
            .field("events", &self.events)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Hard stop for the orchestrator loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Consider compressing the context every N iterations
    #[serde(default = "default_compress_every")]
    pub compress_every: u32,

    /// Compress only once the context holds at least this many messages
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold: usize,

    /// Nudge the backend with remaining clues when it stops calling tools
    #[serde(default = "default_true")]
    pub reminder_on_silence: bool,
}

fn default_max_iterations() -> u32 {
    400
}
fn default_compress_every() -> u32 {
    15
}
fn default_compress_threshold() -> usize {
    50
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            compress_every: default_compress_every(),
            compress_threshold: default_compress_threshold(),
            reminder_on_silence: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Sampling temperature for candidate requests
    #[serde(default = "default_candidate_temperature")]
    pub temperature: f32,

    #[serde(default = "default_candidate_count")]
    pub default_count: usize,

    #[serde(default = "default_candidate_max")]
    pub max_count: usize,
}

fn default_candidate_temperature() -> f32 {
    0.9
}
fn default_candidate_count() -> usize {
    5
}
fn default_candidate_max() -> usize {
    10
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            temperature: default_candidate_temperature(),
            default_count: default_candidate_count(),
            max_count: default_candidate_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_backoff_factor() -> f64 {
    2.0
}
fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer per session; slow observers lag past this
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL, or the resource endpoint for Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Azure `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.crossclaw/config.toml).
    ///
    /// Environment variables for the API key, in priority order:
    /// - `CROSSCLAW_API_KEY`
    /// - `AZURE_OPENAI_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("CROSSCLAW_API_KEY")
                .or_else(|| lookup("AZURE_OPENAI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        let endpoint = lookup("AZURE_OPENAI_ENDPOINT");
        let api_version = lookup("OPENAI_API_VERSION");
        if endpoint.is_some() || api_version.is_some() {
            let azure = self.providers.entry("azure".into()).or_default();
            if let Some(endpoint) = endpoint {
                azure.api_url = Some(endpoint);
                // An Azure endpoint in the environment selects Azure unless
                // the provider was chosen explicitly.
                if self.default_provider == default_provider() {
                    self.default_provider = "azure".into();
                }
            }
            if let Some(version) = api_version {
                azure.api_version = Some(version);
            }
        }

        if let Some(provider) = lookup("CROSSCLAW_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("CROSSCLAW_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".crossclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature_ok = |t: f32| (0.0..=2.0).contains(&t);
        if !temperature_ok(self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !temperature_ok(self.candidates.temperature) {
            return Err(ConfigError::ValidationError(
                "candidates.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.solver.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "solver.max_iterations must be at least 1".into(),
            ));
        }
        if self.solver.compress_every == 0 {
            return Err(ConfigError::ValidationError(
                "solver.compress_every must be at least 1".into(),
            ));
        }
        if self.candidates.default_count == 0 || self.candidates.max_count < self.candidates.default_count {
            return Err(ConfigError::ValidationError(
                "candidates must satisfy max_count >= default_count >= 1".into(),
            ));
        }
        if self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_factor must be at least 1.0".into(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "events.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// The effective configuration as TOML with secrets blanked.
    pub fn redacted_toml(&self) -> String {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some("[REDACTED]".into());
        }
        for provider in shown.providers.values_mut() {
            if provider.api_key.is_some() {
                provider.api_key = Some("[REDACTED]".into());
            }
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            solver: SolverConfig::default(),
            candidates: CandidateConfig::default(),
            retry: RetryConfig::default(),
            events: EventsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.solver.max_iterations, 400);
        assert_eq!(config.solver.compress_every, 15);
        assert_eq!(config.solver.compress_threshold, 50);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.candidates.max_count, config.candidates.max_count);
    }

    #[test]
    fn invalid_settings_rejected() {
        let hot = AppConfig { default_temperature: 5.0, ..AppConfig::default() };
        assert!(hot.validate().is_err());

        let mut no_budget = AppConfig::default();
        no_budget.solver.max_iterations = 0;
        assert!(no_budget.validate().is_err());

        let mut inverted = AppConfig::default();
        inverted.candidates.default_count = 12;
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o-mini"

[solver]
max_iterations = 50

[providers.azure]
api_url = "https://example.openai.azure.com"
api_version = "2024-06-01"
"#
        )
        .unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.solver.max_iterations, 50);
        assert_eq!(config.solver.compress_every, 15);
        assert_eq!(
            config.providers["azure"].api_version.as_deref(),
            Some("2024-06-01")
        );
    }

    #[test]
    fn unparsable_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "solver = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_key_priority() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-open"), ("CROSSCLAW_API_KEY", "sk-cross")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-cross"));

        let mut preset = AppConfig { api_key: Some("from-file".into()), ..AppConfig::default() };
        preset.apply_env(env(&[("OPENAI_API_KEY", "sk-open")]));
        assert_eq!(preset.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn azure_endpoint_selects_azure() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("OPENAI_API_VERSION", "2024-06-01"),
            ("AZURE_OPENAI_API_KEY", "az-key"),
        ]));
        assert_eq!(config.default_provider, "azure");
        assert_eq!(config.api_key.as_deref(), Some("az-key"));
        let azure = &config.providers["azure"];
        assert_eq!(azure.api_url.as_deref(), Some("https://res.openai.azure.com"));
        assert_eq!(azure.api_version.as_deref(), Some("2024-06-01"));

        let mut explicit = AppConfig::default();
        explicit.apply_env(env(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("CROSSCLAW_PROVIDER", "openai"),
            ("CROSSCLAW_MODEL", "gpt-4.1"),
        ]));
        assert_eq!(explicit.default_provider, "openai");
        assert_eq!(explicit.default_model, "gpt-4.1");
    }

    #[test]
    fn debug_and_display_redact_secrets() {
        let mut config = AppConfig { api_key: Some("sk-secret".into()), ..AppConfig::default() };
        config.providers.insert(
            "azure".into(),
            ProviderConfig { api_key: Some("az-secret".into()), ..ProviderConfig::default() },
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("az-secret"));
        let shown = config.redacted_toml();
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o"));
        assert!(toml_str.contains("max_iterations = 400"));
    }
}

//! Provider router: selects the correct LLM provider based on config.

use crate::openai_compat::{DEFAULT_AZURE_API_VERSION, OpenAiCompatProvider};
use crossclaw_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// An Azure entry without an endpoint is skipped, so a router whose default
/// is such an entry has no default provider.
pub fn build_from_config(config: &crossclaw_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        if name == "azure" {
            let Some(endpoint) = provider_config.api_url.as_deref() else {
                warn!("Azure provider configured without an endpoint (AZURE_OPENAI_ENDPOINT), skipping");
                continue;
            };
            let version = provider_config
                .api_version
                .as_deref()
                .unwrap_or(DEFAULT_AZURE_API_VERSION);
            router.register(
                name.clone(),
                Arc::new(OpenAiCompatProvider::azure(endpoint, version, &api_key)),
            );
            continue;
        }

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() && config.default_provider != "azure" {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(&config.default_provider, &base_url, &api_key)),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossclaw_config::{AppConfig, ProviderConfig};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.default_name(), "openai");
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let router = build_from_config(&AppConfig::default());
        assert_eq!(router.default().unwrap().name(), "openai");
    }

    #[test]
    fn build_azure_from_config() {
        let mut config = AppConfig { default_provider: "azure".into(), ..AppConfig::default() };
        config.providers.insert(
            "azure".into(),
            ProviderConfig {
                api_url: Some("https://res.openai.azure.com".into()),
                ..ProviderConfig::default()
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.default().unwrap().name(), "azure");
    }

    #[test]
    fn azure_without_endpoint_has_no_default() {
        let config = AppConfig { default_provider: "azure".into(), ..AppConfig::default() };
        let router = build_from_config(&config);
        assert!(router.default().is_none());
    }
}

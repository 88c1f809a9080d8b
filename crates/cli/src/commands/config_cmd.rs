//! `crossclaw config`: Configuration inspection.

use crossclaw_config::AppConfig;
use crossclaw_core::provider::Provider as _;
use crossclaw_providers::build_from_config;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.redacted_toml());
    if !config.has_api_key() {
        eprintln!("warning: no API key set (CROSSCLAW_API_KEY, AZURE_OPENAI_API_KEY or OPENAI_API_KEY)");
    }
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

/// Ask the default backend whether it is reachable.
pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", router.default_name()))?;
    if provider.health_check().await? {
        println!("Backend '{}' is reachable", provider.name());
        Ok(())
    } else {
        Err(format!("Backend '{}' answered the health check with an error status", provider.name()).into())
    }
}

mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./segplay.toml",
        "./config.toml",
        "~/.config/segplay/config.toml",
        "/etc/segplay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.origin.base_url.is_empty() {
        anyhow::bail!("Origin base_url cannot be empty");
    }

    // Manifest URLs are formed by appending the filename directly.
    if !config.origin.base_url.ends_with('/') {
        anyhow::bail!("Origin base_url must end with '/'");
    }

    // The index file legitimately appears later, once ingestion runs.
    if !config.index.path.exists() {
        tracing::warn!("Segment index does not exist yet: {:?}", config.index.path);
    }

    Ok(())
}

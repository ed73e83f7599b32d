//! Configuration file handling for the Hitplace CLI

use anyhow::{Context, Result};
use hitplace_core::HitplaceConfig;
use std::path::{Path, PathBuf};

/// `~/.hitplace/config.toml`, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hitplace").join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(path: Option<PathBuf>) -> Result<HitplaceConfig> {
    let config = if let Some(path) = path {
        read_config(&path)?
    } else if let Some(default_path) = default_config_path().filter(|p| p.exists()) {
        read_config(&default_path)?
    } else {
        HitplaceConfig::default()
    };

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<HitplaceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &HitplaceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

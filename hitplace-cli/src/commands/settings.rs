//! `hitplace config` subcommands

use crate::config::{default_config_path, save_config};
use anyhow::{bail, Context, Result};
use colored::*;
use hitplace_core::HitplaceConfig;
use std::path::{Path, PathBuf};

/// Write the default configuration to `path` (or the per-user location)
pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => default_config_path().context("no home directory; pass --path")?,
    };
    write_default(&path, force)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_config(&HitplaceConfig::default(), path)
}

/// Print `config` as TOML
pub fn show(config: &HitplaceConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

//! Configuration for placement, sampling and export

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Complete Hitplace configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitplaceConfig {
    /// Handshake and placement behavior
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Measurement window timings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Export artifact settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Model selection keys mapped to glTF files
    #[serde(default)]
    pub models: BTreeMap<String, PathBuf>,
}

/// What a select action does with placed objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Every select adds a new object
    #[default]
    Spawn,
    /// A single persistent object is moved on each select
    Reposition,
}

/// `[placement]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Spawn or reposition on select
    #[serde(default)]
    pub mode: PlacementMode,

    /// Extra attempts for a rejected handshake request
    #[serde(default)]
    pub handshake_retries: u32,

    /// Edge length in meters of the built-in cube
    #[serde(default = "default_primitive_size")]
    pub primitive_size: f32,
}

/// `[sampler]` section, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Time after start before samples are recorded
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Total window length measured from start, warm-up included
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// How often frame counts are turned into an fps value
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

/// `[export]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Name offered for the CSV file
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Where the CLI writes exports
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mode: PlacementMode::default(),
            handshake_retries: 0,
            primitive_size: default_primitive_size(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            window_ms: default_window_ms(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            output_dir: None,
        }
    }
}

fn default_primitive_size() -> f32 { 0.1 }
fn default_warmup_ms() -> u64 { 5_000 }
fn default_window_ms() -> u64 { 35_000 }
fn default_flush_interval_ms() -> u64 { 1_000 }
fn default_filename() -> String { "fps_data.csv".to_string() }

impl HitplaceConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler.validate()?;
        if self.export.filename.trim().is_empty() {
            return Err(ConfigError::EmptyFilename);
        }
        if !(self.placement.primitive_size > 0.0) {
            return Err(ConfigError::InvalidPrimitiveSize(self.placement.primitive_size));
        }
        Ok(())
    }
}

impl SamplerConfig {
    /// Check the window timings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::ZeroFlushInterval);
        }
        if self.warmup_ms >= self.window_ms {
            return Err(ConfigError::WarmupExceedsWindow {
                warmup_ms: self.warmup_ms,
                window_ms: self.window_ms,
            });
        }
        Ok(())
    }
}

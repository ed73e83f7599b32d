//! Error types for Hitplace

use crate::tracker::{ReferenceSpaceKind, RequestId};
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the spatial tracker while setting up a session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// The tracker cannot provide the requested reference space
    #[error("reference space '{0}' is not supported")]
    UnsupportedReferenceSpace(ReferenceSpaceKind),

    /// The hit-test source request was refused
    #[error("hit-test source request rejected: {0}")]
    HitTestSourceRejected(String),

    /// A request resolved to the wrong kind of handle
    #[error("request {0} resolved with an unexpected handle type")]
    UnexpectedHandle(RequestId),

    /// Any other platform failure
    #[error("tracker error: {0}")]
    Platform(String),
}

/// Failures while resolving or loading a model
#[derive(Error, Debug)]
pub enum ModelError {
    /// No catalog entry for the key
    #[error("unknown model selection: {0}")]
    UnknownSelection(String),

    /// The model file could not be read
    #[error("failed to read model {path}: {source}")]
    Io {
        /// Model file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The model file is not a usable glTF document
    #[error("failed to parse model {path}: {source}")]
    Parse {
        /// Model file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: anyhow::Error,
    },

    /// File loading is unavailable (wasm32)
    #[error("model loading is not available on this platform")]
    Unsupported,
}

/// Failures while serializing or delivering an export artifact
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing the artifact failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV buffer was not UTF-8
    #[error("export is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Warm-up leaves no active phase
    #[error("warm-up ({warmup_ms} ms) must be shorter than the measurement window ({window_ms} ms)")]
    WarmupExceedsWindow {
        /// Configured warm-up
        warmup_ms: u64,
        /// Configured window
        window_ms: u64,
    },

    /// A zero flush interval
    #[error("flush interval must be greater than zero")]
    ZeroFlushInterval,

    /// Blank export filename
    #[error("export filename must not be empty")]
    EmptyFilename,

    /// Cube size that is zero, negative or NaN
    #[error("primitive size must be positive, got {0}")]
    InvalidPrimitiveSize(f32),
}

/// Top-level error for Hitplace operations
#[derive(Error, Debug)]
pub enum Error {
    /// Tracker failure
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Model failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Export failure
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid or unreadable scenario
    #[error("scenario error: {0}")]
    Scenario(String),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

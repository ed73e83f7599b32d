//! CSV export of frame-rate samples

use crate::error::ExportError;
use crate::sampler::MetricSample;
use std::path::{Path, PathBuf};
use tracing::info;

/// MIME type of exported samples
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Shown instead of a download when there is nothing to export
pub const NOTHING_TO_EXPORT: &str = "No FPS data to export. Start a measurement first.";

/// A downloadable CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvArtifact {
    /// Suggested file name
    pub filename: String,
    /// MIME type
    pub mime_type: &'static str,
    /// UTF-8 file contents
    pub contents: String,
}

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No samples recorded; the user should see [`NOTHING_TO_EXPORT`]
    NothingToExport,
    /// An artifact ready to be delivered
    Ready(CsvArtifact),
}

impl ExportOutcome {
    /// User-facing notice, if the export produced no file
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ExportOutcome::NothingToExport => Some(NOTHING_TO_EXPORT),
            ExportOutcome::Ready(_) => None,
        }
    }

    /// The artifact, if one was produced
    pub fn artifact(&self) -> Option<&CsvArtifact> {
        match self {
            ExportOutcome::Ready(artifact) => Some(artifact),
            ExportOutcome::NothingToExport => None,
        }
    }
}

/// Render samples as `timestamp,fps` rows
///
/// Rows are separated by `\n`; the last row has no terminator.
pub fn samples_to_csv(samples: &[MetricSample]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for sample in samples {
        writer.serialize(sample)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Build the export for `samples`
pub fn export_samples(samples: &[MetricSample], filename: &str) -> Result<ExportOutcome, ExportError> {
    if samples.is_empty() {
        info!("{}", NOTHING_TO_EXPORT);
        return Ok(ExportOutcome::NothingToExport);
    }

    Ok(ExportOutcome::Ready(CsvArtifact {
        filename: filename.to_string(),
        mime_type: CSV_MIME_TYPE,
        contents: samples_to_csv(samples)?,
    }))
}

/// Delivers artifacts to the user
pub trait ArtifactSink {
    /// Hand `artifact` over, e.g. as a download or a file on disk
    fn deliver(&mut self, artifact: &CsvArtifact) -> Result<(), ExportError>;
}

/// Writes artifacts into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Write into `dir`, creating it on first delivery
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, artifact: &CsvArtifact) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.filename);
        std::fs::write(&path, artifact.contents.as_bytes())?;
        info!(path = %path.display(), bytes = artifact.contents.len(), "export written");
        self.written.push(path);
        Ok(())
    }
}

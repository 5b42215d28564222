use std::path::{Path, PathBuf};

use postgrab_core::RunSummary;
use serde::Serialize;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report path {0:?} has no file name")]
    InvalidPath(PathBuf),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Serialize)]
struct RunReport<'a> {
    finished_utc: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Write the summary as pretty JSON to `path`, replacing any earlier report.
pub fn write_summary_report(
    path: &Path,
    summary: &RunSummary,
    finished_utc: &str,
) -> Result<PathBuf, ReportError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ReportError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let report = RunReport {
        finished_utc,
        summary,
    };
    let mut content = serde_json::to_string_pretty(&report)?;
    content.push('\n');

    let writer = AtomicFileWriter::new(dir);
    Ok(writer.write(filename, content.as_bytes())?)
}

//! Output formats.
//!
//! The full archive is always JSON ([`json::JsonArchiveWriter`]). Selective
//! exports of a single kind can also be written as CSV.

pub mod csv;
pub mod json;

use crate::io::traits::{ExportRecord, ExportSink};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Supported formats for selective export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Pretty-printed JSON array.
    #[default]
    Json,
    /// CSV with a header row.
    Csv,
}

impl Format {
    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Json, Self::Csv]
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some(ext) => Err(Error::InvalidInput(format!(
                "Unsupported file extension: .{ext}"
            ))),
            None => Err(Error::InvalidInput(
                "Cannot determine format: file has no extension".to_string(),
            )),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::InvalidInput(format!("Unknown format: {s}"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Creates an export sink for the given format and writer.
pub fn create_export_sink<'w, R, W>(writer: W, format: Format) -> Box<dyn ExportSink<R> + 'w>
where
    R: ExportRecord,
    W: Write + 'w,
{
    match format {
        Format::Json => Box::new(json::JsonExportSink::new(writer)),
        Format::Csv => Box::new(csv::CsvExportSink::new(writer)),
    }
}

/// Maps a write failure to [`Error::OperationFailed`].
pub(crate) fn write_failed(operation: &str, cause: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}

//! JSON writers.
//!
//! [`JsonArchiveWriter`] streams the full archive object one element at a
//! time:
//!
//! ```text
//! {"Pricelists":[...],"Assignments":[...],"Prices":[...]}
//! ```
//!
//! [`JsonExportSink`] writes a single kind as a pretty-printed array.

use super::write_failed;
use crate::Result;
use crate::io::traits::{ExportRecord, ExportSink};
use serde::Serialize;
use std::io::{BufWriter, Write};

const WRITE_ARCHIVE: &str = "write_archive";

/// Streaming writer for the archive object.
///
/// Nothing is buffered beyond the underlying [`BufWriter`]. If a caller
/// stops before [`finish`](Self::finish) the output is a truncated document.
pub struct JsonArchiveWriter<W: Write> {
    writer: BufWriter<W>,
    sections: usize,
    elements: usize,
}

impl<W: Write> JsonArchiveWriter<W> {
    /// Creates a writer over `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            sections: 0,
            elements: 0,
        }
    }

    /// Opens the top-level object.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the write fails.
    pub fn begin(&mut self) -> Result<()> {
        self.raw(b"{")
    }

    /// Writes the key of section `name` and opens its array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the write fails.
    pub fn begin_section(&mut self, name: &str) -> Result<()> {
        if self.sections > 0 {
            self.raw(b",")?;
        }
        serde_json::to_writer(&mut self.writer, name)
            .map_err(|e| write_failed(WRITE_ARCHIVE, e))?;
        self.raw(b":[")?;
        self.sections += 1;
        self.elements = 0;
        Ok(())
    }

    /// Writes one array element.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if serialization or the
    /// write fails.
    pub fn write_element<T: Serialize + ?Sized>(&mut self, element: &T) -> Result<()> {
        if self.elements > 0 {
            self.raw(b",")?;
        }
        serde_json::to_writer(&mut self.writer, element)
            .map_err(|e| write_failed(WRITE_ARCHIVE, e))?;
        self.elements += 1;
        Ok(())
    }

    /// Closes the current section's array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the write fails.
    pub fn end_section(&mut self) -> Result<()> {
        self.raw(b"]")
    }

    /// Closes the top-level object and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the write or flush fails.
    pub fn finish(mut self) -> Result<()> {
        self.raw(b"}")?;
        self.flush()
    }

    /// Flushes buffered output without closing anything.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| write_failed(WRITE_ARCHIVE, e))
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| write_failed(WRITE_ARCHIVE, e))
    }
}

/// JSON export sink.
///
/// Writes records as one pretty-printed JSON array.
pub struct JsonExportSink<W: Write> {
    writer: BufWriter<W>,
    /// Number of records written.
    count: usize,
}

impl<W: Write> JsonExportSink<W> {
    /// Creates a new JSON export sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            count: 0,
        }
    }
}

impl<R: ExportRecord, W: Write> ExportSink<R> for JsonExportSink<W> {
    fn write(&mut self, record: &R) -> Result<()> {
        let separator: &[u8] = if self.count == 0 { b"[\n" } else { b",\n" };
        self.writer
            .write_all(separator)
            .map_err(|e| write_failed("write_json", e))?;
        serde_json::to_writer_pretty(&mut self.writer, record)
            .map_err(|e| write_failed("write_json", e))?;
        self.count += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        let closing: &[u8] = if self.count == 0 { b"[]\n" } else { b"\n]\n" };
        self.writer
            .write_all(closing)
            .map_err(|e| write_failed("write_json", e))?;
        self.writer
            .flush()
            .map_err(|e| write_failed("flush_json", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::ExportablePricelist;
    use crate::models::Pricelist;

    #[test]
    fn test_archive_layout() {
        let mut out = Vec::new();
        let mut writer = JsonArchiveWriter::new(&mut out);
        writer.begin().unwrap();
        writer.begin_section("Pricelists").unwrap();
        writer.write_element(&serde_json::json!({"id": "a"})).unwrap();
        writer.write_element(&serde_json::json!({"id": "b"})).unwrap();
        writer.end_section().unwrap();
        writer.begin_section("Prices").unwrap();
        writer.end_section().unwrap();
        writer.finish().unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"Pricelists":[{"id":"a"},{"id":"b"}],"Prices":[]}"#
        );
    }

    #[test]
    fn test_export_sink_writes_pretty_array() {
        let mut out = Vec::new();
        let mut sink: Box<dyn ExportSink<ExportablePricelist> + '_> =
            Box::new(JsonExportSink::new(&mut out));
        sink.write(&ExportablePricelist::from(&Pricelist::new("a", "A", "USD")))
            .unwrap();
        sink.write(&ExportablePricelist::from(&Pricelist::new("b", "B", "EUR")))
            .unwrap();
        sink.finalize().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[\n"));
        let parsed: Vec<Pricelist> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].currency, "EUR");
    }

    #[test]
    fn test_empty_export_is_empty_array() {
        let mut out = Vec::new();
        let sink: Box<dyn ExportSink<ExportablePricelist> + '_> =
            Box::new(JsonExportSink::new(&mut out));
        sink.finalize().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}

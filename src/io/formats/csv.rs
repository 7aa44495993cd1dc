//! CSV export sink.
//!
//! Columns come from [`ExportRecord::csv_headers`]; denormalized names are
//! ordinary columns and unset values are empty cells.

use super::write_failed;
use crate::Result;
use crate::io::traits::{ExportRecord, ExportSink};
use std::io::Write;
use std::marker::PhantomData;

/// CSV export sink.
pub struct CsvExportSink<R, W: Write> {
    writer: csv::Writer<W>,
    /// Whether headers have been written.
    headers_written: bool,
    record: PhantomData<fn(&R)>,
}

impl<R: ExportRecord, W: Write> CsvExportSink<R, W> {
    /// Creates a new CSV export sink.
    pub fn new(writer: W) -> Self {
        let csv_writer = csv::WriterBuilder::new()
            .has_headers(false) // We write headers manually
            .from_writer(writer);

        Self {
            writer: csv_writer,
            headers_written: false,
            record: PhantomData,
        }
    }

    /// Writes headers if not already written.
    fn ensure_headers(&mut self) -> Result<()> {
        if !self.headers_written {
            self.writer
                .write_record(R::csv_headers())
                .map_err(|e| write_failed("write_csv_headers", e))?;
            self.headers_written = true;
        }
        Ok(())
    }
}

impl<R: ExportRecord, W: Write> ExportSink<R> for CsvExportSink<R, W> {
    fn write(&mut self, record: &R) -> Result<()> {
        self.ensure_headers()?;
        self.writer
            .write_record(record.csv_row())
            .map_err(|e| write_failed("write_csv", e))
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        // An empty export still gets a header row.
        self.ensure_headers()?;
        self.writer
            .flush()
            .map_err(|e| write_failed("flush_csv", e))
    }
}

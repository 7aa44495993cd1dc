//! Selective export of a single kind.

use crate::config::SettingsManager;
use crate::io::cancellation::CancellationToken;
use crate::io::datasource::{
    ExportDataQuery, PriceExportPagedDataSource, PricelistAssignmentExportPagedDataSource,
    PricelistExportPagedDataSource,
};
use crate::io::formats::{Format, create_export_sink};
use crate::io::paging;
use crate::io::progress::ProgressInfo;
use crate::io::traits::PagedDataSource;
use crate::models::EntityKind;
use crate::storage::PricingStores;
use crate::Result;
use tracing::{info, instrument};

/// Exports one kind, selected by an [`ExportDataQuery`], as JSON or CSV.
///
/// Paging, progress and cancellation follow the full export. With object
/// ids the output keeps the requested order.
pub struct DataExporter {
    stores: PricingStores,
    batch_size: usize,
}

impl DataExporter {
    /// Creates an exporter. The page size is read from `settings` once.
    #[must_use]
    pub fn new(stores: PricingStores, settings: &dyn SettingsManager) -> Self {
        Self {
            stores,
            batch_size: paging::batch_size_from_settings(settings),
        }
    }

    /// Returns the page size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Writes the records of `kind` matching `query` to `writer`.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Cancelled`] if `cancel` is signaled
    /// - [`crate::Error::FetchFailed`] if a store or lookup fails
    /// - [`crate::Error::OperationFailed`] if writing fails
    #[instrument(skip_all, fields(kind = %kind, format = %format))]
    pub fn export<W: std::io::Write>(
        &self,
        kind: EntityKind,
        query: &ExportDataQuery,
        format: Format,
        writer: W,
        mut on_progress: impl FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<usize> {
        cancel.check()?;

        let exported = match kind {
            EntityKind::Pricelist => self.export_source(
                &PricelistExportPagedDataSource::new(&self.stores, query.clone()),
                format,
                writer,
                &mut on_progress,
                cancel,
            ),
            EntityKind::Assignment => self.export_source(
                &PricelistAssignmentExportPagedDataSource::new(&self.stores, query.clone()),
                format,
                writer,
                &mut on_progress,
                cancel,
            ),
            EntityKind::Price => self.export_source(
                &PriceExportPagedDataSource::new(&self.stores, query.clone()),
                format,
                writer,
                &mut on_progress,
                cancel,
            ),
        }?;

        info!(kind = %kind, exported, "selective export complete");
        Ok(exported)
    }

    fn export_source<S, W>(
        &self,
        source: &S,
        format: Format,
        writer: W,
        on_progress: &mut dyn FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<usize>
    where
        S: PagedDataSource,
        W: std::io::Write,
    {
        let kind = source.kind();
        let mut sink = create_export_sink::<S::Record, W>(writer, format);

        let exported = paging::for_each_page(source, self.batch_size, cancel, |records, progress| {
            for record in &records {
                sink.write(record)?;
            }
            on_progress(ProgressInfo::exported(kind, progress.processed, progress.total));
            Ok(())
        })?;

        sink.finalize()?;
        Ok(exported)
    }
}

impl std::fmt::Debug for DataExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataExporter")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

//! Full-archive export.

use super::{ExportSummary, PricingExportImport};
use crate::io::cancellation::CancellationToken;
use crate::io::datasource::{
    ExportDataQuery, PriceExportPagedDataSource, PricelistAssignmentExportPagedDataSource,
    PricelistExportPagedDataSource,
};
use crate::io::formats::json::JsonArchiveWriter;
use crate::io::paging;
use crate::io::progress::ProgressInfo;
use crate::io::traits::{ExportRecord, PagedDataSource};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

impl PricingExportImport {
    /// Streams every price list, assignment and price into `sink` as one
    /// JSON object.
    ///
    /// Sections are written in the order `Pricelists`, `Assignments`,
    /// `Prices`, one page at a time. Elements are the stored entities
    /// themselves, so no related names are looked up. `on_progress` is
    /// called once per page.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if `cancel` is signaled before the start or
    ///   between pages
    /// - [`Error::FetchFailed`] if a store fails
    /// - [`Error::OperationFailed`] if writing to `sink` fails
    ///
    /// On error `sink` holds a truncated document.
    #[instrument(skip_all, fields(batch_size = self.batch_size()))]
    pub fn export<W: Write>(
        &self,
        sink: W,
        mut on_progress: impl FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<ExportSummary> {
        cancel.check()?;

        let batch_size = self.batch_size();
        let query = ExportDataQuery::default();
        let mut writer = JsonArchiveWriter::new(sink);
        let mut summary = ExportSummary::default();

        writer.begin()?;
        summary.pricelists = export_section(
            &mut writer,
            &PricelistExportPagedDataSource::new(self.stores(), query.clone())
                .without_enrichment(),
            batch_size,
            &mut on_progress,
            cancel,
        )?;
        summary.assignments = export_section(
            &mut writer,
            &PricelistAssignmentExportPagedDataSource::new(self.stores(), query.clone())
                .without_enrichment(),
            batch_size,
            &mut on_progress,
            cancel,
        )?;
        summary.prices = export_section(
            &mut writer,
            &PriceExportPagedDataSource::new(self.stores(), query).without_enrichment(),
            batch_size,
            &mut on_progress,
            cancel,
        )?;
        writer.finish()?;

        info!(
            pricelists = summary.pricelists,
            assignments = summary.assignments,
            prices = summary.prices,
            "export complete"
        );
        Ok(summary)
    }

    /// Exports the archive into a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the export fails.
    pub fn export_to_file(
        &self,
        path: &Path,
        on_progress: impl FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<ExportSummary> {
        let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: e.to_string(),
        })?;
        self.export(file, on_progress, cancel)
    }
}

#[instrument(skip_all, fields(section = %source.kind()))]
fn export_section<S, W>(
    writer: &mut JsonArchiveWriter<W>,
    source: &S,
    batch_size: usize,
    on_progress: &mut dyn FnMut(ProgressInfo),
    cancel: &CancellationToken,
) -> Result<usize>
where
    S: PagedDataSource,
    W: Write,
{
    let kind = source.kind();
    writer.begin_section(kind.section_name())?;

    let exported = paging::for_each_page(source, batch_size, cancel, |records, progress| {
        for record in &records {
            writer.write_element(record.entity())?;
        }

        metrics::counter!(
            "pricing_transfer_records_total",
            "direction" => "export",
            "section" => kind.as_str()
        )
        .increment(records.len() as u64);
        metrics::counter!(
            "pricing_transfer_batches_total",
            "direction" => "export",
            "section" => kind.as_str()
        )
        .increment(1);

        on_progress(ProgressInfo::exported(kind, progress.processed, progress.total));
        Ok(())
    })?;

    writer.end_section()?;
    info!(section = %kind, exported, "section exported");
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSettings;
    use crate::models::{Catalog, Price, Pricelist, PricelistAssignment};
    use crate::storage::{CatalogService, EntityStore, InMemoryPricingStore, PricingStores};
    use std::sync::Arc;

    struct UnreachableCatalogs;

    impl CatalogService for UnreachableCatalogs {
        fn get_by_ids(&self, _ids: &[String]) -> Result<Vec<Catalog>> {
            Err(Error::OperationFailed {
                operation: "get_catalogs".to_string(),
                cause: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_empty_stores_export_all_sections() {
        let engine = PricingExportImport::new(
            PricingStores::from_backend(Arc::new(InMemoryPricingStore::new())),
            Arc::new(StaticSettings::new()),
        );
        let mut out = Vec::new();
        let mut reports = Vec::new();

        let summary = engine
            .export(&mut out, |p| reports.push(p), &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"Pricelists":[],"Assignments":[],"Prices":[]}"#
        );
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].description, "0 of 0 price lists have been exported");
    }

    #[test]
    fn test_cancelled_before_start_writes_nothing() {
        let store = Arc::new(InMemoryPricingStore::new());
        EntityStore::<Pricelist>::save(&*store, &[Pricelist::new("a", "A", "USD")]).unwrap();
        let engine = PricingExportImport::new(
            PricingStores::from_backend(store),
            Arc::new(StaticSettings::new()),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        let err = engine.export(&mut out, |_| {}, &cancel).unwrap_err();

        assert!(err.is_cancelled());
        assert!(out.is_empty());
    }

    #[test]
    fn test_archive_holds_entities_without_lookups() {
        let store = Arc::new(
            InMemoryPricingStore::new().with_catalogs([Catalog::new("cat1", "Main")]),
        );
        EntityStore::<Pricelist>::save(&*store, &[Pricelist::new("pl1", "Retail", "USD")])
            .unwrap();
        EntityStore::<PricelistAssignment>::save(
            &*store,
            &[PricelistAssignment::new("a1", "cat1", "pl1")],
        )
        .unwrap();
        EntityStore::<Price>::save(&*store, &[Price::new("p1", "pl1", "sku", 2.0)]).unwrap();

        let mut stores = PricingStores::from_backend(store);
        stores.catalogs = Arc::new(UnreachableCatalogs);
        let engine = PricingExportImport::new(stores, Arc::new(StaticSettings::new()));

        let mut out = Vec::new();
        let summary = engine
            .export(&mut out, |_| {}, &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.total(), 3);
        let archive: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(archive["Assignments"][0]["catalogId"], "cat1");
        assert!(archive["Assignments"][0].get("catalogName").is_none());
        assert!(archive["Assignments"][0].get("pricelistName").is_none());
        assert!(archive["Prices"][0].get("pricelistName").is_none());
    }
}

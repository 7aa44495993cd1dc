//! Full-archive import.
//!
//! The archive is decoded with a [`DeserializeSeed`] driven straight off the
//! reader, so at most one batch of entities is held in memory. Each batch is
//! saved through the matching store as soon as it fills.

use super::{ImportSummary, PricingExportImport};
use crate::io::cancellation::CancellationToken;
use crate::io::progress::ProgressInfo;
use crate::models::{Entity, EntityKind};
use crate::storage::{EntityStore, PricingStores};
use crate::{Error, Result};
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, instrument};

impl PricingExportImport {
    /// Reads an archive from `source`, saving each section in batches.
    ///
    /// Sections may appear in any order or not at all. Unknown top-level
    /// fields are skipped and a `null` section counts as empty.
    /// `on_progress` is called once per saved batch with the section's
    /// cumulative count.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if `cancel` is signaled before the start or
    ///   after a saved batch
    /// - [`Error::DecodeFailed`] if the document is not an object or an
    ///   element has the wrong shape
    /// - [`Error::SaveFailed`] if a store rejects a batch
    /// - [`Error::OperationFailed`] if reading `source` fails
    ///
    /// A leading UTF-8 byte order mark is skipped. Batches saved before an error stay persisted.
    #[instrument(skip_all, fields(batch_size = self.batch_size()))]
    pub fn import<R: Read>(
        &self,
        source: R,
        mut on_progress: impl FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<ImportSummary> {
        cancel.check()?;

        let mut ctx = ImportContext {
            stores: self.stores(),
            batch_size: self.batch_size(),
            on_progress: &mut on_progress,
            cancel,
            summary: ImportSummary::default(),
            failure: None,
        };

        let mut reader = BufReader::new(source);
        skip_utf8_bom(&mut reader)?;

        let mut de = serde_json::Deserializer::from_reader(reader);
        let decoded = ArchiveSeed { ctx: &mut ctx }
            .deserialize(&mut de)
            .and_then(|()| de.end());

        if let Err(e) = decoded {
            return Err(ctx.failure.take().unwrap_or_else(|| decode_error(&e)));
        }

        let summary = ctx.summary;
        info!(
            pricelists = summary.pricelists,
            assignments = summary.assignments,
            prices = summary.prices,
            "import complete"
        );
        Ok(summary)
    }

    /// Imports the archive stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the import fails.
    pub fn import_from_file(
        &self,
        path: &Path,
        on_progress: impl FnMut(ProgressInfo),
        cancel: &CancellationToken,
    ) -> Result<ImportSummary> {
        let file = std::fs::File::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_import_file".to_string(),
            cause: e.to_string(),
        })?;
        self.import(file, on_progress, cancel)
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Drops a leading UTF-8 byte order mark.
fn skip_utf8_bom<R: BufRead>(reader: &mut R) -> Result<()> {
    let starts_with_bom = reader
        .fill_buf()
        .map_err(|e| read_failed(&e))?
        .starts_with(UTF8_BOM);
    if starts_with_bom {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Maps a decoder error without a stashed engine error.
///
/// Failures of the byte source are not malformed data.
fn decode_error(e: &serde_json::Error) -> Error {
    if e.is_io() {
        read_failed(e)
    } else {
        Error::DecodeFailed(e.to_string())
    }
}

fn read_failed(cause: &dyn fmt::Display) -> Error {
    Error::OperationFailed {
        operation: "read_archive".to_string(),
        cause: cause.to_string(),
    }
}

/// State shared by the visitors of one import.
struct ImportContext<'c> {
    stores: &'c PricingStores,
    batch_size: usize,
    on_progress: &'c mut dyn FnMut(ProgressInfo),
    cancel: &'c CancellationToken,
    summary: ImportSummary,
    /// Engine error that aborted decoding. Serde only carries a message, so
    /// the typed error is kept here.
    failure: Option<Error>,
}

impl ImportContext<'_> {
    fn save_batch<T: Entity>(&mut self, store: &dyn EntityStore<T>, batch: &mut Vec<T>) -> Result<()> {
        let kind = T::KIND;
        let items = std::mem::take(batch);

        store
            .save(&items)
            .map_err(|e| Error::save(kind.as_str(), e))?;

        let imported = self.summary.add(kind, items.len());
        metrics::counter!(
            "pricing_transfer_records_total",
            "direction" => "import",
            "section" => kind.as_str()
        )
        .increment(items.len() as u64);
        metrics::counter!(
            "pricing_transfer_batches_total",
            "direction" => "import",
            "section" => kind.as_str()
        )
        .increment(1);
        debug!(section = %kind, saved = items.len(), imported, "saved batch");

        (self.on_progress)(ProgressInfo::imported(kind, imported));
        self.cancel.check()
    }

    /// Saves `batch`, stashing any error for [`PricingExportImport::import`].
    fn flush<T: Entity, E: de::Error>(
        &mut self,
        store: &dyn EntityStore<T>,
        batch: &mut Vec<T>,
    ) -> std::result::Result<(), E> {
        self.save_batch(store, batch).map_err(|error| {
            let message = error.to_string();
            self.failure = Some(error);
            E::custom(message)
        })
    }
}

/// Visits the top-level archive object.
struct ArchiveSeed<'a, 'c> {
    ctx: &'a mut ImportContext<'c>,
}

impl<'de> DeserializeSeed<'de> for ArchiveSeed<'_, '_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for ArchiveSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a pricing archive object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let stores = self.ctx.stores;

        while let Some(key) = map.next_key::<String>()? {
            match EntityKind::from_section_name(&key) {
                Some(EntityKind::Pricelist) => map.next_value_seed(SectionSeed {
                    store: &*stores.pricelists,
                    ctx: &mut *self.ctx,
                })?,
                Some(EntityKind::Assignment) => map.next_value_seed(SectionSeed {
                    store: &*stores.assignments,
                    ctx: &mut *self.ctx,
                })?,
                Some(EntityKind::Price) => map.next_value_seed(SectionSeed {
                    store: &*stores.prices,
                    ctx: &mut *self.ctx,
                })?,
                None => {
                    debug!(key = %key, "skipping unknown field");
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(())
    }
}

/// Visits one section array, saving every full batch.
struct SectionSeed<'a, 'c, T: Entity> {
    store: &'c dyn EntityStore<T>,
    ctx: &'a mut ImportContext<'c>,
}

impl<'de, T: Entity> DeserializeSeed<'de> for SectionSeed<'_, '_, T> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_option(self)
    }
}

impl<'de, T: Entity> Visitor<'de> for SectionSeed<'_, '_, T> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of {} or null", T::KIND)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<(), E> {
        debug!(section = %T::KIND, "null section");
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.visit_none()
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let batch_size = self.ctx.batch_size;
        let mut batch: Vec<T> = Vec::with_capacity(batch_size.min(1024));

        while let Some(entity) = seq.next_element::<T>()? {
            batch.push(entity);
            if batch.len() >= batch_size {
                self.ctx.flush::<T, A::Error>(self.store, &mut batch)?;
            }
        }

        if !batch.is_empty() {
            self.ctx.flush::<T, A::Error>(self.store, &mut batch)?;
        }

        Ok(())
    }
}

//! Core traits and record types for export.
//!
//! Exportable records are display projections of stored entities: the
//! canonical entity fields, flattened, plus denormalized names of related
//! entities. They are never persisted.

use crate::Result;
use crate::models::{EntityKind, Page, Price, Pricelist, PricelistAssignment};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A record that an export sink can write.
pub trait ExportRecord: Serialize + Clone + Debug + Send + Sync + 'static {
    /// Stored entity this record projects.
    type Entity: Serialize;

    /// Id of the underlying entity.
    fn id(&self) -> &str;

    /// The underlying entity without denormalized names.
    fn entity(&self) -> &Self::Entity;

    /// CSV header row.
    fn csv_headers() -> &'static [&'static str];

    /// CSV values in [`csv_headers`](Self::csv_headers) order.
    fn csv_row(&self) -> Vec<String>;
}

/// Export projection of a [`Pricelist`]. Price lists have no relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportablePricelist {
    /// The price list fields.
    #[serde(flatten)]
    pub pricelist: Pricelist,
}

impl From<&Pricelist> for ExportablePricelist {
    fn from(pricelist: &Pricelist) -> Self {
        Self {
            pricelist: pricelist.clone(),
        }
    }
}

/// Export projection of a [`PricelistAssignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportablePricelistAssignment {
    /// The assignment fields.
    #[serde(flatten)]
    pub assignment: PricelistAssignment,
    /// Name of the assigned catalog, when it resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    /// Name of the assigned price list, when it resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricelist_name: Option<String>,
}

impl From<&PricelistAssignment> for ExportablePricelistAssignment {
    fn from(assignment: &PricelistAssignment) -> Self {
        Self {
            assignment: assignment.clone(),
            catalog_name: None,
            pricelist_name: None,
        }
    }
}

/// Export projection of a [`Price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportablePrice {
    /// The price fields.
    #[serde(flatten)]
    pub price: Price,
    /// Name of the owning price list, when it resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricelist_name: Option<String>,
}

impl From<&Price> for ExportablePrice {
    fn from(price: &Price) -> Self {
        Self {
            price: price.clone(),
            pricelist_name: None,
        }
    }
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn date_cell(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(String::new, |d| {
        d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    })
}

impl ExportRecord for ExportablePricelist {
    type Entity = Pricelist;

    fn id(&self) -> &str {
        &self.pricelist.id
    }

    fn entity(&self) -> &Pricelist {
        &self.pricelist
    }

    fn csv_headers() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "description",
            "currency",
            "outerId",
            "createdDate",
            "modifiedDate",
        ]
    }

    fn csv_row(&self) -> Vec<String> {
        let p = &self.pricelist;
        vec![
            p.id.clone(),
            p.name.clone(),
            cell(p.description.as_deref()),
            p.currency.clone(),
            cell(p.outer_id.as_deref()),
            date_cell(p.created_date.as_ref()),
            date_cell(p.modified_date.as_ref()),
        ]
    }
}

impl ExportRecord for ExportablePricelistAssignment {
    type Entity = PricelistAssignment;

    fn id(&self) -> &str {
        &self.assignment.id
    }

    fn entity(&self) -> &PricelistAssignment {
        &self.assignment
    }

    fn csv_headers() -> &'static [&'static str] {
        &[
            "id",
            "catalogId",
            "catalogName",
            "pricelistId",
            "pricelistName",
            "name",
            "description",
            "priority",
            "startDate",
            "endDate",
            "outerId",
        ]
    }

    fn csv_row(&self) -> Vec<String> {
        let a = &self.assignment;
        vec![
            a.id.clone(),
            a.catalog_id.clone(),
            cell(self.catalog_name.as_deref()),
            a.pricelist_id.clone(),
            cell(self.pricelist_name.as_deref()),
            a.name.clone(),
            cell(a.description.as_deref()),
            a.priority.to_string(),
            date_cell(a.start_date.as_ref()),
            date_cell(a.end_date.as_ref()),
            cell(a.outer_id.as_deref()),
        ]
    }
}

impl ExportRecord for ExportablePrice {
    type Entity = Price;

    fn id(&self) -> &str {
        &self.price.id
    }

    fn entity(&self) -> &Price {
        &self.price
    }

    fn csv_headers() -> &'static [&'static str] {
        &[
            "id",
            "pricelistId",
            "pricelistName",
            "productId",
            "currency",
            "list",
            "sale",
            "minQuantity",
            "startDate",
            "endDate",
            "outerId",
        ]
    }

    fn csv_row(&self) -> Vec<String> {
        let p = &self.price;
        vec![
            p.id.clone(),
            p.pricelist_id.clone(),
            cell(self.pricelist_name.as_deref()),
            p.product_id.clone(),
            cell(p.currency.as_deref()),
            p.list.to_string(),
            p.sale.map(|s| s.to_string()).unwrap_or_default(),
            p.min_quantity.to_string(),
            date_cell(p.start_date.as_ref()),
            date_cell(p.end_date.as_ref()),
            cell(p.outer_id.as_deref()),
        ]
    }
}

/// Pull-based source of exportable pages.
///
/// Implementations hold no cursor; callers pass the window each time.
pub trait PagedDataSource: Send + Sync {
    /// Record type produced.
    type Record: ExportRecord;

    /// Kind of entity this source reads.
    fn kind(&self) -> EntityKind;

    /// Fetches one enriched page and the size of the whole filtered set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FetchFailed`] if a store or lookup fails.
    fn fetch_page(&self, skip: usize, take: usize) -> Result<Page<Self::Record>>;
}

/// Sink for exported records.
///
/// # Lifecycle
///
/// 1. Create sink with output destination
/// 2. Call `write()` for each record
/// 3. Call `finalize()` to complete the export
pub trait ExportSink<R: ExportRecord> {
    /// Writes a single record to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails.
    fn write(&mut self, record: &R) -> Result<()>;

    /// Finalizes the export, writing any footers and flushing buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}

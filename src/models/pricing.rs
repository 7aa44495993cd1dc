//! Pricing entities.
//!
//! Field names serialize in `camelCase`; this is the canonical record schema
//! of the transfer archive.

use super::search::{
    Criteria, PricelistAssignmentsSearchCriteria, PricelistSearchCriteria, PricesSearchCriteria,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of entity moved by a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Price lists.
    Pricelist,
    /// Price list to catalog assignments.
    Assignment,
    /// Individual prices.
    Price,
}

impl EntityKind {
    /// Returns all kinds in archive order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pricelist, Self::Assignment, Self::Price]
    }

    /// Returns the lowercase plural name used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pricelist => "pricelists",
            Self::Assignment => "assignments",
            Self::Price => "prices",
        }
    }

    /// Returns the top-level archive field holding this kind.
    #[must_use]
    pub const fn section_name(&self) -> &'static str {
        match self {
            Self::Pricelist => "Pricelists",
            Self::Assignment => "Assignments",
            Self::Price => "Prices",
        }
    }

    /// Resolves a top-level archive field name. Matching is exact.
    #[must_use]
    pub fn from_section_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.section_name() == name)
    }

    /// Parses a user-supplied kind name.
    ///
    /// Returns `None` if the name is not recognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pricelist" | "pricelists" | "price-lists" => Some(Self::Pricelist),
            "assignment" | "assignments" | "pricelist-assignments" => Some(Self::Assignment),
            "price" | "prices" => Some(Self::Price),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identity-bearing stored record.
///
/// An empty id marks a transient entity; stores assign an identity on save.
pub trait Entity:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Criteria type used to search this kind.
    type Criteria: Criteria;

    /// The kind of this entity.
    const KIND: EntityKind;

    /// Returns the stable identifier.
    fn id(&self) -> &str;

    /// Replaces the identifier.
    fn set_id(&mut self, id: String);

    /// Returns `true` if the entity has no identity yet.
    fn is_transient(&self) -> bool {
        self.id().trim().is_empty()
    }
}

/// A named list of prices in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pricelist {
    /// Unique identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: String,
    /// Identifier in an external system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_id: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
}

impl Pricelist {
    /// Creates a price list.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency: currency.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the outer id.
    #[must_use]
    pub fn with_outer_id(mut self, outer_id: impl Into<String>) -> Self {
        self.outer_id = Some(outer_id.into());
        self
    }
}

impl Entity for Pricelist {
    type Criteria = PricelistSearchCriteria;
    const KIND: EntityKind = EntityKind::Pricelist;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Publishes a price list to a catalog under a priority and optional
/// validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PricelistAssignment {
    /// Unique identifier.
    #[serde(default)]
    pub id: String,
    /// Catalog the price list is assigned to.
    #[serde(default)]
    pub catalog_id: String,
    /// Assigned price list.
    #[serde(default)]
    pub pricelist_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Higher priority wins during price evaluation.
    #[serde(default)]
    pub priority: i32,
    /// Start of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// End of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Serialized eligibility condition, opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Identifier in an external system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_id: Option<String>,
}

impl PricelistAssignment {
    /// Creates an assignment of `pricelist_id` to `catalog_id`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        catalog_id: impl Into<String>,
        pricelist_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            catalog_id: catalog_id.into(),
            pricelist_id: pricelist_id.into(),
            ..Self::default()
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the validity window.
    #[must_use]
    pub const fn with_validity(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}

impl Entity for PricelistAssignment {
    type Criteria = PricelistAssignmentsSearchCriteria;
    const KIND: EntityKind = EntityKind::Assignment;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// A product price within a price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Unique identifier.
    #[serde(default)]
    pub id: String,
    /// Owning price list.
    #[serde(default)]
    pub pricelist_id: String,
    /// Priced product.
    #[serde(default)]
    pub product_id: String,
    /// Currency, normally the price list's currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// List price.
    #[serde(default)]
    pub list: f64,
    /// Sale price, if discounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale: Option<f64>,
    /// Minimum quantity this tier applies from.
    #[serde(default = "default_min_quantity")]
    pub min_quantity: i32,
    /// Start of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// End of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Identifier in an external system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_id: Option<String>,
}

const fn default_min_quantity() -> i32 {
    1
}

impl Default for Price {
    fn default() -> Self {
        Self {
            id: String::new(),
            pricelist_id: String::new(),
            product_id: String::new(),
            currency: None,
            list: 0.0,
            sale: None,
            min_quantity: default_min_quantity(),
            start_date: None,
            end_date: None,
            outer_id: None,
        }
    }
}

impl Price {
    /// Creates a list price for `product_id` in `pricelist_id`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        pricelist_id: impl Into<String>,
        product_id: impl Into<String>,
        list: f64,
    ) -> Self {
        Self {
            id: id.into(),
            pricelist_id: pricelist_id.into(),
            product_id: product_id.into(),
            list,
            ..Self::default()
        }
    }

    /// Sets the sale price.
    #[must_use]
    pub const fn with_sale(mut self, sale: f64) -> Self {
        self.sale = Some(sale);
        self
    }

    /// Sets the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the minimum quantity.
    #[must_use]
    pub const fn with_min_quantity(mut self, min_quantity: i32) -> Self {
        self.min_quantity = min_quantity;
        self
    }
}

impl Entity for Price {
    type Criteria = PricesSearchCriteria;
    const KIND: EntityKind = EntityKind::Price;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Catalog reference, owned by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Catalog {
    /// Creates a catalog reference.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

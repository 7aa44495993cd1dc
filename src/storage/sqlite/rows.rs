//! Row conversion for pricing tables.
//!
//! Each stored kind describes its table, its column list and how to move
//! between a row and the entity. Timestamps are stored as RFC 3339 text.

use super::sql::FilterClause;
use crate::models::{Criteria, Entity, Price, Pricelist, PricelistAssignment};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::{Type, Value};

/// An entity kind stored in its own `SQLite` table.
///
/// `COLUMNS[0]` is always `id`, and `to_values` yields one value per column
/// in the same order.
pub trait SqlRecord: Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Column names, `id` first.
    const COLUMNS: &'static [&'static str];

    /// Columns searched by the keyword filter.
    const KEYWORD_COLUMNS: &'static [&'static str];

    /// Reads an entity from a row selected with [`Self::COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns an error if a column has an unexpected type or a timestamp
    /// cannot be parsed.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Returns the column values in [`Self::COLUMNS`] order.
    fn to_values(&self) -> Vec<Value>;

    /// Adds the kind-specific filters of `criteria` to `clause`.
    fn push_filters(criteria: &Self::Criteria, clause: &mut FilterClause);

    /// Adds the generic keyword filter followed by the kind-specific ones.
    fn build_filter(criteria: &Self::Criteria, clause: &mut FilterClause) {
        clause.push_keyword(Self::KEYWORD_COLUMNS, criteria.base().keyword());
        Self::push_filters(criteria, clause);
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn opt_date(value: Option<&DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |d| {
        Value::Text(d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    })
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

impl SqlRecord for Pricelist {
    const TABLE: &'static str = "pricelists";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "currency",
        "outer_id",
        "created_date",
        "modified_date",
    ];
    const KEYWORD_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            currency: row.get(3)?,
            outer_id: row.get(4)?,
            created_date: get_date(row, 5)?,
            modified_date: get_date(row, 6)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.name),
            opt_text(self.description.as_deref()),
            text(&self.currency),
            opt_text(self.outer_id.as_deref()),
            opt_date(self.created_date.as_ref()),
            opt_date(self.modified_date.as_ref()),
        ]
    }

    fn push_filters(criteria: &Self::Criteria, clause: &mut FilterClause) {
        clause.push_in_ignore_case("currency", &criteria.currencies);
    }
}

impl SqlRecord for PricelistAssignment {
    const TABLE: &'static str = "pricelist_assignments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "catalog_id",
        "pricelist_id",
        "name",
        "description",
        "priority",
        "start_date",
        "end_date",
        "condition_expression",
        "outer_id",
    ];
    const KEYWORD_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            catalog_id: row.get(1)?,
            pricelist_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            priority: row.get(5)?,
            start_date: get_date(row, 6)?,
            end_date: get_date(row, 7)?,
            condition_expression: row.get(8)?,
            outer_id: row.get(9)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.catalog_id),
            text(&self.pricelist_id),
            text(&self.name),
            opt_text(self.description.as_deref()),
            Value::Integer(i64::from(self.priority)),
            opt_date(self.start_date.as_ref()),
            opt_date(self.end_date.as_ref()),
            opt_text(self.condition_expression.as_deref()),
            opt_text(self.outer_id.as_deref()),
        ]
    }

    fn push_filters(criteria: &Self::Criteria, clause: &mut FilterClause) {
        clause.push_in("pricelist_id", &criteria.pricelist_ids);
        clause.push_in("catalog_id", &criteria.catalog_ids);
    }
}

impl SqlRecord for Price {
    const TABLE: &'static str = "prices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "pricelist_id",
        "product_id",
        "currency",
        "list",
        "sale",
        "min_quantity",
        "start_date",
        "end_date",
        "outer_id",
    ];
    const KEYWORD_COLUMNS: &'static [&'static str] = &["product_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pricelist_id: row.get(1)?,
            product_id: row.get(2)?,
            currency: row.get(3)?,
            list: row.get(4)?,
            sale: row.get(5)?,
            min_quantity: row.get(6)?,
            start_date: get_date(row, 7)?,
            end_date: get_date(row, 8)?,
            outer_id: row.get(9)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.pricelist_id),
            text(&self.product_id),
            opt_text(self.currency.as_deref()),
            Value::Real(self.list),
            self.sale.map_or(Value::Null, Value::Real),
            Value::Integer(i64::from(self.min_quantity)),
            opt_date(self.start_date.as_ref()),
            opt_date(self.end_date.as_ref()),
            opt_text(self.outer_id.as_deref()),
        ]
    }

    fn push_filters(criteria: &Self::Criteria, clause: &mut FilterClause) {
        clause.push_in("pricelist_id", &criteria.pricelist_ids);
        clause.push_in("product_id", &criteria.product_ids);
    }
}

/// Returns the column list joined for a `SELECT`.
pub fn select_columns<T: SqlRecord>() -> String {
    T::COLUMNS.join(", ")
}

/// Returns the upsert statement for `T`, keyed on `id`.
pub fn upsert_sql<T: SqlRecord>() -> String {
    let updates: Vec<String> = T::COLUMNS
        .iter()
        .skip(1)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();
    format!(
        "INSERT INTO {table} ({columns}) VALUES ({values}) ON CONFLICT(id) DO UPDATE SET {updates}",
        table = T::TABLE,
        columns = select_columns::<T>(),
        values = super::sql::placeholders(T::COLUMNS.len()),
        updates = updates.join(", "),
    )
}

//! `SQLite`-based pricing store.
//!
//! Provides durable storage using `SQLite` as the authoritative source of
//! truth for price lists, assignments and prices, plus a small catalog
//! reference table used for export enrichment.

use crate::models::{Catalog, Criteria, Page};
use crate::storage::sqlite::{
    FilterClause, SqlRecord, acquire_lock, configure_connection, placeholders,
    select_columns, timed, upsert_sql, with_transaction,
};
use crate::storage::traits::{CatalogService, EntityStore};
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::instrument;

/// Maximum number of ids bound into one `IN (...)` list.
const ID_CHUNK_SIZE: usize = 500;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS pricelists (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    currency TEXT NOT NULL,
    outer_id TEXT,
    created_date TEXT,
    modified_date TEXT
);
CREATE TABLE IF NOT EXISTS pricelist_assignments (
    id TEXT PRIMARY KEY,
    catalog_id TEXT NOT NULL,
    pricelist_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,
    end_date TEXT,
    condition_expression TEXT,
    outer_id TEXT
);
CREATE TABLE IF NOT EXISTS prices (
    id TEXT PRIMARY KEY,
    pricelist_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    currency TEXT,
    list REAL NOT NULL,
    sale REAL,
    min_quantity INTEGER NOT NULL DEFAULT 1,
    start_date TEXT,
    end_date TEXT,
    outer_id TEXT
);
CREATE TABLE IF NOT EXISTS catalogs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
";

/// `SQLite`-based pricing store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access. `SQLite`'s WAL mode and
/// `busy_timeout` pragma mitigate contention.
///
/// # Schema
///
/// One table per kind (`pricelists`, `pricelist_assignments`, `prices`) plus
/// `catalogs`. Each `save` runs as one `BEGIN IMMEDIATE` transaction of
/// upserts, so a rejected batch leaves nothing behind.
pub struct SqlitePricingStore {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    /// Path to the `SQLite` database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqlitePricingStore {
    /// Opens (or creates) a store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use pricing_transfer::SqlitePricingStore;
    ///
    /// let store = SqlitePricingStore::new("./pricing.sqlite")?;
    /// # Ok::<(), pricing_transfer::Error>(())
    /// ```
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_database_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::OperationFailed {
                operation: "create_schema".to_string(),
                cause: e.to_string(),
            })?;

        Self::create_indexes(&conn);
        Ok(())
    }

    /// Creates indexes for the filters used by export queries.
    fn create_indexes(conn: &Connection) {
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assignments_pricelist ON pricelist_assignments(pricelist_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assignments_catalog ON pricelist_assignments(catalog_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_prices_pricelist ON prices(pricelist_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_prices_product ON prices(product_id)",
            [],
        );
    }

    /// Adds or replaces a catalog reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn add_catalog(&self, catalog: &Catalog) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute(
            "INSERT INTO catalogs (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![catalog.id, catalog.name],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "add_catalog".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }

    fn query_by_ids<R>(
        conn: &Connection,
        sql_prefix: &str,
        sql_suffix: &str,
        ids: &[String],
        map: impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    ) -> Result<Vec<R>> {
        let mut out = Vec::new();
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let sql = format!(
                "{sql_prefix} WHERE id IN ({}){sql_suffix}",
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql).map_err(query_error)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), &map)
                .map_err(query_error)?;
            for row in rows {
                out.push(row.map_err(query_error)?);
            }
        }
        Ok(out)
    }

    fn get_records<T: SqlRecord>(&self, ids: &[String]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = acquire_lock(&self.conn);
        let prefix = format!("SELECT {} FROM {}", select_columns::<T>(), T::TABLE);
        let mut records = Self::query_by_ids(&conn, &prefix, "", ids, T::from_row)?;
        records.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(records)
    }

    fn search_records<T: SqlRecord>(&self, criteria: &T::Criteria) -> Result<Page<T>> {
        let base = criteria.base();
        let mut clause = FilterClause::new();
        clause.push_in("id", &base.requested_ids());
        T::build_filter(criteria, &mut clause);

        let conn = acquire_lock(&self.conn);
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", T::TABLE, clause.sql());
        let total: i64 = conn
            .query_row(&count_sql, params_from_iter(clause.params()), |row| {
                row.get(0)
            })
            .map_err(query_error)?;
        let total_count = usize::try_from(total).unwrap_or(0);

        if base.take == 0 || base.skip >= total_count {
            return Ok(Page::new(Vec::new(), total_count));
        }

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY id LIMIT ? OFFSET ?",
            select_columns::<T>(),
            T::TABLE,
            clause.sql()
        );
        let mut values: Vec<Value> = clause.params().to_vec();
        values.push(Value::Integer(i64::try_from(base.take).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(base.skip).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), T::from_row)
            .map_err(query_error)?;
        let results = rows
            .collect::<rusqlite::Result<Vec<T>>>()
            .map_err(query_error)?;

        Ok(Page::new(results, total_count))
    }

    fn save_records<T: SqlRecord>(&self, items: &[T]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let conn = acquire_lock(&self.conn);
        let sql = upsert_sql::<T>();

        with_transaction(&conn, |conn| {
            let mut stmt = conn.prepare(&sql).map_err(|e| Error::OperationFailed {
                operation: format!("upsert_{}", T::TABLE),
                cause: e.to_string(),
            })?;
            for item in items {
                let mut values = item.to_values();
                if item.is_transient() {
                    values[0] = Value::Text(uuid::Uuid::new_v4().to_string());
                }
                stmt.execute(params_from_iter(values.iter()))
                    .map_err(|e| Error::OperationFailed {
                        operation: format!("upsert_{}", T::TABLE),
                        cause: e.to_string(),
                    })?;
            }
            Ok(())
        })
    }

    fn delete_records<T: SqlRecord>(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = acquire_lock(&self.conn);
        with_transaction(&conn, |conn| {
            for chunk in ids.chunks(ID_CHUNK_SIZE) {
                let sql = format!(
                    "DELETE FROM {} WHERE id IN ({})",
                    T::TABLE,
                    placeholders(chunk.len())
                );
                conn.execute(&sql, params_from_iter(chunk.iter()))
                    .map_err(|e| Error::OperationFailed {
                        operation: format!("delete_{}", T::TABLE),
                        cause: e.to_string(),
                    })?;
            }
            Ok(())
        })
    }
}

fn query_error(e: rusqlite::Error) -> Error {
    Error::OperationFailed {
        operation: "query".to_string(),
        cause: e.to_string(),
    }
}

impl<T: SqlRecord> EntityStore<T> for SqlitePricingStore {
    #[instrument(skip(self, ids), fields(backend = "sqlite", entity = %T::KIND, count = ids.len()))]
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<T>> {
        timed(T::KIND.as_str(), "get_by_ids", || self.get_records(ids))
    }

    #[instrument(skip(self, criteria), fields(backend = "sqlite", entity = %T::KIND))]
    fn search(&self, criteria: &T::Criteria) -> Result<Page<T>> {
        timed(T::KIND.as_str(), "search", || self.search_records(criteria))
    }

    #[instrument(skip(self, items), fields(backend = "sqlite", entity = %T::KIND, count = items.len()))]
    fn save(&self, items: &[T]) -> Result<()> {
        timed(T::KIND.as_str(), "save", || self.save_records(items))
    }

    #[instrument(skip(self, ids), fields(backend = "sqlite", entity = %T::KIND, count = ids.len()))]
    fn delete(&self, ids: &[String]) -> Result<()> {
        timed(T::KIND.as_str(), "delete", || self.delete_records::<T>(ids))
    }
}

impl CatalogService for SqlitePricingStore {
    #[instrument(skip(self, ids), fields(backend = "sqlite", count = ids.len()))]
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Catalog>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = acquire_lock(&self.conn);
        Self::query_by_ids(
            &conn,
            "SELECT id, name FROM catalogs",
            " ORDER BY id",
            ids,
            |row| {
                Ok(Catalog {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
    }
}

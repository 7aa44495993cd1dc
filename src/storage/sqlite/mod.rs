//! Shared `SQLite` infrastructure for the pricing store.
//!
//! ## Module Structure
//!
//! - [`connection`]: Connection handling ([`Mutex<Connection>`](rusqlite::Connection), lock acquisition, configuration, transactions)
//! - [`sql`]: SQL helper functions (LIKE escaping, placeholders, filter building)
//! - [`rows`]: Row conversion for each pricing table
//! - [`metrics`]: Operation metrics recording

mod connection;
mod metrics;
mod rows;
mod sql;

pub use connection::{acquire_lock, configure_connection, with_transaction};
pub use metrics::timed;
pub use rows::{SqlRecord, select_columns, upsert_sql};
pub use sql::{FilterClause, escape_like_wildcards, placeholders};

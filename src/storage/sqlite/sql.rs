//! SQL helper functions for the `SQLite` store.
//!
//! This module provides utilities for SQL query construction:
//! - LIKE wildcard escaping
//! - Positional placeholder lists
//! - A WHERE clause builder collecting bound values in order

use rusqlite::types::Value;

/// Escapes SQL LIKE wildcards in a string to make them literal.
///
/// SQL LIKE uses `%` (match any characters) and `_` (match single character)
/// as wildcards. When searching for literal `%` or `_` characters, they must
/// be escaped with a backslash. The backslash itself also needs escaping.
///
/// # Examples
///
/// ```
/// use pricing_transfer::storage::sqlite::escape_like_wildcards;
///
/// assert_eq!(escape_like_wildcards("100%"), "100\\%");
/// assert_eq!(escape_like_wildcards("sku_1"), "sku\\_1");
/// assert_eq!(escape_like_wildcards("path\\file"), "path\\\\file");
/// ```
#[must_use]
pub fn escape_like_wildcards(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            },
            _ => result.push(c),
        }
    }
    result
}

/// Returns `count` comma-separated positional placeholders.
///
/// ```
/// use pricing_transfer::storage::sqlite::placeholders;
///
/// assert_eq!(placeholders(3), "?, ?, ?");
/// assert_eq!(placeholders(0), "");
/// ```
#[must_use]
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// WHERE clause under construction.
///
/// Conditions are joined with `AND`; bound values are kept in placeholder
/// order.
#[derive(Debug, Default)]
pub struct FilterClause {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl FilterClause {
    /// Creates an empty clause.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column IN (...)`. An empty value list adds nothing.
    pub fn push_in(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        self.conditions
            .push(format!("{column} IN ({})", placeholders(values.len())));
        self.params
            .extend(values.iter().cloned().map(Value::Text));
    }

    /// Adds a case-insensitive `column IN (...)`.
    pub fn push_in_ignore_case(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        self.conditions
            .push(format!("LOWER({column}) IN ({})", placeholders(values.len())));
        self.params
            .extend(values.iter().map(|v| Value::Text(v.to_lowercase())));
    }

    /// Adds a case-insensitive substring match of `keyword` against any of
    /// `columns`. `None` adds nothing.
    pub fn push_keyword(&mut self, columns: &[&str], keyword: Option<&str>) {
        let Some(keyword) = keyword else {
            return;
        };
        if columns.is_empty() {
            return;
        }
        let pattern = format!("%{}%", escape_like_wildcards(&keyword.to_lowercase()));
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("LOWER(COALESCE({c}, '')) LIKE ? ESCAPE '\\'"))
            .collect();
        self.conditions.push(format!("({})", ors.join(" OR ")));
        self.params
            .extend(columns.iter().map(|_| Value::Text(pattern.clone())));
    }

    /// Returns the clause text, prefixed with ` WHERE ` when non-empty.
    #[must_use]
    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Returns the bound values in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

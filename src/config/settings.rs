//! Settings lookup used by the transfer engines.

use std::collections::HashMap;

/// Setting key controlling the export page size and import batch size.
pub const EXPORT_IMPORT_PAGE_SIZE: &str = "Pricing.ExportImport.PageSize";

/// Default for [`EXPORT_IMPORT_PAGE_SIZE`].
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Key/value settings collaborator.
pub trait SettingsManager: Send + Sync {
    /// Returns the integer value stored under `key`, or `default` when unset.
    fn get_value(&self, key: &str, default: i64) -> i64;
}

/// Fixed in-memory settings.
///
/// # Example
///
/// ```rust
/// use pricing_transfer::config::{EXPORT_IMPORT_PAGE_SIZE, SettingsManager, StaticSettings};
///
/// let settings = StaticSettings::new().with_value(EXPORT_IMPORT_PAGE_SIZE, 7);
/// assert_eq!(settings.get_value(EXPORT_IMPORT_PAGE_SIZE, 50), 7);
/// assert_eq!(settings.get_value("Other", 3), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, i64>,
}

impl StaticSettings {
    /// Creates empty settings; every lookup returns its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings with only the page size set.
    #[must_use]
    pub fn with_page_size(page_size: i64) -> Self {
        Self::new().with_value(EXPORT_IMPORT_PAGE_SIZE, page_size)
    }

    /// Sets a value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: i64) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl SettingsManager for StaticSettings {
    fn get_value(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }
}

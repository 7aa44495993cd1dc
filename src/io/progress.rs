//! Progress reporting values.

use crate::models::EntityKind;
use std::fmt;

/// One progress report.
///
/// A new value is built for every report; engines never mutate a value
/// after handing it to the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressInfo {
    /// Section the report belongs to.
    pub kind: EntityKind,
    /// Human-readable summary.
    pub description: String,
    /// Records processed so far in this section.
    pub processed_count: usize,
    /// Size of the section, when known. Import does not know it up front.
    pub total_count: Option<usize>,
}

impl ProgressInfo {
    /// Builds an export report.
    #[must_use]
    pub fn exported(kind: EntityKind, processed_count: usize, total_count: usize) -> Self {
        Self {
            kind,
            description: format!(
                "{processed_count} of {total_count} {} have been exported",
                display_noun(kind)
            ),
            processed_count,
            total_count: Some(total_count),
        }
    }

    /// Builds an import report.
    #[must_use]
    pub fn imported(kind: EntityKind, processed_count: usize) -> Self {
        Self {
            kind,
            description: format!(
                "{processed_count} {} have been imported",
                display_noun(kind)
            ),
            processed_count,
            total_count: None,
        }
    }
}

impl fmt::Display for ProgressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

const fn display_noun(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Pricelist => "price lists",
        EntityKind::Assignment => "price list assignments",
        EntityKind::Price => "prices",
    }
}

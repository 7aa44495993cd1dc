//! Search criteria and result pages.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;

/// Default page size for a search window.
pub const DEFAULT_TAKE: usize = 20;

/// Generic filter and pagination window shared by every entity search.
///
/// When `object_ids` contains at least one non-blank id, callers fetch those
/// entities directly and the pagination window does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    /// Number of records to skip.
    pub skip: usize,
    /// Maximum number of records to return.
    pub take: usize,
    /// Case-insensitive substring filter.
    pub keyword: Option<String>,
    /// Explicit ids to fetch, in the order they should be returned.
    pub object_ids: Vec<String>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            skip: 0,
            take: DEFAULT_TAKE,
            keyword: None,
            object_ids: Vec::new(),
        }
    }
}

impl SearchCriteria {
    /// Creates criteria with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pagination window.
    #[must_use]
    pub const fn with_paging(mut self, skip: usize, take: usize) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }

    /// Sets the keyword filter.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Sets the explicit id list.
    #[must_use]
    pub fn with_object_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if at least one non-blank object id was requested.
    #[must_use]
    pub fn has_object_ids(&self) -> bool {
        self.object_ids.iter().any(|id| !id.trim().is_empty())
    }

    /// Returns the non-blank requested ids, duplicates removed, first
    /// occurrence kept.
    #[must_use]
    pub fn requested_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.object_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// Returns the trimmed keyword, if any is set and non-blank.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Criteria types carrying the generic [`SearchCriteria`] part.
pub trait Criteria: Clone + Debug + Default + Send + Sync + 'static {
    /// Returns the generic part.
    fn base(&self) -> &SearchCriteria;

    /// Returns the generic part mutably.
    fn base_mut(&mut self) -> &mut SearchCriteria;
}

impl Criteria for SearchCriteria {
    fn base(&self) -> &SearchCriteria {
        self
    }

    fn base_mut(&mut self) -> &mut SearchCriteria {
        self
    }
}

/// Price list search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricelistSearchCriteria {
    /// Generic part.
    #[serde(flatten)]
    pub base: SearchCriteria,
    /// Restrict to these currencies (case-insensitive).
    pub currencies: Vec<String>,
}

impl Criteria for PricelistSearchCriteria {
    fn base(&self) -> &SearchCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SearchCriteria {
        &mut self.base
    }
}

/// Price list assignment search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricelistAssignmentsSearchCriteria {
    /// Generic part.
    #[serde(flatten)]
    pub base: SearchCriteria,
    /// Restrict to assignments of these price lists.
    pub pricelist_ids: Vec<String>,
    /// Restrict to assignments into these catalogs.
    pub catalog_ids: Vec<String>,
}

impl Criteria for PricelistAssignmentsSearchCriteria {
    fn base(&self) -> &SearchCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SearchCriteria {
        &mut self.base
    }
}

/// Price search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricesSearchCriteria {
    /// Generic part.
    #[serde(flatten)]
    pub base: SearchCriteria,
    /// Restrict to prices of these price lists.
    pub pricelist_ids: Vec<String>,
    /// Restrict to prices of these products.
    pub product_ids: Vec<String>,
}

impl Criteria for PricesSearchCriteria {
    fn base(&self) -> &SearchCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SearchCriteria {
        &mut self.base
    }
}

/// One bounded slice of a filtered dataset.
///
/// `total_count` counts the whole filtered dataset, not just `results`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records in this slice, in storage order.
    pub results: Vec<T>,
    /// Size of the whole filtered dataset.
    pub total_count: usize,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(results: Vec<T>, total_count: usize) -> Self {
        Self {
            results,
            total_count,
        }
    }

    /// Returns the number of records in this slice.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if this slice holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Returns `true` if `filter` is empty or contains `value`.
pub(crate) fn matches_any(filter: &[String], value: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| f == value)
}

/// Returns `true` if `filter` is empty or contains `value`, ignoring case.
pub(crate) fn matches_any_ignore_case(filter: &[String], value: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| f.eq_ignore_ascii_case(value))
}

/// Case-insensitive substring match of `keyword` against any candidate.
pub(crate) fn keyword_matches<'a>(
    keyword: Option<&str>,
    candidates: impl IntoIterator<Item = Option<&'a str>>,
) -> bool {
    let Some(keyword) = keyword else {
        return true;
    };
    let needle = keyword.to_lowercase();
    candidates
        .into_iter()
        .flatten()
        .any(|c| c.to_lowercase().contains(&needle))
}

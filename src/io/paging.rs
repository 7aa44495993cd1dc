//! Page loop shared by the export paths.
//!
//! The first request is `(0, batch_size)`. After each page the window moves
//! by `take`, and the next `take` is `min(batch_size, total - skip)`. The
//! loop stops when the processed count reaches the reported total, when the
//! next `take` would be zero, or when a page comes back empty. Both stop
//! signals are kept so that a stale total can neither loop forever nor cut
//! the export short.

use super::cancellation::CancellationToken;
use super::traits::PagedDataSource;
use crate::Result;
use crate::config::{DEFAULT_PAGE_SIZE, EXPORT_IMPORT_PAGE_SIZE, SettingsManager};
use std::time::Instant;
use tracing::{debug, warn};

/// Reads the page size setting, clamped to at least 1.
#[must_use]
pub fn batch_size_from_settings(settings: &dyn SettingsManager) -> usize {
    let value = settings
        .get_value(EXPORT_IMPORT_PAGE_SIZE, DEFAULT_PAGE_SIZE)
        .max(1);
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Window arithmetic for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    batch_size: usize,
    skip: usize,
    take: usize,
    processed: usize,
    done: bool,
}

impl PageCursor {
    /// Creates a cursor at the first window.
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            skip: 0,
            take: batch_size,
            processed: 0,
            done: false,
        }
    }

    /// Returns the next `(skip, take)` window, or `None` when finished.
    #[must_use]
    pub const fn next_window(&self) -> Option<(usize, usize)> {
        if self.done {
            None
        } else {
            Some((self.skip, self.take))
        }
    }

    /// Records a fetched page of `fetched` records from a set of `total`.
    pub fn advance(&mut self, fetched: usize, total: usize) {
        self.processed += fetched;
        if fetched == 0 || self.processed >= total {
            self.done = true;
            return;
        }
        self.skip += self.take;
        self.take = self.batch_size.min(total.saturating_sub(self.skip));
        if self.take == 0 {
            self.done = true;
        }
    }

    /// Returns the number of records fetched so far.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.processed
    }
}

/// Running position passed to the page callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// Records processed including this page.
    pub processed: usize,
    /// Total reported with this page.
    pub total: usize,
}

/// Drives `source` page by page, handing each page to `on_page`.
///
/// Cancellation is checked before every fetch. Returns the number of
/// records processed.
///
/// # Errors
///
/// Returns [`crate::Error::Cancelled`] once `cancel` is signaled, the
/// source's fetch error, or the first error of `on_page`.
pub fn for_each_page<S, F>(
    source: &S,
    batch_size: usize,
    cancel: &CancellationToken,
    mut on_page: F,
) -> Result<usize>
where
    S: PagedDataSource + ?Sized,
    F: FnMut(Vec<S::Record>, PageProgress) -> Result<()>,
{
    let kind = source.kind();
    let mut cursor = PageCursor::new(batch_size);

    while let Some((skip, take)) = cursor.next_window() {
        cancel.check()?;

        let start = Instant::now();
        let page = source.fetch_page(skip, take)?;
        let fetched = page.len();
        let total = page.total_count;
        cursor.advance(fetched, total);

        metrics::histogram!("pricing_transfer_page_duration_ms", "section" => kind.as_str())
            .record(start.elapsed().as_secs_f64() * 1000.0);
        debug!(section = %kind, skip, take, fetched, total, "fetched page");

        if fetched == 0 && cursor.processed() < total {
            warn!(
                section = %kind,
                processed = cursor.processed(),
                total,
                "empty page before reported total, stopping"
            );
        }

        on_page(
            page.results,
            PageProgress {
                processed: cursor.processed(),
                total,
            },
        )?;
    }

    Ok(cursor.processed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSettings;
    use test_case::test_case;

    fn windows(batch: usize, total: usize) -> Vec<(usize, usize)> {
        let mut cursor = PageCursor::new(batch);
        let mut out = Vec::new();
        while let Some((skip, take)) = cursor.next_window() {
            out.push((skip, take));
            let fetched = take.min(total.saturating_sub(skip));
            cursor.advance(fetched, total);
        }
        out
    }

    #[test]
    fn test_windows_for_133_by_50() {
        assert_eq!(windows(50, 133), vec![(0, 50), (50, 50), (100, 33)]);
    }

    #[test_case(10, 0, &[(0, 10)] ; "empty set fetches once")]
    #[test_case(10, 10, &[(0, 10)] ; "exact single page")]
    #[test_case(10, 20, &[(0, 10), (10, 10)] ; "exact two pages")]
    #[test_case(1, 3, &[(0, 1), (1, 1), (2, 1)] ; "batch of one")]
    #[test_case(100, 7, &[(0, 100)] ; "batch larger than set")]
    fn test_windows(batch: usize, total: usize, expected: &[(usize, usize)]) {
        assert_eq!(windows(batch, total), expected);
    }

    #[test]
    fn test_empty_page_stops_despite_total() {
        let mut cursor = PageCursor::new(10);
        cursor.advance(10, 100);
        assert_eq!(cursor.next_window(), Some((10, 10)));
        cursor.advance(0, 100);
        assert_eq!(cursor.next_window(), None);
        assert_eq!(cursor.processed(), 10);
    }

    #[test]
    fn test_cursor_clamps_zero_batch() {
        assert_eq!(PageCursor::new(0).next_window(), Some((0, 1)));
    }

    #[test_case(50, 50 ; "configured")]
    #[test_case(0, 1 ; "zero clamps")]
    #[test_case(-5, 1 ; "negative clamps")]
    fn test_batch_size_from_settings(configured: i64, expected: usize) {
        let settings = StaticSettings::with_page_size(configured);
        assert_eq!(batch_size_from_settings(&settings), expected);
    }

    #[test]
    fn test_batch_size_default() {
        assert_eq!(batch_size_from_settings(&StaticSettings::new()), 50);
    }
}

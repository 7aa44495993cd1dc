//! Shared helpers for integration tests.
//!
//! Wrappers around the in-memory store that count calls, record paging
//! windows and inject failures.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use pricing_transfer::models::Criteria;
use pricing_transfer::storage::{CatalogService, EntityStore};
use pricing_transfer::{
    Catalog, Entity, Error, InMemoryPricingStore, Page, Price, Pricelist, PricelistAssignment,
    PricingStores, Result, SettingsManager, StaticSettings,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Hook = Box<dyn Fn(usize) + Send + Sync>;

/// Store wrapper for one entity kind.
pub struct InstrumentedStore<T: Entity> {
    inner: Arc<dyn EntityStore<T>>,
    searches: AtomicUsize,
    lookups: AtomicUsize,
    saves: AtomicUsize,
    windows: Mutex<Vec<(usize, usize)>>,
    batches: Mutex<Vec<usize>>,
    fail_search_from: Option<usize>,
    fail_save_from: Option<usize>,
    after_search: Option<Hook>,
    after_save: Option<Hook>,
}

impl<T: Entity> InstrumentedStore<T> {
    pub fn new(inner: Arc<dyn EntityStore<T>>) -> Self {
        Self {
            inner,
            searches: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            fail_search_from: None,
            fail_save_from: None,
            after_search: None,
            after_save: None,
        }
    }

    /// Fails the `n`th search call (1-based) and every later one.
    pub fn failing_search_from(mut self, n: usize) -> Self {
        self.fail_search_from = Some(n);
        self
    }

    /// Fails the `n`th save call (1-based) and every later one.
    pub fn failing_save_from(mut self, n: usize) -> Self {
        self.fail_save_from = Some(n);
        self
    }

    /// Runs `hook` with the call number after every successful search.
    pub fn after_search(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.after_search = Some(Box::new(hook));
        self
    }

    /// Runs `hook` with the call number after every successful save.
    pub fn after_save(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.after_save = Some(Box::new(hook));
        self
    }

    pub fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// `(skip, take)` of every search, in call order.
    pub fn windows(&self) -> Vec<(usize, usize)> {
        self.windows.lock().unwrap().clone()
    }

    /// Size of every save call that reached the inner store.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

fn injected(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "injected failure".to_string(),
    }
}

impl<T: Entity> EntityStore<T> for InstrumentedStore<T> {
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<T>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_ids(ids)
    }

    fn search(&self, criteria: &T::Criteria) -> Result<Page<T>> {
        let call = self.searches.fetch_add(1, Ordering::SeqCst) + 1;
        let base = criteria.base();
        self.windows.lock().unwrap().push((base.skip, base.take));
        if self.fail_search_from.is_some_and(|n| call >= n) {
            return Err(injected("search"));
        }
        let page = self.inner.search(criteria)?;
        if let Some(hook) = &self.after_search {
            hook(call);
        }
        Ok(page)
    }

    fn save(&self, items: &[T]) -> Result<()> {
        let call = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_save_from.is_some_and(|n| call >= n) {
            return Err(injected("save"));
        }
        self.inner.save(items)?;
        self.batches.lock().unwrap().push(items.len());
        if let Some(hook) = &self.after_save {
            hook(call);
        }
        Ok(())
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        self.inner.delete(ids)
    }
}

/// Catalog service that always fails.
pub struct FailingCatalogs;

impl CatalogService for FailingCatalogs {
    fn get_by_ids(&self, _ids: &[String]) -> Result<Vec<Catalog>> {
        Err(injected("get_catalogs"))
    }
}

/// Settings wrapper counting reads.
pub struct CountingSettings {
    inner: StaticSettings,
    reads: AtomicUsize,
}

impl CountingSettings {
    pub fn with_page_size(page_size: i64) -> Self {
        Self {
            inner: StaticSettings::with_page_size(page_size),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SettingsManager for CountingSettings {
    fn get_value(&self, key: &str, default: i64) -> i64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_value(key, default)
    }
}

pub fn pricelist_id(i: usize) -> String {
    format!("pl-{i:04}")
}

pub fn pricelists(n: usize) -> Vec<Pricelist> {
    (0..n)
        .map(|i| {
            let currency = if i % 2 == 0 { "USD" } else { "EUR" };
            Pricelist::new(pricelist_id(i), format!("List {i}"), currency)
                .with_description(format!("Seeded list {i}"))
        })
        .collect()
}

pub fn assignments(n: usize, pricelist_count: usize) -> Vec<PricelistAssignment> {
    (0..n)
        .map(|i| {
            let pricelist = pricelist_id(i % pricelist_count.max(1));
            let catalog = if i % 3 == 0 { "cat-main" } else { "cat-outlet" };
            PricelistAssignment::new(format!("as-{i:04}"), catalog, pricelist)
                .with_name(format!("Assignment {i}"))
                .with_priority(i32::try_from(i).unwrap())
        })
        .collect()
}

pub fn prices(n: usize, pricelist_count: usize) -> Vec<Price> {
    (0..n)
        .map(|i| {
            let list = 10.0 + f64::from(u32::try_from(i).unwrap()) * 0.25;
            let price = Price::new(
                format!("pr-{i:04}"),
                pricelist_id(i % pricelist_count.max(1)),
                format!("sku-{i:04}"),
                list,
            );
            if i % 4 == 0 { price.with_sale(list - 1.0) } else { price }
        })
        .collect()
}

pub fn catalogs() -> Vec<Catalog> {
    vec![
        Catalog::new("cat-main", "Main catalog"),
        Catalog::new("cat-outlet", "Outlet"),
    ]
}

/// Creates an in-memory store holding the given numbers of records.
pub fn seeded_store(
    pricelist_count: usize,
    assignment_count: usize,
    price_count: usize,
) -> Arc<InMemoryPricingStore> {
    let store = Arc::new(InMemoryPricingStore::new().with_catalogs(catalogs()));
    EntityStore::<Pricelist>::save(&*store, &pricelists(pricelist_count)).unwrap();
    EntityStore::<PricelistAssignment>::save(
        &*store,
        &assignments(assignment_count, pricelist_count),
    )
    .unwrap();
    EntityStore::<Price>::save(&*store, &prices(price_count, pricelist_count)).unwrap();
    store
}

pub fn stores_of(store: &Arc<InMemoryPricingStore>) -> PricingStores {
    PricingStores::from_backend(Arc::clone(store))
}

/// Returns every stored entity of one kind, ordered by id.
pub fn all<T: Entity>(store: &dyn EntityStore<T>) -> Vec<T> {
    let mut criteria = T::Criteria::default();
    criteria.base_mut().take = usize::MAX;
    store.search(&criteria).unwrap().results
}

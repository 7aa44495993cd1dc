//! End-to-end export/import tests over the in-memory store.
//!
//! Covers page arithmetic, progress reports, partial archives, failure
//! propagation, cancellation and selective export.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{
    CountingSettings, FailingCatalogs, InstrumentedStore, all, pricelists, seeded_store, stores_of,
};
use pricing_transfer::io::Format;
use pricing_transfer::io::{ExportRecord, ExportablePricelistAssignment};
use pricing_transfer::storage::EntityStore;
use pricing_transfer::{
    CancellationToken, DataExporter, EntityKind, Error, ExportDataQuery, InMemoryPricingStore,
    Price, Pricelist, PricelistAssignment, PricingExportImport, PricingStores, ProgressInfo,
    StaticSettings,
};
use std::sync::Arc;
use test_case::test_case;

fn engine(stores: PricingStores, batch_size: i64) -> PricingExportImport {
    PricingExportImport::new(stores, Arc::new(StaticSettings::with_page_size(batch_size)))
}

fn export_bytes(engine: &PricingExportImport) -> (Vec<u8>, Vec<ProgressInfo>) {
    let mut out = Vec::new();
    let mut reports = Vec::new();
    engine
        .export(&mut out, |p| reports.push(p), &CancellationToken::new())
        .unwrap();
    (out, reports)
}

fn reports_for(reports: &[ProgressInfo], kind: EntityKind) -> Vec<&ProgressInfo> {
    reports.iter().filter(|p| p.kind == kind).collect()
}

// ============================================================================
// Round trip
// ============================================================================

#[test_case(1 ; "batch of one")]
#[test_case(7 ; "batch of seven")]
#[test_case(50 ; "default batch")]
#[test_case(10_000 ; "batch larger than every section")]
fn test_roundtrip_preserves_every_record(batch_size: i64) {
    let source = seeded_store(23, 11, 37);
    let (archive, reports) = export_bytes(&engine(stores_of(&source), batch_size));

    let target = Arc::new(InMemoryPricingStore::new());
    let summary = engine(stores_of(&target), batch_size)
        .import(archive.as_slice(), |_| {}, &CancellationToken::new())
        .unwrap();

    assert_eq!(summary.pricelists, 23);
    assert_eq!(summary.assignments, 11);
    assert_eq!(summary.prices, 37);
    assert_eq!(
        all::<Pricelist>(&*target),
        all::<Pricelist>(&*source)
    );
    assert_eq!(
        all::<PricelistAssignment>(&*target),
        all::<PricelistAssignment>(&*source)
    );
    assert_eq!(all::<Price>(&*target), all::<Price>(&*source));

    let batch = usize::try_from(batch_size).unwrap();
    for (kind, n) in [
        (EntityKind::Pricelist, 23_usize),
        (EntityKind::Assignment, 11),
        (EntityKind::Price, 37),
    ] {
        assert_eq!(reports_for(&reports, kind).len(), n.div_ceil(batch));
    }
}

#[test]
fn test_archive_sections_are_in_fixed_order() {
    let source = seeded_store(2, 2, 2);
    let (archive, _) = export_bytes(&engine(stores_of(&source), 50));
    let text = String::from_utf8(archive).unwrap();

    let pricelists = text.find("\"Pricelists\"").unwrap();
    let assignments = text.find("\"Assignments\"").unwrap();
    let prices = text.find("\"Prices\"").unwrap();
    assert_eq!(pricelists, 1);
    assert!(pricelists < assignments && assignments < prices);

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["Pricelists"].as_array().unwrap().len(), 2);
    assert_eq!(value["Assignments"][0]["catalogId"], "cat-main");
    assert!(value["Assignments"][0].get("catalogName").is_none());
    assert!(value["Prices"][0].get("pricelistName").is_none());
}

#[test]
fn test_empty_stores_roundtrip() {
    let source = Arc::new(InMemoryPricingStore::new());
    let (archive, reports) = export_bytes(&engine(stores_of(&source), 50));
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|p| p.processed_count == 0));

    let target = Arc::new(InMemoryPricingStore::new());
    let mut import_reports = Vec::new();
    let summary = engine(stores_of(&target), 50)
        .import(
            archive.as_slice(),
            |p| import_reports.push(p),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(summary.total(), 0);
    assert!(import_reports.is_empty());
}

// ============================================================================
// Paging
// ============================================================================

#[test]
fn test_133_records_with_batch_50() {
    let backend = seeded_store(133, 0, 0);
    let pricelist_store = Arc::new(InstrumentedStore::<Pricelist>::new(backend.clone()));
    let mut stores = stores_of(&backend);
    stores.pricelists = pricelist_store.clone();

    let (_, reports) = export_bytes(&engine(stores, 50));

    assert_eq!(pricelist_store.windows(), vec![(0, 50), (50, 50), (100, 33)]);
    let progress: Vec<(usize, Option<usize>)> = reports_for(&reports, EntityKind::Pricelist)
        .iter()
        .map(|p| (p.processed_count, p.total_count))
        .collect();
    assert_eq!(
        progress,
        vec![(50, Some(133)), (100, Some(133)), (133, Some(133))]
    );
    assert_eq!(
        reports[0].description,
        "50 of 133 price lists have been exported"
    );
}

#[test]
fn test_export_stops_on_early_empty_page() {
    struct StaleTotal(Arc<InMemoryPricingStore>);

    impl EntityStore<Pricelist> for StaleTotal {
        fn get_by_ids(&self, ids: &[String]) -> pricing_transfer::Result<Vec<Pricelist>> {
            EntityStore::<Pricelist>::get_by_ids(&*self.0, ids)
        }

        fn search(
            &self,
            criteria: &pricing_transfer::models::PricelistSearchCriteria,
        ) -> pricing_transfer::Result<pricing_transfer::Page<Pricelist>> {
            let mut page = EntityStore::<Pricelist>::search(&*self.0, criteria)?;
            page.total_count = 1_000;
            Ok(page)
        }

        fn save(&self, items: &[Pricelist]) -> pricing_transfer::Result<()> {
            EntityStore::<Pricelist>::save(&*self.0, items)
        }

        fn delete(&self, ids: &[String]) -> pricing_transfer::Result<()> {
            EntityStore::<Pricelist>::delete(&*self.0, ids)
        }
    }

    let backend = seeded_store(15, 0, 0);
    let counted = Arc::new(InstrumentedStore::<Pricelist>::new(Arc::new(StaleTotal(
        backend.clone(),
    ))));
    let mut stores = stores_of(&backend);
    stores.pricelists = counted.clone();

    let mut out = Vec::new();
    let summary = engine(stores, 10)
        .export(&mut out, |_| {}, &CancellationToken::new())
        .unwrap();

    assert_eq!(summary.pricelists, 15);
    assert_eq!(counted.windows(), vec![(0, 10), (10, 10), (20, 10)]);
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["Pricelists"].as_array().unwrap().len(), 15);
}

#[test]
fn test_import_saves_in_batches() {
    let target = Arc::new(InMemoryPricingStore::new());
    let counted = Arc::new(InstrumentedStore::<Pricelist>::new(target.clone()));
    let mut stores = stores_of(&target);
    stores.pricelists = counted.clone();

    let archive = serde_json::json!({ "Pricelists": pricelists(7) }).to_string();
    let mut reports = Vec::new();
    engine(stores, 3)
        .import(archive.as_bytes(), |p| reports.push(p), &CancellationToken::new())
        .unwrap();

    assert_eq!(counted.batch_sizes(), vec![3, 3, 1]);
    let counts: Vec<usize> = reports.iter().map(|p| p.processed_count).collect();
    assert_eq!(counts, vec![3, 6, 7]);
    assert!(reports.iter().all(|p| p.total_count.is_none()));
}

// ============================================================================
// Partial and unusual archives
// ============================================================================

#[test]
fn test_import_only_assignments_section() {
    let target = Arc::new(InMemoryPricingStore::new());
    let pricelist_store = Arc::new(InstrumentedStore::<Pricelist>::new(target.clone()));
    let price_store = Arc::new(InstrumentedStore::<Price>::new(target.clone()));
    let mut stores = stores_of(&target);
    stores.pricelists = pricelist_store.clone();
    stores.prices = price_store.clone();

    let archive = serde_json::json!({
        "Assignments": common::assignments(5, 1),
    })
    .to_string();
    let mut reports = Vec::new();
    let summary = engine(stores, 2)
        .import(archive.as_bytes(), |p| reports.push(p), &CancellationToken::new())
        .unwrap();

    assert_eq!(summary.assignments, 5);
    assert_eq!(pricelist_store.save_calls(), 0);
    assert_eq!(price_store.save_calls(), 0);
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports[2].description,
        "5 price list assignments have been imported"
    );
    assert_eq!(all::<PricelistAssignment>(&*target).len(), 5);
}

#[test]
fn test_import_sections_in_any_order_with_unknown_fields() {
    let target = Arc::new(InMemoryPricingStore::new());
    let archive = format!(
        r#"{{
            "Prices": {prices},
            "ExportedAt": "2026-01-01T00:00:00Z",
            "Meta": {{"nested": [{{"deep": [1, 2, 3]}}, null, "x"]}},
            "Assignments": null,
            "Pricelists": {pricelists}
        }}"#,
        prices = serde_json::to_string(&common::prices(3, 2)).unwrap(),
        pricelists = serde_json::to_string(&pricelists(2)).unwrap(),
    );

    let summary = engine(stores_of(&target), 50)
        .import(archive.as_bytes(), |_| {}, &CancellationToken::new())
        .unwrap();

    assert_eq!(summary.prices, 3);
    assert_eq!(summary.assignments, 0);
    assert_eq!(summary.pricelists, 2);
}

#[test]
fn test_import_ignores_denormalized_fields() {
    let target = Arc::new(InMemoryPricingStore::new());
    let archive = r#"{"Assignments":[{
        "id": "as-1", "catalogId": "cat-main", "pricelistId": "pl-0000",
        "catalogName": "Stale name", "pricelistName": "Stale too", "priority": 3
    }]}"#;

    engine(stores_of(&target), 50)
        .import(archive.as_bytes(), |_| {}, &CancellationToken::new())
        .unwrap();

    let saved = all::<PricelistAssignment>(&*target);
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].catalog_id, "cat-main");
    assert_eq!(saved[0].priority, 3);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_decode_failure_keeps_earlier_batches() {
    let target = Arc::new(InMemoryPricingStore::new());
    let archive = r#"{"Pricelists":[
        {"id":"a","name":"A","currency":"USD"},
        {"id":"b","name":"B","currency":"USD"},
        {"id":"c","name":"C","currency":"USD"},
        {"id": 5}
    ]}"#;

    let err = engine(stores_of(&target), 2)
        .import(archive.as_bytes(), |_| {}, &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::DecodeFailed(_)), "got {err:?}");
    let ids: Vec<String> = all::<Pricelist>(&*target).into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test_case("" ; "empty input")]
#[test_case("[]" ; "array document")]
#[test_case(r#"{"Pricelists": 3}"# ; "section is not an array")]
#[test_case(r#"{"Pricelists": [}"# ; "truncated document")]
fn test_malformed_archive_is_decode_failure(archive: &str) {
    let err = engine(stores_of(&Arc::new(InMemoryPricingStore::new())), 50)
        .import(archive.as_bytes(), |_| {}, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::DecodeFailed(_)), "got {err:?}");
}

#[test]
fn test_save_failure_is_reported() {
    let target = Arc::new(InMemoryPricingStore::new());
    let failing = Arc::new(InstrumentedStore::<Price>::new(target.clone()).failing_save_from(2));
    let mut stores = stores_of(&target);
    stores.prices = failing.clone();

    let archive = serde_json::json!({ "Prices": common::prices(5, 1) }).to_string();
    let mut reports = Vec::new();
    let err = engine(stores, 2)
        .import(archive.as_bytes(), |p| reports.push(p), &CancellationToken::new())
        .unwrap_err();

    assert!(
        matches!(err, Error::SaveFailed { ref entity, .. } if entity == "prices"),
        "got {err:?}"
    );
    assert_eq!(failing.save_calls(), 2);
    assert_eq!(reports.len(), 1);
    assert_eq!(all::<Price>(&*target).len(), 2);
}

#[test]
fn test_fetch_failure_leaves_truncated_sink() {
    let backend = seeded_store(3, 3, 3);
    let mut stores = stores_of(&backend);
    stores.assignments = Arc::new(
        InstrumentedStore::<PricelistAssignment>::new(backend.clone()).failing_search_from(1),
    );

    let mut out = Vec::new();
    let err = engine(stores, 50)
        .export(&mut out, |_| {}, &CancellationToken::new())
        .unwrap_err();

    assert!(
        matches!(err, Error::FetchFailed { ref entity, .. } if entity == "assignments"),
        "got {err:?}"
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(r#"{"Pricelists":[{"#));
    assert!(text.ends_with(r#""Assignments":["#));
    assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
}

#[test]
fn test_lookup_failure_is_fetch_failure() {
    let backend = seeded_store(1, 1, 0);
    let mut stores = stores_of(&backend);
    stores.catalogs = Arc::new(FailingCatalogs);

    let err = DataExporter::new(stores, &StaticSettings::new())
        .export(
            EntityKind::Assignment,
            &ExportDataQuery::new(),
            Format::Json,
            Vec::new(),
            |_| {},
            &CancellationToken::new(),
        )
        .unwrap_err();

    assert!(
        matches!(err, Error::FetchFailed { ref entity, .. } if entity == "catalogs"),
        "got {err:?}"
    );
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancelled_before_start() {
    let backend = seeded_store(5, 5, 5);
    let pricelist_store = Arc::new(InstrumentedStore::<Pricelist>::new(backend.clone()));
    let mut stores = stores_of(&backend);
    stores.pricelists = pricelist_store.clone();
    let engine = engine(stores, 50);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut out = Vec::new();
    let mut reports = Vec::new();
    let err = engine
        .export(&mut out, |p| reports.push(p), &cancel)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(pricelist_store.search_calls(), 0);
    assert!(out.is_empty());

    let archive = serde_json::json!({ "Pricelists": pricelists(3) }).to_string();
    let err = engine
        .import(archive.as_bytes(), |p| reports.push(p), &cancel)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(pricelist_store.save_calls(), 0);
    assert!(reports.is_empty());
}

#[test]
fn test_cancel_during_export_finishes_page_in_flight() {
    let backend = seeded_store(133, 0, 0);
    let cancel = CancellationToken::new();
    let hook_token = cancel.clone();
    let pricelist_store = Arc::new(
        InstrumentedStore::<Pricelist>::new(backend.clone()).after_search(move |call| {
            if call == 2 {
                hook_token.cancel();
            }
        }),
    );
    let mut stores = stores_of(&backend);
    stores.pricelists = pricelist_store.clone();

    let mut reports = Vec::new();
    let err = engine(stores, 50)
        .export(Vec::new(), |p| reports.push(p), &cancel)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(pricelist_store.search_calls(), 2);
    let counts: Vec<usize> = reports.iter().map(|p| p.processed_count).collect();
    assert_eq!(counts, vec![50, 100]);
}

#[test]
fn test_cancel_during_import_stops_after_saved_batch() {
    let target = Arc::new(InMemoryPricingStore::new());
    let cancel = CancellationToken::new();
    let hook_token = cancel.clone();
    let price_store = Arc::new(
        InstrumentedStore::<Price>::new(target.clone()).after_save(move |_| hook_token.cancel()),
    );
    let mut stores = stores_of(&target);
    stores.prices = price_store.clone();

    let archive = serde_json::json!({ "Prices": common::prices(5, 1) }).to_string();
    let err = engine(stores, 2)
        .import(archive.as_bytes(), |_| {}, &cancel)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(price_store.save_calls(), 1);
    assert_eq!(all::<Price>(&*target).len(), 2);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_batch_size_read_once_per_engine() {
    let settings = Arc::new(CountingSettings::with_page_size(4));
    let backend = seeded_store(9, 2, 2);
    let engine = PricingExportImport::new(stores_of(&backend), settings.clone());
    assert_eq!(settings.reads(), 0);

    let mut archive = Vec::new();
    engine
        .export(&mut archive, |_| {}, &CancellationToken::new())
        .unwrap();
    engine
        .export(Vec::new(), |_| {}, &CancellationToken::new())
        .unwrap();
    engine
        .import(archive.as_slice(), |_| {}, &CancellationToken::new())
        .unwrap();

    assert_eq!(engine.batch_size(), 4);
    assert_eq!(settings.reads(), 1);
}

#[test]
fn test_non_positive_batch_size_is_clamped() {
    let backend = seeded_store(3, 0, 0);
    let (_, reports) = export_bytes(&engine(stores_of(&backend), 0));
    assert_eq!(reports_for(&reports, EntityKind::Pricelist).len(), 3);
}

// ============================================================================
// Selective export
// ============================================================================

#[test]
fn test_selective_export_keeps_requested_order() {
    let backend = seeded_store(10, 0, 0);
    let pricelist_store = Arc::new(InstrumentedStore::<Pricelist>::new(backend.clone()));
    let mut stores = stores_of(&backend);
    stores.pricelists = pricelist_store.clone();
    let exporter = DataExporter::new(stores, &StaticSettings::with_page_size(1));

    let query = ExportDataQuery::new().with_object_ids(["pl-0007", "pl-0002", "", "pl-0005"]);
    let mut out = Vec::new();
    let mut reports = Vec::new();
    let exported = exporter
        .export(
            EntityKind::Pricelist,
            &query,
            Format::Json,
            &mut out,
            |p| reports.push(p),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(exported, 3);
    assert_eq!(pricelist_store.search_calls(), 0);
    assert_eq!(pricelist_store.lookup_calls(), 1);
    let parsed: Vec<Pricelist> = serde_json::from_slice(&out).unwrap();
    let ids: Vec<&str> = parsed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["pl-0007", "pl-0002", "pl-0005"]);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].description, "3 of 3 price lists have been exported");
}

#[test]
fn test_selective_csv_export_has_header_and_names() {
    let backend = seeded_store(2, 4, 0);
    let exporter = DataExporter::new(stores_of(&backend), &StaticSettings::new());

    let query = ExportDataQuery::new().with_catalog_ids(vec!["cat-main".to_string()]);
    let mut out = Vec::new();
    let exported = exporter
        .export(
            EntityKind::Assignment,
            &query,
            Format::Csv,
            &mut out,
            |_| {},
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(exported, 2);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        ExportablePricelistAssignment::csv_headers().join(",")
    );
    assert!(lines[1].starts_with("as-0000,cat-main,Main catalog,pl-0000,List 0,"));
}

#[test]
fn test_selective_export_by_keyword_and_filters() {
    let backend = seeded_store(12, 0, 30);
    let exporter = DataExporter::new(stores_of(&backend), &StaticSettings::with_page_size(5));

    let query = ExportDataQuery::new().with_pricelist_ids(vec!["pl-0001".to_string()]);
    let mut out = Vec::new();
    let mut reports = Vec::new();
    let exported = exporter
        .export(
            EntityKind::Price,
            &query,
            Format::Json,
            &mut out,
            |p| reports.push(p),
            &CancellationToken::new(),
        )
        .unwrap();

    // Prices cycle through 12 price lists, so pl-0001 owns indexes 1, 13 and 25.
    assert_eq!(exported, 3);
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
    assert!(parsed.iter().all(|p| p["pricelistName"] == "List 1"));
    assert_eq!(reports.len(), 1);

    let by_keyword = ExportDataQuery::new().with_keyword("list 1");
    let exported = exporter
        .export(
            EntityKind::Pricelist,
            &by_keyword,
            Format::Json,
            Vec::new(),
            |_| {},
            &CancellationToken::new(),
        )
        .unwrap();
    // "List 1", "List 10", "List 11"
    assert_eq!(exported, 3);
}

#[test]
fn test_selective_export_cancelled_before_start() {
    let backend = seeded_store(3, 0, 0);
    let exporter = DataExporter::new(stores_of(&backend), &StaticSettings::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = exporter
        .export(
            EntityKind::Pricelist,
            &ExportDataQuery::new(),
            Format::Csv,
            Vec::new(),
            |_| {},
            &cancel,
        )
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_exportable_ids_match_entities() {
    let backend = seeded_store(1, 1, 1);
    let (archive, _) = export_bytes(&engine(stores_of(&backend), 50));
    let value: serde_json::Value = serde_json::from_slice(&archive).unwrap();
    let assignment: ExportablePricelistAssignment =
        serde_json::from_value(value["Assignments"][0].clone()).unwrap();
    assert_eq!(assignment.id(), "as-0000");
    assert_eq!(assignment.pricelist_name, None);
    assert_eq!(assignment.entity(), &all::<PricelistAssignment>(&*backend)[0]);
}

#[test]
fn test_full_export_ignores_catalog_lookup() {
    let backend = seeded_store(1, 2, 0);
    let mut stores = stores_of(&backend);
    stores.catalogs = Arc::new(FailingCatalogs);

    let (archive, _) = export_bytes(&engine(stores, 50));
    let value: serde_json::Value = serde_json::from_slice(&archive).unwrap();
    assert_eq!(value["Assignments"].as_array().unwrap().len(), 2);
}

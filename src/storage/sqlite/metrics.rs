//! Metrics recording for the `SQLite` store.

use std::time::Instant;

/// Runs one store operation and records its outcome.
///
/// Emits `storage_operations_total` and `storage_operation_duration_ms`,
/// both labeled by backend, entity, operation and status (`success` or
/// `error`).
pub fn timed<T, E>(
    entity: &'static str,
    operation: &'static str,
    run: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = run();
    let status = if result.is_ok() { "success" } else { "error" };
    let labels = [
        ("backend", "sqlite"),
        ("entity", entity),
        ("operation", operation),
        ("status", status),
    ];

    metrics::counter!("storage_operations_total", &labels).increment(1);
    metrics::histogram!("storage_operation_duration_ms", &labels)
        .record(start.elapsed().as_secs_f64() * 1000.0);
    result
}

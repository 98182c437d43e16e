//! Shared metrics recording for data-access operations.

use std::time::Instant;

/// Records a counter and a latency histogram for one data-access call.
///
/// Every executor entry point reports through here so operation counts
/// and latency share one naming scheme:
/// 1. `agora_db_operations_total` - counter by operation and status
/// 2. `agora_db_operation_duration_ms` - latency histogram
pub fn record_access_metrics(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "agora_db_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "agora_db_operation_duration_ms",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_access_metrics_statuses() {
        // Recording must never panic, whatever the status label
        let start = Instant::now();
        record_access_metrics("fetch_all", start, "success");
        record_access_metrics("execute", start, "error");
        record_access_metrics("transaction", start, "success");
    }
}

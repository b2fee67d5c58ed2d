//! Catalog refresh metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct CatalogMetrics;

impl CatalogMetrics {
    pub fn record_refresh_success(duration_secs: f64, entries: usize, dropped: usize) {
        ::metrics::counter!(phase_metric!(counter, "catalog", "refresh_success")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "catalog", "fetch_duration_seconds"))
            .record(duration_secs);
        ::metrics::gauge!(phase_metric!(gauge, "catalog", "entries")).set(entries as f64);
        ::metrics::counter!(phase_metric!(counter, "catalog", "records_dropped"))
            .increment(dropped as u64);
    }

    pub fn record_refresh_error(duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "catalog", "refresh_error")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "catalog", "fetch_duration_seconds"))
            .record(duration_secs);
    }

    /// A trigger arrived while a fetch was already running
    pub fn record_refresh_skipped() {
        ::metrics::counter!(phase_metric!(counter, "catalog", "refresh_skipped")).increment(1);
    }
}

impl PhaseMetrics for CatalogMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "catalog", "refresh_success"));
        let _ = counter!(phase_metric!(counter, "catalog", "refresh_error"));
        let _ = counter!(phase_metric!(counter, "catalog", "refresh_skipped"));
        let _ = counter!(phase_metric!(counter, "catalog", "records_dropped"));
        let _ = histogram!(phase_metric!(histogram, "catalog", "fetch_duration_seconds"));
        let _ = gauge!(phase_metric!(gauge, "catalog", "entries"));
    }

    fn phase_name() -> &'static str {
        "catalog"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "catalog", "refresh_success"),
                metric_type: MetricType::Counter,
                help: "Catalog refreshes that swapped in a new snapshot",
            },
            MetricDoc {
                name: phase_metric!(counter, "catalog", "refresh_error"),
                metric_type: MetricType::Counter,
                help: "Catalog refreshes that failed and kept the prior snapshot",
            },
            MetricDoc {
                name: phase_metric!(counter, "catalog", "refresh_skipped"),
                metric_type: MetricType::Counter,
                help: "Refresh triggers dropped because a fetch was in flight",
            },
            MetricDoc {
                name: phase_metric!(counter, "catalog", "records_dropped"),
                metric_type: MetricType::Counter,
                help: "Source records excluded as malformed, nameless or restricted",
            },
            MetricDoc {
                name: phase_metric!(histogram, "catalog", "fetch_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent fetching and parsing the catalog",
            },
            MetricDoc {
                name: phase_metric!(gauge, "catalog", "entries"),
                metric_type: MetricType::Gauge,
                help: "Entries in the active snapshot",
            },
        ]
    }
}

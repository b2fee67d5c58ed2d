//! Alias table metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct AliasMetrics;

impl AliasMetrics {
    pub fn record_added() {
        ::metrics::counter!(phase_metric!(counter, "aliases", "added")).increment(1);
    }

    pub fn record_removed() {
        ::metrics::counter!(phase_metric!(counter, "aliases", "removed")).increment(1);
    }

    pub fn record_persisted() {
        ::metrics::counter!(phase_metric!(counter, "aliases", "persisted")).increment(1);
    }

    pub fn record_persist_error() {
        ::metrics::counter!(phase_metric!(counter, "aliases", "persist_error")).increment(1);
    }
}

impl PhaseMetrics for AliasMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "aliases", "added"));
        let _ = counter!(phase_metric!(counter, "aliases", "removed"));
        let _ = counter!(phase_metric!(counter, "aliases", "persisted"));
        let _ = counter!(phase_metric!(counter, "aliases", "persist_error"));
    }

    fn phase_name() -> &'static str {
        "aliases"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "aliases", "added"),
                metric_type: MetricType::Counter,
                help: "Aliases added",
            },
            MetricDoc {
                name: phase_metric!(counter, "aliases", "removed"),
                metric_type: MetricType::Counter,
                help: "Aliases removed",
            },
            MetricDoc {
                name: phase_metric!(counter, "aliases", "persisted"),
                metric_type: MetricType::Counter,
                help: "Alias documents written to the store",
            },
            MetricDoc {
                name: phase_metric!(counter, "aliases", "persist_error"),
                metric_type: MetricType::Counter,
                help: "Alias document writes that failed",
            },
        ]
    }
}

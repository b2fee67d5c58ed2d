//! Slash-command metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct CommandMetrics;

impl CommandMetrics {
    pub fn record_command(verb: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "commands", "received"), "verb" => verb)
            .increment(1);
    }

    pub fn record_forbidden() {
        ::metrics::counter!(phase_metric!(counter, "commands", "forbidden")).increment(1);
    }

    pub fn record_resolution(hit: bool) {
        if hit {
            ::metrics::counter!(phase_metric!(counter, "commands", "resolve_hit")).increment(1);
        } else {
            ::metrics::counter!(phase_metric!(counter, "commands", "resolve_miss")).increment(1);
        }
    }

    pub fn record_delivery_error() {
        ::metrics::counter!(phase_metric!(counter, "commands", "delivery_error")).increment(1);
    }
}

impl PhaseMetrics for CommandMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "commands", "forbidden"));
        let _ = counter!(phase_metric!(counter, "commands", "resolve_hit"));
        let _ = counter!(phase_metric!(counter, "commands", "resolve_miss"));
        let _ = counter!(phase_metric!(counter, "commands", "delivery_error"));
    }

    fn phase_name() -> &'static str {
        "commands"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "commands", "received"),
                metric_type: MetricType::Counter,
                help: "Commands handled, labelled by verb",
            },
            MetricDoc {
                name: phase_metric!(counter, "commands", "forbidden"),
                metric_type: MetricType::Counter,
                help: "Requests rejected by the shared-secret check",
            },
            MetricDoc {
                name: phase_metric!(counter, "commands", "resolve_hit"),
                metric_type: MetricType::Counter,
                help: "Send requests that found a sticker image",
            },
            MetricDoc {
                name: phase_metric!(counter, "commands", "resolve_miss"),
                metric_type: MetricType::Counter,
                help: "Send requests with no sticker or no image at that size",
            },
            MetricDoc {
                name: phase_metric!(counter, "commands", "delivery_error"),
                metric_type: MetricType::Counter,
                help: "Chat deliveries that failed",
            },
        ]
    }
}

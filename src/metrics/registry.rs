//! Metrics registry for coordinating the per-area metrics
//!
//! Registers every area's metrics and detects name conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::catalog::CatalogMetrics>(&mut all_metrics);
    register_phase_metrics::<super::aliases::AliasMetrics>(&mut all_metrics);
    register_phase_metrics::<super::commands::CommandMetrics>(&mut all_metrics);

    info!("Registered {} total metrics", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<String, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if let Some(existing) = all_metrics.get(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' ({}) registered again by phase '{}'",
                doc.name, existing.help, phase_name
            );
        } else {
            debug!("  - {} ({:?}): {}", doc.name, doc.metric_type, doc.help);
            all_metrics.insert(doc.name.to_string(), doc);
        }
    }
}

/// Phase segment of a metric name ("stickerbot_catalog_entries" -> "catalog")
pub fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("stickerbot_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AliasMetrics, CatalogMetrics, CommandMetrics};
    use std::collections::HashSet;

    #[test]
    fn test_extract_phase_from_metric_name() {
        assert_eq!(
            extract_phase_from_metric_name("stickerbot_catalog_refresh_success_total"),
            "catalog"
        );
        assert_eq!(
            extract_phase_from_metric_name("stickerbot_aliases_added_total"),
            "aliases"
        );
        assert_eq!(extract_phase_from_metric_name("invalid_metric_name"), "unknown");
    }

    #[test]
    fn documented_names_are_unique_and_match_their_phase() {
        let mut seen = HashSet::new();
        let docs = CatalogMetrics::metrics_documentation()
            .into_iter()
            .map(|d| (CatalogMetrics::phase_name(), d))
            .chain(
                AliasMetrics::metrics_documentation()
                    .into_iter()
                    .map(|d| (AliasMetrics::phase_name(), d)),
            )
            .chain(
                CommandMetrics::metrics_documentation()
                    .into_iter()
                    .map(|d| (CommandMetrics::phase_name(), d)),
            );

        for (phase, doc) in docs {
            assert!(seen.insert(doc.name), "duplicate metric {}", doc.name);
            assert_eq!(extract_phase_from_metric_name(doc.name), phase);
        }
    }
}

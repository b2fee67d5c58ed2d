//! Metrics for the sticker service
//!
//! Each area (catalog refresh, alias table, command handling) defines its metrics in a
//! dedicated submodule. The Prometheus recorder is installed once and its handle is kept
//! so the webhook server can render `/metrics` in-process.

pub mod aliases;
pub mod catalog;
pub mod commands;
pub mod registry;

pub use aliases::AliasMetrics;
pub use catalog::CatalogMetrics;
pub use commands::CommandMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder and register all metrics.
///
/// Idempotent. Returns the render handle, or `None` if another recorder was already
/// installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus recorder installed");
                registry::register_all_metrics();
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .clone()
}

/// Implemented by each area's metrics collection
pub trait PhaseMetrics {
    /// Pre-register every metric so it shows up before first use
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds metric names as `stickerbot_{phase}_{name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("stickerbot_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("stickerbot_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("stickerbot_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless
//! `ONLINE_REDSHIFT_METRICS_PORT` is set, in which case a Prometheus
//! endpoint is installed on that port.

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

use crate::constants::METRICS_PORT_ENV;
use crate::policy::SearchType;

static INIT: Once = Once::new();

/// Install the Prometheus exporter when the port variable is set. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        let Some(port) = std::env::var(METRICS_PORT_ENV)
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        else {
            return;
        };
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let builder =
            metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        match builder.install() {
            Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
            Err(e) => warn!("Prometheus exporter install failed: {}", e),
        }
    });
}

pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_catalog_seen(search_type: SearchType) {
        ::metrics::counter!("online_redshift_catalogs_total", "search_type" => search_type.as_str())
            .increment(1);
    }

    /// `reason` is one of banned, no_position, no_column, no_rows, schema
    pub fn record_catalog_rejected(reason: &'static str) {
        ::metrics::counter!("online_redshift_catalogs_rejected_total", "reason" => reason)
            .increment(1);
    }

    pub fn record_rows_kept(source: &'static str, rows: usize) {
        ::metrics::counter!("online_redshift_rows_kept_total", "source" => source)
            .increment(rows as u64);
    }

    pub fn record_photoz_dropped(rows: usize) {
        ::metrics::counter!("online_redshift_photoz_dropped_total").increment(rows as u64);
    }

    pub fn record_duplicates_removed(rows: usize) {
        ::metrics::counter!("online_redshift_duplicates_removed_total").increment(rows as u64);
    }

    pub fn record_query_failure(service: &'static str) {
        ::metrics::counter!("online_redshift_query_failures_total", "service" => service)
            .increment(1);
    }

    pub fn record_query_duration(service: &'static str, duration_secs: f64) {
        ::metrics::histogram!("online_redshift_query_duration_seconds", "service" => service)
            .record(duration_secs);
    }
}

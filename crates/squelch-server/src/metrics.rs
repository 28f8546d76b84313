//! Routing counters and latency, scraped by Prometheus.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;
use tenvis_squelch_core::RouteOutcome;
use tracing::info;

pub mod names {
    pub const TRANSMISSIONS_TOTAL: &str = "squelch_transmissions_total";
    pub const DELIVERIES_TOTAL: &str = "squelch_deliveries_total";
    pub const SESSION_FRAMES_TOTAL: &str = "squelch_session_frames_total";
    pub const SESSION_BYTES: &str = "squelch_session_bytes";
    pub const CHIMES_TOTAL: &str = "squelch_chimes_total";
    pub const CHIME_LISTENERS_TOTAL: &str = "squelch_chime_listeners_total";
    pub const ROUTING_SECONDS: &str = "squelch_routing_seconds";
    pub const ERRORS_TOTAL: &str = "squelch_errors_total";
}

/// Register descriptions for every Squelch metric.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::TRANSMISSIONS_TOTAL,
        "Routing calls by outcome (broadcast, cancelled, suppressed)"
    );
    metrics::describe_counter!(names::DELIVERIES_TOTAL, "Recipients reached");
    metrics::describe_counter!(
        names::SESSION_FRAMES_TOTAL,
        "Chat frames pushed to sessions"
    );
    metrics::describe_counter!(names::SESSION_BYTES, "Bytes pushed to sessions");
    metrics::describe_counter!(names::CHIMES_TOTAL, "Radio chimes played");
    metrics::describe_counter!(
        names::CHIME_LISTENERS_TOTAL,
        "Listeners addressed by radio chimes"
    );
    metrics::describe_histogram!(
        names::ROUTING_SECONDS,
        "Time spent in one routing call in seconds"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Failed requests and codec errors by kind");

    info!("Metric descriptions registered");
}

/// Serve `/metrics` on every interface at `port`.
///
/// # Errors
///
/// Returns an error if the exporter cannot bind or is already installed.
pub fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

pub fn outcome_label(outcome: RouteOutcome) -> &'static str {
    match outcome {
        RouteOutcome::Broadcast => "broadcast",
        RouteOutcome::Cancelled => "cancelled",
        RouteOutcome::Suppressed => "suppressed",
    }
}

/// Record a finished routing call.
pub fn record_transmission(outcome: RouteOutcome, recipients: usize) {
    counter!(names::TRANSMISSIONS_TOTAL, "outcome" => outcome_label(outcome)).increment(1);
    counter!(names::DELIVERIES_TOTAL).increment(recipients as u64);
}

/// Record a frame pushed to a session.
pub fn record_session_frame(bytes: usize) {
    counter!(names::SESSION_FRAMES_TOTAL).increment(1);
    counter!(names::SESSION_BYTES).increment(bytes as u64);
}

/// Record a chime.
pub fn record_chime(targets: usize) {
    counter!(names::CHIMES_TOTAL).increment(1);
    counter!(names::CHIME_LISTENERS_TOTAL).increment(targets as u64);
}

/// Count a failure under its `kind` label.
pub fn record_error(kind: &'static str) {
    counter!(names::ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Records routing latency on drop.
pub struct RoutingTimer {
    started: Instant,
}

impl RoutingTimer {
    /// Start timing a routing call.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Drop for RoutingTimer {
    fn drop(&mut self) {
        histogram!(names::ROUTING_SECONDS).record(self.started.elapsed().as_secs_f64());
    }
}

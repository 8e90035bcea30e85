//! Prometheus metrics endpoint.

use crate::server::StageRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
pub async fn metrics_handler(Extension(relay): Extension<Arc<StageRelay>>) -> impl IntoResponse {
    let m = relay.metrics();

    let entries = relay.store().len();
    let copies = m.copies_total.load(Ordering::Relaxed);
    let moves = m.moves_total.load(Ordering::Relaxed);
    let pastes = m.pastes_total.load(Ordering::Relaxed);
    let lists = m.lists_total.load(Ordering::Relaxed);
    let not_found = m.not_found_total.load(Ordering::Relaxed);
    let rejected = m.rejected_total.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);
    let bytes_rx = m.bytes_received.load(Ordering::Relaxed);
    let bytes_tx = m.bytes_sent.load(Ordering::Relaxed);

    let body = format!(
        r#"# HELP stagebox_entries Number of staged entries
# TYPE stagebox_entries gauge
stagebox_entries {entries}

# HELP stagebox_info Server information
# TYPE stagebox_info gauge
stagebox_info{{version="{version}"}} 1

# HELP stagebox_requests_total Successful requests by operation
# TYPE stagebox_requests_total counter
stagebox_requests_total{{op="copy"}} {copies}
stagebox_requests_total{{op="move"}} {moves}
stagebox_requests_total{{op="paste"}} {pastes}
stagebox_requests_total{{op="list"}} {lists}

# HELP stagebox_not_found_total Move or paste requests with no matching entry
# TYPE stagebox_not_found_total counter
stagebox_not_found_total {not_found}

# HELP stagebox_rejected_total Requests that failed to open, decode, or verify
# TYPE stagebox_rejected_total counter
stagebox_rejected_total {rejected}

# HELP stagebox_errors_total Requests that failed inside the relay
# TYPE stagebox_errors_total counter
stagebox_errors_total {errors}

# HELP stagebox_bytes_received_total Total sealed bytes received
# TYPE stagebox_bytes_received_total counter
stagebox_bytes_received_total {bytes_rx}

# HELP stagebox_bytes_sent_total Total sealed bytes sent
# TYPE stagebox_bytes_sent_total counter
stagebox_bytes_sent_total {bytes_tx}
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

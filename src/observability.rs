use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

use crate::model::{Outcome, UiEvent};

// ── RED metrics (event-driven) ──────────────────────────────────

/// Counter: finished gestures. Labels: gesture, outcome.
pub const GESTURES_TOTAL: &str = "campgrid_gestures_total";

/// Counter: UI events handled. Labels: event.
pub const EVENTS_TOTAL: &str = "campgrid_events_total";

/// Counter: check-in and payment status changes. Labels: transition.
pub const STATUS_TRANSITIONS_TOTAL: &str = "campgrid_status_transitions_total";

// ── Store calls ─────────────────────────────────────────────────

/// Counter: calls made to the booking store. Labels: op, status.
pub const STORE_CALLS_TOTAL: &str = "campgrid_store_calls_total";

/// Histogram: store call latency in seconds. Labels: op.
pub const STORE_CALL_DURATION_SECONDS: &str = "campgrid_store_call_duration_seconds";

/// Gauge: intervals currently held in the local calendar.
pub const LEDGER_INTERVALS: &str = "campgrid_ledger_intervals";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a UiEvent variant to a short label for metrics.
pub fn event_label(event: &UiEvent) -> &'static str {
    match event {
        UiEvent::PointerDown { .. } => "pointer_down",
        UiEvent::PointerMove { .. } => "pointer_move",
        UiEvent::PointerUp => "pointer_up",
        UiEvent::DragStart { .. } => "drag_start",
        UiEvent::DragOver { .. } => "drag_over",
        UiEvent::Drop { .. } => "drop",
        UiEvent::DragEnd => "drag_end",
        UiEvent::ResizeHandleDown { .. } => "resize_handle_down",
        UiEvent::CheckInRequest { .. } => "check_in_request",
        UiEvent::CheckOutRequest { .. } => "check_out_request",
        UiEvent::MarkPaidRequest { .. } => "mark_paid_request",
    }
}

pub fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::MutationCommitted { .. } => "committed",
        Outcome::MutationRejected { .. } => "rejected",
        Outcome::NewReservationRequested { .. } => "requested",
        Outcome::StatusChanged { .. } => "status_changed",
    }
}

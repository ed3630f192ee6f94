mod conflict;
mod error;
mod gesture;
mod ledger;
mod mutations;
mod queries;
mod status;

pub use conflict::{available_sites, check_conflict, find_conflict, is_site_available};
pub use error::{SchedulingError, ValidationError};
pub use gesture::{
    plan_move, resize_candidate, selection_for, CreateAnchor, Gesture, GestureKind, MoveDrag, MovePlan,
    ResizeDrag, SelectionBox,
};
pub use ledger::Ledger;
pub use status::{check_in, check_out, mark_paid, transition, TransitionError};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{ResizeCommit, SchedulerConfig};
use crate::grid::GridMapper;
use crate::model::*;
use crate::notify::OutcomeHub;
use crate::observability::{
    event_label, EVENTS_TOTAL, LEDGER_INTERVALS, STORE_CALLS_TOTAL, STORE_CALL_DURATION_SECONDS,
};
use crate::store::{BookingStore, StoreError};

/// Drives the calendar: turns UI events into validated store mutations and
/// reports each result as an [`Outcome`].
///
/// Events must be fed one at a time; every store call is awaited before the
/// next event is looked at, so writes to the same stay land in the order
/// they were issued.
pub struct Scheduler {
    pub(super) store: Arc<dyn BookingStore>,
    pub(super) hub: Arc<OutcomeHub>,
    pub(super) grid: GridMapper,
    pub(super) resize_commit: ResizeCommit,
    pub(super) ledger: Ledger,
    pub(super) gesture: Gesture,
}

impl Scheduler {
    pub fn new(store: Arc<dyn BookingStore>, hub: Arc<OutcomeHub>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            hub,
            grid: GridMapper::from_config(config),
            resize_commit: config.resize_commit,
            ledger: Ledger::default(),
            gesture: Gesture::Idle,
        }
    }

    /// List sites and every stay overlapping `window` into the local ledger.
    pub async fn load(&mut self, window: StayRange) -> Result<(), SchedulingError> {
        let (sites, (bookings, reservations)) = futures::future::try_join(
            timed("list_sites", self.store.list_sites()),
            timed("list_intervals", self.store.list_intervals(None, window)),
        )
        .await?;
        info!(
            "loaded {window}: {} sites, {} bookings, {} reservations",
            sites.len(),
            bookings.len(),
            reservations.len()
        );
        self.ledger.replace_all(window, sites, bookings, reservations);
        metrics::gauge!(LEDGER_INTERVALS).set(self.ledger.len() as f64);
        Ok(())
    }

    /// Reload the last window. No-op before the first [`load`](Self::load).
    pub async fn refresh(&mut self) -> Result<(), SchedulingError> {
        match self.ledger.window {
            Some(window) => self.load(window).await,
            None => {
                debug!("refresh before load, nothing to do");
                Ok(())
            }
        }
    }

    /// Feed one UI event. Returns the outcome it produced, if any; the same
    /// outcome is also published on the hub.
    pub async fn handle(&mut self, event: UiEvent) -> Option<Outcome> {
        metrics::counter!(EVENTS_TOTAL, "event" => event_label(&event)).increment(1);
        let outcome = match event {
            UiEvent::PointerDown {
                date,
                site_id,
                client_x,
                primary,
            } => {
                self.on_pointer_down(date, site_id, client_x, primary);
                None
            }
            UiEvent::PointerMove {
                site_id,
                primary_held,
                client_x,
                ..
            } => self.on_pointer_move(site_id, primary_held, client_x).await,
            UiEvent::PointerUp => self.on_pointer_up().await,
            UiEvent::DragStart { key } => self.on_drag_start(key),
            UiEvent::DragOver { date, site_id } => {
                self.on_drag_over(date, site_id);
                None
            }
            UiEvent::Drop { date, site_id } => self.on_drop(date, site_id).await,
            UiEvent::DragEnd => {
                self.on_drag_end();
                None
            }
            UiEvent::ResizeHandleDown { key, edge, client_x } => {
                self.on_resize_handle_down(key, edge, client_x)
            }
            UiEvent::CheckInRequest { booking_id } => Some(status_outcome(
                self.request_check_in(booking_id).await.map(StayInterval::Booking),
            )),
            UiEvent::CheckOutRequest { booking_id } => Some(status_outcome(
                self.request_check_out(booking_id).await.map(StayInterval::Booking),
            )),
            UiEvent::MarkPaidRequest { reservation_id } => Some(status_outcome(
                self.mark_paid(reservation_id).await.map(StayInterval::Reservation),
            )),
        };

        if let Some(outcome) = &outcome {
            self.hub.send(outcome);
            metrics::gauge!(LEDGER_INTERVALS).set(self.ledger.len() as f64);
        }
        outcome
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Box staked out by an in-progress create drag.
    pub fn selection(&self) -> Option<&SelectionBox> {
        match &self.gesture {
            Gesture::Selecting { selection, .. } => Some(selection),
            _ => None,
        }
    }

    /// Cell a dragged stay is hovering over.
    pub fn drag_over(&self) -> Option<(NaiveDate, SiteId)> {
        match &self.gesture {
            Gesture::Moving(drag) => drag.over,
            _ => None,
        }
    }

    /// Range to draw for the stay being resized.
    pub fn resize_preview(&self) -> Option<(IntervalKey, StayRange)> {
        match &self.gesture {
            Gesture::Resizing(drag) => Some((drag.key, drag.accepted)),
            _ => None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn grid(&self) -> &GridMapper {
        &self.grid
    }

    pub fn hub(&self) -> &Arc<OutcomeHub> {
        &self.hub
    }
}

fn status_outcome(result: Result<StayInterval, SchedulingError>) -> Outcome {
    match result {
        Ok(interval) => Outcome::StatusChanged { interval },
        Err(e) => {
            info!("status change refused: {e}");
            Outcome::rejected(e)
        }
    }
}

/// Await a store call, recording its latency and result.
pub(super) async fn timed<T>(
    op: &'static str,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    let start = Instant::now();
    let result = fut.await;
    let status = match &result {
        Ok(_) => "ok",
        Err(e) => e.label(),
    };
    metrics::counter!(STORE_CALLS_TOTAL, "op" => op, "status" => status).increment(1);
    metrics::histogram!(STORE_CALL_DURATION_SECONDS, "op" => op).record(start.elapsed().as_secs_f64());
    result
}

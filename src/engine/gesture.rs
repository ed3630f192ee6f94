//! Interactive edits on the date-by-site grid.
//!
//! One gesture at a time, held as a single [`Gesture`] value:
//!
//! ```text
//! Move:    Idle -> Moving -> (drop: validate) -> commit | reject -> Idle
//! Resize:  Idle -> Resizing(edge) -> (tick, tick, ...) -> pointer-up -> Idle
//! Create:  Idle -> Armed -> Selecting -> pointer-up -> new-reservation request -> Idle
//! ```
//!
//! Every exit path lands back on `Idle`, whatever the store said.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ResizeCommit;
use crate::dates;
use crate::model::*;

use super::conflict::{check_no_conflict, validate_range};
use super::{Scheduler, SchedulingError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Move,
    Resize,
    Create,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Move => "move",
            GestureKind::Resize => "resize",
            GestureKind::Create => "create",
        }
    }
}

/// An existing stay being dragged to another cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveDrag {
    pub key: IntervalKey,
    /// Cell currently under the pointer, for drop highlighting.
    pub over: Option<(NaiveDate, SiteId)>,
}

/// An existing stay having one edge dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    pub key: IntervalKey,
    pub site_id: SiteId,
    pub edge: ResizeEdge,
    pub origin_x: f64,
    /// Range when the handle was grabbed. The edge not being dragged stays
    /// where it is here.
    pub original: StayRange,
    /// Last range that passed validation.
    pub accepted: StayRange,
    /// Last candidate evaluated, so a pointer jittering within one column
    /// doesn't repeat work or repeat a rejection.
    pub last_candidate: StayRange,
}

/// Where a create drag was pressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateAnchor {
    pub site_id: SiteId,
    pub date: NaiveDate,
    pub origin_x: f64,
}

/// The range staked out so far by a create drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub site_id: SiteId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SelectionBox {
    pub fn range(&self) -> Option<StayRange> {
        StayRange::try_new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Moving(MoveDrag),
    Resizing(ResizeDrag),
    Armed(CreateAnchor),
    Selecting {
        anchor: CreateAnchor,
        selection: SelectionBox,
    },
}

impl Gesture {
    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            Gesture::Idle => None,
            Gesture::Moving(_) => Some(GestureKind::Move),
            Gesture::Resizing(_) => Some(GestureKind::Resize),
            Gesture::Armed(_) | Gesture::Selecting { .. } => Some(GestureKind::Create),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Result of dropping a dragged stay on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Dropped back where it started.
    Unchanged,
    To { site_id: SiteId, range: StayRange },
}

/// Where a stay lands when dropped on (`target_site`, `target_date`). The
/// length always comes from the stored stay, so a move never stretches or
/// shrinks it.
pub fn plan_move(
    interval: &StayInterval,
    target_site: SiteId,
    target_date: NaiveDate,
) -> Result<MovePlan, ValidationError> {
    let original = validate_range(interval.start_date(), interval.end_date())?;
    if interval.site_id() == target_site && original.start == target_date {
        return Ok(MovePlan::Unchanged);
    }
    let range = original
        .shifted_to(target_date)
        .ok_or(ValidationError::OffCalendar(target_date))?;
    Ok(MovePlan::To {
        site_id: target_site,
        range,
    })
}

/// Range produced by moving `edge` of `original` by `days_delta`, or `None`
/// if that would leave no nights or fall off the calendar.
pub fn resize_candidate(original: &StayRange, edge: ResizeEdge, days_delta: i64) -> Option<StayRange> {
    match edge {
        ResizeEdge::Start => {
            let start = dates::checked_add_days(original.start, days_delta)?;
            StayRange::try_new(start, original.end)
        }
        ResizeEdge::End => {
            let end = dates::checked_add_days(original.end, days_delta)?;
            StayRange::try_new(original.start, end)
        }
    }
}

/// Selection for a create drag covering `days_dragged` columns from the
/// anchor. Always at least one night. `None` when the end would fall past
/// the last representable day.
pub fn selection_for(anchor: &CreateAnchor, days_dragged: i64) -> Option<SelectionBox> {
    let far = dates::checked_add_days(anchor.date, days_dragged.max(1))?;
    let range = StayRange::try_new(anchor.date, far)?;
    Some(SelectionBox {
        site_id: anchor.site_id,
        start_date: range.start,
        end_date: range.end,
    })
}

impl Scheduler {
    fn ignore_if_busy(&self, starting: GestureKind) -> bool {
        match self.gesture.kind() {
            Some(active) => {
                debug!(
                    "ignoring {} start while {} is active",
                    starting.as_str(),
                    active.as_str()
                );
                true
            }
            None => false,
        }
    }

    /// Look up a stay that a gesture wants to edit.
    fn editable(&self, key: &IntervalKey) -> Result<&StayInterval, ValidationError> {
        let interval = self
            .ledger
            .get(key)
            .ok_or(ValidationError::UnknownInterval(*key))?;
        if interval.is_immutable() {
            return Err(ValidationError::Immutable(*key));
        }
        Ok(interval)
    }

    // ── Move ─────────────────────────────────────────────────

    pub(super) fn on_drag_start(&mut self, key: IntervalKey) -> Option<Outcome> {
        if self.ignore_if_busy(GestureKind::Move) {
            return None;
        }
        if let Err(e) = self.editable(&key) {
            info!("{key}: drag refused: {e}");
            return Some(self.reject(GestureKind::Move, e.into()));
        }
        debug!("{key}: drag started");
        self.gesture = Gesture::Moving(MoveDrag { key, over: None });
        None
    }

    pub(super) fn on_drag_over(&mut self, date: NaiveDate, site_id: SiteId) {
        if let Gesture::Moving(drag) = &mut self.gesture {
            drag.over = Some((date, site_id));
        }
    }

    pub(super) fn on_drag_end(&mut self) {
        if let Gesture::Moving(drag) = &self.gesture {
            debug!("{}: drag ended without drop", drag.key);
            self.gesture = Gesture::Idle;
        }
    }

    pub(super) async fn on_drop(&mut self, date: NaiveDate, site_id: SiteId) -> Option<Outcome> {
        let Gesture::Moving(drag) = &self.gesture else {
            return None;
        };
        let key = drag.key;
        self.gesture = Gesture::Idle;
        match self.drop_interval(key, date, site_id).await {
            Ok(Some(interval)) => Some(self.committed(GestureKind::Move, interval)),
            Ok(None) => None,
            Err(e) => Some(self.reject(GestureKind::Move, e)),
        }
    }

    async fn drop_interval(
        &mut self,
        key: IntervalKey,
        date: NaiveDate,
        site_id: SiteId,
    ) -> Result<Option<StayInterval>, SchedulingError> {
        // Status may have changed while the stay was in the air.
        let interval = self.editable(&key)?;
        let (site_id, range) = match plan_move(interval, site_id, date)? {
            MovePlan::Unchanged => {
                debug!("{key}: dropped on its own cell");
                return Ok(None);
            }
            MovePlan::To { site_id, range } => (site_id, range),
        };
        self.commit_range(GestureKind::Move, key, site_id, range)
            .await
            .map(Some)
    }

    // ── Resize ───────────────────────────────────────────────

    pub(super) fn on_resize_handle_down(
        &mut self,
        key: IntervalKey,
        edge: ResizeEdge,
        client_x: f64,
    ) -> Option<Outcome> {
        if self.ignore_if_busy(GestureKind::Resize) {
            return None;
        }
        let grabbed = self
            .editable(&key)
            .and_then(|i| Ok((i.site_id(), validate_range(i.start_date(), i.end_date())?)));
        let (site_id, original) = match grabbed {
            Ok(found) => found,
            Err(e) => {
                info!("{key}: resize refused: {e}");
                return Some(self.reject(GestureKind::Resize, e.into()));
            }
        };
        debug!("{key}: resizing {edge:?} edge from {original}");
        self.gesture = Gesture::Resizing(ResizeDrag {
            key,
            site_id,
            edge,
            origin_x: client_x,
            original,
            accepted: original,
            last_candidate: original,
        });
        None
    }

    async fn on_resize_tick(&mut self, client_x: f64) -> Option<Outcome> {
        let Gesture::Resizing(drag) = &self.gesture else {
            return None;
        };
        let days_delta = self.grid.resize_days(client_x - drag.origin_x);
        // Ticks that would empty or invert the stay are dropped silently.
        let candidate = resize_candidate(&drag.original, drag.edge, days_delta)?;
        if candidate == drag.last_candidate {
            return None;
        }
        let (key, site_id) = (drag.key, drag.site_id);
        if let Gesture::Resizing(drag) = &mut self.gesture {
            drag.last_candidate = candidate;
        }

        if let Err(e) = check_no_conflict(
            GestureKind::Resize,
            site_id,
            Some(key),
            &candidate,
            self.ledger.on_site(site_id),
        ) {
            debug!("{key}: resize tick to {candidate} blocked");
            return Some(self.reject(GestureKind::Resize, e));
        }

        match self.resize_commit {
            ResizeCommit::OnRelease => {
                if let Gesture::Resizing(drag) = &mut self.gesture {
                    drag.accepted = candidate;
                }
                None
            }
            ResizeCommit::PerTick => {
                let written = self
                    .commit_range(GestureKind::Resize, key, site_id, candidate)
                    .await;
                match written {
                    Ok(interval) => {
                        if let Gesture::Resizing(drag) = &mut self.gesture {
                            drag.accepted = candidate;
                        }
                        Some(self.committed(GestureKind::Resize, interval))
                    }
                    Err(e) => Some(self.reject(GestureKind::Resize, e)),
                }
            }
        }
    }

    async fn finish_resize(&mut self, drag: ResizeDrag) -> Option<Outcome> {
        if self.resize_commit == ResizeCommit::PerTick || drag.accepted == drag.original {
            debug!("{}: resize released", drag.key);
            return None;
        }
        match self
            .commit_range(GestureKind::Resize, drag.key, drag.site_id, drag.accepted)
            .await
        {
            Ok(interval) => Some(self.committed(GestureKind::Resize, interval)),
            Err(e) => Some(self.reject(GestureKind::Resize, e)),
        }
    }

    // ── Create ───────────────────────────────────────────────

    pub(super) fn on_pointer_down(
        &mut self,
        date: NaiveDate,
        site_id: SiteId,
        client_x: f64,
        primary: bool,
    ) {
        // No pointer-down can happen mid drag-and-drop, so the DragEnd was lost.
        if let Gesture::Moving(drag) = &self.gesture {
            warn!("{}: drag abandoned without DragEnd", drag.key);
            self.gesture = Gesture::Idle;
        }
        if !primary || self.ignore_if_busy(GestureKind::Create) {
            return;
        }
        // New stays can only be started from an empty cell.
        if self.ledger.occupied(site_id, date) {
            return;
        }
        debug!("create armed at site {site_id} on {date}");
        self.gesture = Gesture::Armed(CreateAnchor {
            site_id,
            date,
            origin_x: client_x,
        });
    }

    fn on_create_drag(&mut self, site_id: SiteId, client_x: f64) {
        let anchor = match &self.gesture {
            Gesture::Armed(anchor) | Gesture::Selecting { anchor, .. } => *anchor,
            _ => return,
        };
        // The box stays on the row it was started on.
        if site_id != anchor.site_id {
            return;
        }
        let days_dragged = self.grid.create_days(client_x - anchor.origin_x);
        let Some(next) = selection_for(&anchor, days_dragged) else {
            debug!("create selection from {} runs off the calendar", anchor.date);
            return;
        };
        if let Gesture::Selecting { selection, .. } = &mut self.gesture {
            *selection = next;
        } else if days_dragged.abs() >= 1 {
            self.gesture = Gesture::Selecting {
                anchor,
                selection: next,
            };
        }
    }

    fn finish_create(&mut self, gesture: Gesture) -> Option<Outcome> {
        let Gesture::Selecting { selection, .. } = gesture else {
            return None;
        };
        let range = selection.range()?;
        info!("new reservation requested on site {} for {range}", selection.site_id);
        let outcome = Outcome::NewReservationRequested {
            request: NewReservationRequest {
                site_id: selection.site_id,
                start_date: range.start,
                end_date: range.end,
            },
        };
        self.record(GestureKind::Create, &outcome);
        Some(outcome)
    }

    // ── Shared pointer stream ────────────────────────────────

    pub(super) async fn on_pointer_move(
        &mut self,
        site_id: SiteId,
        primary_held: bool,
        client_x: f64,
    ) -> Option<Outcome> {
        let pointer_gesture = matches!(
            self.gesture,
            Gesture::Armed(_) | Gesture::Selecting { .. } | Gesture::Resizing(_)
        );
        if !primary_held && pointer_gesture {
            // Button came up somewhere we didn't hear about.
            return self.on_pointer_up().await;
        }
        match self.gesture {
            Gesture::Resizing(_) => self.on_resize_tick(client_x).await,
            Gesture::Armed(_) | Gesture::Selecting { .. } => {
                self.on_create_drag(site_id, client_x);
                None
            }
            Gesture::Idle | Gesture::Moving(_) => None,
        }
    }

    pub(super) async fn on_pointer_up(&mut self) -> Option<Outcome> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Resizing(drag) => self.finish_resize(drag).await,
            create @ (Gesture::Armed(_) | Gesture::Selecting { .. }) => self.finish_create(create),
            // A drag-and-drop ends with Drop/DragEnd, not pointer-up.
            moving @ Gesture::Moving(_) => {
                self.gesture = moving;
                None
            }
            Gesture::Idle => None,
        }
    }

    fn committed(&self, gesture: GestureKind, interval: StayInterval) -> Outcome {
        let outcome = Outcome::MutationCommitted { interval };
        self.record(gesture, &outcome);
        outcome
    }

    fn reject(&self, gesture: GestureKind, err: SchedulingError) -> Outcome {
        if matches!(err, SchedulingError::Store(_)) {
            warn!("{} failed: {err}", gesture.as_str());
        }
        let outcome = Outcome::rejected(&err);
        self.record(gesture, &outcome);
        outcome
    }

    fn record(&self, gesture: GestureKind, outcome: &Outcome) {
        metrics::counter!(
            crate::observability::GESTURES_TOTAL,
            "gesture" => gesture.as_str(),
            "outcome" => crate::observability::outcome_label(outcome)
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn stay(site_id: SiteId, start: &str, end: &str) -> StayInterval {
        StayInterval::Reservation(Reservation {
            id: 1,
            site_id,
            customer_id: None,
            start_date: d(start),
            end_date: d(end),
            created_at: Utc::now(),
            status: ReservationStatus::Pending,
            amount_owed: 0,
            amount_paid: 0,
        })
    }

    #[test]
    fn move_preserves_length() {
        let s = stay(1, "2024-03-01", "2024-03-04");
        for offset in -40..40 {
            let target = dates::add_days(d("2024-03-10"), offset);
            match plan_move(&s, 2, target).unwrap() {
                MovePlan::To { site_id, range } => {
                    assert_eq!(site_id, 2);
                    assert_eq!(range.start, target);
                    assert_eq!(range.nights(), 3);
                }
                MovePlan::Unchanged => panic!("site changed, must move"),
            }
        }
    }

    #[test]
    fn drop_on_origin_is_noop() {
        let s = stay(1, "2024-03-01", "2024-03-04");
        assert_eq!(plan_move(&s, 1, d("2024-03-01")).unwrap(), MovePlan::Unchanged);
        // same site, other day still moves
        assert!(matches!(plan_move(&s, 1, d("2024-03-02")).unwrap(), MovePlan::To { .. }));
        // same day, other site still moves
        assert!(matches!(plan_move(&s, 2, d("2024-03-01")).unwrap(), MovePlan::To { .. }));
    }

    #[test]
    fn move_of_corrupt_stay_is_validation_error() {
        let s = stay(1, "2024-03-04", "2024-03-04");
        assert!(matches!(
            plan_move(&s, 2, d("2024-03-10")),
            Err(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn resize_edges() {
        let r = StayRange::new(d("2024-03-05"), d("2024-03-08"));
        assert_eq!(
            resize_candidate(&r, ResizeEdge::End, 2),
            Some(StayRange::new(d("2024-03-05"), d("2024-03-10")))
        );
        assert_eq!(
            resize_candidate(&r, ResizeEdge::Start, -1),
            Some(StayRange::new(d("2024-03-04"), d("2024-03-08")))
        );
        assert_eq!(
            resize_candidate(&r, ResizeEdge::Start, 2),
            Some(StayRange::new(d("2024-03-07"), d("2024-03-08")))
        );
    }

    #[test]
    fn resize_never_inverts() {
        let r = StayRange::new(d("2024-03-05"), d("2024-03-08"));
        for delta in -20..20 {
            for edge in [ResizeEdge::Start, ResizeEdge::End] {
                if let Some(c) = resize_candidate(&r, edge, delta) {
                    assert!(c.start < c.end);
                }
            }
        }
        assert_eq!(resize_candidate(&r, ResizeEdge::Start, 3), None);
        assert_eq!(resize_candidate(&r, ResizeEdge::End, -3), None);
    }

    #[test]
    fn selection_grows_forward() {
        let anchor = CreateAnchor {
            site_id: 2,
            date: d("2024-04-10"),
            origin_x: 0.0,
        };
        let sel = selection_for(&anchor, 3).unwrap();
        assert_eq!((sel.start_date, sel.end_date), (d("2024-04-10"), d("2024-04-13")));
        assert_eq!(sel.site_id, 2);
    }

    #[test]
    fn backward_selection_keeps_one_night() {
        let anchor = CreateAnchor {
            site_id: 2,
            date: d("2024-04-10"),
            origin_x: 0.0,
        };
        for days in [-5, -1, 0, 1] {
            let sel = selection_for(&anchor, days).unwrap();
            assert_eq!((sel.start_date, sel.end_date), (d("2024-04-10"), d("2024-04-11")));
        }
    }

    #[test]
    fn nothing_is_built_past_the_last_day() {
        let anchor = CreateAnchor {
            site_id: 3,
            date: NaiveDate::MAX,
            origin_x: 0.0,
        };
        for days in [-3, 0, 1, 4] {
            assert_eq!(selection_for(&anchor, days), None);
        }

        let tail = StayRange::new(NaiveDate::MAX.pred_opt().unwrap(), NaiveDate::MAX);
        assert_eq!(resize_candidate(&tail, ResizeEdge::End, 1), None);
        assert_eq!(
            resize_candidate(&tail, ResizeEdge::Start, -1).map(|r| r.nights()),
            Some(2)
        );

        let s = stay(1, "2024-03-01", "2024-03-04");
        assert_eq!(
            plan_move(&s, 2, NaiveDate::MAX),
            Err(ValidationError::OffCalendar(NaiveDate::MAX))
        );
    }

    #[test]
    fn gesture_kinds() {
        assert_eq!(Gesture::Idle.kind(), None);
        let anchor = CreateAnchor {
            site_id: 1,
            date: d("2024-04-10"),
            origin_x: 0.0,
        };
        assert_eq!(Gesture::Armed(anchor).kind(), Some(GestureKind::Create));
        assert!(Gesture::default().is_idle());
    }
}

use tracing::{info, warn};

use crate::model::*;

use super::{timed, Scheduler, SchedulingError, ValidationError};

/// Refused check-in status change. `Display` is the user-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyCheckedIn,
    CheckInAfterCheckOut,
    AlreadyCheckedOut,
    NotCheckedIn,
    BackToPending,
    AlreadyPaid,
    PayCancelled,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            TransitionError::AlreadyCheckedIn => "Booking is already checked in",
            TransitionError::CheckInAfterCheckOut => "Cannot check in a checked-out booking",
            TransitionError::AlreadyCheckedOut => "Booking is already checked out",
            TransitionError::NotCheckedIn => {
                "Cannot check out a booking that has not been checked in"
            }
            TransitionError::BackToPending => "Cannot return a booking to pending",
            TransitionError::AlreadyPaid => "Reservation is already paid",
            TransitionError::PayCancelled => "Cannot mark a cancelled reservation paid",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for TransitionError {}

/// `pending -> checked_in`.
pub fn check_in(current: CheckInStatus) -> Result<CheckInStatus, TransitionError> {
    match current {
        CheckInStatus::Pending => Ok(CheckInStatus::CheckedIn),
        CheckInStatus::CheckedIn => Err(TransitionError::AlreadyCheckedIn),
        CheckInStatus::CheckedOut => Err(TransitionError::CheckInAfterCheckOut),
    }
}

/// `checked_in -> checked_out`.
pub fn check_out(current: CheckInStatus) -> Result<CheckInStatus, TransitionError> {
    match current {
        CheckInStatus::CheckedIn => Ok(CheckInStatus::CheckedOut),
        CheckInStatus::CheckedOut => Err(TransitionError::AlreadyCheckedOut),
        CheckInStatus::Pending => Err(TransitionError::NotCheckedIn),
    }
}

/// Move from `current` toward `requested`. The lifecycle is linear with no
/// skips and no way back.
pub fn transition(
    current: CheckInStatus,
    requested: CheckInStatus,
) -> Result<CheckInStatus, TransitionError> {
    match requested {
        CheckInStatus::CheckedIn => check_in(current),
        CheckInStatus::CheckedOut => check_out(current),
        CheckInStatus::Pending => Err(TransitionError::BackToPending),
    }
}

/// `pending -> confirmed`. Cancelled reservations stay cancelled.
pub fn mark_paid(current: ReservationStatus) -> Result<ReservationStatus, TransitionError> {
    match current {
        ReservationStatus::Pending => Ok(ReservationStatus::Confirmed),
        ReservationStatus::Confirmed => Err(TransitionError::AlreadyPaid),
        ReservationStatus::Cancelled => Err(TransitionError::PayCancelled),
    }
}

impl Scheduler {
    pub async fn request_check_in(&mut self, booking_id: BookingId) -> Result<Booking, SchedulingError> {
        self.change_check_in_status(booking_id, CheckInStatus::CheckedIn)
            .await
    }

    pub async fn request_check_out(&mut self, booking_id: BookingId) -> Result<Booking, SchedulingError> {
        self.change_check_in_status(booking_id, CheckInStatus::CheckedOut)
            .await
    }

    async fn change_check_in_status(
        &mut self,
        booking_id: BookingId,
        requested: CheckInStatus,
    ) -> Result<Booking, SchedulingError> {
        let key = IntervalKey::booking(booking_id);
        let current = match self.ledger.get(&key) {
            Some(StayInterval::Booking(b)) => b.check_in_status,
            _ => return Err(ValidationError::UnknownInterval(key).into()),
        };
        let next = transition(current, requested)?;

        let updated = timed(
            "set_booking_check_in_status",
            self.store.set_booking_check_in_status(booking_id, next),
        )
        .await
        .inspect_err(|e| warn!("{key}: {} -> {} failed: {e}", current.as_str(), next.as_str()))?;

        metrics::counter!(
            crate::observability::STATUS_TRANSITIONS_TOTAL,
            "transition" => next.as_str()
        )
        .increment(1);
        info!("{key}: {} -> {}", current.as_str(), next.as_str());
        self.ledger.upsert(StayInterval::Booking(updated.clone()));
        Ok(updated)
    }

    pub async fn mark_paid(&mut self, reservation_id: ReservationId) -> Result<Reservation, SchedulingError> {
        let key = IntervalKey::reservation(reservation_id);
        let current = match self.ledger.get(&key) {
            Some(StayInterval::Reservation(r)) => r.status,
            _ => return Err(ValidationError::UnknownInterval(key).into()),
        };

        let expected = mark_paid(current)?;
        let updated = timed("mark_reservation_paid", self.store.mark_reservation_paid(reservation_id))
            .await
            .inspect_err(|e| warn!("{key}: payment failed: {e}"))?;
        if updated.status != expected {
            warn!("{key}: store reports {:?} after payment", updated.status);
        }

        metrics::counter!(
            crate::observability::STATUS_TRANSITIONS_TOTAL,
            "transition" => "paid"
        )
        .increment(1);
        info!("{key}: marked paid");
        self.ledger.upsert(StayInterval::Reservation(updated.clone()));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CheckInStatus; 3] = [
        CheckInStatus::Pending,
        CheckInStatus::CheckedIn,
        CheckInStatus::CheckedOut,
    ];

    #[test]
    fn check_in_only_from_pending() {
        assert_eq!(check_in(CheckInStatus::Pending), Ok(CheckInStatus::CheckedIn));
        assert_eq!(check_in(CheckInStatus::CheckedIn), Err(TransitionError::AlreadyCheckedIn));
        assert_eq!(
            check_in(CheckInStatus::CheckedOut),
            Err(TransitionError::CheckInAfterCheckOut)
        );
    }

    #[test]
    fn check_out_only_from_checked_in() {
        assert_eq!(check_out(CheckInStatus::CheckedIn), Ok(CheckInStatus::CheckedOut));
        assert_eq!(check_out(CheckInStatus::Pending), Err(TransitionError::NotCheckedIn));
        assert_eq!(
            check_out(CheckInStatus::CheckedOut),
            Err(TransitionError::AlreadyCheckedOut)
        );
    }

    #[test]
    fn lifecycle_is_linear() {
        for from in ALL {
            let reachable: Vec<CheckInStatus> = ALL
                .into_iter()
                .filter_map(|to| transition(from, to).ok())
                .collect();
            let expected = match from {
                CheckInStatus::Pending => vec![CheckInStatus::CheckedIn],
                CheckInStatus::CheckedIn => vec![CheckInStatus::CheckedOut],
                CheckInStatus::CheckedOut => vec![],
            };
            assert_eq!(reachable, expected, "from {}", from.as_str());
        }
    }

    #[test]
    fn reasons_are_specific() {
        assert_eq!(
            TransitionError::CheckInAfterCheckOut.to_string(),
            "Cannot check in a checked-out booking"
        );
        assert_eq!(
            TransitionError::NotCheckedIn.to_string(),
            "Cannot check out a booking that has not been checked in"
        );
        assert_eq!(TransitionError::AlreadyCheckedIn.to_string(), "Booking is already checked in");
        assert_eq!(TransitionError::AlreadyCheckedOut.to_string(), "Booking is already checked out");
    }

    #[test]
    fn only_pending_reservations_can_be_paid() {
        assert_eq!(mark_paid(ReservationStatus::Pending), Ok(ReservationStatus::Confirmed));
        assert_eq!(mark_paid(ReservationStatus::Confirmed), Err(TransitionError::AlreadyPaid));
        assert_eq!(mark_paid(ReservationStatus::Cancelled), Err(TransitionError::PayCancelled));
        assert_eq!(
            TransitionError::PayCancelled.to_string(),
            "Cannot mark a cancelled reservation paid"
        );
    }
}

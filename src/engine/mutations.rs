use tracing::{info, warn};

use crate::model::*;

use super::conflict::{check_no_conflict, validate_range};
use super::gesture::GestureKind;
use super::ledger::into_intervals;
use super::{timed, Scheduler, SchedulingError, ValidationError};

impl Scheduler {
    /// Re-list `site_id` over `range` so the ledger reflects what the store
    /// has right now.
    async fn refresh_site(&mut self, site_id: SiteId, range: StayRange) -> Result<(), SchedulingError> {
        if self.ledger.site(site_id).is_none() {
            return Err(ValidationError::UnknownSite(site_id).into());
        }
        let (bookings, reservations) = timed(
            "list_intervals",
            self.store.list_intervals(Some(site_id), range),
        )
        .await?;
        self.ledger
            .replace_site_window(site_id, &range, into_intervals(bookings, reservations));
        Ok(())
    }

    /// Write a new site and range for an existing stay.
    ///
    /// Local data can be stale, so the target site is re-listed and the
    /// conflict check re-run on what comes back before anything is written.
    pub(super) async fn commit_range(
        &mut self,
        gesture: GestureKind,
        key: IntervalKey,
        site_id: SiteId,
        range: StayRange,
    ) -> Result<StayInterval, SchedulingError> {
        self.refresh_site(site_id, range).await?;

        let current = self
            .ledger
            .get(&key)
            .ok_or(ValidationError::UnknownInterval(key))?;
        if current.is_immutable() {
            return Err(ValidationError::Immutable(key).into());
        }
        check_no_conflict(gesture, site_id, Some(key), &range, self.ledger.on_site(site_id))?;

        let update = RangeUpdate::new(site_id, range);
        let updated = match key.kind {
            IntervalKind::Booking => {
                timed("update_booking", self.store.update_booking(key.id, update))
                    .await
                    .map(StayInterval::Booking)
            }
            IntervalKind::Reservation => {
                timed("update_reservation", self.store.update_reservation(key.id, update))
                    .await
                    .map(StayInterval::Reservation)
            }
        }
        .inspect_err(|e| warn!("{key}: {} to site {site_id} {range} failed: {e}", gesture.as_str()))?;

        info!("{key}: {} to site {site_id} {range}", gesture.as_str());
        self.ledger.upsert(updated.clone());
        Ok(updated)
    }

    /// Create a customer and a reservation for them in one store call.
    ///
    /// The stay is priced with [`quote`](Self::quote) and checked for
    /// conflicts against freshly listed data first. On success the new
    /// reservation is on the calendar and `MutationCommitted` is published.
    pub async fn submit_reservation(
        &mut self,
        customer: NewCustomer,
        site_id: SiteId,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
    ) -> Result<(Customer, Reservation), SchedulingError> {
        let range = validate_range(start_date, end_date)?;
        self.refresh_site(site_id, range).await?;
        check_no_conflict(GestureKind::Create, site_id, None, &range, self.ledger.on_site(site_id))?;
        let amount = self.quote(site_id, &range)?;

        let (customer, reservation) = timed(
            "create_customer_with_reservation",
            self.store.create_customer_with_reservation(
                customer,
                NewReservation {
                    site_id,
                    start_date: range.start,
                    end_date: range.end,
                    amount,
                },
            ),
        )
        .await
        .inspect_err(|e| warn!("reservation on site {site_id} {range} failed: {e}"))?;

        info!(
            "reservation {} created for customer {} on site {site_id} {range}, {amount} cents",
            reservation.id, customer.id
        );
        let interval = StayInterval::Reservation(reservation.clone());
        self.ledger.upsert(interval.clone());
        self.hub.send(&Outcome::MutationCommitted { interval });
        Ok((customer, reservation))
    }
}

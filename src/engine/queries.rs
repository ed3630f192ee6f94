use chrono::NaiveDate;

use crate::model::*;

use super::conflict;
use super::ledger::into_intervals;
use super::{timed, Scheduler, SchedulingError, ValidationError};

impl Scheduler {
    /// Sites free for the whole of `range`, listed fresh from the store.
    pub async fn available_sites(&self, range: StayRange) -> Result<Vec<Site>, SchedulingError> {
        let (bookings, reservations) =
            timed("list_intervals", self.store.list_intervals(None, range)).await?;
        let intervals: Vec<StayInterval> = into_intervals(bookings, reservations).collect();
        Ok(conflict::available_sites(self.ledger.sites(), &range, &intervals)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Nights times the site's nightly rate. Sites without a rate quote 0.
    pub fn quote(&self, site_id: SiteId, range: &StayRange) -> Result<Cents, ValidationError> {
        let site = self
            .ledger
            .site(site_id)
            .ok_or(ValidationError::UnknownSite(site_id))?;
        Ok(site.price_per_night.unwrap_or(0) * range.nights())
    }

    /// Bookings starting on `date`, by site.
    pub fn arrivals_on(&self, date: NaiveDate) -> Vec<&Booking> {
        let mut arrivals: Vec<&Booking> = self.bookings().filter(|b| b.start_date == date).collect();
        arrivals.sort_by_key(|b| (b.site_id, b.id));
        arrivals
    }

    pub fn departures_on(&self, date: NaiveDate) -> Vec<&Booking> {
        let mut departures: Vec<&Booking> = self.bookings().filter(|b| b.end_date == date).collect();
        departures.sort_by_key(|b| (b.site_id, b.id));
        departures
    }

    /// Checked-in bookings, earliest check-in first.
    pub fn current_campers(&self) -> Vec<&Booking> {
        let mut campers: Vec<&Booking> = self
            .bookings()
            .filter(|b| b.check_in_status == CheckInStatus::CheckedIn)
            .collect();
        campers.sort_by_key(|b| (b.check_in_date, b.id));
        campers
    }

    fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.ledger.intervals().filter_map(|i| match i {
            StayInterval::Booking(b) => Some(b),
            StayInterval::Reservation(_) => None,
        })
    }
}

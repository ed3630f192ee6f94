use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::engine;
use crate::model::*;

use super::{BookingStore, StoreError};

/// Initial contents for an [`InMemoryStore`], e.g. loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// Process-local store. Booking and reservation ids are independent
/// counters, exactly like two auto-increment tables.
pub struct InMemoryStore {
    sites: DashMap<SiteId, Site>,
    customers: DashMap<CustomerId, Customer>,
    bookings: DashMap<BookingId, Booking>,
    reservations: DashMap<ReservationId, Reservation>,
    next_customer_id: AtomicI64,
    next_reservation_id: AtomicI64,
    enforce_no_overlap: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sites: DashMap::new(),
            customers: DashMap::new(),
            bookings: DashMap::new(),
            reservations: DashMap::new(),
            next_customer_id: AtomicI64::new(1),
            next_reservation_id: AtomicI64::new(1),
            enforce_no_overlap: false,
        }
    }

    /// Reject writes that would overlap another stay, like a database
    /// exclusion constraint would.
    pub fn with_overlap_enforcement(mut self) -> Self {
        self.enforce_no_overlap = true;
        self
    }

    pub fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        for site in seed.sites {
            store.insert_site(site);
        }
        for customer in seed.customers {
            store.insert_customer(customer);
        }
        for booking in seed.bookings {
            store.insert_booking(booking);
        }
        for reservation in seed.reservations {
            store.insert_reservation(reservation);
        }
        store
    }

    // ── Seeding ──────────────────────────────────────────────

    pub fn insert_site(&self, site: Site) {
        self.sites.insert(site.id, site);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.next_customer_id.fetch_max(customer.id + 1, Ordering::Relaxed);
        self.customers.insert(customer.id, customer);
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    pub fn insert_reservation(&self, reservation: Reservation) {
        self.next_reservation_id
            .fetch_max(reservation.id + 1, Ordering::Relaxed);
        self.reservations.insert(reservation.id, reservation);
    }

    // ── Direct reads ─────────────────────────────────────────

    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(&id).map(|e| e.value().clone())
    }

    pub fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.reservations.get(&id).map(|e| e.value().clone())
    }

    pub fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers.get(&id).map(|e| e.value().clone())
    }

    /// Every occupying stay on `site_id` other than `exclude`.
    fn occupants(&self, site_id: SiteId, exclude: Option<IntervalKey>) -> Vec<StayInterval> {
        let bookings = self
            .bookings
            .iter()
            .filter(|e| e.site_id == site_id)
            .map(|e| StayInterval::Booking(e.value().clone()));
        let reservations = self
            .reservations
            .iter()
            .filter(|e| e.site_id == site_id)
            .map(|e| StayInterval::Reservation(e.value().clone()));
        bookings
            .chain(reservations)
            .filter(|i| Some(i.key()) != exclude && i.occupies_site())
            .collect()
    }

    fn validate_write(
        &self,
        key: Option<IntervalKey>,
        site_id: SiteId,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<(), StoreError> {
        if !self.sites.contains_key(&site_id) {
            return Err(StoreError::SiteNotFound(site_id));
        }
        if start >= end {
            return Err(StoreError::Backend(format!(
                "end_date {end} must be after start_date {start}"
            )));
        }
        if self.enforce_no_overlap {
            let candidate = StayRange::new(start, end);
            for other in self.occupants(site_id, key) {
                if other.range().is_some_and(|r| r.overlaps(&candidate)) {
                    return Err(StoreError::Conflict(other.key()));
                }
            }
        }
        Ok(())
    }
}

fn in_window(start: chrono::NaiveDate, end: chrono::NaiveDate, window: &StayRange) -> bool {
    start < window.end && window.start < end
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn list_sites(&self) -> Result<Vec<Site>, StoreError> {
        let mut sites: Vec<Site> = self.sites.iter().map(|e| e.value().clone()).collect();
        sites.sort_by_key(|s| s.id);
        Ok(sites)
    }

    async fn list_intervals(
        &self,
        site_id: Option<SiteId>,
        window: StayRange,
    ) -> Result<(Vec<Booking>, Vec<Reservation>), StoreError> {
        let on_site = |s: SiteId| site_id.is_none_or(|wanted| wanted == s);
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| on_site(e.site_id) && in_window(e.start_date, e.end_date, &window))
            .map(|e| e.value().clone())
            .collect();
        let mut reservations: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|e| on_site(e.site_id) && in_window(e.start_date, e.end_date, &window))
            .map(|e| e.value().clone())
            .collect();
        bookings.sort_by_key(|b| (b.start_date, b.id));
        reservations.sort_by_key(|r| (r.start_date, r.id));
        Ok((bookings, reservations))
    }

    async fn update_booking(&self, id: BookingId, update: RangeUpdate) -> Result<Booking, StoreError> {
        let key = IntervalKey::booking(id);
        if !self.bookings.contains_key(&id) {
            return Err(StoreError::NotFound(key));
        }
        self.validate_write(Some(key), update.site_id, update.start_date, update.end_date)?;
        let mut entry = self.bookings.get_mut(&id).ok_or(StoreError::NotFound(key))?;
        entry.site_id = update.site_id;
        entry.start_date = update.start_date;
        entry.end_date = update.end_date;
        Ok(entry.clone())
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        update: RangeUpdate,
    ) -> Result<Reservation, StoreError> {
        let key = IntervalKey::reservation(id);
        if !self.reservations.contains_key(&id) {
            return Err(StoreError::NotFound(key));
        }
        self.validate_write(Some(key), update.site_id, update.start_date, update.end_date)?;
        let mut entry = self
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::NotFound(key))?;
        entry.site_id = update.site_id;
        entry.start_date = update.start_date;
        entry.end_date = update.end_date;
        Ok(entry.clone())
    }

    async fn set_booking_check_in_status(
        &self,
        id: BookingId,
        new_status: CheckInStatus,
    ) -> Result<Booking, StoreError> {
        let mut entry = self
            .bookings
            .get_mut(&id)
            .ok_or(StoreError::NotFound(IntervalKey::booking(id)))?;
        let next = engine::transition(entry.check_in_status, new_status)
            .map_err(|e| StoreError::InvalidTransition(e.to_string()))?;
        let now = Utc::now();
        match next {
            CheckInStatus::CheckedIn => entry.check_in_date = Some(now),
            CheckInStatus::CheckedOut => entry.check_out_date = Some(now),
            CheckInStatus::Pending => {}
        }
        entry.check_in_status = next;
        Ok(entry.clone())
    }

    async fn mark_reservation_paid(&self, id: ReservationId) -> Result<Reservation, StoreError> {
        let key = IntervalKey::reservation(id);
        let current = self.reservation(id).ok_or(StoreError::NotFound(key))?;
        let next = engine::mark_paid(current.status)
            .map_err(|e| StoreError::InvalidTransition(e.to_string()))?;
        // `occupants` walks the reservation table, so no entry lock is held here.
        if self.enforce_no_overlap {
            self.validate_write(Some(key), current.site_id, current.start_date, current.end_date)?;
        }
        let mut entry = self.reservations.get_mut(&id).ok_or(StoreError::NotFound(key))?;
        entry.status = next;
        entry.amount_paid = entry.amount_owed;
        Ok(entry.clone())
    }

    async fn create_customer_with_reservation(
        &self,
        customer: NewCustomer,
        reservation: NewReservation,
    ) -> Result<(Customer, Reservation), StoreError> {
        self.validate_write(
            None,
            reservation.site_id,
            reservation.start_date,
            reservation.end_date,
        )?;
        if reservation.amount < 0 {
            return Err(StoreError::Backend("amount must not be negative".into()));
        }

        let customer = Customer {
            id: self.next_customer_id.fetch_add(1, Ordering::Relaxed),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
        };
        let created = Reservation {
            id: self.next_reservation_id.fetch_add(1, Ordering::Relaxed),
            site_id: reservation.site_id,
            customer_id: Some(customer.id),
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            created_at: Utc::now(),
            status: ReservationStatus::Pending,
            amount_owed: reservation.amount,
            amount_paid: 0,
        };
        self.customers.insert(customer.id, customer.clone());
        self.reservations.insert(created.id, created.clone());
        Ok((customer, created))
    }
}

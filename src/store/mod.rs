mod memory;

pub use memory::{InMemoryStore, Seed};

use std::fmt;

use async_trait::async_trait;

use crate::model::*;

/// Failure reported by the backing store. `Display` is shown to the user
/// verbatim, so messages are written for people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(IntervalKey),
    SiteNotFound(SiteId),
    /// The store refused a check-in status change.
    InvalidTransition(String),
    /// The store enforces the no-overlap rule itself and found a clash.
    Conflict(IntervalKey),
    /// Network, server validation, anything else.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(key) => write!(f, "{key} not found"),
            StoreError::SiteNotFound(id) => write!(f, "site {id} not found"),
            StoreError::InvalidTransition(msg) => write!(f, "{msg}"),
            StoreError::Conflict(key) => {
                write!(f, "This time slot is already booked (overlaps {key})")
            }
            StoreError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) | StoreError::SiteNotFound(_) => "not_found",
            StoreError::InvalidTransition(_) => "invalid_transition",
            StoreError::Conflict(_) => "conflict",
            StoreError::Backend(_) => "backend",
        }
    }
}

/// Everything the scheduler needs from persistence.
///
/// Implementations decide whether they enforce the no-overlap rule
/// server-side. The scheduler always checks locally first, but two clients
/// can still race between that check and the write.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Bookings and reservations whose stay overlaps `window`, optionally
    /// restricted to one site.
    async fn list_intervals(
        &self,
        site_id: Option<SiteId>,
        window: StayRange,
    ) -> Result<(Vec<Booking>, Vec<Reservation>), StoreError>;

    async fn update_booking(&self, id: BookingId, update: RangeUpdate) -> Result<Booking, StoreError>;

    async fn update_reservation(
        &self,
        id: ReservationId,
        update: RangeUpdate,
    ) -> Result<Reservation, StoreError>;

    /// Records the new status and stamps the matching check-in/out time.
    async fn set_booking_check_in_status(
        &self,
        id: BookingId,
        status: CheckInStatus,
    ) -> Result<Booking, StoreError>;

    async fn mark_reservation_paid(&self, id: ReservationId) -> Result<Reservation, StoreError>;

    async fn create_customer_with_reservation(
        &self,
        customer: NewCustomer,
        reservation: NewReservation,
    ) -> Result<(Customer, Reservation), StoreError>;
}

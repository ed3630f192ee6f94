use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates;

pub type SiteId = i64;
pub type BookingId = i64;
pub type ReservationId = i64;
pub type CustomerId = i64;

/// Whole cents. Rates and amounts never go through floating point.
pub type Cents = i64;

/// Half-open stay `[start, end)` in calendar days. `end` is the checkout day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start < end, "StayRange start must be before end");
        Self { start, end }
    }

    /// Checked constructor for ranges coming from outside the engine.
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Range covering both dates in whichever order they arrive.
    /// Returns `None` when the dates are equal.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Option<Self> {
        Self::try_new(a.min(b), a.max(b))
    }

    pub fn nights(&self) -> i64 {
        dates::days_between(self.start, self.end)
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        dates::overlaps(self.start, self.end, other.start, other.end)
    }

    /// True if the camper is on site the night of `day`.
    pub fn occupies(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Same length, starting on `start`. `None` if the end would fall off
    /// the calendar.
    pub fn shifted_to(&self, start: NaiveDate) -> Option<Self> {
        let end = dates::checked_add_days(start, self.nights())?;
        Self::try_new(start, end)
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Tent,
    Rv,
    MobileHome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub kind: Option<SiteKind>,
    /// Nightly rate; sites without one quote at zero.
    #[serde(default)]
    pub price_per_night: Option<Cents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Pending,
    CheckedIn,
    CheckedOut,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Pending => "pending",
            CheckInStatus::CheckedIn => "checked_in",
            CheckInStatus::CheckedOut => "checked_out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub site_id: SiteId,
    pub customer_id: Option<CustomerId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub check_in_status: CheckInStatus,
    #[serde(default)]
    pub check_in_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount: Option<Cents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub site_id: SiteId,
    pub customer_id: Option<CustomerId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub amount_owed: Cents,
    #[serde(default)]
    pub amount_paid: Cents,
}

/// Which id-space an interval id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Booking,
    Reservation,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Booking => "booking",
            IntervalKind::Reservation => "reservation",
        }
    }
}

/// Identity of an interval across both id-spaces. Booking #7 and
/// Reservation #7 are different keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalKey {
    pub kind: IntervalKind,
    pub id: i64,
}

impl IntervalKey {
    pub fn booking(id: BookingId) -> Self {
        Self { kind: IntervalKind::Booking, id }
    }

    pub fn reservation(id: ReservationId) -> Self {
        Self { kind: IntervalKind::Reservation, id }
    }
}

impl fmt::Display for IntervalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.id)
    }
}

/// Anything that occupies a site for a range of nights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StayInterval {
    Booking(Booking),
    Reservation(Reservation),
}

impl StayInterval {
    pub fn key(&self) -> IntervalKey {
        match self {
            StayInterval::Booking(b) => IntervalKey::booking(b.id),
            StayInterval::Reservation(r) => IntervalKey::reservation(r.id),
        }
    }

    pub fn site_id(&self) -> SiteId {
        match self {
            StayInterval::Booking(b) => b.site_id,
            StayInterval::Reservation(r) => r.site_id,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        match self {
            StayInterval::Booking(b) => b.start_date,
            StayInterval::Reservation(r) => r.start_date,
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        match self {
            StayInterval::Booking(b) => b.end_date,
            StayInterval::Reservation(r) => r.end_date,
        }
    }

    /// Stored dates as a range. `None` if the store handed us an inverted
    /// or empty stay.
    pub fn range(&self) -> Option<StayRange> {
        StayRange::try_new(self.start_date(), self.end_date())
    }

    /// Checked-out bookings can no longer be moved or resized.
    pub fn is_immutable(&self) -> bool {
        matches!(
            self,
            StayInterval::Booking(Booking {
                check_in_status: CheckInStatus::CheckedOut,
                ..
            })
        )
    }

    /// Cancelled reservations stay on record but free the site.
    pub fn occupies_site(&self) -> bool {
        !matches!(
            self,
            StayInterval::Reservation(Reservation {
                status: ReservationStatus::Cancelled,
                ..
            })
        )
    }
}

impl From<Booking> for StayInterval {
    fn from(b: Booking) -> Self {
        StayInterval::Booking(b)
    }
}

impl From<Reservation> for StayInterval {
    fn from(r: Reservation) -> Self {
        StayInterval::Reservation(r)
    }
}

/// Payload of the store's update calls. Identical shape for both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeUpdate {
    pub site_id: SiteId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RangeUpdate {
    pub fn new(site_id: SiteId, range: StayRange) -> Self {
        Self {
            site_id,
            start_date: range.start,
            end_date: range.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub site_id: SiteId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: Cents,
}

// ── UI boundary ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeEdge {
    Start,
    End,
}

/// Pointer and request events the host UI feeds to the scheduler.
/// Dates and sites identify the grid cell under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    PointerDown {
        date: NaiveDate,
        site_id: SiteId,
        client_x: f64,
        #[serde(default = "primary_default")]
        primary: bool,
    },
    PointerMove {
        date: NaiveDate,
        site_id: SiteId,
        primary_held: bool,
        client_x: f64,
    },
    /// Must arrive even when the pointer is released outside the grid.
    PointerUp,
    DragStart {
        key: IntervalKey,
    },
    DragOver {
        date: NaiveDate,
        site_id: SiteId,
    },
    Drop {
        date: NaiveDate,
        site_id: SiteId,
    },
    /// Drag finished without a drop on the grid. If it never arrives, the
    /// next `PointerDown` abandons the drag.
    DragEnd,
    ResizeHandleDown {
        key: IntervalKey,
        edge: ResizeEdge,
        client_x: f64,
    },
    CheckInRequest {
        booking_id: BookingId,
    },
    CheckOutRequest {
        booking_id: BookingId,
    },
    MarkPaidRequest {
        reservation_id: ReservationId,
    },
}

fn primary_default() -> bool {
    true
}

/// What a finished create drag asks the reservation form to open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservationRequest {
    pub site_id: SiteId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Results the scheduler reports back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    MutationCommitted { interval: StayInterval },
    /// `reason` is displayed as-is.
    MutationRejected { reason: String },
    NewReservationRequested { request: NewReservationRequest },
    StatusChanged { interval: StayInterval },
}

impl Outcome {
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Outcome::MutationRejected {
            reason: reason.to_string(),
        }
    }

    /// Site the outcome concerns, if any.
    pub fn site_id(&self) -> Option<SiteId> {
        match self {
            Outcome::MutationCommitted { interval } | Outcome::StatusChanged { interval } => {
                Some(interval.site_id())
            }
            Outcome::NewReservationRequested { request } => Some(request.site_id),
            Outcome::MutationRejected { .. } => None,
        }
    }
}

use chrono::NaiveDate;

use crate::model::{IntervalKey, SiteId};
use crate::store::StoreError;

use super::gesture::GestureKind;
use super::status::TransitionError;

/// Problems caught locally, before anything is sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// A stay starting on this date would end past the last representable day.
    OffCalendar(NaiveDate),
    Immutable(IntervalKey),
    Transition(TransitionError),
    UnknownInterval(IntervalKey),
    UnknownSite(SiteId),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidRange { start, end } => {
                write!(f, "Invalid dates: end date {end} must be after start date {start}")
            }
            ValidationError::OffCalendar(date) => {
                write!(f, "Invalid dates: a stay from {date} would run past the end of the calendar")
            }
            ValidationError::Immutable(_) => write!(f, "Cannot modify a checked out booking"),
            ValidationError::Transition(e) => write!(f, "{e}"),
            ValidationError::UnknownInterval(key) => write!(f, "Cannot find {key} on the calendar"),
            ValidationError::UnknownSite(id) => write!(f, "Site {id} does not exist"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    Validation(ValidationError),
    /// The candidate range overlaps `with` on the target site.
    Conflict { gesture: GestureKind, with: IntervalKey },
    Store(StoreError),
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::Validation(e) => write!(f, "{e}"),
            SchedulingError::Conflict { gesture, .. } => match gesture {
                GestureKind::Move => write!(f, "Cannot move: This time slot is already booked"),
                GestureKind::Resize => {
                    write!(f, "Cannot resize: This would overlap with another booking")
                }
                GestureKind::Create => {
                    write!(f, "Cannot reserve: This time slot is already booked")
                }
            },
            SchedulingError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SchedulingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulingError::Validation(e) => Some(e),
            SchedulingError::Store(e) => Some(e),
            SchedulingError::Conflict { .. } => None,
        }
    }
}

impl SchedulingError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SchedulingError::Validation(_) => "validation",
            SchedulingError::Conflict { .. } => "conflict",
            SchedulingError::Store(_) => "store",
        }
    }
}

impl From<ValidationError> for SchedulingError {
    fn from(e: ValidationError) -> Self {
        SchedulingError::Validation(e)
    }
}

impl From<TransitionError> for SchedulingError {
    fn from(e: TransitionError) -> Self {
        SchedulingError::Validation(ValidationError::Transition(e))
    }
}

impl From<StoreError> for SchedulingError {
    fn from(e: StoreError) -> Self {
        SchedulingError::Store(e)
    }
}

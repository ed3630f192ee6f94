use chrono::NaiveDate;

use crate::dates;
use crate::model::*;

use super::gesture::GestureKind;
use super::{SchedulingError, ValidationError};

pub(crate) fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<StayRange, ValidationError> {
    StayRange::try_new(start, end).ok_or(ValidationError::InvalidRange { start, end })
}

/// First interval on `site_id` that a stay over `candidate` would collide
/// with. `exclude` is the interval being edited, compared by composite key.
/// Cancelled reservations never collide.
pub fn find_conflict<'a>(
    site_id: SiteId,
    exclude: Option<IntervalKey>,
    candidate: &StayRange,
    intervals: impl IntoIterator<Item = &'a StayInterval>,
) -> Option<IntervalKey> {
    intervals
        .into_iter()
        .filter(|i| i.site_id() == site_id)
        .filter(|i| Some(i.key()) != exclude)
        .filter(|i| i.occupies_site())
        .find(|i| dates::overlaps(candidate.start, candidate.end, i.start_date(), i.end_date()))
        .map(StayInterval::key)
}

pub fn check_conflict<'a>(
    site_id: SiteId,
    exclude: Option<IntervalKey>,
    candidate: &StayRange,
    intervals: impl IntoIterator<Item = &'a StayInterval>,
) -> bool {
    find_conflict(site_id, exclude, candidate, intervals).is_some()
}

pub(crate) fn check_no_conflict<'a>(
    gesture: GestureKind,
    site_id: SiteId,
    exclude: Option<IntervalKey>,
    candidate: &StayRange,
    intervals: impl IntoIterator<Item = &'a StayInterval>,
) -> Result<(), SchedulingError> {
    match find_conflict(site_id, exclude, candidate, intervals) {
        Some(with) => Err(SchedulingError::Conflict { gesture, with }),
        None => Ok(()),
    }
}

/// A site is free for `range` when nothing on it collides anywhere in the
/// range.
pub fn is_site_available<'a>(
    site_id: SiteId,
    range: &StayRange,
    intervals: impl IntoIterator<Item = &'a StayInterval>,
) -> bool {
    !check_conflict(site_id, None, range, intervals)
}

/// Sites that can take a new stay over `range`, in input order.
pub fn available_sites<'s>(
    sites: &'s [Site],
    range: &StayRange,
    intervals: &[StayInterval],
) -> Vec<&'s Site> {
    sites
        .iter()
        .filter(|site| is_site_available(site.id, range, intervals))
        .collect()
}

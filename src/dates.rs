//! Calendar-day arithmetic. Dates carry no time or zone, so nothing here can
//! drift across a DST boundary.

use chrono::{Days, NaiveDate};

/// Whole days from `a` to `b` (`b - a`). Negative when `b` is earlier.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// `date` shifted by `days`, which may be negative. `None` past the ends of
/// chrono's representable range.
pub fn checked_add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Like [`checked_add_days`], saturating at the ends of the calendar. Only
/// for display and iteration; never build a stay from the result.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    checked_add_days(date, days).unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Whether `[start1, end1)` and `[start2, end2)` share a night.
///
/// Touching ranges never overlap: a checkout on day E and a check-in on day E
/// can share a site.
pub fn overlaps(start1: NaiveDate, end1: NaiveDate, start2: NaiveDate, end2: NaiveDate) -> bool {
    if end1 == start2 || end2 == start1 {
        return false;
    }
    start1 < end2 && start2 < end1
}

/// Rendered width of a stay of `nights` nights, minus the seam between
/// adjacent cells. Can go negative for zero-night input; callers clamp.
pub fn width_for_duration(nights: i64, day_column_width: f64, gutter: f64) -> f64 {
    nights as f64 * day_column_width - gutter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d("2024-03-01"), d("2024-03-03")), 2);
        assert_eq!(days_between(d("2024-03-03"), d("2024-03-01")), -2);
        assert_eq!(days_between(d("2024-02-28"), d("2024-03-01")), 2); // leap year
        assert_eq!(days_between(d("2024-03-01"), d("2024-03-01")), 0);
    }

    #[test]
    fn add_days_both_directions() {
        assert_eq!(add_days(d("2024-12-30"), 3), d("2025-01-02"));
        assert_eq!(add_days(d("2024-03-01"), -1), d("2024-02-29"));
        assert_eq!(add_days(d("2024-03-01"), 0), d("2024-03-01"));
    }

    #[test]
    fn add_days_saturates() {
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
    }

    #[test]
    fn checked_add_days_stops_at_calendar_ends() {
        assert_eq!(checked_add_days(NaiveDate::MAX, 1), None);
        assert_eq!(checked_add_days(NaiveDate::MIN, -1), None);
        assert_eq!(checked_add_days(NaiveDate::MAX, 0), Some(NaiveDate::MAX));
        assert_eq!(checked_add_days(d("2024-02-28"), 1), Some(d("2024-02-29")));
    }

    #[test]
    fn partial_overlap() {
        assert!(overlaps(d("2024-03-01"), d("2024-03-03"), d("2024-03-02"), d("2024-03-04")));
    }

    #[test]
    fn containment_overlaps() {
        assert!(overlaps(d("2024-03-01"), d("2024-03-10"), d("2024-03-04"), d("2024-03-05")));
        assert!(overlaps(d("2024-03-04"), d("2024-03-05"), d("2024-03-01"), d("2024-03-10")));
    }

    #[test]
    fn identical_ranges_overlap() {
        assert!(overlaps(d("2024-03-01"), d("2024-03-02"), d("2024-03-01"), d("2024-03-02")));
    }

    #[test]
    fn same_day_turnover_is_not_overlap() {
        let end = d("2024-03-03");
        for k in 1..=10 {
            let later = add_days(end, k);
            assert!(!overlaps(d("2024-03-01"), end, end, later));
            assert!(!overlaps(end, later, d("2024-03-01"), end));
        }
    }

    #[test]
    fn disjoint_ranges() {
        assert!(!overlaps(d("2024-03-01"), d("2024-03-02"), d("2024-03-05"), d("2024-03-07")));
    }

    #[test]
    fn overlap_is_symmetric() {
        let base = d("2024-03-01");
        let days: Vec<NaiveDate> = (0..6).map(|i| add_days(base, i)).collect();
        for &s1 in &days {
            for &e1 in days.iter().filter(|e| **e > s1) {
                for &s2 in &days {
                    for &e2 in days.iter().filter(|e| **e > s2) {
                        assert_eq!(
                            overlaps(s1, e1, s2, e2),
                            overlaps(s2, e2, s1, e1),
                            "[{s1},{e1}) vs [{s2},{e2})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn width_subtracts_gutter() {
        assert_eq!(width_for_duration(2, 120.0, 5.0), 235.0);
        assert_eq!(width_for_duration(0, 120.0, 5.0), -5.0);
    }
}

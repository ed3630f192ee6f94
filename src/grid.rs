use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::dates;
use crate::model::StayRange;

/// Horizontal placement of a stay on the grid, relative to the first
/// visible day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub left_px: f64,
    pub width_px: f64,
}

/// Converts between pointer pixels and day columns.
///
/// Two different snaps are in play on purpose:
/// - move and resize deltas use [`resize_days`](Self::resize_days), a
///   symmetric round-to-nearest, so an edge lands on whichever column
///   boundary is closer;
/// - a create drag uses [`create_days`](Self::create_days), `floor + 1`, so
///   the selection grows by a night as soon as the pointer enters the next
///   column and a motionless press already means one night.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    day_column_width: f64,
    gutter: f64,
    start_offset: f64,
}

impl GridMapper {
    pub fn new(day_column_width: f64, gutter: f64, start_offset: f64) -> Self {
        debug_assert!(day_column_width > 0.0);
        Self {
            day_column_width,
            gutter,
            start_offset,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.day_column_width, config.gutter_px, config.start_offset)
    }

    pub fn day_column_width(&self) -> f64 {
        self.day_column_width
    }

    /// Days for a move/resize pointer delta. Halves round up, matching the
    /// browser's `Math.round`, so -180px at 120px/day is -1 not -2.
    pub fn resize_days(&self, delta_x: f64) -> i64 {
        (delta_x / self.day_column_width + 0.5).floor() as i64
    }

    /// Nights covered by a create drag of `delta_x` pixels from the press.
    pub fn create_days(&self, delta_x: f64) -> i64 {
        (delta_x / self.day_column_width).floor() as i64 + 1
    }

    /// Drawn width of `nights` nights, never negative.
    pub fn day_to_pixel_width(&self, nights: i64) -> f64 {
        dates::width_for_duration(nights, self.day_column_width, self.gutter).max(0.0)
    }

    /// Where a stay is drawn when the grid's first column is `view_start`.
    pub fn cell_geometry(&self, range: &StayRange, view_start: NaiveDate) -> CellGeometry {
        let column = dates::days_between(view_start, range.start) as f64;
        CellGeometry {
            left_px: (column + self.start_offset) * self.day_column_width,
            width_px: self.day_to_pixel_width(range.nights()),
        }
    }
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

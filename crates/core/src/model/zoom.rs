use serde::{Deserialize, Serialize};

use super::config::ViewContext;
use super::item::{TimelineItem, Year};

const ZOOM_IN_FACTOR: f64 = 0.7;
const ZOOM_OUT_FACTOR: f64 = 1.43;
const PAN_FRACTION: f64 = 0.2;
const MIN_RANGE: Year = 10;

/// The visible year window and its navigation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    pub start_year: Year,
    pub end_year: Year,
    pub min_year: Year,
    pub max_year: Year,
    pub zoom_level: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            start_year: 1800,
            end_year: 2000,
            min_year: -3000,
            max_year: 2100,
            zoom_level: 1.0,
        }
    }
}

impl ZoomState {
    pub fn new(start_year: Year, end_year: Year) -> Self {
        Self {
            start_year,
            end_year,
            ..Self::default()
        }
    }

    /// A window that shows every visible item with a little margin.
    pub fn fit(items: &[TimelineItem], current_year: Year) -> Self {
        let spans = items
            .iter()
            .filter(|i| !i.hidden)
            .map(|i| i.time_span(current_year));
        let (mut lo, mut hi) = (Year::MAX, Year::MIN);
        for (start, end) in spans {
            lo = lo.min(start.min(end));
            hi = hi.max(start.max(end));
        }
        if lo > hi {
            return Self::default();
        }
        let margin = ((hi - lo) / 20).max(5);
        let base = Self::default();
        Self::new(
            (lo - margin).max(base.min_year),
            (hi + margin).min(base.max_year),
        )
    }

    pub fn range(&self) -> Year {
        self.end_year - self.start_year
    }

    fn center(&self) -> f64 {
        f64::from(self.start_year + self.end_year) / 2.0
    }

    /// Narrow the window to 70% around its center.
    pub fn zoom_in(&mut self) {
        let new_range = f64::from(self.range()) * ZOOM_IN_FACTOR;
        if new_range < f64::from(MIN_RANGE) {
            return;
        }
        let center = self.center();
        self.start_year = (center - new_range / 2.0).floor() as Year;
        self.end_year = (center + new_range / 2.0).ceil() as Year;
        self.zoom_level *= 1.43;
    }

    /// Widen the window by 43% around its center, clamped to the bounds.
    pub fn zoom_out(&mut self) {
        let new_range = f64::from(self.range()) * ZOOM_OUT_FACTOR;
        let center = self.center();
        self.start_year = ((center - new_range / 2.0).floor() as Year).max(self.min_year);
        self.end_year = ((center + new_range / 2.0).ceil() as Year).min(self.max_year);
        self.zoom_level *= 0.7;
    }

    /// Shift 20% of the range into the past. Refused past `min_year`.
    pub fn pan_left(&mut self) {
        let shift = self.pan_shift();
        if self.start_year - shift >= self.min_year {
            self.start_year -= shift;
            self.end_year -= shift;
        }
    }

    /// Shift 20% of the range into the future. Refused past `max_year`.
    pub fn pan_right(&mut self) {
        let shift = self.pan_shift();
        if self.end_year + shift <= self.max_year {
            self.start_year += shift;
            self.end_year += shift;
        }
    }

    fn pan_shift(&self) -> Year {
        (f64::from(self.range()) * PAN_FRACTION).floor() as Year
    }

    pub fn set_range(&mut self, start_year: Year, end_year: Year) {
        self.start_year = start_year;
        self.end_year = end_year;
    }

    /// The view context for a plot area `viewport_width_px` wide.
    pub fn view_context(&self, viewport_width_px: f64) -> ViewContext {
        ViewContext::new(viewport_width_px, f64::from(self.range()))
    }
}

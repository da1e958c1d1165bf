use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::item::Year;

/// Tuning values for layout and drag resolution.
///
/// These are empirical UI values, not derived constraints; every field can
/// be overridden from a JSON file or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between two rows, in layout pixels.
    pub row_spacing_px: f64,
    /// How many rows up and down a displaced item may search for a free slot.
    pub max_search_steps: u32,
    /// Estimated glyph width of the label font.
    pub char_width_px: f64,
    /// Horizontal padding added around every label.
    pub label_padding_px: f64,
    /// Labels are only drawn (and only widen items) at or below this year range.
    pub label_year_range_threshold: f64,
    /// Space between the top of a lane and its first row.
    pub lane_header_px: f64,
    /// Space added below the last row of a lane.
    pub lane_margin_px: f64,
    /// Pointer travel below which a drag counts as a click.
    pub click_distance_px: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_spacing_px: 35.0,
            max_search_steps: 30,
            char_width_px: 7.0,
            label_padding_px: 16.0,
            label_year_range_threshold: 1000.0,
            lane_header_px: 40.0,
            lane_margin_px: 100.0,
            click_distance_px: 3.0,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their
    /// defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Per-pass view parameters supplied by the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewContext {
    /// Width of the plot area in pixels. Zero disables label padding.
    pub viewport_width_px: f64,
    /// Number of years visible across the plot area. Zero disables label
    /// padding.
    pub year_range: f64,
    /// Year that closes the interval of a living person.
    pub current_year: Year,
}

impl ViewContext {
    pub fn new(viewport_width_px: f64, year_range: f64) -> Self {
        Self {
            viewport_width_px,
            year_range,
            current_year: current_year(),
        }
    }

    /// A context without viewport information: raw time ranges only.
    pub fn unscaled(current_year: Year) -> Self {
        Self {
            viewport_width_px: 0.0,
            year_range: 0.0,
            current_year,
        }
    }

    pub fn with_current_year(mut self, current_year: Year) -> Self {
        self.current_year = current_year;
        self
    }

    /// Whether labels are drawn at this zoom, and so must be accounted for.
    pub fn labels_visible(&self, config: &LayoutConfig) -> bool {
        self.viewport_width_px > 0.0
            && self.year_range > 0.0
            && self.year_range <= config.label_year_range_threshold
    }

    /// Years covered by one pixel.
    pub fn years_per_px(&self) -> f64 {
        if self.viewport_width_px > 0.0 {
            self.year_range / self.viewport_width_px
        } else {
            0.0
        }
    }
}

/// The current calendar year from the local clock.
pub fn current_year() -> Year {
    chrono::Local::now().year()
}

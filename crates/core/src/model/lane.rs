use chronolane_protocol::Color;
use serde::{Deserialize, Serialize};

/// A lane is the vertical region dedicated to one category: a stack of
/// packed rows below a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub category_id: String,
    pub name: String,
    /// Category color, if the stored one parses.
    pub color: Option<Color>,
    /// Top of the lane in layout pixels: the summed height of all lanes
    /// above it.
    pub base_y: f64,
    /// Highest packed row used by any item in the lane.
    pub max_row: u32,
    /// Height in layout pixels, margin included.
    pub height: f64,
    /// Visible items in this lane, in input order.
    pub item_ids: Vec<String>,
}

impl Lane {
    /// Y of row 0 in layout pixels.
    pub fn origin_y(&self, lane_header_px: f64) -> f64 {
        self.base_y + lane_header_px
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.base_y && y < self.base_y + self.height
    }
}

use serde::{Deserialize, Serialize};

/// A closed interval of (possibly fractional) years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: f64,
    pub end: f64,
}

impl YearRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn overlaps(&self, other: &YearRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

/// Closed-interval overlap: touching boundary years count as overlapping.
///
/// Inverted intervals (`end < start`) are not corrected.
pub fn overlaps(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    !(a_end < b_start || a_start > b_end)
}

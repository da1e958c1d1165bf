use chronolane_protocol::{EventRecord, PersonRecord, Position};
use serde::{Deserialize, Serialize};

/// A calendar year. Negative values are BCE.
pub type Year = i32;

/// Lane that every event without an explicit category is drawn in.
pub const EVENTS_CATEGORY: &str = "events";

/// Lane id for a person with no categories. No category uses it by default,
/// so such persons are laid out nowhere until one is defined.
pub const UNCATEGORIZED: &str = "uncategorized";

/// What a timeline item is, with the fields that decide its time interval.
///
/// An open end means different things per kind: a person without a death
/// year is alive (the interval runs to the current year), an event without
/// an end year is a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Person { birth: Year, death: Option<Year> },
    Event { start_year: Year, end_year: Option<Year> },
}

impl ItemKind {
    pub fn start(&self) -> Year {
        match *self {
            Self::Person { birth, .. } => birth,
            Self::Event { start_year, .. } => start_year,
        }
    }

    /// Closed `[start, end]` interval with the open end resolved.
    ///
    /// `current_year` is read at evaluation time, not when the item was
    /// created, so a living person's bar grows as the clock advances.
    pub fn resolve(&self, current_year: Year) -> (Year, Year) {
        match *self {
            Self::Person { birth, death } => (birth, death.unwrap_or(current_year)),
            Self::Event {
                start_year,
                end_year,
            } => (start_year, end_year.unwrap_or(start_year)),
        }
    }

    /// Events drawn as a dot rather than a bar.
    pub fn is_single_year(&self) -> bool {
        match *self {
            Self::Person { .. } => false,
            Self::Event {
                start_year,
                end_year,
            } => end_year.is_none_or(|end| end == start_year),
        }
    }

    pub fn is_person(&self) -> bool {
        matches!(self, Self::Person { .. })
    }
}

/// A person or event as seen by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    pub kind: ItemKind,
    pub label: String,
    pub short_label: Option<String>,
    /// The single lane this item is laid out in.
    pub category_id: String,
    /// Packed row within the lane; `None` until a packing pass assigns one.
    pub row: Option<u32>,
    /// Packing leaves the row of a manually placed item alone.
    pub manually_placed: bool,
    /// Drag resolution never moves a pinned item.
    pub pinned: bool,
    /// Hidden items take no part in layout or rendering.
    pub hidden: bool,
    /// Accumulated manual adjustment, in rows, on top of `row`.
    pub drag_offset_rows: i32,
}

impl TimelineItem {
    fn new(id: impl Into<String>, kind: ItemKind) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            short_label: None,
            category_id: String::new(),
            row: None,
            manually_placed: false,
            pinned: false,
            hidden: false,
            drag_offset_rows: 0,
        }
    }

    pub fn person(id: impl Into<String>, birth: Year, death: Option<Year>) -> Self {
        Self::new(id, ItemKind::Person { birth, death })
    }

    pub fn event(id: impl Into<String>, start_year: Year, end_year: Option<Year>) -> Self {
        Self::new(
            id,
            ItemKind::Event {
                start_year,
                end_year,
            },
        )
        .in_category(EVENTS_CATEGORY)
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = category_id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_short_label(mut self, short_label: impl Into<String>) -> Self {
        self.short_label = Some(short_label.into());
        self
    }

    /// Mark as manually placed at `row`.
    pub fn placed_at(mut self, row: u32) -> Self {
        self.row = Some(row);
        self.manually_placed = true;
        self
    }

    pub fn with_row(mut self, row: u32) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_drag_offset(mut self, rows: i32) -> Self {
        self.drag_offset_rows = rows;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Build from a stored person. Returns `None` when the birth year is
    /// missing, since there is nothing to place.
    pub fn from_person(record: &PersonRecord, row_spacing_px: f64) -> Option<Self> {
        let birth = record.birth?;
        let category = record
            .categories
            .first()
            .map_or(UNCATEGORIZED, String::as_str);
        let mut item = Self::person(record.id.clone(), birth, record.death)
            .with_label(record.name.clone())
            .in_category(category);
        item.short_label = record.short_name.clone();
        item.apply_position(record.position.as_ref(), row_spacing_px);
        item.hidden = record.visibility.is_some_and(|v| v.is_hidden);
        Some(item)
    }

    /// Build from a stored event. Returns `None` when the start year is
    /// missing.
    pub fn from_event(record: &EventRecord, row_spacing_px: f64) -> Option<Self> {
        let start = record.start_year?;
        let mut item = Self::event(record.id.clone(), start, record.end_year)
            .with_label(record.name.clone());
        if let Some(category) = &record.category {
            item.category_id.clone_from(category);
        }
        item.short_label = record.short_name.clone();
        item.apply_position(record.position.as_ref(), row_spacing_px);
        item.hidden = record.visibility.is_some_and(|v| v.is_hidden);
        Some(item)
    }

    fn apply_position(&mut self, position: Option<&Position>, row_spacing_px: f64) {
        let Some(position) = position else {
            return;
        };
        self.row = position.y.and_then(|y| y_to_row(y, row_spacing_px));
        self.manually_placed = position.is_manually_placed;
        self.pinned = position.is_pinned;
        self.drag_offset_rows = position.drag_offset_rows;
    }

    /// Text used for label width estimation.
    pub fn display_label(&self) -> &str {
        self.short_label
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.label)
    }

    /// Row the item currently appears in, drag offset included.
    pub fn effective_row(&self) -> i64 {
        i64::from(self.row.unwrap_or(0)) + i64::from(self.drag_offset_rows)
    }

    pub fn time_span(&self, current_year: Year) -> (Year, Year) {
        self.kind.resolve(current_year)
    }
}

/// Convert a stored `position.y` (layout pixels) into a row index.
pub fn y_to_row(y: f64, row_spacing_px: f64) -> Option<u32> {
    if !y.is_finite() || y < 0.0 || row_spacing_px <= 0.0 {
        return None;
    }
    Some((y / row_spacing_px).round() as u32)
}

pub fn row_to_y(row: u32, row_spacing_px: f64) -> f64 {
    f64::from(row) * row_spacing_px
}

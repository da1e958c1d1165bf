pub mod import;

use std::collections::BTreeMap;

use chronolane_protocol::{
    Category, EventRecord, Metadata, PersonRecord, Position, TimelineDocument, Visibility,
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::{
    DragCommit, DragSession, TimelineLayout, capture_snapshot, compact, layout_lanes,
};
use crate::model::item::row_to_y;
use crate::model::{LayoutConfig, TimelineItem, ViewContext, ZoomState, current_year};

pub use import::{
    Duplicate, ImportStrategy, ImportSummary, ItemType, check_duplicates, normalize_event,
    normalize_person, reset_event, reset_person, validate_import,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no item with id `{0}`")]
    UnknownItem(String),
    #[error("no category with id `{0}`")]
    UnknownCategory(String),
    #[error("an item with id `{0}` already exists")]
    DuplicateId(String),
    #[error("document: {0}")]
    Document(#[from] import::DocumentError),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

enum Slot {
    Person(usize),
    Event(usize),
}

/// The editable timeline: people, events, categories, and view state,
/// with the layout engine wired to the stored position fields.
///
/// Layout state (packed row, manual placement, pin, drag offset) lives in
/// each record's `position`, so a document saved through a
/// [`DocumentStore`](crate::persist::DocumentStore) keeps it while an
/// [`export`](Self::export) drops it.
#[derive(Debug, Clone)]
pub struct Timeline {
    metadata: Metadata,
    categories: Vec<Category>,
    locations: Value,
    extra: BTreeMap<String, Value>,
    people: Vec<PersonRecord>,
    events: Vec<EventRecord>,
    config: LayoutConfig,
    zoom: ZoomState,
}

impl Timeline {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            metadata: Metadata::default(),
            categories: Vec::new(),
            locations: Value::Null,
            extra: BTreeMap::new(),
            people: Vec::new(),
            events: Vec::new(),
            config,
            zoom: ZoomState::default(),
        }
    }

    /// Load a stored document. Records keep any layout state they carry;
    /// missing state is filled with defaults.
    pub fn from_document(doc: TimelineDocument, config: LayoutConfig) -> Self {
        let TimelineDocument {
            metadata,
            categories,
            locations,
            people,
            events,
            extra,
        } = doc;
        let mut timeline = Self {
            metadata,
            categories,
            locations,
            extra,
            people: people
                .unwrap_or_default()
                .into_iter()
                .map(normalize_person)
                .collect(),
            events: events
                .unwrap_or_default()
                .into_iter()
                .map(normalize_event)
                .collect(),
            config,
            zoom: ZoomState::default(),
        };
        timeline.zoom = zoom_from_ui_state(&timeline.extra)
            .unwrap_or_else(|| ZoomState::fit(&timeline.items(), current_year()));
        timeline.refresh_totals();
        info!(
            people = timeline.people.len(),
            events = timeline.events.len(),
            categories = timeline.categories.len(),
            "timeline loaded"
        );
        timeline
    }

    /// The full document including layout state, for persistence.
    pub fn to_document(&self) -> TimelineDocument {
        let mut extra = self.extra.clone();
        let ui_state = extra
            .entry("ui_state".to_string())
            .or_insert_with(|| json!({}));
        if let Some(ui_state) = ui_state.as_object_mut() {
            ui_state.insert(
                "zoom".to_string(),
                json!({
                    "start_year": self.zoom.start_year,
                    "end_year": self.zoom.end_year,
                }),
            );
        }
        TimelineDocument {
            metadata: self.metadata.clone(),
            categories: self.categories.clone(),
            locations: self.locations.clone(),
            people: Some(self.people.clone()),
            events: Some(self.events.clone()),
            extra,
        }
    }

    /// The document for sharing: content only. Every item's layout and
    /// visibility state is reset to defaults, drag offsets included, and
    /// `exported_at` is stamped.
    pub fn export(&self) -> TimelineDocument {
        let mut doc = self.to_document();
        doc.people = Some(self.people.iter().cloned().map(reset_person).collect());
        doc.events = Some(self.events.iter().cloned().map(reset_event).collect());
        doc.metadata.exported_at = Some(chrono::Utc::now().to_rfc3339());
        doc
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn zoom_mut(&mut self) -> &mut ZoomState {
        &mut self.zoom
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn people(&self) -> &[PersonRecord] {
        &self.people
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Every placeable person and event as a layout item.
    pub fn items(&self) -> Vec<TimelineItem> {
        let spacing = self.config.row_spacing_px;
        self.people
            .iter()
            .filter_map(|p| TimelineItem::from_person(p, spacing))
            .chain(
                self.events
                    .iter()
                    .filter_map(|e| TimelineItem::from_event(e, spacing)),
            )
            .collect()
    }

    pub fn item(&self, id: &str) -> Option<TimelineItem> {
        let spacing = self.config.row_spacing_px;
        match self.slot(id)? {
            Slot::Person(i) => TimelineItem::from_person(&self.people[i], spacing),
            Slot::Event(i) => TimelineItem::from_event(&self.events[i], spacing),
        }
    }

    fn slot(&self, id: &str) -> Option<Slot> {
        if let Some(i) = self.people.iter().position(|p| p.id == id) {
            return Some(Slot::Person(i));
        }
        self.events
            .iter()
            .position(|e| e.id == id)
            .map(Slot::Event)
    }

    fn contains(&self, id: &str) -> bool {
        self.slot(id).is_some()
    }

    fn position_mut(&mut self, id: &str) -> Result<&mut Position, StoreError> {
        let position = match self.slot(id) {
            Some(Slot::Person(i)) => &mut self.people[i].position,
            Some(Slot::Event(i)) => &mut self.events[i].position,
            None => return Err(StoreError::UnknownItem(id.to_string())),
        };
        Ok(position.get_or_insert_with(Position::default))
    }

    fn visibility_mut(&mut self, id: &str) -> Result<&mut Visibility, StoreError> {
        let visibility = match self.slot(id) {
            Some(Slot::Person(i)) => &mut self.people[i].visibility,
            Some(Slot::Event(i)) => &mut self.events[i].visibility,
            None => return Err(StoreError::UnknownItem(id.to_string())),
        };
        Ok(visibility.get_or_insert_with(Visibility::default))
    }

    fn refresh_totals(&mut self) {
        self.metadata.total_people = self.people.len();
        self.metadata.total_events = self.events.len();
    }

    /// Add a person with fresh layout state.
    pub fn add_person(&mut self, person: PersonRecord) -> Result<(), StoreError> {
        if self.contains(&person.id) {
            return Err(StoreError::DuplicateId(person.id));
        }
        self.people.push(reset_person(person));
        self.refresh_totals();
        Ok(())
    }

    /// Add an event with fresh layout state.
    pub fn add_event(&mut self, event: EventRecord) -> Result<(), StoreError> {
        if self.contains(&event.id) {
            return Err(StoreError::DuplicateId(event.id));
        }
        self.events.push(reset_event(event));
        self.refresh_totals();
        Ok(())
    }

    /// Edit a person's fields in place. The id cannot be changed.
    pub fn update_person(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut PersonRecord),
    ) -> Result<(), StoreError> {
        let Some(person) = self.people.iter_mut().find(|p| p.id == id) else {
            return Err(StoreError::UnknownItem(id.to_string()));
        };
        edit(person);
        person.id = id.to_string();
        Ok(())
    }

    /// Edit an event's fields in place. The id cannot be changed.
    pub fn update_event(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut EventRecord),
    ) -> Result<(), StoreError> {
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return Err(StoreError::UnknownItem(id.to_string()));
        };
        edit(event);
        event.id = id.to_string();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        match self.slot(id) {
            Some(Slot::Person(i)) => {
                self.people.remove(i);
            }
            Some(Slot::Event(i)) => {
                self.events.remove(i);
            }
            None => return Err(StoreError::UnknownItem(id.to_string())),
        }
        self.refresh_totals();
        Ok(())
    }

    /// Flip an item's hidden flag. Returns the new value.
    pub fn toggle_hidden(&mut self, id: &str) -> Result<bool, StoreError> {
        let visibility = self.visibility_mut(id)?;
        visibility.is_hidden = !visibility.is_hidden;
        Ok(visibility.is_hidden)
    }

    /// Flip an item's pin. Returns the new value.
    pub fn toggle_pin(&mut self, id: &str) -> Result<bool, StoreError> {
        let position = self.position_mut(id)?;
        position.is_pinned = !position.is_pinned;
        Ok(position.is_pinned)
    }

    /// Place an item at a fixed row that packing will not touch, or with
    /// `None` hand it back to the packer.
    pub fn set_manual_row(&mut self, id: &str, row: Option<u32>) -> Result<(), StoreError> {
        let spacing = self.config.row_spacing_px;
        let position = self.position_mut(id)?;
        match row {
            Some(row) => {
                position.y = Some(row_to_y(row, spacing));
                position.is_manually_placed = true;
            }
            None => position.is_manually_placed = false,
        }
        Ok(())
    }

    pub fn set_drag_offset(&mut self, id: &str, rows: i32) -> Result<(), StoreError> {
        self.position_mut(id)?.drag_offset_rows = rows;
        Ok(())
    }

    pub fn clear_drag_offsets(&mut self) {
        let positions = self
            .people
            .iter_mut()
            .filter_map(|p| p.position.as_mut())
            .chain(self.events.iter_mut().filter_map(|e| e.position.as_mut()));
        for position in positions {
            position.drag_offset_rows = 0;
        }
    }

    /// Flip a category lane's visibility. Returns the new value.
    pub fn toggle_category_visibility(&mut self, category_id: &str) -> Result<bool, StoreError> {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| StoreError::UnknownCategory(category_id.to_string()))?;
        category.visible = !category.visible;
        Ok(category.visible)
    }

    /// List incoming items whose ids already exist here.
    pub fn check_duplicates(&self, doc: &TimelineDocument) -> Vec<Duplicate> {
        check_duplicates(doc, &self.people, &self.events)
    }

    /// Merge people and events from `doc`. New ids are appended; existing
    /// ids are skipped or replaced according to `strategy`. Imported records
    /// keep layout state they carry.
    pub fn import_bulk(&mut self, doc: TimelineDocument, strategy: ImportStrategy) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for person in doc.people.unwrap_or_default() {
            let person = normalize_person(person);
            match self.people.iter().position(|p| p.id == person.id) {
                Some(i) if strategy == ImportStrategy::Overwrite => {
                    self.people[i] = person;
                    summary.imported += 1;
                }
                Some(_) => summary.skipped += 1,
                None => {
                    self.people.push(person);
                    summary.imported += 1;
                }
            }
        }

        for event in doc.events.unwrap_or_default() {
            let event = normalize_event(event);
            match self.events.iter().position(|e| e.id == event.id) {
                Some(i) if strategy == ImportStrategy::Overwrite => {
                    self.events[i] = event;
                    summary.imported += 1;
                }
                Some(_) => summary.skipped += 1,
                None => {
                    self.events.push(event);
                    summary.imported += 1;
                }
            }
        }

        self.refresh_totals();
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            ?strategy,
            "bulk import"
        );
        summary
    }

    /// Pack every visible lane and record each packed row in the item's
    /// stored `position.y`.
    pub fn layout(&mut self, view: &ViewContext) -> TimelineLayout {
        let items = self.items();
        let layout = layout_lanes(&self.categories, &items, view, &self.config);
        let spacing = self.config.row_spacing_px;
        for item in items.iter().filter(|i| !i.manually_placed) {
            if let Some(row) = layout.row_of(&item.id)
                && let Ok(position) = self.position_mut(&item.id)
            {
                position.y = Some(row_to_y(row, spacing));
            }
        }
        layout
    }

    /// Start dragging `id` with the pointer at `pointer_y`. `None` if the
    /// item is not laid out or is pinned.
    pub fn begin_drag(
        &self,
        layout: &TimelineLayout,
        id: &str,
        pointer_y: f64,
        view: &ViewContext,
    ) -> Option<DragSession> {
        let snapshot = capture_snapshot(&self.items(), layout, view, &self.config);
        DragSession::start(snapshot, id, pointer_y, self.config)
    }

    /// Persist the offsets of a finished drag. Returns how many items moved.
    pub fn apply_drag(&mut self, commit: &DragCommit) -> usize {
        let mut applied = 0;
        for (id, &rows) in &commit.offsets {
            if self.set_drag_offset(id, rows).is_ok() {
                applied += 1;
            }
        }
        debug!(applied, "drag offsets applied");
        applied
    }

    /// Compact one lane's manual offsets. Returns how many offsets changed.
    ///
    /// Uses the rows recorded by the last [`layout`](Self::layout) pass.
    pub fn compact_lane(&mut self, category_id: &str, view: &ViewContext) -> usize {
        let lane_items: Vec<TimelineItem> = self
            .items()
            .into_iter()
            .filter(|i| i.category_id == category_id)
            .collect();
        let offsets = compact(&lane_items, view, &self.config);
        let mut changed = 0;
        for item in &lane_items {
            if let Some(&rows) = offsets.get(&item.id)
                && rows != item.drag_offset_rows
                && self.set_drag_offset(&item.id, rows).is_ok()
            {
                changed += 1;
            }
        }
        changed
    }

    /// Compact every visible lane.
    pub fn compact_all(&mut self, view: &ViewContext) -> usize {
        let lanes: Vec<String> = self
            .categories
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.id.clone())
            .collect();
        lanes
            .iter()
            .map(|lane| self.compact_lane(lane, view))
            .sum()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

fn zoom_from_ui_state(extra: &BTreeMap<String, Value>) -> Option<ZoomState> {
    let zoom = extra.get("ui_state")?.get("zoom")?;
    let start = i32::try_from(zoom.get("start_year")?.as_i64()?).ok()?;
    let end = i32::try_from(zoom.get("end_year")?.as_i64()?).ok()?;
    (start < end).then(|| ZoomState::new(start, end))
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted timeline document: the JSON shape the data store fetches,
/// stores, imports, and exports.
///
/// Field names follow the stored JSON (`snake_case` for content,
/// `camelCase` inside `position`/`visibility`). Fields this crate does not
/// interpret are kept in the `extra` maps so content round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Location table, opaque to layout.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub locations: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<PersonRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventRecord>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TimelineDocument {
    pub fn people(&self) -> &[PersonRecord] {
        self.people.as_deref().unwrap_or_default()
    }

    pub fn events(&self) -> &[EventRecord] {
        self.events.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub total_people: usize,
    #[serde(default)]
    pub total_events: usize,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A category lane definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `#rrggbb` lane color.
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Manual layout state of a stored item.
///
/// `y` is the packed vertical slot in layout pixels (row × row spacing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub is_manually_placed: bool,
    #[serde(default)]
    pub is_pinned: bool,
    /// Manual vertical adjustment in row units, layered on top of `y`.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub drag_offset_rows: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_in_comparison: bool,
}

/// A person, drawn as a bar from birth to death (or to the current year
/// while alive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default)]
    pub birth: Option<i32>,
    #[serde(default)]
    pub death: Option<i32>,
    /// The first entry is the primary category and decides the lane.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An event, drawn as a dot (single year) or a bar (start to end year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_round_trips_unknown_fields() {
        let json = r#"{
            "id": "p1",
            "name": "Ada Lovelace",
            "birth": 1815,
            "death": 1852,
            "categories": ["science"],
            "primary_location": "london",
            "citizenship": "UK",
            "position": {"y": 35, "isManuallyPlaced": true, "isPinned": false}
        }"#;
        let person: PersonRecord = serde_json::from_str(json).unwrap();
        assert_eq!(person.birth, Some(1815));
        assert_eq!(person.extra["citizenship"], "UK");
        let position = person.position.unwrap();
        assert!(position.is_manually_placed);
        assert_eq!(position.y, Some(35.0));

        let back = serde_json::to_value(&person).unwrap();
        assert_eq!(back["citizenship"], "UK");
        assert_eq!(back["position"]["isManuallyPlaced"], true);
    }

    #[test]
    fn empty_document_has_no_items() {
        let doc: TimelineDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.people().is_empty());
        assert!(doc.events().is_empty());
        assert!(doc.people.is_none());
    }

    #[test]
    fn category_defaults_to_visible() {
        let cat: Category = serde_json::from_str(r#"{"id": "art", "name": "Art"}"#).unwrap();
        assert!(cat.visible);
    }
}

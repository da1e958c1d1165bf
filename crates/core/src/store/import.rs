use chronolane_protocol::{EventRecord, PersonRecord, Position, TimelineDocument, Visibility};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document contains neither people nor events")]
    Empty,
}

/// Decode a timeline document. A document must carry a `people` or an
/// `events` array (either may be empty).
pub fn parse_document(data: &[u8]) -> Result<TimelineDocument, DocumentError> {
    let doc: TimelineDocument = serde_json::from_slice(data)?;
    if doc.people.is_none() && doc.events.is_none() {
        return Err(DocumentError::Empty);
    }
    Ok(doc)
}

/// A single problem found while validating import data. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document must contain people or events")]
    NoItems,
    #[error("person #{index} ({name}): missing name")]
    PersonMissingName { index: usize, name: String },
    #[error("person #{index} ({name}): missing birth year")]
    PersonMissingBirth { index: usize, name: String },
    #[error("person #{index} ({name}): birth year is after death year")]
    PersonBornAfterDeath { index: usize, name: String },
    #[error("person #{index} ({name}): needs at least one category")]
    PersonMissingCategory { index: usize, name: String },
    #[error("person #{index} ({name}): missing primary location")]
    PersonMissingLocation { index: usize, name: String },
    #[error("event #{index} ({name}): missing name")]
    EventMissingName { index: usize, name: String },
    #[error("event #{index} ({name}): missing start year")]
    EventMissingStart { index: usize, name: String },
    #[error("event #{index} ({name}): start year is after end year")]
    EventStartsAfterEnd { index: usize, name: String },
}

/// Every problem found in an import document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("import data has {} problem(s)", .errors.len())]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        "unnamed".to_string()
    } else {
        name.to_string()
    }
}

/// Check import data, collecting every problem rather than stopping at
/// the first.
pub fn validate_import(doc: &TimelineDocument) -> Result<(), ValidationReport> {
    let mut errors = Vec::new();

    if doc.people.is_none() && doc.events.is_none() {
        errors.push(ValidationError::NoItems);
    }

    for (i, person) in doc.people().iter().enumerate() {
        let index = i + 1;
        let name = display_name(&person.name);
        if person.name.is_empty() {
            errors.push(ValidationError::PersonMissingName {
                index,
                name: name.clone(),
            });
        }
        if person.birth.is_none() {
            errors.push(ValidationError::PersonMissingBirth {
                index,
                name: name.clone(),
            });
        }
        if let (Some(birth), Some(death)) = (person.birth, person.death)
            && birth > death
        {
            errors.push(ValidationError::PersonBornAfterDeath {
                index,
                name: name.clone(),
            });
        }
        if person.categories.is_empty() {
            errors.push(ValidationError::PersonMissingCategory {
                index,
                name: name.clone(),
            });
        }
        if person.primary_location.as_deref().is_none_or(str::is_empty) {
            errors.push(ValidationError::PersonMissingLocation { index, name });
        }
    }

    for (i, event) in doc.events().iter().enumerate() {
        let index = i + 1;
        let name = display_name(&event.name);
        if event.name.is_empty() {
            errors.push(ValidationError::EventMissingName {
                index,
                name: name.clone(),
            });
        }
        if event.start_year.is_none() {
            errors.push(ValidationError::EventMissingStart {
                index,
                name: name.clone(),
            });
        }
        if let (Some(start), Some(end)) = (event.start_year, event.end_year)
            && start > end
        {
            errors.push(ValidationError::EventStartsAfterEnd { index, name });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { errors })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Person,
    Event,
}

/// An incoming item whose id already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duplicate {
    pub kind: ItemType,
    pub id: String,
    pub name: String,
}

/// List incoming people and events whose ids are already present.
pub fn check_duplicates(
    doc: &TimelineDocument,
    existing_people: &[PersonRecord],
    existing_events: &[EventRecord],
) -> Vec<Duplicate> {
    let people = doc
        .people()
        .iter()
        .filter(|p| existing_people.iter().any(|e| e.id == p.id))
        .map(|p| Duplicate {
            kind: ItemType::Person,
            id: p.id.clone(),
            name: p.name.clone(),
        });
    let events = doc
        .events()
        .iter()
        .filter(|ev| existing_events.iter().any(|e| e.id == ev.id))
        .map(|ev| Duplicate {
            kind: ItemType::Event,
            id: ev.id.clone(),
            name: ev.name.clone(),
        });
    people.chain(events).collect()
}

/// What to do with an incoming item whose id already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrategy {
    #[default]
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Fill in missing layout and visibility state, keeping whatever the
/// record already carries.
pub fn normalize_person(mut person: PersonRecord) -> PersonRecord {
    person.position.get_or_insert_with(Position::default);
    person.visibility.get_or_insert_with(Visibility::default);
    person
}

pub fn normalize_event(mut event: EventRecord) -> EventRecord {
    event.position.get_or_insert_with(Position::default);
    event.visibility.get_or_insert_with(Visibility::default);
    event
}

/// Reset layout and visibility state to defaults, dropping anything the
/// record carried. Applied to directly added items and to exports.
pub fn reset_person(mut person: PersonRecord) -> PersonRecord {
    person.position = Some(Position::default());
    person.visibility = Some(Visibility::default());
    person
}

pub fn reset_event(mut event: EventRecord) -> EventRecord {
    event.position = Some(Position::default());
    event.visibility = Some(Visibility::default());
    event
}

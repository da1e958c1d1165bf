//! Durable storage for timeline documents.

use std::fs;
use std::path::{Path, PathBuf};

use chronolane_protocol::TimelineDocument;
use tracing::{debug, info};

use crate::store::StoreError;
use crate::store::import::{DocumentError, parse_document};

/// Where a timeline document lives between sessions.
pub trait DocumentStore {
    /// Load the stored document. `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<TimelineDocument>, StoreError>;

    /// Save `doc`, stamping `metadata.last_updated`. Returns the timestamp.
    fn save(&self, doc: &TimelineDocument) -> Result<String, StoreError>;
}

/// Stores the document as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<TimelineDocument>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no stored document");
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let doc = parse_document(&data)?;
        info!(path = %self.path.display(), "document loaded");
        Ok(Some(doc))
    }

    fn save(&self, doc: &TimelineDocument) -> Result<String, StoreError> {
        if doc.people.is_none() && doc.events.is_none() {
            return Err(DocumentError::Empty.into());
        }
        let stamp = chrono::Utc::now().to_rfc3339();
        let mut doc = doc.clone();
        doc.metadata.last_updated = Some(stamp.clone());

        let json = serde_json::to_vec_pretty(&doc).map_err(DocumentError::from)?;
        // Write beside the target, then rename over it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), %stamp, "document saved");
        Ok(stamp)
    }
}

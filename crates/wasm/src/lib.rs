use std::collections::BTreeMap;
use std::fmt::Display;

use chronolane_core::layout::{DragOutcome, DragSession, TimelineLayout};
use chronolane_core::model::current_year;
use chronolane_core::store::import::{ImportStrategy, parse_document, validate_import};
use chronolane_core::views::{TimelineScene, render_timeline, render_year_axis};
use chronolane_core::{LayoutConfig, Timeline, ViewContext};
use chronolane_protocol::Viewport;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn js_err(e: impl Display) -> JsError {
    JsError::new(&e.to_string())
}

fn to_json(value: &impl Serialize) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(js_err)
}

#[derive(Serialize)]
struct DragResult {
    committed: bool,
    offsets: BTreeMap<String, i32>,
}

/// One open timeline and its interaction state. The page owns the handle;
/// nothing is shared between handles.
#[wasm_bindgen]
pub struct TimelineHandle {
    timeline: Timeline,
    layout: TimelineLayout,
    view: ViewContext,
    drag: Option<DragSession>,
    preview: Option<BTreeMap<String, f64>>,
    current_year: i32,
}

impl TimelineHandle {
    fn relayout(&mut self, viewport_width: f64) {
        self.view = self
            .timeline
            .zoom()
            .view_context(viewport_width)
            .with_current_year(self.current_year);
        self.layout = self.timeline.layout(&self.view);
    }
}

#[wasm_bindgen]
impl TimelineHandle {
    /// Load a timeline document (JSON bytes). `config_json` optionally
    /// overrides layout tuning values.
    #[wasm_bindgen(constructor)]
    pub fn new(data: &[u8], config_json: Option<String>) -> Result<TimelineHandle, JsError> {
        let doc = parse_document(data).map_err(js_err)?;
        let config = match config_json {
            Some(json) => LayoutConfig::from_json(json.as_bytes()).map_err(js_err)?,
            None => LayoutConfig::default(),
        };
        Ok(Self {
            timeline: Timeline::from_document(doc, config),
            layout: TimelineLayout::default(),
            view: ViewContext::unscaled(current_year()),
            drag: None,
            preview: None,
            current_year: current_year(),
        })
    }

    /// Pin the year that closes open-ended life spans.
    pub fn set_current_year(&mut self, year: i32) {
        self.current_year = year;
    }

    /// Lay out every visible lane for a plot `viewport_width` pixels wide.
    /// Returns the layout as JSON.
    pub fn layout(&mut self, viewport_width: f64) -> Result<String, JsError> {
        self.relayout(viewport_width);
        to_json(&self.layout)
    }

    /// Axis and lane render commands as JSON. Lays out first; while a drag
    /// is in progress the preview positions are drawn.
    pub fn render(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        dpr: f64,
        vertical_scale: f64,
    ) -> Result<String, JsError> {
        if self.drag.is_none() {
            self.relayout(width);
        }
        let viewport = Viewport {
            x,
            y,
            width,
            height,
            dpr,
        };
        let items = self.timeline.items();
        let zoom = *self.timeline.zoom();
        let config = *self.timeline.config();
        let mut scene = TimelineScene::new(&self.layout, &items, &zoom, &config, self.current_year)
            .with_vertical_scale(vertical_scale);
        if let Some(preview) = &self.preview {
            scene = scene.with_overrides(preview);
        }
        let mut commands = render_year_axis(
            &viewport,
            f64::from(zoom.start_year),
            f64::from(zoom.end_year),
            self.layout.total_height * vertical_scale,
        );
        commands.extend(render_timeline(&scene, &viewport));
        to_json(&commands)
    }

    /// Begin dragging `id`. `pointer_y` is in layout pixels (screen Y
    /// divided by the vertical scale). Returns false for pinned or unknown
    /// items.
    pub fn drag_start(&mut self, id: &str, pointer_y: f64) -> bool {
        self.drag = self
            .timeline
            .begin_drag(&self.layout, id, pointer_y, &self.view);
        self.preview = None;
        self.drag.is_some()
    }

    /// Preview positions (id → layout Y) for the pointer at `pointer_y`.
    pub fn drag_move(&mut self, pointer_y: f64) -> Result<String, JsError> {
        let Some(session) = &self.drag else {
            return Err(JsError::new("no drag in progress"));
        };
        let preview = session.preview(pointer_y);
        let json = to_json(&preview)?;
        self.preview = Some(preview);
        Ok(json)
    }

    /// Release the drag. Returns `{committed, offsets}` as JSON.
    pub fn drag_end(&mut self, pointer_y: f64) -> Result<String, JsError> {
        self.preview = None;
        let Some(session) = self.drag.take() else {
            return Err(JsError::new("no drag in progress"));
        };
        let result = match session.finish(pointer_y) {
            DragOutcome::Committed(commit) => {
                self.timeline.apply_drag(&commit);
                DragResult {
                    committed: true,
                    offsets: commit.offsets,
                }
            }
            DragOutcome::Cancelled => DragResult {
                committed: false,
                offsets: BTreeMap::new(),
            },
        };
        to_json(&result)
    }

    /// Compact one lane, or every lane when `category_id` is absent.
    /// Returns how many offsets changed.
    pub fn compact(&mut self, category_id: Option<String>) -> usize {
        match category_id {
            Some(id) => self.timeline.compact_lane(&id, &self.view),
            None => self.timeline.compact_all(&self.view),
        }
    }

    pub fn clear_drag_offsets(&mut self) {
        self.timeline.clear_drag_offsets();
    }

    pub fn toggle_pin(&mut self, id: &str) -> Result<bool, JsError> {
        self.timeline.toggle_pin(id).map_err(js_err)
    }

    pub fn toggle_hidden(&mut self, id: &str) -> Result<bool, JsError> {
        self.timeline.toggle_hidden(id).map_err(js_err)
    }

    pub fn toggle_category(&mut self, category_id: &str) -> Result<bool, JsError> {
        self.timeline
            .toggle_category_visibility(category_id)
            .map_err(js_err)
    }

    pub fn zoom_in(&mut self) {
        self.timeline.zoom_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.timeline.zoom_mut().zoom_out();
    }

    pub fn pan_left(&mut self) {
        self.timeline.zoom_mut().pan_left();
    }

    pub fn pan_right(&mut self) {
        self.timeline.zoom_mut().pan_right();
    }

    /// Validation problems of an import document, as a JSON list of
    /// messages (empty when valid).
    pub fn validate(&self, data: &[u8]) -> Result<String, JsError> {
        let doc = parse_document(data).map_err(js_err)?;
        let messages: Vec<String> = match validate_import(&doc) {
            Ok(()) => Vec::new(),
            Err(report) => report.errors.iter().map(ToString::to_string).collect(),
        };
        to_json(&messages)
    }

    /// Incoming items whose ids already exist, as JSON.
    pub fn check_duplicates(&self, data: &[u8]) -> Result<String, JsError> {
        let doc = parse_document(data).map_err(js_err)?;
        to_json(&self.timeline.check_duplicates(&doc))
    }

    /// Merge an import document; `strategy` is `"skip"` or `"overwrite"`.
    /// Returns the import summary as JSON.
    pub fn import(&mut self, data: &[u8], strategy: &str) -> Result<String, JsError> {
        let strategy = match strategy {
            "skip" => ImportStrategy::Skip,
            "overwrite" => ImportStrategy::Overwrite,
            other => return Err(JsError::new(&format!("unknown import strategy: {other}"))),
        };
        let doc = parse_document(data).map_err(js_err)?;
        to_json(&self.timeline.import_bulk(doc, strategy))
    }

    /// The full document, layout state included, for saving.
    pub fn document(&self) -> Result<String, JsError> {
        to_json(&self.timeline.to_document())
    }

    /// The document with all layout state reset, for sharing.
    pub fn export(&self) -> Result<String, JsError> {
        to_json(&self.timeline.export())
    }
}

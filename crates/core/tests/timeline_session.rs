//! Integration test: load a stored timeline, lay it out, drag an item,
//! compact, save through the file store, and export.

use chronolane_core::layout::DragOutcome;
use chronolane_core::persist::{DocumentStore, JsonFileStore};
use chronolane_core::store::import::{parse_document, validate_import};
use chronolane_core::svg::render_svg;
use chronolane_core::views::{AXIS_HEIGHT, TimelineScene, render_timeline, render_year_axis};
use chronolane_core::{LayoutConfig, Timeline, ViewContext};
use chronolane_protocol::{Position, Viewport};

const NOW: i32 = 2024;

fn load() -> Timeline {
    let data = include_bytes!("fixtures/sample-timeline.json");
    let doc = parse_document(data).expect("fixture should parse");
    validate_import(&doc).expect("fixture should validate");
    Timeline::from_document(doc, LayoutConfig::default())
}

fn row(tl: &Timeline, id: &str) -> i64 {
    tl.item(id).map(|i| i.effective_row()).unwrap_or(-1)
}

#[test]
fn loads_lanes_and_zoom() {
    let mut tl = load();
    assert_eq!(tl.people().len(), 8);
    assert_eq!(tl.events().len(), 3);
    assert_eq!(tl.zoom().start_year, 1600);
    assert_eq!(tl.zoom().end_year, 1950);

    let layout = tl.layout(&ViewContext::unscaled(NOW));
    let lanes: Vec<&str> = layout.lanes.iter().map(|l| l.category_id.as_str()).collect();
    assert_eq!(lanes, ["science", "art", "events"]);

    // newton, leibniz and euler all overlap around 1710.
    assert_eq!(layout.row_of("newton"), Some(0));
    assert_eq!(layout.row_of("leibniz"), Some(1));
    assert_eq!(layout.row_of("euler"), Some(2));
    assert_eq!(layout.row_of("gauss"), Some(0));
    assert_eq!(layout.row_of("curie"), Some(0));

    let science = layout.lane("science").unwrap();
    assert_eq!(science.height, 170.0);
    assert_eq!(layout.lane("art").unwrap().base_y, 170.0);
    assert_eq!(layout.lane("events").unwrap().base_y, 270.0);
    assert_eq!(layout.total_height, 370.0);

    // Curie's first category is science; events without a category land
    // in the events lane.
    assert!(science.item_ids.contains(&"curie".to_string()));
    assert_eq!(layout.lane("events").unwrap().item_ids.len(), 3);
}

#[test]
fn drag_commit_and_compact() {
    let mut tl = load();
    let view = ViewContext::unscaled(NOW);
    let layout = tl.layout(&view);

    // Euler sits on row 2 at y = 40 + 70. Drag it up to row 0.
    let session = tl
        .begin_drag(&layout, "euler", 110.0, &view)
        .expect("euler is draggable");
    let preview = session.preview(42.0);
    assert_eq!(preview["euler"], 40.0);
    assert_eq!(preview["newton"], 110.0);
    assert_eq!(preview["gauss"], 75.0);
    assert_eq!(preview["leibniz"], 75.0);
    assert_eq!(preview["curie"], 40.0);
    assert_eq!(preview["bach"], 210.0);

    let DragOutcome::Committed(commit) = session.finish(42.0) else {
        unreachable!("a 68px drag is not a click");
    };
    assert_eq!(commit.offsets.len(), 3);
    assert_eq!(commit.offsets["euler"], -2);
    assert_eq!(commit.offsets["newton"], 2);
    assert_eq!(commit.offsets["gauss"], 1);
    tl.apply_drag(&commit);

    assert_eq!(row(&tl, "euler"), 0);
    assert_eq!(row(&tl, "newton"), 2);

    // Offsets survive a fresh layout pass.
    let layout = tl.layout(&view);
    let euler = tl.item("euler").unwrap();
    assert_eq!(layout.effective_y(&euler), Some(40.0));

    // The arrangement has no gaps, so compaction changes nothing.
    let before: Vec<i64> = ["euler", "curie", "leibniz", "gauss", "newton"]
        .iter()
        .map(|id| row(&tl, id))
        .collect();
    assert_eq!(tl.compact_all(&view), 0);
    let after: Vec<i64> = ["euler", "curie", "leibniz", "gauss", "newton"]
        .iter()
        .map(|id| row(&tl, id))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn pinned_items_hold_through_drags() {
    let mut tl = load();
    let view = ViewContext::unscaled(NOW);
    tl.toggle_pin("newton").unwrap();
    let layout = tl.layout(&view);

    assert!(tl.begin_drag(&layout, "newton", 40.0, &view).is_none());

    let session = tl.begin_drag(&layout, "euler", 110.0, &view).unwrap();
    let DragOutcome::Committed(commit) = session.finish(40.0) else {
        unreachable!("a 70px drag is not a click");
    };
    assert!(!commit.offsets.contains_key("newton"));
    tl.apply_drag(&commit);
    assert_eq!(row(&tl, "newton"), 0);
    assert_eq!(row(&tl, "euler"), 0);
    // leibniz keeps row 1; gauss overlaps euler and is pushed down to it.
    assert_eq!(commit.offsets.get("gauss"), Some(&1));
}

#[test]
fn small_release_is_a_click() {
    let mut tl = load();
    let view = ViewContext::unscaled(NOW);
    let layout = tl.layout(&view);
    let session = tl.begin_drag(&layout, "euler", 110.0, &view).unwrap();
    assert_eq!(session.finish(112.0), DragOutcome::Cancelled);
}

#[test]
fn save_keeps_layout_state_and_export_drops_it() {
    let mut tl = load();
    let view = ViewContext::unscaled(NOW);
    tl.layout(&view);
    tl.set_drag_offset("gauss", 3).unwrap();
    tl.toggle_pin("bach").unwrap();

    let path = std::env::temp_dir().join(format!("chronolane-session-{}.json", std::process::id()));
    let store = JsonFileStore::new(&path);
    store.save(&tl.to_document()).unwrap();
    let reloaded = Timeline::from_document(store.load().unwrap().unwrap(), LayoutConfig::default());
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.item("gauss").unwrap().drag_offset_rows, 3);
    assert!(reloaded.item("bach").unwrap().pinned);
    assert_eq!(reloaded.zoom().start_year, 1600);
    assert!(reloaded.metadata().last_updated.is_some());

    let exported = tl.export();
    assert!(exported.metadata.exported_at.is_some());
    let json = serde_json::to_vec(&exported).unwrap();
    let reimported = Timeline::from_document(parse_document(&json).unwrap(), LayoutConfig::default());
    for person in reimported.people() {
        assert_eq!(person.position, Some(Position::default()));
    }
    for (a, b) in tl.people().iter().zip(reimported.people()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.birth, b.birth);
        assert_eq!(a.death, b.death);
        assert_eq!(a.categories, b.categories);
    }
}

#[test]
fn renders_to_svg() {
    let mut tl = load();
    let view = tl.zoom().view_context(1000.0).with_current_year(NOW);
    let layout = tl.layout(&view);
    let items = tl.items();
    let zoom = *tl.zoom();
    let config = *tl.config();
    let viewport = Viewport::new(1000.0, AXIS_HEIGHT + layout.total_height);

    let scene = TimelineScene::new(&layout, &items, &zoom, &config, NOW);
    let mut commands = render_year_axis(
        &viewport,
        f64::from(zoom.start_year),
        f64::from(zoom.end_year),
        layout.total_height,
    );
    commands.extend(render_timeline(&scene, &viewport));

    let svg = render_svg(&commands, viewport.width, viewport.height, false);
    assert!(svg.contains("Isaac Newton"));
    assert!(svg.contains("Art &amp; Music"));
    assert!(svg.contains(">1700<"));
    assert!(svg.contains("<circle"));
}

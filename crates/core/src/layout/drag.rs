use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{LayoutConfig, TimelineItem, ViewContext};

use super::effective::effective_range;
use super::lanes::TimelineLayout;
use super::overlap::YearRange;

/// Tolerance for comparing layout Y values that should sit on the row grid.
const Y_EPSILON: f64 = 1e-6;

/// One visible item frozen at drag start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub id: String,
    /// Effective Y at drag start, in layout pixels.
    pub original_y: f64,
    /// Y of row 0 of the item's lane.
    pub lane_origin_y: f64,
    /// Effective (label padded) time range at drag start.
    pub range: YearRange,
    pub drag_offset_rows: i32,
    pub pinned: bool,
}

/// Freeze every visible, laid-out item with its current effective Y.
///
/// Items spanning all lanes are captured: a dragged item may be pulled
/// across a lane boundary and must then avoid that lane's items too.
pub fn capture_snapshot(
    items: &[TimelineItem],
    layout: &TimelineLayout,
    view: &ViewContext,
    config: &LayoutConfig,
) -> Vec<SnapshotItem> {
    items
        .iter()
        .filter(|i| !i.hidden)
        .filter_map(|item| {
            let original_y = layout.effective_y(item)?;
            let lane = layout.lane(&item.category_id)?;
            Some(SnapshotItem {
                id: item.id.clone(),
                original_y,
                lane_origin_y: lane.origin_y(layout.lane_header_px),
                range: effective_range(item, view, config),
                drag_offset_rows: item.drag_offset_rows,
                pinned: item.pinned,
            })
        })
        .collect()
}

/// Compute where every snapshotted item ends up when `dragged_id` is held
/// at `target_y`.
///
/// The preview is rebuilt from scratch on every call, so it is
/// deterministic and carries no drift between pointer moves:
///
/// 1. Pinned items are committed at their original Y.
/// 2. The dragged item is committed at `target_y`.
/// 3. The others, closest to the dragged item's original Y first, keep
///    their original Y unless an already committed item that overlaps in
///    time sits less than one row spacing away.
/// 4. A colliding item searches one row down, then one row up, then two
///    down, and so on up to `max_search_steps`, never above row 0 of its
///    own lane. The first free slot wins.
/// 5. If nothing is free, the item stays where it was.
///
/// If `dragged_id` is not in the snapshot, or is pinned, nothing moves.
pub fn resolve_preview(
    snapshot: &[SnapshotItem],
    dragged_id: &str,
    target_y: f64,
    config: &LayoutConfig,
) -> BTreeMap<String, f64> {
    let spacing = config.row_spacing_px;
    let mut positions = BTreeMap::new();

    let dragged = snapshot.iter().find(|s| s.id == dragged_id);
    let Some(dragged) = dragged.filter(|d| !d.pinned) else {
        for item in snapshot {
            positions.insert(item.id.clone(), item.original_y);
        }
        return positions;
    };

    let mut committed: Vec<(&SnapshotItem, f64)> = Vec::with_capacity(snapshot.len());
    for item in snapshot.iter().filter(|s| s.pinned) {
        committed.push((item, item.original_y));
    }
    committed.push((dragged, target_y));

    let mut others: Vec<&SnapshotItem> = snapshot
        .iter()
        .filter(|s| !s.pinned && s.id != dragged.id)
        .collect();
    others.sort_by(|a, b| {
        let da = (a.original_y - dragged.original_y).abs();
        let db = (b.original_y - dragged.original_y).abs();
        da.total_cmp(&db)
    });

    let collides = |committed: &[(&SnapshotItem, f64)], item: &SnapshotItem, y: f64| {
        committed.iter().any(|(placed, placed_y)| {
            (placed_y - y).abs() < spacing - Y_EPSILON && placed.range.overlaps(&item.range)
        })
    };

    for item in others {
        let y = if !collides(&committed, item, item.original_y) {
            item.original_y
        } else {
            find_free_slot(item, config, |y| !collides(&committed, item, y)).unwrap_or_else(|| {
                warn!(item = %item.id, "no free slot within search bound, keeping original row");
                item.original_y
            })
        };
        committed.push((item, y));
    }

    for (item, y) in committed {
        positions.insert(item.id.clone(), y);
    }
    positions
}

fn find_free_slot(
    item: &SnapshotItem,
    config: &LayoutConfig,
    is_free: impl Fn(f64) -> bool,
) -> Option<f64> {
    let spacing = config.row_spacing_px;
    for step in 1..=config.max_search_steps {
        let offset = f64::from(step) * spacing;
        let down = item.original_y + offset;
        if is_free(down) {
            return Some(down);
        }
        let up = item.original_y - offset;
        if up >= item.lane_origin_y - Y_EPSILON && is_free(up) {
            return Some(up);
        }
    }
    None
}

/// How a drag ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DragOutcome {
    /// The pointer barely moved: treat as a click, nothing changes.
    Cancelled,
    Committed(DragCommit),
}

/// New drag offsets to persist, in rows, keyed by item id.
///
/// Only items that moved by more than half a row (plus the dragged item)
/// are listed; everything else keeps its current offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DragCommit {
    pub offsets: BTreeMap<String, i32>,
}

/// State of one vertical drag, owned by the caller for the duration of the
/// gesture (start, any number of moves, end).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragSession {
    dragged_id: String,
    start_pointer_y: f64,
    start_y: f64,
    lane_origin_y: f64,
    snapshot: Vec<SnapshotItem>,
    config: LayoutConfig,
}

impl DragSession {
    /// Begin dragging `dragged_id`. Returns `None` when the item is not in
    /// the snapshot or is pinned.
    pub fn start(
        snapshot: Vec<SnapshotItem>,
        dragged_id: &str,
        pointer_y: f64,
        config: LayoutConfig,
    ) -> Option<Self> {
        let dragged = snapshot.iter().find(|s| s.id == dragged_id)?;
        if dragged.pinned {
            debug!(item = dragged_id, "refusing to drag pinned item");
            return None;
        }
        let (start_y, lane_origin_y) = (dragged.original_y, dragged.lane_origin_y);
        debug!(item = dragged_id, items = snapshot.len(), "drag started");
        Some(Self {
            dragged_id: dragged_id.to_string(),
            start_pointer_y: pointer_y,
            start_y,
            lane_origin_y,
            snapshot,
            config,
        })
    }

    pub fn dragged_id(&self) -> &str {
        &self.dragged_id
    }

    /// Unsnapped Y under the pointer.
    pub fn visual_y(&self, pointer_y: f64) -> f64 {
        self.start_y + (pointer_y - self.start_pointer_y)
    }

    /// Pointer Y snapped to the nearest row of the dragged item's lane.
    pub fn target_y(&self, pointer_y: f64) -> f64 {
        let spacing = self.config.row_spacing_px;
        let rows = ((self.visual_y(pointer_y) - self.lane_origin_y) / spacing).round();
        self.lane_origin_y + rows * spacing
    }

    /// Positions of every snapshotted item for the pointer at `pointer_y`.
    pub fn preview(&self, pointer_y: f64) -> BTreeMap<String, f64> {
        resolve_preview(
            &self.snapshot,
            &self.dragged_id,
            self.target_y(pointer_y),
            &self.config,
        )
    }

    /// Finish the drag with the pointer released at `pointer_y`.
    pub fn finish(self, pointer_y: f64) -> DragOutcome {
        if (pointer_y - self.start_pointer_y).abs() <= self.config.click_distance_px {
            debug!(item = %self.dragged_id, "drag cancelled below click distance");
            return DragOutcome::Cancelled;
        }

        let spacing = self.config.row_spacing_px;
        let positions = self.preview(pointer_y);
        let mut commit = DragCommit::default();
        for item in &self.snapshot {
            let Some(&y) = positions.get(&item.id) else {
                continue;
            };
            let moved = y - item.original_y;
            if moved.abs() > spacing / 2.0 || item.id == self.dragged_id {
                let rows = (moved / spacing).round() as i32;
                commit
                    .offsets
                    .insert(item.id.clone(), item.drag_offset_rows + rows);
            }
        }
        debug!(
            item = %self.dragged_id,
            moved = commit.offsets.len(),
            "drag committed"
        );
        DragOutcome::Committed(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SP: f64 = 35.0;

    fn snap(id: &str, row: i32, start: f64, end: f64) -> SnapshotItem {
        SnapshotItem {
            id: id.into(),
            original_y: f64::from(row) * SP,
            lane_origin_y: 0.0,
            range: YearRange::new(start, end),
            drag_offset_rows: 0,
            pinned: false,
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn dragged_item_lands_on_target() {
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0), snap("b", 2, 1900.0, 1950.0)];
        let preview = resolve_preview(&snapshot, "a", 2.0 * SP, &config());
        assert_eq!(preview["a"], 2.0 * SP);
        // No time overlap, so b stays.
        assert_eq!(preview["b"], 2.0 * SP);
    }

    #[test]
    fn colliding_item_moves_down_first() {
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0), snap("b", 2, 1820.0, 1870.0)];
        let preview = resolve_preview(&snapshot, "a", 2.0 * SP, &config());
        assert_eq!(preview["a"], 2.0 * SP);
        assert_eq!(preview["b"], 3.0 * SP);
    }

    #[test]
    fn displacement_cascades_downward() {
        let snapshot = vec![
            snap("a", 0, 1800.0, 1850.0),
            snap("b", 2, 1820.0, 1870.0),
            snap("c", 3, 1820.0, 1870.0),
        ];
        let preview = resolve_preview(&snapshot, "a", 2.0 * SP, &config());
        assert_eq!(preview["b"], 3.0 * SP);
        assert_eq!(preview["c"], 4.0 * SP);
    }

    #[test]
    fn colliding_item_moves_up_when_below_is_taken() {
        let mut pinned = snap("p", 3, 1820.0, 1870.0);
        pinned.pinned = true;
        let snapshot = vec![
            snap("a", 0, 1800.0, 1850.0),
            snap("b", 2, 1820.0, 1870.0),
            pinned,
        ];
        let preview = resolve_preview(&snapshot, "a", 2.0 * SP, &config());
        assert_eq!(preview["b"], SP);
        assert_eq!(preview["p"], 3.0 * SP);
    }

    #[test]
    fn pinned_item_never_moves() {
        let mut pinned = snap("p", 1, 1800.0, 1900.0);
        pinned.pinned = true;
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0), pinned];
        let preview = resolve_preview(&snapshot, "a", SP, &config());
        assert_eq!(preview["p"], SP);
        assert_eq!(preview["a"], SP);
    }

    #[test]
    fn others_avoid_pinned_items() {
        let mut pinned = snap("p", 1, 1800.0, 1900.0);
        pinned.pinned = true;
        let snapshot = vec![snap("a", 3, 1800.0, 1850.0), snap("b", 0, 1810.0, 1820.0), pinned];
        let preview = resolve_preview(&snapshot, "a", 0.0, &config());
        // b collides with a at row 0; row 1 is the pinned item, so b goes to 2.
        assert_eq!(preview["b"], 2.0 * SP);
    }

    #[test]
    fn search_exhaustion_keeps_original() {
        let config = LayoutConfig {
            max_search_steps: 0,
            ..LayoutConfig::default()
        };
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0), snap("b", 1, 1800.0, 1850.0)];
        let preview = resolve_preview(&snapshot, "a", SP, &config);
        assert_eq!(preview["b"], SP);
    }

    #[test]
    fn unknown_dragged_id_is_identity() {
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0)];
        let preview = resolve_preview(&snapshot, "missing", 5.0 * SP, &config());
        assert_eq!(preview["a"], 0.0);
    }

    #[test]
    fn session_snaps_to_lane_rows() {
        let mut a = snap("a", 0, 1800.0, 1850.0);
        a.lane_origin_y = 40.0;
        a.original_y = 40.0;
        let session = DragSession::start(vec![a], "a", 100.0, config()).unwrap();
        assert_eq!(session.dragged_id(), "a");
        // Pointer moved 50px: visual 90, nearest row is 1 (75).
        assert_eq!(session.target_y(150.0), 75.0);
        // Pointer moved 60px: visual 100, nearest row is 2 (110).
        assert_eq!(session.target_y(160.0), 110.0);
    }

    #[test]
    fn small_release_cancels() {
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0)];
        let session = DragSession::start(snapshot, "a", 10.0, config()).unwrap();
        assert_eq!(session.finish(12.0), DragOutcome::Cancelled);
    }

    #[test]
    fn finish_converts_moves_to_row_offsets() {
        let mut b = snap("b", 2, 1820.0, 1870.0);
        b.drag_offset_rows = 1;
        let snapshot = vec![snap("a", 0, 1800.0, 1850.0), b, snap("far", 5, 1000.0, 1010.0)];
        let session = DragSession::start(snapshot, "a", 0.0, config()).unwrap();
        let commit = match session.finish(2.0 * SP) {
            DragOutcome::Committed(commit) => commit,
            DragOutcome::Cancelled => DragCommit::default(),
        };
        assert_eq!(commit.offsets["a"], 2);
        assert_eq!(commit.offsets["b"], 2);
        assert!(!commit.offsets.contains_key("far"));
    }

    #[test]
    fn pinned_item_cannot_be_dragged() {
        let mut p = snap("p", 0, 1800.0, 1850.0);
        p.pinned = true;
        assert!(DragSession::start(vec![p], "p", 0.0, config()).is_none());
    }
}

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{LayoutConfig, TimelineItem, ViewContext};

use super::effective::effective_range;
use super::pack::RowOccupancy;

/// Close the vertical gaps that manual drags left in one lane, keeping the
/// top-to-bottom order the user arranged.
///
/// Items are visited by effective row (packed row plus drag offset), which
/// is the authoritative visual order, and re-packed first-fit with the same
/// non-overlap rule as [`pack`](super::pack::pack). An item is never placed
/// above an item that preceded it, so for any `a` drawn above `b` before
/// compaction, `a` is not drawn below `b` afterwards.
///
/// Pinned items keep their current row and block it for overlapping items;
/// hidden items are ignored.
///
/// Returns the new `drag_offset_rows` of every non-pinned visible item,
/// relative to its packed row. Zero means the offset can be cleared.
pub fn compact(
    lane_items: &[TimelineItem],
    view: &ViewContext,
    config: &LayoutConfig,
) -> BTreeMap<String, i32> {
    let mut order: Vec<&TimelineItem> = lane_items.iter().filter(|i| !i.hidden).collect();
    order.sort_by_key(|i| i.effective_row());

    let mut occupancy = RowOccupancy::default();
    for item in order.iter().filter(|i| i.pinned) {
        occupancy.place(pinned_row(item), effective_range(item, view, config));
    }

    let mut offsets = BTreeMap::new();
    let mut floor = 0usize;
    for item in order {
        if item.pinned {
            floor = floor.max(pinned_row(item));
            continue;
        }
        let range = effective_range(item, view, config);
        let row = occupancy.first_fit(&range, floor);
        occupancy.place(row, range);
        floor = row;

        let base_row = i64::from(item.row.unwrap_or(0));
        let offset = i32::try_from(row as i64 - base_row).unwrap_or(0);
        offsets.insert(item.id.clone(), offset);
    }

    debug!(
        items = lane_items.len(),
        rows = occupancy.len(),
        "compacted lane"
    );
    offsets
}

fn pinned_row(item: &TimelineItem) -> usize {
    usize::try_from(item.effective_row()).unwrap_or(0)
}

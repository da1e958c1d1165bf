use std::collections::HashMap;

use chronolane_protocol::{Category, Color};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Lane, LayoutConfig, TimelineItem, ViewContext};

use super::pack::{RowAssignment, pack};

/// Result of laying out every visible lane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    /// Visible lanes, top to bottom.
    pub lanes: Vec<Lane>,
    /// Packed row of every laid-out item (manually placed ones included).
    pub rows: RowAssignment,
    /// Height of all lanes together, in layout pixels.
    pub total_height: f64,
    pub row_spacing_px: f64,
    pub lane_header_px: f64,
}

impl TimelineLayout {
    pub fn lane(&self, category_id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.category_id == category_id)
    }

    pub fn row_of(&self, item_id: &str) -> Option<u32> {
        self.rows.get(item_id).copied()
    }

    /// Y of the item's packed row, ignoring any drag offset.
    pub fn base_y(&self, item: &TimelineItem) -> Option<f64> {
        let lane = self.lane(&item.category_id)?;
        let row = self.row_of(&item.id)?;
        Some(lane.origin_y(self.lane_header_px) + f64::from(row) * self.row_spacing_px)
    }

    /// Y at which the item is currently drawn: packed row plus drag offset,
    /// in unscaled layout pixels. The renderer multiplies by its vertical
    /// scale.
    pub fn effective_y(&self, item: &TimelineItem) -> Option<f64> {
        self.base_y(item)
            .map(|y| y + f64::from(item.drag_offset_rows) * self.row_spacing_px)
    }

    /// The lane whose vertical extent contains `y`.
    pub fn lane_at(&self, y: f64) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.contains_y(y))
    }
}

/// Pack every visible category lane and stack the lanes vertically.
///
/// Each lane gets the items whose `category_id` matches and that are not
/// hidden. A lane's height is its highest row times the row spacing plus
/// the lane margin, and its `base_y` is the summed height of the lanes
/// above it. Manually placed items keep their stored row.
pub fn layout_lanes(
    categories: &[Category],
    items: &[TimelineItem],
    view: &ViewContext,
    config: &LayoutConfig,
) -> TimelineLayout {
    let mut by_lane: HashMap<&str, Vec<TimelineItem>> = HashMap::new();
    for item in items.iter().filter(|i| !i.hidden) {
        by_lane
            .entry(item.category_id.as_str())
            .or_default()
            .push(item.clone());
    }

    let mut layout = TimelineLayout {
        row_spacing_px: config.row_spacing_px,
        lane_header_px: config.lane_header_px,
        ..TimelineLayout::default()
    };
    let mut current_y = 0.0;

    for category in categories.iter().filter(|c| c.visible) {
        let lane_items = by_lane.remove(category.id.as_str()).unwrap_or_default();
        let mut rows = pack(&lane_items, view, config);
        for item in lane_items.iter().filter(|i| i.manually_placed) {
            rows.insert(item.id.clone(), item.row.unwrap_or(0));
        }

        let max_row = lane_items
            .iter()
            .filter_map(|i| rows.get(&i.id))
            .copied()
            .max()
            .unwrap_or(0);
        let height = f64::from(max_row) * config.row_spacing_px + config.lane_margin_px;

        debug!(
            lane = %category.id,
            items = lane_items.len(),
            max_row,
            base_y = current_y,
            "laid out lane"
        );

        layout.lanes.push(Lane {
            category_id: category.id.clone(),
            name: category.name.clone(),
            color: Color::from_hex(&category.color),
            base_y: current_y,
            max_row,
            height,
            item_ids: lane_items.iter().map(|i| i.id.clone()).collect(),
        });
        layout.rows.extend(rows);
        current_y += height;
    }

    layout.total_height = current_y;
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn category(id: &str, visible: bool) -> Category {
        Category {
            id: id.into(),
            name: id.to_uppercase(),
            color: "#336699".into(),
            visible,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn lanes_stack_by_height() {
        let categories = vec![category("science", true), category("art", true)];
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)).in_category("science"),
            TimelineItem::person("b", 1820, Some(1860)).in_category("science"),
            TimelineItem::person("c", 1700, Some(1750)).in_category("art"),
        ];
        let config = LayoutConfig::default();
        let layout = layout_lanes(&categories, &items, &ViewContext::unscaled(2024), &config);

        assert_eq!(layout.lanes.len(), 2);
        let science = layout.lane("science").unwrap();
        assert_eq!(science.base_y, 0.0);
        assert_eq!(science.max_row, 1);
        assert_eq!(science.height, 135.0);
        let art = layout.lane("art").unwrap();
        assert_eq!(art.base_y, 135.0);
        assert_eq!(layout.total_height, 235.0);

        assert_eq!(layout.effective_y(&items[1]), Some(75.0));
        assert_eq!(layout.effective_y(&items[2]), Some(175.0));

        assert_eq!(layout.lane_at(0.0).map(|l| l.category_id.as_str()), Some("science"));
        assert_eq!(layout.lane_at(134.9).map(|l| l.category_id.as_str()), Some("science"));
        assert_eq!(layout.lane_at(135.0).map(|l| l.category_id.as_str()), Some("art"));
        assert_eq!(layout.lane_at(235.0), None);
        assert_eq!(layout.lane_at(-1.0), None);
    }

    #[test]
    fn hidden_categories_and_items_are_skipped() {
        let categories = vec![category("science", false), category("art", true)];
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)).in_category("science"),
            TimelineItem::person("b", 1800, Some(1850)).in_category("art").hidden(),
        ];
        let layout = layout_lanes(
            &categories,
            &items,
            &ViewContext::unscaled(2024),
            &LayoutConfig::default(),
        );
        assert_eq!(layout.lanes.len(), 1);
        assert!(layout.rows.is_empty());
        assert_eq!(layout.effective_y(&items[0]), None);
    }

    #[test]
    fn drag_offset_moves_effective_y() {
        let categories = vec![category("science", true)];
        let item = TimelineItem::person("a", 1800, Some(1850))
            .in_category("science")
            .with_drag_offset(2);
        let layout = layout_lanes(
            &categories,
            std::slice::from_ref(&item),
            &ViewContext::unscaled(2024),
            &LayoutConfig::default(),
        );
        assert_eq!(layout.base_y(&item), Some(40.0));
        assert_eq!(layout.effective_y(&item), Some(110.0));
    }

    #[test]
    fn manual_rows_count_toward_lane_height() {
        let categories = vec![category("science", true)];
        let items = vec![
            TimelineItem::person("m", 1800, Some(1850))
                .in_category("science")
                .placed_at(3),
        ];
        let layout = layout_lanes(
            &categories,
            &items,
            &ViewContext::unscaled(2024),
            &LayoutConfig::default(),
        );
        assert_eq!(layout.row_of("m"), Some(3));
        assert_eq!(layout.lanes[0].max_row, 3);
    }
}

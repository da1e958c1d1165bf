use std::collections::{BTreeMap, HashMap};

use chronolane_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::layout::TimelineLayout;
use crate::model::{Lane, LayoutConfig, TimelineItem, Year, ZoomState};

use super::time_axis::AXIS_HEIGHT;

const HEADER_FONT_SIZE: f64 = 12.0;
const LABEL_FONT_SIZE: f64 = 11.0;
/// Below this vertical scale labels would be unreadable.
const MIN_LABEL_SCALE: f64 = 0.3;
/// At or below this many visible years labels use the full name.
const FULL_NAME_RANGE: f64 = 400.0;
const MIN_BAR_WIDTH: f64 = 2.0;

/// Everything one render pass of the lane view reads.
#[derive(Debug, Clone, Copy)]
pub struct TimelineScene<'a> {
    pub layout: &'a TimelineLayout,
    pub items: &'a [TimelineItem],
    pub zoom: &'a ZoomState,
    pub config: &'a LayoutConfig,
    pub current_year: Year,
    /// Multiplies every layout Y; lets the user squeeze or stretch lanes.
    pub vertical_scale: f64,
    /// Drag preview positions (layout pixels) that replace the stored ones.
    pub overrides: Option<&'a BTreeMap<String, f64>>,
}

impl<'a> TimelineScene<'a> {
    pub fn new(
        layout: &'a TimelineLayout,
        items: &'a [TimelineItem],
        zoom: &'a ZoomState,
        config: &'a LayoutConfig,
        current_year: Year,
    ) -> Self {
        Self {
            layout,
            items,
            zoom,
            config,
            current_year,
            vertical_scale: 1.0,
            overrides: None,
        }
    }

    pub fn with_vertical_scale(mut self, vertical_scale: f64) -> Self {
        self.vertical_scale = vertical_scale;
        self
    }

    pub fn with_overrides(mut self, overrides: &'a BTreeMap<String, f64>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    fn year_to_x(&self, year: f64, width: f64) -> f64 {
        let range = f64::from(self.zoom.range());
        if range <= 0.0 {
            return 0.0;
        }
        (year - f64::from(self.zoom.start_year)) / range * width
    }

    /// Screen Y for a layout Y. `viewport.y` is the vertical scroll.
    fn screen_y(&self, layout_y: f64, viewport: &Viewport) -> f64 {
        AXIS_HEIGHT + layout_y * self.vertical_scale - viewport.y
    }

    fn labels_visible(&self) -> bool {
        let range = f64::from(self.zoom.range());
        range > 0.0
            && range <= self.config.label_year_range_threshold
            && self.vertical_scale >= MIN_LABEL_SCALE
    }

    fn bar_height(&self) -> f64 {
        (20.0 * self.vertical_scale).max(8.0)
    }

    fn dot_radius(&self) -> f64 {
        (8.0 * self.vertical_scale).max(4.0)
    }
}

/// Render every visible lane: background, header, then each item as a
/// bar (people, multi-year events) or a dot (single-year events), with
/// labels when zoomed in far enough.
///
/// Items are drawn at their effective Y (packed row plus drag offset), or
/// at their preview Y while a drag is in progress. Lanes and items outside
/// the viewport are culled.
pub fn render_timeline(scene: &TimelineScene<'_>, viewport: &Viewport) -> Vec<RenderCommand> {
    let by_id: HashMap<&str, &TimelineItem> =
        scene.items.iter().map(|i| (i.id.as_str(), i)).collect();
    let mut commands = Vec::with_capacity(scene.items.len() * 3 + scene.layout.lanes.len() * 4);

    for lane in &scene.layout.lanes {
        let top = scene.screen_y(lane.base_y, viewport);
        let height = lane.height * scene.vertical_scale;
        if top > viewport.height || top + height < 0.0 {
            continue;
        }

        commands.push(RenderCommand::BeginGroup {
            id: format!("lane:{}", lane.category_id),
            label: Some(lane.name.clone()),
        });
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, top, viewport.width, height),
            color: ThemeToken::LaneBackground,
            fill: None,
            border_color: Some(ThemeToken::LaneBorder),
            label: None,
            item_id: None,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(8.0, top + HEADER_FONT_SIZE + 4.0),
            text: lane.name.clone(),
            color: ThemeToken::LaneHeaderText,
            font_size: HEADER_FONT_SIZE,
            align: TextAlign::Left,
        });

        for id in &lane.item_ids {
            if let Some(item) = by_id.get(id.as_str()) {
                render_item(scene, lane, item, viewport, &mut commands);
            }
        }

        commands.push(RenderCommand::EndGroup);
    }

    commands
}

fn render_item(
    scene: &TimelineScene<'_>,
    lane: &Lane,
    item: &TimelineItem,
    viewport: &Viewport,
    out: &mut Vec<RenderCommand>,
) {
    let layout_y = scene
        .overrides
        .and_then(|o| o.get(&item.id).copied())
        .or_else(|| scene.layout.effective_y(item));
    let Some(layout_y) = layout_y else {
        return;
    };

    let (start, end) = item.time_span(scene.current_year);
    let x1 = scene.year_to_x(f64::from(start), viewport.width);
    let x2 = scene.year_to_x(f64::from(end), viewport.width);
    if x2 < 0.0 || x1 > viewport.width {
        return;
    }

    let y = scene.screen_y(layout_y, viewport);
    let bar_height = scene.bar_height();
    if y > viewport.height || y + bar_height < 0.0 {
        return;
    }

    let color = if item.pinned {
        ThemeToken::PinnedBar
    } else if item.kind.is_person() {
        ThemeToken::PersonBar
    } else {
        ThemeToken::EventBar
    };
    let label = label_text(scene, item);

    if item.kind.is_single_year() {
        out.push(RenderCommand::DrawCircle {
            center: Point::new(x1, y + bar_height / 2.0),
            radius: scene.dot_radius(),
            color: if item.pinned {
                ThemeToken::PinnedBar
            } else {
                ThemeToken::EventDot
            },
            fill: lane.color,
            label: Some(item.label.clone()),
            item_id: Some(item.id.clone()),
        });
    } else {
        out.push(RenderCommand::DrawRect {
            rect: Rect::new(x1, y, (x2 - x1).max(MIN_BAR_WIDTH), bar_height),
            color,
            fill: lane.color,
            border_color: item.pinned.then_some(ThemeToken::Border),
            label: Some(item.label.clone()),
            item_id: Some(item.id.clone()),
        });
    }

    if let Some(text) = label {
        let font_size = (LABEL_FONT_SIZE * scene.vertical_scale).clamp(8.0, LABEL_FONT_SIZE);
        out.push(RenderCommand::DrawText {
            position: Point::new((x1 + x2) / 2.0, y + bar_height / 2.0 + font_size / 3.0),
            text,
            color: ThemeToken::TextPrimary,
            font_size,
            align: TextAlign::Center,
        });
    }
}

/// The label drawn next to an item, if labels are shown at this zoom.
fn label_text(scene: &TimelineScene<'_>, item: &TimelineItem) -> Option<String> {
    if !scene.labels_visible() {
        return None;
    }
    let text = if f64::from(scene.zoom.range()) <= FULL_NAME_RANGE {
        item.label.as_str()
    } else {
        item.display_label()
    };
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_lanes;
    use crate::model::ViewContext;
    use chronolane_protocol::Category;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: "science".into(),
            name: "Science".into(),
            color: "#3366cc".into(),
            visible: true,
            extra: Default::default(),
        }]
    }

    fn items() -> Vec<TimelineItem> {
        vec![
            TimelineItem::person("curie", 1867, Some(1934))
                .in_category("science")
                .with_label("Marie Curie")
                .with_short_label("Curie"),
            TimelineItem::event("nobel", 1903, None)
                .in_category("science")
                .with_label("Nobel Prize"),
        ]
    }

    fn render(zoom: ZoomState, vertical_scale: f64) -> Vec<RenderCommand> {
        let config = LayoutConfig::default();
        let items = items();
        let view = ViewContext::unscaled(2024);
        let layout = layout_lanes(&categories(), &items, &view, &config);
        let scene = TimelineScene::new(&layout, &items, &zoom, &config, 2024)
            .with_vertical_scale(vertical_scale);
        render_timeline(&scene, &Viewport::new(1000.0, 600.0))
    }

    fn texts(cmds: &[RenderCommand]) -> Vec<String> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn person_bar_and_event_dot() {
        let cmds = render(ZoomState::new(1800, 2000), 1.0);
        let bar = cmds.iter().find_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                item_id: Some(id),
                fill,
                ..
            } if id == "curie" => Some((*rect, *fill)),
            _ => None,
        });
        let (rect, fill) = bar.unwrap();
        // 1867 is 67/200 of the way across.
        assert!((rect.x - 335.0).abs() < 1e-9);
        assert!((rect.w - 335.0).abs() < 1e-9);
        assert_eq!(rect.y, AXIS_HEIGHT + 40.0);
        assert_eq!(rect.h, 20.0);
        assert!(fill.is_some());

        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawCircle { item_id: Some(id), radius, .. } if id == "nobel" && *radius == 8.0
        )));
    }

    #[test]
    fn labels_follow_zoom() {
        let near = texts(&render(ZoomState::new(1800, 2000), 1.0));
        assert!(near.contains(&"Marie Curie".to_string()));

        let mid = texts(&render(ZoomState::new(1500, 2000), 1.0));
        assert!(mid.contains(&"Curie".to_string()));

        let far = texts(&render(ZoomState::new(0, 2000), 1.0));
        assert_eq!(far, vec!["Science".to_string()]);

        let squeezed = texts(&render(ZoomState::new(1800, 2000), 0.2));
        assert_eq!(squeezed, vec!["Science".to_string()]);
    }

    #[test]
    fn overrides_move_preview_items() {
        let config = LayoutConfig::default();
        let items = items();
        let zoom = ZoomState::new(1800, 2000);
        let layout = layout_lanes(&categories(), &items, &ViewContext::unscaled(2024), &config);
        let preview = BTreeMap::from([("curie".to_string(), 180.0)]);
        let scene = TimelineScene::new(&layout, &items, &zoom, &config, 2024)
            .with_overrides(&preview);
        let cmds = render_timeline(&scene, &Viewport::new(1000.0, 600.0));
        let y = cmds.iter().find_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                item_id: Some(id),
                ..
            } if id == "curie" => Some(rect.y),
            _ => None,
        });
        assert_eq!(y, Some(AXIS_HEIGHT + 180.0));
    }

    #[test]
    fn off_screen_items_are_culled() {
        let cmds = render(ZoomState::new(1950, 2000), 1.0);
        assert!(!cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawRect { item_id: Some(_), .. } | RenderCommand::DrawCircle { .. }
        )));
    }
}

use std::collections::BTreeMap;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use chronolane_core::{Timeline, ViewContext};
use chronolane_core::layout::{DragOutcome, DragSession, TimelineLayout};
use chronolane_core::persist::{DocumentStore, JsonFileStore};
use chronolane_core::views::{AXIS_HEIGHT, TimelineScene, render_timeline, render_year_axis};
use chronolane_protocol::{self as protocol, RenderCommand, ThemeToken};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
};
use tracing::{debug, warn};

/// Layout pixels covered by one terminal column.
const CELL_W: f64 = 8.0;
/// Layout pixels covered by one terminal line: half a row at the default
/// spacing, so bars sit on every other line.
const CELL_H: f64 = 17.5;
const SCROLL_STEP: f64 = 35.0;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::PersonBar => Color::Blue,
        ThemeToken::PinnedBar => Color::Yellow,
        ThemeToken::EventBar | ThemeToken::EventDot => Color::Red,
        ThemeToken::LaneBackground | ThemeToken::Background | ThemeToken::AxisBackground => {
            Color::Black
        }
        ThemeToken::LaneBorder | ThemeToken::Border | ThemeToken::GridLine => Color::DarkGray,
        ThemeToken::LaneHeaderText => Color::Cyan,
        ThemeToken::AxisTick | ThemeToken::TextMuted => Color::Gray,
        ThemeToken::AxisLabel | ThemeToken::TextPrimary => Color::White,
    }
}

fn fill_to_color(fill: Option<protocol::Color>, token: ThemeToken) -> Color {
    match fill {
        Some(c) if token != ThemeToken::PinnedBar => {
            let (r, g, b) = c.to_rgb8();
            Color::Rgb(r, g, b)
        }
        _ => theme_to_color(token),
    }
}

/// Terminal cell span `(col, line, width)` covered by a layout-pixel rect,
/// or `None` if it starts outside `area`.
fn to_cells(x: f64, y: f64, w: f64, area: Rect) -> Option<(u16, u16, u16)> {
    if x + w < 0.0 || y < 0.0 {
        return None;
    }
    let col = (x.max(0.0) / CELL_W) as u16;
    let line = (y / CELL_H) as u16;
    if col >= area.width || line >= area.height {
        return None;
    }
    let end = ((x + w) / CELL_W).ceil() as u16;
    let width = end.saturating_sub(col).max(1).min(area.width - col);
    Some((col, line, width))
}

fn put_str(buf: &mut Buffer, area: Rect, col: u16, line: u16, text: &str, fg: Color) {
    for (i, ch) in text.chars().enumerate() {
        let x = area.x + col + i as u16;
        if x >= area.x + area.width {
            break;
        }
        buf[(x, area.y + line)].set_char(ch).set_fg(fg);
    }
}

fn draw_commands(buf: &mut Buffer, area: Rect, cmds: &[RenderCommand]) {
    for cmd in cmds {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                fill,
                item_id: Some(_),
                ..
            } => {
                let Some((col, line, width)) = to_cells(rect.x, rect.y, rect.w, area) else {
                    continue;
                };
                let fg = fill_to_color(*fill, *color);
                for i in 0..width {
                    buf[(area.x + col + i, area.y + line)].set_char('█').set_fg(fg);
                }
            }
            RenderCommand::DrawCircle {
                center,
                color,
                fill,
                ..
            } => {
                if let Some((col, line, _)) = to_cells(center.x, center.y, 0.0, area) {
                    buf[(area.x + col, area.y + line)]
                        .set_char('●')
                        .set_fg(fill_to_color(*fill, *color));
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let chars = text.chars().count() as f64 * CELL_W;
                let x = match align {
                    protocol::TextAlign::Left => position.x,
                    protocol::TextAlign::Center => position.x - chars / 2.0,
                    protocol::TextAlign::Right => position.x - chars,
                };
                // Text baselines sit below the glyph; lift onto the bar line.
                let y = (position.y - CELL_H / 2.0).max(0.0);
                if let Some((col, line, _)) = to_cells(x, y, chars, area) {
                    put_str(buf, area, col, line, text, theme_to_color(*color));
                }
            }
            _ => {}
        }
    }
}

/// Id of the topmost item drawn under terminal cell `(col, line)`.
fn hit_test(cmds: &[RenderCommand], col: u16, line: u16, area: Rect) -> Option<String> {
    cmds.iter().rev().find_map(|cmd| match cmd {
        RenderCommand::DrawRect {
            rect,
            item_id: Some(id),
            ..
        } => {
            let (c, l, w) = to_cells(rect.x, rect.y, rect.w, area)?;
            (l == line && col >= c && col < c + w).then(|| id.clone())
        }
        RenderCommand::DrawCircle {
            center,
            item_id: Some(id),
            ..
        } => {
            let (c, l, _) = to_cells(center.x, center.y, 0.0, area)?;
            (l == line && col.abs_diff(c) <= 1).then(|| id.clone())
        }
        _ => None,
    })
}

/// Interactive state owned by the event loop.
struct ViewerState {
    scroll_y: f64,
    vertical_scale: f64,
    selected: Option<String>,
    /// Lane clicked on outside any item; `c` compacts only this lane.
    focused_lane: Option<String>,
    drag: Option<DragSession>,
    preview: Option<BTreeMap<String, f64>>,
    status: String,
}

impl ViewerState {
    /// Terminal line to layout Y (before vertical scale is applied).
    fn line_to_layout_y(&self, line: u16) -> f64 {
        let screen = f64::from(line) * CELL_H + CELL_H / 2.0;
        (screen - AXIS_HEIGHT + self.scroll_y) / self.vertical_scale
    }
}

/// Move `id` by `rows` rows through a full drag gesture.
fn nudge(
    timeline: &mut Timeline,
    layout: &TimelineLayout,
    view: &ViewContext,
    id: &str,
    rows: i32,
) -> String {
    let Some(item) = timeline.item(id) else {
        return format!("{id} is gone");
    };
    if item.effective_row() + i64::from(rows) < 0 {
        return "already at the top of its lane".into();
    }
    let Some(y) = layout.effective_y(&item) else {
        return format!("{id} is not laid out");
    };
    let Some(session) = timeline.begin_drag(layout, id, y, view) else {
        return format!("{id} is pinned");
    };
    let spacing = timeline.config().row_spacing_px;
    match session.finish(y + f64::from(rows) * spacing) {
        DragOutcome::Committed(commit) => {
            let moved = timeline.apply_drag(&commit);
            format!("moved {id}; {moved} item(s) updated")
        }
        DragOutcome::Cancelled => String::new(),
    }
}

pub fn run(timeline: &mut Timeline, store: &JsonFileStore, now: i32) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = ViewerState {
        scroll_y: 0.0,
        vertical_scale: 1.0,
        selected: None,
        focused_lane: None,
        drag: None,
        preview: None,
        status: String::new(),
    };

    loop {
        let term_size = terminal.size()?;
        let content_area = Rect::new(0, 1, term_size.width, term_size.height.saturating_sub(2));
        let viewport = protocol::Viewport {
            x: 0.0,
            y: state.scroll_y,
            width: f64::from(content_area.width) * CELL_W,
            height: f64::from(content_area.height) * CELL_H,
            dpr: 1.0,
        };

        let view = timeline.zoom().view_context(viewport.width).with_current_year(now);
        let layout = timeline.layout(&view);
        let items = timeline.items();
        let zoom = *timeline.zoom();
        let config = *timeline.config();

        let mut scene = TimelineScene::new(&layout, &items, &zoom, &config, now)
            .with_vertical_scale(state.vertical_scale);
        if let Some(preview) = &state.preview {
            scene = scene.with_overrides(preview);
        }
        let mut cmds = render_year_axis(
            &viewport,
            f64::from(zoom.start_year),
            f64::from(zoom.end_year),
            0.0,
        );
        cmds.extend(render_timeline(&scene, &viewport));

        let selected_label = state
            .selected
            .as_deref()
            .and_then(|id| items.iter().find(|i| i.id == id))
            .map(|i| i.label.clone())
            .unwrap_or_default();

        terminal.draw(|frame| {
            let area = frame.area();

            let header_area = Rect::new(0, 0, area.width, 1);
            let header = Block::default()
                .title(format!(
                    " chronolane {}..{} | ←→ pan | +/- zoom | ↑↓ scroll | [ ] scale | tab select | j/k move | p pin | h hide | c compact lane/all | s save | q quit ",
                    zoom.start_year, zoom.end_year
                ))
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, header_area);

            let block = Block::default()
                .borders(Borders::NONE)
                .style(Style::default().bg(Color::Black));
            frame.render_widget(block, content_area);
            draw_commands(frame.buffer_mut(), content_area, &cmds);

            let status_area = Rect::new(0, area.height.saturating_sub(1), area.width, 1);
            let status = Block::default()
                .title(format!(" {} {}", selected_label, state.status))
                .style(Style::default().fg(Color::Gray).bg(Color::Black));
            frame.render_widget(status, status_area);
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                state.status.clear();
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Left => timeline.zoom_mut().pan_left(),
                    KeyCode::Right => timeline.zoom_mut().pan_right(),
                    KeyCode::Char('+') | KeyCode::Char('=') => timeline.zoom_mut().zoom_in(),
                    KeyCode::Char('-') => timeline.zoom_mut().zoom_out(),
                    KeyCode::Up => state.scroll_y = (state.scroll_y - SCROLL_STEP).max(0.0),
                    KeyCode::Down => state.scroll_y += SCROLL_STEP,
                    KeyCode::Char('[') => {
                        state.vertical_scale = (state.vertical_scale - 0.1).max(0.2);
                    }
                    KeyCode::Char(']') => {
                        state.vertical_scale = (state.vertical_scale + 0.1).min(3.0);
                    }
                    KeyCode::Tab => {
                        let visible: Vec<&str> = layout
                            .lanes
                            .iter()
                            .flat_map(|l| l.item_ids.iter().map(String::as_str))
                            .collect();
                        let next = state
                            .selected
                            .as_deref()
                            .and_then(|id| visible.iter().position(|v| *v == id))
                            .map_or(0, |i| (i + 1) % visible.len().max(1));
                        state.selected = visible.get(next).map(|s| (*s).to_string());
                    }
                    KeyCode::Char(c @ ('j' | 'k')) => {
                        if let Some(id) = state.selected.clone() {
                            let rows = if c == 'j' { 1 } else { -1 };
                            state.status = nudge(timeline, &layout, &view, &id, rows);
                        }
                    }
                    KeyCode::Char('p') => {
                        if let Some(id) = &state.selected {
                            state.status = match timeline.toggle_pin(id) {
                                Ok(true) => "pinned".into(),
                                Ok(false) => "unpinned".into(),
                                Err(e) => e.to_string(),
                            };
                        }
                    }
                    KeyCode::Char('h') => {
                        if let Some(id) = state.selected.take() {
                            if let Err(e) = timeline.toggle_hidden(&id) {
                                state.status = e.to_string();
                            }
                        }
                    }
                    KeyCode::Char('c') => {
                        let changed = match &state.focused_lane {
                            Some(lane) => timeline.compact_lane(lane, &view),
                            None => timeline.compact_all(&view),
                        };
                        state.status = format!("compacted: {changed} offset(s) changed");
                    }
                    KeyCode::Char('r') => {
                        timeline.clear_drag_offsets();
                        state.status = "drag offsets cleared".into();
                    }
                    KeyCode::Char('s') => {
                        state.status = match store.save(&timeline.to_document()) {
                            Ok(stamp) => format!("saved {stamp}"),
                            Err(e) => {
                                warn!(error = %e, "save failed");
                                format!("save failed: {e}")
                            }
                        };
                    }
                    _ => {}
                }
            }
            Event::Mouse(mouse) => {
                let inside = mouse.row >= content_area.y
                    && mouse.row < content_area.y + content_area.height;
                let line = mouse.row.saturating_sub(content_area.y);
                match mouse.kind {
                    MouseEventKind::ScrollDown => state.scroll_y += SCROLL_STEP,
                    MouseEventKind::ScrollUp => {
                        state.scroll_y = (state.scroll_y - SCROLL_STEP).max(0.0);
                    }
                    MouseEventKind::Down(MouseButton::Left) if inside => {
                        let hit = hit_test(&cmds, mouse.column, line, content_area);
                        let pointer_y = state.line_to_layout_y(line);
                        match &hit {
                            Some(id) => {
                                state.drag = timeline.begin_drag(&layout, id, pointer_y, &view);
                            }
                            None => {
                                state.focused_lane =
                                    layout.lane_at(pointer_y).map(|l| l.category_id.clone());
                                state.status = match &state.focused_lane {
                                    Some(lane) => format!("lane {lane}"),
                                    None => String::new(),
                                };
                            }
                        }
                        state.selected = hit;
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        if let Some(session) = &state.drag {
                            state.preview = Some(session.preview(state.line_to_layout_y(line)));
                        }
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        state.preview = None;
                        if let Some(session) = state.drag.take() {
                            let dragged = session.dragged_id().to_string();
                            let outcome = session.finish(state.line_to_layout_y(line));
                            if let DragOutcome::Committed(commit) = outcome {
                                let moved = timeline.apply_drag(&commit);
                                debug!(moved, item = %dragged, "mouse drag committed");
                                state.status = format!("moved {dragged}; {moved} item(s) updated");
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

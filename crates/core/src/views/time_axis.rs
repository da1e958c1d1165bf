use chronolane_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

/// Height of the year ruler drawn above the lanes.
pub const AXIS_HEIGHT: f64 = 24.0;
const MAJOR_TICK_HEIGHT: f64 = 10.0;
const MINOR_TICK_HEIGHT: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const LABEL_Y: f64 = 12.0;
const MIN_MAJOR_SPACING_PX: f64 = 80.0;

/// Render a year ruler with major/minor ticks and labels.
///
/// `start_year` and `end_year` bound the visible window. Major ticks get a
/// label and a vertical gridline extending `grid_height` below the axis.
pub fn render_year_axis(
    viewport: &Viewport,
    start_year: f64,
    end_year: f64,
    grid_height: f64,
) -> Vec<RenderCommand> {
    let range = end_year - start_year;
    if range <= 0.0 || viewport.width <= 0.0 {
        return Vec::new();
    }

    let width = viewport.width;
    let x_scale = width / range;
    let mut commands = Vec::with_capacity(64);

    commands.push(RenderCommand::BeginGroup {
        id: "axis".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, AXIS_HEIGHT),
        color: ThemeToken::AxisBackground,
        fill: None,
        border_color: Some(ThemeToken::Border),
        label: None,
        item_id: None,
    });

    let (major, subdivisions) = nice_interval(range, width);
    let minor = major / f64::from(subdivisions);

    // Minor ticks first so major ticks draw over them.
    let mut year = (start_year / minor).ceil() * minor;
    while year <= end_year {
        if !is_multiple(year, major) {
            let x = (year - start_year) * x_scale;
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, AXIS_HEIGHT - MINOR_TICK_HEIGHT),
                to: Point::new(x, AXIS_HEIGHT),
                color: ThemeToken::AxisTick,
                width: 0.5,
            });
        }
        year += minor;
    }

    year = (start_year / major).ceil() * major;
    while year <= end_year {
        let x = (year - start_year) * x_scale;
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, AXIS_HEIGHT - MAJOR_TICK_HEIGHT),
            to: Point::new(x, AXIS_HEIGHT),
            color: ThemeToken::AxisTick,
            width: 1.0,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(x + 3.0, LABEL_Y),
            text: format_year(year.round() as i64),
            color: ThemeToken::AxisLabel,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
        if grid_height > 0.0 {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, AXIS_HEIGHT),
                to: Point::new(x, AXIS_HEIGHT + grid_height),
                color: ThemeToken::GridLine,
                width: 0.5,
            });
        }
        year += major;
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

fn is_multiple(year: f64, interval: f64) -> bool {
    let q = year / interval;
    (q - q.round()).abs() < 0.001
}

/// Choose a major tick interval in years for `range` years across
/// `width_px`. Returns (major_interval, subdivisions).
fn nice_interval(range: f64, width_px: f64) -> (f64, u32) {
    let target_count = (width_px / MIN_MAJOR_SPACING_PX).max(2.0);
    let raw = range / target_count;

    let nice_values: &[(f64, u32)] = &[
        (1.0, 1),
        (2.0, 2),
        (5.0, 5),
        (10.0, 2),
        (20.0, 2),
        (25.0, 5),
        (50.0, 5),
        (100.0, 2),
        (200.0, 2),
        (250.0, 5),
        (500.0, 5),
        (1_000.0, 2),
    ];
    for &(interval, subs) in nice_values {
        if interval >= raw {
            return (interval, subs);
        }
    }

    let magnitude = 10.0_f64.powf(raw.log10().ceil());
    (magnitude, 2)
}

/// Year label; years before 1 are written as BCE.
pub fn format_year(year: i64) -> String {
    if year < 0 {
        format!("{} BCE", -year)
    } else {
        year.to_string()
    }
}

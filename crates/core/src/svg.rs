//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use chronolane_protocol::{Color, RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette. Category colors carried in a
/// command's `fill` win over the theme color.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif;font-size:11px">"#,
    ));
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        resolve_color(ThemeToken::Background, dark),
    ));

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                fill,
                border_color,
                label,
                ..
            } => {
                let paint = paint(*color, *fill, dark);
                let stroke = border_color
                    .map(|b| format!(r#" stroke="{}""#, resolve_color(b, dark)))
                    .unwrap_or_default();
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{paint}"{stroke} rx="2">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");
            }
            RenderCommand::DrawCircle {
                center,
                radius,
                color,
                fill,
                label,
                ..
            } => {
                let paint = paint(*color, *fill, dark);
                svg.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="{radius}" fill="{paint}">"#,
                    center.x, center.y,
                ));
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</circle>");
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn paint(token: ThemeToken, fill: Option<Color>, dark: bool) -> String {
    match fill {
        Some(color) if token != ThemeToken::PinnedBar => {
            let (r, g, b) = color.to_rgb8();
            format!("#{r:02x}{g:02x}{b:02x}")
        }
        _ => resolve_color(token, dark).to_string(),
    }
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::PersonBar => "#5c8dd6",
            ThemeToken::PinnedBar => "#ffb74d",
            ThemeToken::EventBar | ThemeToken::EventDot => "#e57373",
            ThemeToken::LaneBackground => "#202020",
            ThemeToken::LaneBorder | ThemeToken::Border => "#303030",
            ThemeToken::LaneHeaderText | ThemeToken::TextPrimary | ThemeToken::AxisLabel => {
                "#ececec"
            }
            ThemeToken::TextMuted | ThemeToken::AxisTick => "#9e9e9e",
            ThemeToken::GridLine => "#2a2a2a",
            ThemeToken::AxisBackground | ThemeToken::Background => "#181818",
        }
    } else {
        match token {
            ThemeToken::PersonBar => "#457b9d",
            ThemeToken::PinnedBar => "#e67e22",
            ThemeToken::EventBar | ThemeToken::EventDot => "#e63946",
            ThemeToken::LaneBackground => "#f8f9fa",
            ThemeToken::LaneBorder | ThemeToken::Border => "#dee2e6",
            ThemeToken::LaneHeaderText | ThemeToken::TextPrimary | ThemeToken::AxisLabel => {
                "#1a1a2e"
            }
            ThemeToken::TextMuted | ThemeToken::AxisTick => "#666677",
            ThemeToken::GridLine => "#eeeeee",
            ThemeToken::AxisBackground | ThemeToken::Background => "#ffffff",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

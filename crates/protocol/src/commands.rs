use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Color, Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` per layout pass. Renderers consume
/// this list sequentially; each command carries all the data it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle (a person's life span or a multi-year event).
    /// `fill` overrides the theme color with the lane's category color.
    /// `item_id` identifies the timeline item for hit-testing and dragging.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        fill: Option<Color>,
        border_color: Option<ThemeToken>,
        label: Option<String>,
        item_id: Option<String>,
    },

    /// Draw a filled circle (a single-year event).
    DrawCircle {
        center: Point,
        radius: f64,
        color: ThemeToken,
        fill: Option<Color>,
        label: Option<String>,
        item_id: Option<String>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Begin a logical group (a category lane, the axis). Renderers may use
    /// this for batching or layer separation.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    PersonBar,
    PinnedBar,
    EventBar,
    EventDot,

    LaneBackground,
    LaneBorder,
    LaneHeaderText,

    AxisBackground,
    AxisTick,
    AxisLabel,
    GridLine,

    TextPrimary,
    TextMuted,

    Background,
    Border,
}

//! The layout engine: row packing, lane stacking, interactive drag
//! resolution, and compaction.
//!
//! Everything here is a pure function of its input snapshot. Results are
//! returned as new values (row assignments, positions, offsets) and written
//! back by the caller.

pub mod compact;
pub mod drag;
pub mod effective;
pub mod lanes;
pub mod overlap;
pub mod pack;

pub use compact::compact;
pub use drag::{
    DragCommit, DragOutcome, DragSession, SnapshotItem, capture_snapshot, resolve_preview,
};
pub use effective::{effective_range, label_width_px};
pub use lanes::{TimelineLayout, layout_lanes};
pub use overlap::{YearRange, overlaps};
pub use pack::{RowAssignment, apply_rows, pack};

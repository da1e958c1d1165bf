//! Views turn a laid-out timeline into `RenderCommand` lists.

pub mod time_axis;
pub mod timeline;

pub use time_axis::{AXIS_HEIGHT, format_year, render_year_axis};
pub use timeline::{TimelineScene, render_timeline};

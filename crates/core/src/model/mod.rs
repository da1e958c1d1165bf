pub mod config;
pub mod item;
pub mod lane;
pub mod zoom;

pub use config::{LayoutConfig, ViewContext, current_year};
pub use item::{EVENTS_CATEGORY, ItemKind, TimelineItem, UNCATEGORIZED, Year};
pub use lane::Lane;
pub use zoom::ZoomState;

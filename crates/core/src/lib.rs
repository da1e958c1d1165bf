//! Layout and collision resolution for a category-laned timeline of people
//! and events.
//!
//! ```text
//!   TimelineDocument ─▶ Timeline (store) ─▶ TimelineItem[] ─▶ layout::pack ─▶ TimelineLayout
//!                                                                 │                 │
//!                                             layout::drag / layout::compact        ▼
//!                                                                         views ─▶ RenderCommand[]
//! ```

pub mod layout;
pub mod model;
pub mod persist;
pub mod store;
pub mod svg;
pub mod views;

pub use layout::{TimelineLayout, pack};
pub use model::{ItemKind, LayoutConfig, TimelineItem, ViewContext, Year};
pub use store::Timeline;

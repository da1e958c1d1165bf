pub mod commands;
pub mod document;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use document::{
    Category, EventRecord, Metadata, PersonRecord, Position, TimelineDocument, Visibility,
};
pub use theme::ThemeToken;
pub use types::{Color, Point, Rect, Viewport};

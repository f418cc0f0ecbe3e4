/// Cursor over the characters of a [`Text`].
pub mod cursor;
/// The text source and its font.
pub mod data;
/// Auto-fit font sizing for polygons.
pub mod fit;
/// Glyph placement along segments.
pub mod flow;

pub use cursor::{CursorStep, TextCursor};
pub use data::Text;
pub use fit::auto_fit_size;
pub use flow::GlyphPlacement;

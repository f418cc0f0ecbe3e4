pub mod command;
pub mod style;

pub use command::{
    Coord, ContextValue, DrawingInstruction, ImageAdjust, ImageOptions, PainterCommand,
    PolygonEnd,
};
pub use style::process_style;

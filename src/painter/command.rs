use serde::{Deserialize, Serialize};

use crate::font::PathCommand;
use crate::geometry::{Extent, Point, Transform};

/// `[x, y]` as it travels to the host.
pub type Coord = [f64; 2];

fn coord(p: Point) -> Coord {
    [p.x, p.y]
}

/// One replayable operation of the host canvas renderer.
///
/// A frame is an ordered log of these; the host replays them as they come.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PainterCommand {
    Save,
    Restore,
    Clear,
    ClearRect {
        rect: [f64; 4],
    },
    Set {
        key: String,
        value: ContextValue,
    },
    Line {
        coordinates: Vec<Coord>,
    },
    Polygon {
        coordinates: Vec<Vec<Coord>>,
        ends: Vec<PolygonEnd>,
    },
    Image {
        coordinates: Vec<Vec<Coord>>,
        extent: [f64; 4],
        options: ImageOptions,
    },
    ApplyTexture {
        id: String,
    },
    StartTexture {
        id: String,
    },
    EndTexture,
    Instructions {
        instructions: Vec<DrawingInstruction>,
    },
}

/// Path-level drawing operation carried inside [`PainterCommand::Instructions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawingInstruction {
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadraticCurveTo { cx: f64, cy: f64, x: f64, y: f64 },
    BezierCurveTo { c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64 },
    ClosePath,
    Fill,
    Stroke,
}

impl DrawingInstruction {
    /// Maps one outline primitive through `transform`.
    pub fn from_path(cmd: &PathCommand, transform: &Transform) -> Self {
        match cmd.map(|p| transform.apply(p)) {
            PathCommand::MoveTo(p) => Self::MoveTo { x: p.x, y: p.y },
            PathCommand::LineTo(p) => Self::LineTo { x: p.x, y: p.y },
            PathCommand::QuadTo(c, p) => Self::QuadraticCurveTo {
                cx: c.x,
                cy: c.y,
                x: p.x,
                y: p.y,
            },
            PathCommand::CurveTo(c1, c2, p) => Self::BezierCurveTo {
                c1x: c1.x,
                c1y: c1.y,
                c2x: c2.x,
                c2y: c2.y,
                x: p.x,
                y: p.y,
            },
            PathCommand::Close => Self::ClosePath,
        }
    }
}

/// Value assigned to a canvas context property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
    Flag(bool),
}

/// What the host does with a polygon path once it is traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolygonEnd {
    ClosePath,
    Fill,
    Stroke,
    Clip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageAdjust {
    #[default]
    None,
    Fit,
    Cover,
}

impl ImageAdjust {
    /// Reads `params.adjust`; unknown values fall back to the default.
    pub fn parse(s: &str) -> Self {
        match s {
            "fit" => Self::Fit,
            "cover" => Self::Cover,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub image: String,
    pub clip: bool,
    pub adjust: ImageAdjust,
    pub rotation: Option<f64>,
}

/// Builders from geometry types.
impl PainterCommand {
    /// `Set` of one context property.
    pub fn set(key: impl Into<String>, value: ContextValue) -> Self {
        Self::Set {
            key: key.into(),
            value,
        }
    }

    /// `ClearRect` over `ext`.
    pub fn clear_rect(ext: &Extent) -> Self {
        Self::ClearRect {
            rect: extent_array(ext),
        }
    }

    /// Open polyline through `points`.
    pub fn line(points: &[Point]) -> Self {
        Self::Line {
            coordinates: points.iter().copied().map(coord).collect(),
        }
    }

    /// Polygon of `rings`, finished by `ends`.
    pub fn polygon(rings: &[Vec<Point>], ends: Vec<PolygonEnd>) -> Self {
        Self::Polygon {
            coordinates: rings_to_coords(rings),
            ends,
        }
    }

    /// Image drawn into `ext` and clipped to `rings`.
    pub fn image(rings: &[Vec<Point>], ext: &Extent, options: ImageOptions) -> Self {
        Self::Image {
            coordinates: rings_to_coords(rings),
            extent: extent_array(ext),
            options,
        }
    }

    /// Fills the current clip with pattern `id`.
    pub fn apply_texture(id: impl Into<String>) -> Self {
        Self::ApplyTexture { id: id.into() }
    }

    /// Opens the recording of pattern `id`.
    pub fn start_texture(id: impl Into<String>) -> Self {
        Self::StartTexture { id: id.into() }
    }

    /// Batch of low-level path instructions.
    pub fn instructions(instructions: Vec<DrawingInstruction>) -> Self {
        Self::Instructions { instructions }
    }
}

fn rings_to_coords(rings: &[Vec<Point>]) -> Vec<Vec<Coord>> {
    rings
        .iter()
        .map(|r| r.iter().copied().map(coord).collect())
        .collect()
}

/// `[min_x, min_y, max_x, max_y]`
fn extent_array(ext: &Extent) -> [f64; 4] {
    [ext.min.x, ext.min.y, ext.max.x, ext.max.y]
}

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::FontError;
use crate::geometry::Point;

/// One primitive of a glyph outline, in font units (Y axis up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CurveTo(Point, Point, Point),
    Close,
}

impl PathCommand {
    /// Applies `f` to every point of the command.
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Self {
        match *self {
            Self::MoveTo(p) => Self::MoveTo(f(p)),
            Self::LineTo(p) => Self::LineTo(f(p)),
            Self::QuadTo(c, p) => Self::QuadTo(f(c), f(p)),
            Self::CurveTo(c1, c2, p) => Self::CurveTo(f(c1), f(c2), f(p)),
            Self::Close => Self::Close,
        }
    }
}

/// A glyph as seen by the text flow: how far it advances and what it looks like.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Advance width in font units.
    pub advance_width: f64,
    pub outline: Vec<PathCommand>,
}

/// Font metrics provider consumed by the layout code.
///
/// `glyphs_for` may return several glyphs for one character (ligature
/// decomposition) or none at all.
pub trait FontHandle: Send + Sync {
    fn units_per_em(&self) -> f64;

    fn glyphs_for(&self, text: &str) -> Vec<Glyph>;

    /// Family name used in log messages.
    fn family(&self) -> Option<&str> {
        None
    }
}

/// TrueType / OpenType font backed by `ttf-parser`.
///
/// Glyphs are cached per character. The face is parsed again only when a
/// lookup meets a character not seen before, which keeps the handle free
/// of self-references.
pub struct OutlineFont {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: f64,
    family: Option<String>,
    glyphs: Mutex<GlyphCache>,
}

type GlyphCache = HashMap<char, Glyph, fxhash::FxBuildHasher>;

/// Glyphs for `text` from `cache`, calling `load` once with every missing
/// character. `load` returns `false` when it could not fill them in.
fn cached_glyphs(
    cache: &mut GlyphCache,
    text: &str,
    load: impl FnOnce(&mut GlyphCache, &[char]) -> bool,
) -> Vec<Glyph> {
    let mut missing: Vec<char> = text.chars().filter(|ch| !cache.contains_key(ch)).collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        if !load(cache, &missing) {
            return Vec::new();
        }
    }
    text.chars().filter_map(|ch| cache.get(&ch).cloned()).collect()
}

impl OutlineFont {
    /// Validates `data` as the face at `index` and records its metrics.
    pub fn from_bytes(data: Arc<Vec<u8>>, index: u32) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(data.as_slice(), index)?;
        let units_per_em = face.units_per_em() as f64;
        Ok(Self {
            data,
            index,
            units_per_em,
            family: None,
            glyphs: Mutex::new(HashMap::default()),
        })
    }

    /// Names the family shown in log messages.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Index of the face inside its collection.
    pub fn face_index(&self) -> u32 {
        self.index
    }
}

impl FontHandle for OutlineFont {
    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn glyphs_for(&self, text: &str) -> Vec<Glyph> {
        let mut cache = self.glyphs.lock();
        cached_glyphs(&mut cache, text, |cache, missing| {
            let face = match ttf_parser::Face::parse(self.data.as_slice(), self.index) {
                Ok(face) => face,
                Err(e) => {
                    log::error!("Font data became unreadable: {}", e);
                    return false;
                }
            };
            for &ch in missing {
                cache.insert(ch, outline_glyph(&face, ch));
            }
            true
        })
    }

    fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

fn outline_glyph(face: &ttf_parser::Face<'_>, ch: char) -> Glyph {
    // unmapped characters fall back to .notdef
    let id = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
    let advance_width = face.glyph_hor_advance(id).unwrap_or(0) as f64;
    let mut sink = OutlineSink::default();
    face.outline_glyph(id, &mut sink);
    Glyph {
        advance_width,
        outline: sink.commands,
    }
}

#[derive(Default)]
struct OutlineSink {
    commands: Vec<PathCommand>,
}

impl ttf_parser::OutlineBuilder for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo(pt(x, y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo(pt(x, y)));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.commands
            .push(PathCommand::QuadTo(pt(x1, y1), pt(x, y)));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.commands
            .push(PathCommand::CurveTo(pt(x1, y1), pt(x2, y2), pt(x, y)));
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }
}

fn pt(x: f32, y: f32) -> Point {
    Point::new(x as f64, y as f64)
}

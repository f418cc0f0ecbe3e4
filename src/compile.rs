//! Feature → painter commands.
//!
//! Each drawable feature compiles to one style scope: `Save`, its style
//! `Set`s, the drawing commands, `Restore`. A feature that ends up drawing
//! nothing (a point, an off-scale line, text without a font) compiles to no
//! commands at all.

use serde_json::Value;

use crate::config::WorkerConfig;
use crate::feature::{Feature, Geometry};
use crate::font_storage::FontSet;
use crate::geometry::{Extent, Point, Polygon, Segment, Transform, extent_of};
use crate::painter::{
    DrawingInstruction, ImageAdjust, ImageOptions, PainterCommand, PolygonEnd, process_style,
};
use crate::properties::{get_parameter, param_bool, param_f64, param_str};
use crate::scanline::writable_segments;
use crate::text::{GlyphPlacement, Text, auto_fit_size};
use crate::texture::TextureCache;

/// Everything a frame shares across its features.
pub struct FrameContext<'a> {
    pub transform: &'a Transform,
    /// The frame extent in screen units.
    pub viewport: &'a Extent,
    pub fonts: &'a FontSet,
    pub config: &'a WorkerConfig,
    pub textures: &'a mut TextureCache,
}

/// Commands for one feature, wrapped in its style scope; empty when it draws nothing.
pub fn compile_feature(feature: &Feature, ctx: &mut FrameContext<'_>) -> Vec<PainterCommand> {
    let props = &feature.properties;
    let body = match &feature.geometry {
        Geometry::LineString(_) => compile_line(feature, ctx),
        Geometry::Polygon(_) => compile_polygon(feature, ctx),
        Geometry::Point(_) => Vec::new(),
    };
    if body.is_empty() {
        return body;
    }

    let mut commands = Vec::with_capacity(body.len() + 4);
    process_style(&mut commands, props, ctx.transform);
    commands.extend(body);
    commands.push(PainterCommand::Restore);
    commands
}

/// `params.text` as a string; numbers are accepted too.
fn text_param(props: &Value) -> Option<String> {
    match get_parameter(props, "text")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text for `feature` with its font, or `None` when the font did not resolve.
fn feature_text(feature: &Feature, source: String, ctx: &FrameContext<'_>) -> Option<Text> {
    let url = feature
        .font_url()
        .unwrap_or(ctx.config.default_font_url.as_str());
    match ctx.fonts.get(url) {
        Some(font) => Some(Text::new(source, Some(font))),
        None => {
            log::debug!("No font {} for feature {}, skipping its text", url, feature.id);
            None
        }
    }
}

fn font_size_param(props: &Value) -> Option<f64> {
    param_f64(props, "fontsize").filter(|fs| *fs > 0.0)
}

fn compile_line(feature: &Feature, ctx: &mut FrameContext<'_>) -> Vec<PainterCommand> {
    let points = feature.line_points();

    if let Some(source) = text_param(&feature.properties) {
        let Some(text) = feature_text(feature, source, ctx) else {
            return Vec::new();
        };
        let font_size =
            font_size_param(&feature.properties).unwrap_or(ctx.config.line_font_size);
        let instructions = draw_text_on_line(ctx.transform, &points, &text, font_size);
        return instructions_command(instructions);
    }

    let screen = ctx.transform.apply_all(&points);
    let Some(ext) = extent_of(&screen) else {
        return Vec::new();
    };
    let min = ctx.config.min_screen_extent;
    if ext.height() > min || ext.width() > min {
        vec![PainterCommand::line(&screen)]
    } else {
        Vec::new()
    }
}

fn compile_polygon(feature: &Feature, ctx: &mut FrameContext<'_>) -> Vec<PainterCommand> {
    let Some(polygon) = feature.polygon() else {
        return Vec::new();
    };
    let props = &feature.properties;

    if let Some(image) = param_str(props, "image").filter(|s| !s.is_empty()) {
        return image_polygon(&polygon, image, props, ctx);
    }

    if let Some(source) = text_param(props) {
        let Some(text) = feature_text(feature, source, ctx) else {
            return Vec::new();
        };
        let lhf = ctx.config.line_height_factor;
        let font_size = match font_size_param(props) {
            Some(fs) => fs,
            None => auto_fit_size(&polygon, &text, lhf, &ctx.config.fit),
        };
        let instructions = draw_text_in_polygon(ctx.transform, &polygon, &text, font_size, lhf);
        return instructions_command(instructions);
    }

    hatched_polygon(&polygon, props, ctx)
}

fn image_polygon(
    polygon: &Polygon,
    image: &str,
    props: &Value,
    ctx: &FrameContext<'_>,
) -> Vec<PainterCommand> {
    let rings = transform_rings(ctx.transform, polygon);
    let Some(ext) = extent_of(rings.iter().flatten()) else {
        return Vec::new();
    };
    let options = ImageOptions {
        image: image.to_string(),
        clip: param_bool(props, "clip").unwrap_or(true),
        adjust: param_str(props, "adjust")
            .map(ImageAdjust::parse)
            .unwrap_or_default(),
        rotation: param_f64(props, "rotation"),
    };
    vec![PainterCommand::image(&rings, &ext, options)]
}

fn hatched_polygon(
    polygon: &Polygon,
    props: &Value,
    ctx: &mut FrameContext<'_>,
) -> Vec<PainterCommand> {
    let rings = transform_rings(ctx.transform, polygon);
    let Some(ext) = extent_of(rings.iter().flatten()) else {
        return Vec::new();
    };
    let min = ctx.config.min_screen_extent;
    if ext.height() < min || ext.width() < min {
        return Vec::new();
    }

    let mut commands = Vec::new();
    let (key, satisfied) = ctx.textures.key(props, ctx.viewport, &ext, ctx.transform);
    if !satisfied {
        commands.extend(ctx.textures.ensure(&key, props, ctx.viewport, &ext, ctx.transform));
    }
    commands.push(PainterCommand::Save);
    commands.push(PainterCommand::polygon(&rings, vec![PolygonEnd::Clip]));
    commands.push(PainterCommand::apply_texture(key));
    commands.push(PainterCommand::Restore);
    commands
}

fn transform_rings(transform: &Transform, polygon: &Polygon) -> Vec<Vec<Point>> {
    polygon
        .rings
        .iter()
        .map(|ring| transform.apply_all(ring))
        .collect()
}

fn instructions_command(instructions: Vec<DrawingInstruction>) -> Vec<PainterCommand> {
    if instructions.is_empty() {
        Vec::new()
    } else {
        vec![PainterCommand::instructions(instructions)]
    }
}

/// `BeginPath`, the outline through `transform`, `Fill`.
fn push_glyph(out: &mut Vec<DrawingInstruction>, glyph: &GlyphPlacement, transform: &Transform) {
    out.push(DrawingInstruction::BeginPath);
    out.extend(
        glyph
            .outline
            .iter()
            .map(|cmd| DrawingInstruction::from_path(cmd, transform)),
    );
    out.push(DrawingInstruction::Fill);
}

/// Fills `polygon` band by band with `text` at `font_size`.
///
/// Bands are `font_size * line_height_factor` apart, top to bottom; the text
/// stops where it ends or where the polygon does.
pub fn draw_text_in_polygon(
    transform: &Transform,
    polygon: &Polygon,
    text: &Text,
    font_size: f64,
    line_height_factor: f64,
) -> Vec<DrawingInstruction> {
    let line_height = font_size * line_height_factor;
    let mut instructions = Vec::new();
    let mut cursor = Some(text.cursor());
    let mut band = 0;

    while let Some(segments) = writable_segments(polygon, line_height, band) {
        let Some(current) = cursor else {
            break;
        };
        if !segments.is_empty() {
            let (next, glyphs) = text.draw(font_size, &segments, current, false);
            for glyph in &glyphs {
                push_glyph(&mut instructions, glyph, transform);
            }
            cursor = next;
        }
        band += 1;
    }
    instructions
}

/// Lays `text` along the polyline `points`, each glyph turned to follow
/// the segment it sits on.
pub fn draw_text_on_line(
    transform: &Transform,
    points: &[Point],
    text: &Text,
    font_size: f64,
) -> Vec<DrawingInstruction> {
    let segments: Vec<Segment> = points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .collect();
    let (_, glyphs) = text.draw(font_size, &segments, text.cursor(), true);

    let mut instructions = Vec::new();
    for glyph in &glyphs {
        let glyph_transform = transform.rotate_around(glyph.segment.angle(), glyph.position);
        push_glyph(&mut instructions, glyph, &glyph_transform);
    }
    instructions
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::SquareFont;
    use crate::font_storage::FontStorage;
    use serde_json::json;

    struct Fixture {
        fonts: FontSet,
        config: WorkerConfig,
        textures: TextureCache,
        transform: Transform,
        viewport: Extent,
    }

    impl Fixture {
        fn new(transform: Transform) -> Self {
            let config = WorkerConfig::default();
            let mut storage = FontStorage::new();
            storage.insert(config.default_font_url.clone(), SquareFont::new(1000.0, 500.0));
            let viewport = transform.apply_extent(&Extent::new(
                Point::new(0.0, 0.0),
                Point::new(100.0, 100.0),
            ));
            Self {
                fonts: storage.snapshot([config.default_font_url.as_str()]),
                config,
                textures: TextureCache::default(),
                transform,
                viewport,
            }
        }

        fn compile(&mut self, feature: &Feature) -> Vec<PainterCommand> {
            let mut ctx = FrameContext {
                transform: &self.transform,
                viewport: &self.viewport,
                fonts: &self.fonts,
                config: &self.config,
                textures: &mut self.textures,
            };
            compile_feature(feature, &mut ctx)
        }
    }

    fn square(side: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [side, 0.0],
            [side, side],
            [0.0, side],
            [0.0, 0.0],
        ]])
    }

    fn instruction_count(cmds: &[PainterCommand], wanted: &DrawingInstruction) -> usize {
        cmds.iter()
            .filter_map(|c| match c {
                PainterCommand::Instructions { instructions } => Some(instructions),
                _ => None,
            })
            .flatten()
            .filter(|i| *i == wanted)
            .count()
    }

    #[test]
    fn line_is_transformed_and_scoped() {
        let mut fx = Fixture::new(Transform::scaling(2.0, 2.0));
        let feature = Feature::new(
            "l",
            Geometry::LineString(vec![[0.0, 0.0], [10.0, 0.0]]),
            json!({ "style": { "lineWidth": 3 } }),
        );
        let cmds = fx.compile(&feature);
        assert_eq!(
            cmds,
            vec![
                PainterCommand::Save,
                PainterCommand::set("lineWidth", crate::painter::ContextValue::Number(6.0)),
                PainterCommand::Line {
                    coordinates: vec![[0.0, 0.0], [20.0, 0.0]]
                },
                PainterCommand::Restore,
            ]
        );
    }

    #[test]
    fn sub_pixel_line_is_dropped() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new(
            "l",
            Geometry::LineString(vec![[0.0, 0.0], [0.5, 0.5]]),
            Value::Null,
        );
        assert!(fx.compile(&feature).is_empty());
    }

    #[test]
    fn points_compile_to_nothing() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new("p", Geometry::Point([1.0, 1.0]), Value::Null);
        assert!(fx.compile(&feature).is_empty());
    }

    #[test]
    fn image_polygon_carries_options() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new(
            "i",
            square(10.0),
            json!({ "params": { "image": "img/a.png", "adjust": "cover", "clip": false } }),
        );
        let cmds = fx.compile(&feature);
        let Some(PainterCommand::Image { extent, options, .. }) = cmds.get(1) else {
            panic!("expected an image, got {:?}", cmds);
        };
        assert_eq!(*extent, [0.0, 0.0, 10.0, 10.0]);
        assert_eq!(options.image, "img/a.png");
        assert_eq!(options.adjust, ImageAdjust::Cover);
        assert!(!options.clip);
        assert_eq!(options.rotation, None);
    }

    #[test]
    fn hatched_polygon_sends_texture_once_per_frame() {
        let mut fx = Fixture::new(Transform::identity());
        let a = Feature::new("a", square(10.0), Value::Null);
        let b = Feature::new("b", square(10.0), Value::Null);

        let first = fx.compile(&a);
        let second = fx.compile(&b);
        let starts = |cmds: &[PainterCommand]| {
            cmds.iter()
                .filter(|c| matches!(c, PainterCommand::StartTexture { .. }))
                .count()
        };
        assert_eq!(starts(&first), 1);
        assert_eq!(starts(&second), 0);

        let n = second.len();
        assert!(matches!(
            &second[n - 5..n - 1],
            [
                PainterCommand::Save,
                PainterCommand::Polygon { .. },
                PainterCommand::ApplyTexture { .. },
                PainterCommand::Restore,
            ]
        ));
        assert_eq!(second[n - 1], PainterCommand::Restore);

        fx.textures.clear_index();
        assert_eq!(starts(&fx.compile(&b)), 1);
        assert_eq!(fx.textures.generation_count(), 1);
    }

    #[test]
    fn tiny_hatched_polygon_is_skipped() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new("t", square(0.5), Value::Null);
        assert!(fx.compile(&feature).is_empty());
    }

    #[test]
    fn polygon_text_with_fixed_size() {
        let mut fx = Fixture::new(Transform::identity());
        // size 10: 12 unit bands in a 30 unit square, scaled advance 5
        let feature = Feature::new(
            "t",
            square(30.0),
            json!({ "params": { "text": "abcd", "fontsize": 10 } }),
        );
        let cmds = fx.compile(&feature);
        assert_eq!(instruction_count(&cmds, &DrawingInstruction::BeginPath), 4);
        assert_eq!(instruction_count(&cmds, &DrawingInstruction::Fill), 4);
    }

    #[test]
    fn polygon_text_auto_fits() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new(
            "t",
            square(100.0),
            json!({ "params": { "text": "abcdefghijklmnopqrst" } }),
        );
        // settles on size 28: two bands of 100 holding 7 glyphs of 14 each
        let cmds = fx.compile(&feature);
        assert_eq!(instruction_count(&cmds, &DrawingInstruction::BeginPath), 14);
    }

    #[test]
    fn auto_fitted_short_label_is_drawn() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new(
            "park",
            Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [300.0, 0.0],
                [300.0, 40.0],
                [0.0, 40.0],
                [0.0, 0.0],
            ]]),
            json!({ "params": { "text": "Park" } }),
        );
        let cmds = fx.compile(&feature);
        assert_eq!(instruction_count(&cmds, &DrawingInstruction::BeginPath), 4);
    }

    #[test]
    fn text_without_font_draws_nothing() {
        let mut fx = Fixture::new(Transform::identity());
        let feature = Feature::new(
            "t",
            square(30.0),
            json!({ "params": { "text": "abc", "fontsize": 10, "fontUrl": "fonts/missing" } }),
        );
        assert!(fx.compile(&feature).is_empty());
    }

    #[test]
    fn text_on_line_follows_segment_direction() {
        let transform = Transform::identity();
        let font = SquareFont::new(1000.0, 500.0);
        let text = Text::new("a", Some(font));
        // vertical line: the glyph is turned a quarter turn
        let points = [Point::new(0.0, 0.0), Point::new(0.0, 100.0)];
        let ins = draw_text_on_line(&transform, &points, &text, 10.0);

        assert_eq!(ins.first(), Some(&DrawingInstruction::BeginPath));
        assert_eq!(ins.last(), Some(&DrawingInstruction::Fill));
        // the square's (5, 0) corner ends up on the line at (0, 5)
        let DrawingInstruction::LineTo { x, y } = ins[2] else {
            panic!("expected a line, got {:?}", ins[2]);
        };
        assert!(x.abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn line_text_uses_default_size() {
        let mut fx = Fixture::new(Transform::identity());
        // default size 100 with advance 500/1000: 50 units per glyph
        let feature = Feature::new(
            "l",
            Geometry::LineString(vec![[0.0, 0.0], [120.0, 0.0]]),
            json!({ "params": { "text": "abcd" } }),
        );
        let cmds = fx.compile(&feature);
        assert_eq!(instruction_count(&cmds, &DrawingInstruction::BeginPath), 2);
    }
}

//! Hatch patterns shared by polygon features.
//!
//! A pattern is recorded once per key as a `StartTexture` … `EndTexture`
//! block that the host replays into an offscreen texture. Features then
//! clip to their outline and `ApplyTexture` the key.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::config::TextureConfig;
use crate::geometry::{Extent, Point, Transform, buffer, extent_ring, max_square};
use crate::painter::{ContextValue, PainterCommand, PolygonEnd, process_style};
use crate::properties::{get_parameter, get_style, key_fragment, param_f64};

/// Pattern commands keyed by what makes two hatches look the same.
///
/// Entries outlive frames. The frame index records which keys have already
/// been sent to the host during the current frame and is reset by
/// [`clear_index`](Self::clear_index).
pub struct TextureCache {
    config: TextureConfig,
    entries: HashMap<String, Vec<PainterCommand>, fxhash::FxBuildHasher>,
    frame_index: HashSet<String, fxhash::FxBuildHasher>,
    generated: usize,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(TextureConfig::default())
    }
}

impl TextureCache {
    /// Empty cache generating patterns with `config`.
    pub fn new(config: TextureConfig) -> Self {
        Self {
            config,
            entries: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            frame_index: HashSet::with_hasher(fxhash::FxBuildHasher::default()),
            generated: 0,
        }
    }

    /// Cache key for a hatched feature, and whether it was already sent this frame.
    ///
    /// `viewport` and `extent` are in screen units; `extent` is the
    /// feature's transformed bounding box.
    pub fn key(
        &self,
        props: &Value,
        viewport: &Extent,
        extent: &Extent,
        transform: &Transform,
    ) -> (String, bool) {
        let step = match param_f64(props, "step") {
            Some(step) if step != 0.0 => step * transform.scale_factor(),
            _ => {
                let hn = (viewport.height() * self.hatch_count(props) / extent.height())
                    .floor()
                    .max(1.0);
                viewport.height() / hn
            }
        };

        let key = [
            step.ceil().to_string(),
            key_fragment(get_style(props, "strokeStyle"), &self.config.default_stroke),
            key_fragment(
                get_style(props, "lineWidth"),
                &self.config.default_line_width.to_string(),
            ),
            key_fragment(get_parameter(props, "rotation"), "0"),
        ]
        .join("-");

        let satisfied = self.has_texture(&key);
        (key, satisfied)
    }

    /// Pattern commands for `key`, generating them on first use.
    ///
    /// Marks `key` as satisfied for the current frame.
    pub fn ensure(
        &mut self,
        key: &str,
        props: &Value,
        viewport: &Extent,
        extent: &Extent,
        transform: &Transform,
    ) -> Vec<PainterCommand> {
        self.frame_index.insert(key.to_string());
        if let Some(commands) = self.entries.get(key) {
            return commands.clone();
        }

        let commands = self.generate(key, props, viewport, extent, transform);
        self.generated += 1;
        log::debug!(
            "Generated texture {} ({} commands)",
            key,
            commands.len()
        );
        self.entries.insert(key.to_string(), commands.clone());
        commands
    }

    /// Whether `key` was sent during the current frame.
    pub fn has_texture(&self, key: &str) -> bool {
        self.frame_index.contains(key)
    }

    /// Starts a new frame. Cached patterns are kept.
    pub fn clear_index(&mut self) {
        self.frame_index.clear();
    }

    /// Drops every pattern and the frame index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.frame_index.clear();
    }

    /// Number of patterns generated since creation.
    pub fn generation_count(&self) -> usize {
        self.generated
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pattern is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hatch_count(&self, props: &Value) -> f64 {
        param_f64(props, "hn").unwrap_or(self.config.hatch_count)
    }

    fn generate(
        &self,
        key: &str,
        props: &Value,
        viewport: &Extent,
        extent: &Extent,
        transform: &Transform,
    ) -> Vec<PainterCommand> {
        let bv = buffer(&max_square(viewport), viewport.width() * self.config.buffer_ratio);
        let stroke = key_fragment(get_style(props, "strokeStyle"), &self.config.default_stroke);
        let line_width = get_style(props, "lineWidth")
            .and_then(Value::as_f64)
            .unwrap_or(self.config.default_line_width);

        let (step, hatch_len) = match param_f64(props, "step") {
            Some(step) if step != 0.0 => {
                let step = (step * transform.scale_factor()).ceil();
                (step, (bv.height() / step).floor())
            }
            _ => {
                let hatch_len = (bv.height() * self.hatch_count(props) / extent.height())
                    .floor()
                    .max(1.0);
                ((bv.height() / hatch_len).ceil(), hatch_len)
            }
        };

        let mut commands = vec![PainterCommand::start_texture(key)];
        process_style(&mut commands, props, transform);

        if step <= line_width || step <= 0.0 || !hatch_len.is_finite() {
            commands.push(PainterCommand::set("fillStyle", ContextValue::Text(stroke)));
            commands.push(PainterCommand::polygon(
                &[extent_ring(viewport)],
                vec![PolygonEnd::ClosePath, PolygonEnd::Fill],
            ));
        } else {
            // a ceiled step covers the buffered viewport in fewer lines
            let count = hatch_len.min((bv.height() / step).ceil() + 1.0);
            let mut pattern = zig_zag(&bv, step, count as usize);
            let rotation = param_f64(props, "rotation").unwrap_or(0.0);
            if rotation != 0.0 {
                pattern = Transform::rotation_around(rotation, viewport.center()).apply_all(&pattern);
            }
            commands.push(PainterCommand::line(&pattern));
        }

        commands.push(PainterCommand::Restore);
        commands.push(PainterCommand::EndTexture);
        commands
    }
}

/// One polyline sweeping `bv` bottom-up, alternating direction every `step`.
fn zig_zag(bv: &Extent, step: f64, count: usize) -> Vec<Point> {
    let (left, right, start) = (bv.min.x, bv.max.x, bv.min.y);
    let mut points = Vec::with_capacity(count * 2);
    points.push(Point::new(left, start));

    let mut turn = false;
    for i in 0..count {
        let y = start + i as f64 * step;
        let (from, to) = if turn { (right, left) } else { (left, right) };
        if i > 0 {
            points.push(Point::new(from, y));
        }
        points.push(Point::new(to, y));
        turn = !turn;
    }
    points
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::compile::{FrameContext, compile_feature};
use crate::config::WorkerConfig;
use crate::feature::Feature;
use crate::font_storage::FontSet;
use crate::geometry::{Extent, Point, Transform};
use crate::painter::PainterCommand;
use crate::texture::TextureCache;

/// One frame in flight: what to draw, how far along it is, and whether the
/// host still wants it.
pub struct FrameJob {
    pub id: String,
    /// Requested extent in map units.
    pub extent: Extent,
    pub transform: Transform,
    /// `extent` through `transform`, in screen units.
    pub viewport: Extent,
    features: Vec<Arc<Feature>>,
    offset: usize,
    token: CancellationToken,
}

impl FrameJob {
    /// Frame `id` over `extent`, drawn through the flat `matrix`.
    pub fn new(
        id: impl Into<String>,
        extent: [f64; 4],
        matrix: [f64; 6],
        token: CancellationToken,
    ) -> Self {
        let extent = Extent::new(
            Point::new(extent[0], extent[1]),
            Point::new(extent[2], extent[3]),
        );
        let transform = Transform::from_flat_matrix(matrix);
        let viewport = transform.apply_extent(&extent);
        Self {
            id: id.into(),
            extent,
            transform,
            viewport,
            features: Vec::new(),
            offset: 0,
            token,
        }
    }

    /// Token the registry cancels this frame with.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the host cancelled this frame.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Snapshot of the features to draw, in drawing order.
    pub fn set_features(&mut self, features: Vec<Arc<Feature>>) {
        self.features = features;
        self.offset = 0;
    }

    /// Number of features in the snapshot.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Whether every feature has been compiled.
    pub fn is_done(&self) -> bool {
        self.offset >= self.features.len()
    }

    /// Compiles the next `config.batch_size` features.
    pub fn next_batch(
        &mut self,
        config: &WorkerConfig,
        fonts: &FontSet,
        textures: &mut TextureCache,
    ) -> Vec<PainterCommand> {
        let end = (self.offset + config.batch_size.max(1)).min(self.features.len());
        let mut ctx = FrameContext {
            transform: &self.transform,
            viewport: &self.viewport,
            fonts,
            config,
            textures,
        };

        let mut commands = Vec::new();
        for feature in &self.features[self.offset..end] {
            commands.extend(compile_feature(feature, &mut ctx));
        }
        self.offset = end;
        commands
    }
}

/// Cancellation tokens of the frames currently in flight.
///
/// Several frames may run under one id; each registration gets a
/// generation so a finished frame releases only its own token.
#[derive(Default)]
pub struct FrameRegistry {
    next_generation: u64,
    live: HashMap<String, Vec<(u64, CancellationToken)>, fxhash::FxBuildHasher>,
}

impl FrameRegistry {
    /// Registers a new frame under `id`. Frames already running under the
    /// same id keep running.
    pub fn register(&mut self, id: &str) -> (u64, CancellationToken) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let token = CancellationToken::new();
        let frames = self.live.entry(id.to_string()).or_default();
        if !frames.is_empty() {
            log::debug!("Frame {} requested while {} still in flight", id, frames.len());
        }
        frames.push((generation, token.clone()));
        (generation, token)
    }

    /// Cancels and forgets every frame under `id`. Returns whether any was
    /// in flight.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.live.remove(id) {
            Some(frames) => {
                for (_, token) in frames {
                    token.cancel();
                }
                true
            }
            None => false,
        }
    }

    /// Forgets the frame registered as `generation` under `id`.
    pub fn release(&mut self, id: &str, generation: u64) {
        let Some(frames) = self.live.get_mut(id) else {
            return;
        };
        frames.retain(|(g, _)| *g != generation);
        if frames.is_empty() {
            self.live.remove(id);
        }
    }

    /// Whether any frame is in flight under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Number of frames in flight, counting each registration.
    pub fn len(&self) -> usize {
        self.live.values().map(Vec::len).sum()
    }

    /// Whether no frame is in flight.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Geometry;
    use serde_json::Value;

    fn lines(n: usize) -> Vec<Arc<Feature>> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                Arc::new(Feature::new(
                    i.to_string(),
                    Geometry::LineString(vec![[x, 0.0], [x + 10.0, 0.0]]),
                    Value::Null,
                ))
            })
            .collect()
    }

    #[test]
    fn viewport_is_transformed_extent() {
        let job = FrameJob::new(
            "f",
            [0.0, 0.0, 10.0, 20.0],
            [2.0, 0.0, 0.0, -2.0, 0.0, 40.0],
            CancellationToken::new(),
        );
        assert_eq!(job.viewport.min, Point::new(0.0, 0.0));
        assert_eq!(job.viewport.max, Point::new(20.0, 40.0));
    }

    #[test]
    fn batches_walk_the_snapshot() {
        let config = WorkerConfig {
            batch_size: 4,
            ..WorkerConfig::default()
        };
        let mut textures = TextureCache::default();
        let fonts = FontSet::default();
        let mut job = FrameJob::new(
            "f",
            [0.0, -1.0, 100.0, 1.0],
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            CancellationToken::new(),
        );
        job.set_features(lines(10));

        let mut sizes = Vec::new();
        while !job.is_done() {
            sizes.push(job.next_batch(&config, &fonts, &mut textures).len());
        }
        // save, line, restore per feature
        assert_eq!(sizes, vec![12, 12, 6]);
    }

    #[test]
    fn registry_generations() {
        let mut registry = FrameRegistry::default();
        let (g1, t1) = registry.register("f");
        let (g2, t2) = registry.register("f");
        assert!(!t1.is_cancelled());
        assert!(!t2.is_cancelled());
        assert_eq!(registry.len(), 2);

        // the first frame finishing leaves the second registered
        registry.release("f", g1);
        assert!(registry.contains("f"));
        assert_eq!(registry.len(), 1);
        registry.release("f", g2);
        assert!(registry.is_empty());

        assert!(!registry.cancel("f"));
    }

    #[test]
    fn cancel_reaches_every_frame_under_id() {
        let mut registry = FrameRegistry::default();
        let (_, t1) = registry.register("f");
        let (_, t2) = registry.register("f");
        let (_, other) = registry.register("g");

        assert!(registry.cancel("f"));
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
        assert!(!other.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn cancel_fires_token() {
        let mut registry = FrameRegistry::default();
        let (_, token) = registry.register("f");
        assert!(registry.cancel("f"));
        assert!(token.is_cancelled());
        assert_eq!(registry.len(), 0);
    }
}

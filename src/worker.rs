use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::WorkerConfig;
use crate::error::FontError;
use crate::feature::{Feature, ModelData};
use crate::font::FontHandle;
use crate::font_source::FontSource;
use crate::font_storage::{FontSet, FontStorage};
use crate::protocol::{Inbound, Outbound};
use crate::spatial_index::{FeatureIndex, SpatialIndex};
use crate::texture::TextureCache;

pub mod frame;

pub use frame::{FrameJob, FrameRegistry};

/// The rendering worker: owns the feature index, fonts and texture cache,
/// and turns frame requests into batches of painter commands.
///
/// Frames run as tokio tasks. Every piece of shared state sits behind its
/// own `Mutex`, and no lock is held across an `.await`.
///
/// The fields are public so hosts can inspect or seed the state directly
/// (e.g. insert a font handle they already have).
pub struct Worker {
    pub font_storage: Mutex<FontStorage>,
    pub textures: Mutex<TextureCache>,
    pub index: Mutex<FeatureIndex>,
    pub frames: Mutex<FrameRegistry>,
    source: Arc<dyn FontSource>,
    config: WorkerConfig,
    outbound: UnboundedSender<Outbound>,
}

impl Worker {
    /// Creates a worker and the receiving end of its outbound messages.
    pub fn new(
        config: WorkerConfig,
        source: Arc<dyn FontSource>,
    ) -> (Arc<Self>, UnboundedReceiver<Outbound>) {
        let (outbound, rx) = unbounded_channel();
        let worker = Self {
            font_storage: Mutex::new(FontStorage::new()),
            textures: Mutex::new(TextureCache::new(config.texture.clone())),
            index: Mutex::new(FeatureIndex::new()),
            frames: Mutex::new(FrameRegistry::default()),
            source,
            config,
            outbound,
        };
        (Arc::new(worker), rx)
    }

    /// Configuration the worker was built with.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn send(&self, msg: Outbound) -> bool {
        if self.outbound.send(msg).is_err() {
            log::debug!("Host receiver dropped, discarding message");
            return false;
        }
        true
    }
}

/// message dispatch
impl Worker {
    /// Handles messages until `rx` closes.
    pub async fn run(self: Arc<Self>, mut rx: UnboundedReceiver<Inbound>) {
        while let Some(msg) = rx.recv().await {
            self.handle(msg);
        }
        log::debug!("Inbound channel closed, worker stopping");
    }

    /// Handles one message. Returns the frame task for `RenderFrame`.
    pub fn handle(self: &Arc<Self>, msg: Inbound) -> Option<JoinHandle<()>> {
        match msg {
            Inbound::Init { models, ack } => {
                self.init_data(models);
                self.send(Outbound::Ack { id: ack });
                None
            }
            Inbound::Update { models, ack } => {
                self.update_data(models);
                self.send(Outbound::Ack { id: ack });
                None
            }
            Inbound::RenderFrame {
                extent,
                transform,
                id,
            } => Some(self.render_frame(extent, transform, id)),
            Inbound::CancelFrame { id } => {
                self.cancel_frame(&id);
                None
            }
        }
    }
}

/// data
impl Worker {
    /// Replaces every stored feature.
    pub fn init_data(&self, models: Vec<ModelData>) {
        let mut index = self.index.lock();
        index.clear();
        for model in models {
            index.insert(Feature::from(model), true);
        }
        index.build_index();
        log::debug!("Initialized {} features", index.len());
    }

    /// Replaces the given features, matching by id.
    pub fn update_data(&self, models: Vec<ModelData>) {
        let mut index = self.index.lock();
        for model in models {
            index.insert(Feature::from(model), false);
        }
    }
}

/// fonts
impl Worker {
    /// Parses `data` and stores it as the font for `url`.
    pub fn load_font_binary(&self, url: &str, data: impl Into<Vec<u8>>) -> Result<(), FontError> {
        self.font_storage.lock().load_font_binary(url, data)?;
        Ok(())
    }

    /// Stores a ready-made handle as the font for `url`.
    pub fn insert_font(&self, url: impl Into<String>, font: Arc<dyn FontHandle>) {
        self.font_storage.lock().insert(url, font);
    }

    /// Every font URL the stored features may need, plus the default one.
    fn font_urls(&self) -> Vec<String> {
        let mut urls = self.index.lock().font_urls();
        if !urls.contains(&self.config.default_font_url) {
            urls.push(self.config.default_font_url.clone());
        }
        urls
    }

    /// Fetches and loads the fonts in `urls` that are not stored yet.
    ///
    /// Failures are logged and leave the URL unresolved. Returns `false` if
    /// `job` got cancelled before every fetch settled.
    async fn resolve_fonts(&self, urls: &[String], job: &FrameJob) -> bool {
        let missing: Vec<String> = {
            let storage = self.font_storage.lock();
            urls.iter()
                .filter(|url| !storage.contains(url))
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            return true;
        }

        let mut fetches = JoinSet::new();
        for url in missing {
            let fetch = self.source.fetch(&url);
            fetches.spawn(async move { (url, fetch.await) });
        }

        let settle = async {
            while let Some(joined) = fetches.join_next().await {
                match joined {
                    Ok((url, Ok(data))) => {
                        let loaded = self.font_storage.lock().load_font_binary(&url, data);
                        match loaded {
                            Ok(_) => log::debug!("Resolved font {}", url),
                            Err(e) => log::warn!("Failed to load font {}: {}", url, e),
                        }
                    }
                    Ok((url, Err(e))) => log::warn!("Failed to fetch font {}: {}", url, e),
                    Err(e) => log::error!("Font fetch task failed: {}", e),
                }
            }
        };

        tokio::select! {
            _ = job.token().cancelled() => false,
            _ = settle => true,
        }
    }

    fn font_set(&self, urls: &[String]) -> FontSet {
        self.font_storage
            .lock()
            .snapshot(urls.iter().map(String::as_str))
    }
}

/// frames
impl Worker {
    /// Starts rendering frame `id` and returns its task.
    ///
    /// The frame is registered before this returns, so a `cancel_frame`
    /// issued right after always reaches it.
    pub fn render_frame(
        self: &Arc<Self>,
        extent: [f64; 4],
        matrix: [f64; 6],
        id: impl Into<String>,
    ) -> JoinHandle<()> {
        let id = id.into();
        let (generation, token) = self.frames.lock().register(&id);
        let job = FrameJob::new(id, extent, matrix, token);
        let worker = Arc::clone(self);

        tokio::spawn(async move {
            let id = job.id.clone();
            worker.run_frame(job).await;
            worker.frames.lock().release(&id, generation);
        })
    }

    /// Cancels frame `id`. Unknown or finished frames are ignored.
    pub fn cancel_frame(&self, id: &str) {
        if self.frames.lock().cancel(id) {
            log::debug!("Cancelled frame {}", id);
        }
    }

    async fn run_frame(&self, mut job: FrameJob) {
        self.textures.lock().clear_index();

        let urls = self.font_urls();
        if !self.resolve_fonts(&urls, &job).await || job.is_cancelled() {
            log::debug!("Frame {} cancelled while resolving fonts", job.id);
            return;
        }
        let fonts = self.font_set(&urls);

        let features = self.index.lock().query(&job.extent);
        job.set_features(features);
        log::debug!("Frame {}: {} features", job.id, job.feature_count());

        loop {
            if job.is_cancelled() {
                log::debug!("Frame {} cancelled", job.id);
                return;
            }
            let instructions = {
                let mut textures = self.textures.lock();
                job.next_batch(&self.config, &fonts, &mut textures)
            };
            let sent = self.send(Outbound::Frame {
                id: job.id.clone(),
                instructions,
            });
            if !sent || job.is_done() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}

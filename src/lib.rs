//! # Hatchwork
//!
//! A background rendering worker for vector map editors.
//!
//! ## Overview
//!
//! The host keeps the canvas and sends features, viewports and transforms;
//! `hatchwork` answers with ordered [`PainterCommand`]s the host replays.
//! Besides plain lines, polygons and images it lays text out along lines
//! and inside polygons (with automatic font sizing), and draws hatch
//! patterns from a cache of textures.
//!
//! The core of the library is the [`Worker`], which stores features in a
//! spatial index, resolves fonts through a [`FontSource`], and compiles
//! frames in cancellable batches.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hatchwork::{LocalFontSource, Worker, WorkerConfig, protocol::Inbound};
//!
//! # async fn demo() {
//! let (worker, mut frames) = Worker::new(
//!     WorkerConfig::default(),
//!     Arc::new(LocalFontSource::with_base_dir("assets")),
//! );
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! tokio::spawn(worker.run(rx));
//!
//! tx.send(Inbound::RenderFrame {
//!     extent: [0.0, 0.0, 100.0, 100.0],
//!     transform: [1.0, 0.0, 0.0, -1.0, 0.0, 100.0],
//!     id: "frame-1".into(),
//! })
//! .unwrap();
//!
//! while let Some(batch) = frames.recv().await {
//!     println!("{}", batch.to_json().unwrap());
//! }
//! # }
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod feature;
pub mod font;
pub mod font_source;
pub mod font_storage;
pub mod geometry;
pub mod painter;
pub mod properties;
pub mod protocol;
pub mod scanline;
pub mod spatial_index;
pub mod text;
pub mod texture;
pub mod worker;

// common re-exports
pub use config::WorkerConfig;
pub use feature::{Feature, Geometry, ModelData};
pub use font::{FontHandle, OutlineFont};
pub use font_source::{FontSource, LocalFontSource};
pub use font_storage::FontStorage;
pub use painter::PainterCommand;
pub use spatial_index::{FeatureIndex, SpatialIndex};
pub use worker::Worker;

// re-export dependencies
pub use euclid;
pub use fontdb;
pub use parking_lot;

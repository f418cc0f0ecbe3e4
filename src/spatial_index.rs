use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::feature::Feature;
use crate::geometry::Extent;

/// Feature store that can answer bounding-box queries.
pub trait SpatialIndex: Send {
    fn clear(&mut self);

    /// Adds `feature`, replacing any feature with the same id.
    ///
    /// With `defer_build` the index may skip reorganizing itself until
    /// [`build_index`](Self::build_index) is called; queries stay correct.
    fn insert(&mut self, feature: Feature, defer_build: bool);

    fn remove(&mut self, id: &str) -> Option<Arc<Feature>>;

    fn build_index(&mut self);

    /// Features whose bounds intersect `extent`, edges included.
    fn query(&self, extent: &Extent) -> Vec<Arc<Feature>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    bounds: Extent,
    feature: Arc<Feature>,
}

/// Bounding boxes kept sorted by their left edge.
///
/// A query binary-searches the first box starting right of the extent and
/// only tests what lies before it. Deferred inserts append unsorted and turn
/// queries into a full scan until the next [`build_index`](SpatialIndex::build_index).
///
/// Stored ids are kept in a hash set, so inserting a new id never scans
/// the entries; only a real replacement or removal does.
///
/// Also counts the distinct `params.fontUrl` values of stored features, so
/// the set of fonts a frame may need is known without scanning.
#[derive(Default)]
pub struct FeatureIndex {
    entries: Vec<Entry>,
    /// Features without coordinates; stored but never returned by queries.
    unbounded: Vec<Arc<Feature>>,
    dirty: bool,
    ids: HashSet<String, fxhash::FxBuildHasher>,
    font_urls: HashMap<String, usize, fxhash::FxBuildHasher>,
}

impl FeatureIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct font URLs referenced by stored features, sorted.
    pub fn font_urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self.font_urls.keys().cloned().collect();
        urls.sort_unstable();
        urls
    }

    /// Whether a feature with `id` is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Stored feature with `id`.
    pub fn get(&self, id: &str) -> Option<Arc<Feature>> {
        if !self.ids.contains(id) {
            return None;
        }
        self.entries
            .iter()
            .map(|e| &e.feature)
            .chain(self.unbounded.iter())
            .find(|f| f.id == id)
            .map(Arc::clone)
    }

    fn track_font(&mut self, feature: &Feature) {
        if let Some(url) = feature.font_url() {
            *self.font_urls.entry(url.to_string()).or_insert(0) += 1;
        }
    }

    /// Detaches the stored feature `id`, leaving the id set alone.
    fn take(&mut self, id: &str) -> Option<Arc<Feature>> {
        let removed = if let Some(i) = self.entries.iter().position(|e| e.feature.id == id) {
            self.entries.remove(i).feature
        } else {
            let i = self.unbounded.iter().position(|f| f.id == id)?;
            self.unbounded.remove(i)
        };
        self.untrack_font(&removed);
        Some(removed)
    }

    fn untrack_font(&mut self, feature: &Feature) {
        let Some(url) = feature.font_url() else {
            return;
        };
        if let Some(count) = self.font_urls.get_mut(url) {
            *count -= 1;
            if *count == 0 {
                self.font_urls.remove(url);
            }
        }
    }
}

fn left_edge(e: &Entry) -> f64 {
    e.bounds.min.x
}

fn intersects(a: &Extent, b: &Extent) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

impl SpatialIndex for FeatureIndex {
    fn clear(&mut self) {
        self.entries.clear();
        self.unbounded.clear();
        self.ids.clear();
        self.font_urls.clear();
        self.dirty = false;
    }

    fn insert(&mut self, feature: Feature, defer_build: bool) {
        if !self.ids.insert(feature.id.clone()) {
            self.take(&feature.id);
        }
        self.track_font(&feature);

        let Some(bounds) = feature.bounds() else {
            self.unbounded.push(Arc::new(feature));
            return;
        };
        let entry = Entry {
            bounds,
            feature: Arc::new(feature),
        };

        if defer_build || self.dirty {
            self.entries.push(entry);
            self.dirty = true;
        } else {
            let at = self
                .entries
                .partition_point(|e| left_edge(e) <= bounds.min.x);
            self.entries.insert(at, entry);
        }
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Feature>> {
        if !self.ids.remove(id) {
            return None;
        }
        self.take(id)
    }

    fn build_index(&mut self) {
        if self.dirty {
            self.entries
                .sort_by(|a, b| left_edge(a).total_cmp(&left_edge(b)));
            self.dirty = false;
        }
    }

    fn query(&self, extent: &Extent) -> Vec<Arc<Feature>> {
        let candidates = if self.dirty {
            &self.entries[..]
        } else {
            let end = self
                .entries
                .partition_point(|e| left_edge(e) <= extent.max.x);
            &self.entries[..end]
        };
        candidates
            .iter()
            .filter(|e| intersects(&e.bounds, extent))
            .map(|e| Arc::clone(&e.feature))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len() + self.unbounded.len()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Geometry;
    use crate::geometry::Point;
    use serde_json::{Value, json};

    fn point(id: &str, x: f64, y: f64) -> Feature {
        Feature::new(id, Geometry::Point([x, y]), Value::Null)
    }

    fn extent(x0: f64, y0: f64, x1: f64, y1: f64) -> Extent {
        Extent::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    fn ids(features: &[Arc<Feature>]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn query_returns_intersecting_features_in_left_order() {
        let mut index = FeatureIndex::new();
        index.insert(point("c", 5.0, 5.0), false);
        index.insert(point("a", 1.0, 1.0), false);
        index.insert(point("far", 50.0, 50.0), false);
        index.insert(
            Feature::new(
                "line",
                Geometry::LineString(vec![[-10.0, 2.0], [2.0, 2.0]]),
                Value::Null,
            ),
            false,
        );

        let found = index.query(&extent(0.0, 0.0, 5.0, 5.0));
        assert_eq!(ids(&found), vec!["line", "a", "c"]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn deferred_inserts_are_queryable_before_and_after_build() {
        let mut index = FeatureIndex::new();
        for i in (0..10).rev() {
            index.insert(point(&i.to_string(), i as f64, 0.0), true);
        }
        let before = index.query(&extent(2.0, -1.0, 4.0, 1.0));
        assert_eq!(before.len(), 3);

        index.build_index();
        let after = index.query(&extent(2.0, -1.0, 4.0, 1.0));
        assert_eq!(ids(&after), vec!["2", "3", "4"]);
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut index = FeatureIndex::new();
        index.insert(point("a", 0.0, 0.0), false);
        index.insert(point("a", 10.0, 10.0), false);
        assert_eq!(index.len(), 1);
        assert!(index.query(&extent(-1.0, -1.0, 1.0, 1.0)).is_empty());
        assert_eq!(index.get("a").unwrap().bounds().unwrap().min, Point::new(10.0, 10.0));
    }

    #[test]
    fn font_urls_are_reference_counted() {
        let with_font = |id: &str, url: &str| {
            Feature::new(
                id,
                Geometry::Point([0.0, 0.0]),
                json!({ "params": { "fontUrl": url } }),
            )
        };
        let mut index = FeatureIndex::new();
        index.insert(with_font("a", "fonts/b"), false);
        index.insert(with_font("b", "fonts/b"), false);
        index.insert(with_font("c", "fonts/a"), false);
        assert_eq!(index.font_urls(), vec!["fonts/a", "fonts/b"]);

        index.remove("a");
        assert_eq!(index.font_urls(), vec!["fonts/a", "fonts/b"]);
        index.remove("b");
        assert_eq!(index.font_urls(), vec!["fonts/a"]);

        // replacing drops the old reference
        index.insert(with_font("c", "fonts/z"), false);
        assert_eq!(index.font_urls(), vec!["fonts/z"]);

        index.clear();
        assert!(index.font_urls().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn bulk_deferred_load_after_clear() {
        let mut index = FeatureIndex::new();
        index.insert(point("old", 0.0, 0.0), false);
        index.clear();

        let n = 50_000;
        for i in 0..n {
            index.insert(point(&format!("f{}", i), (n - i) as f64, 0.0), true);
        }
        index.build_index();

        assert_eq!(index.len(), n);
        assert!(!index.contains("old"));
        assert!(index.contains("f0"));
        let found = index.query(&extent(9.5, -1.0, 12.5, 1.0));
        assert_eq!(ids(&found), vec!["f49990", "f49989", "f49988"]);

        // replacing after the bulk load still drops the earlier copy
        index.insert(point("f0", -5.0, 0.0), true);
        assert_eq!(index.len(), n);
        assert_eq!(index.get("f0").unwrap().bounds().unwrap().min.x, -5.0);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut index = FeatureIndex::new();
        assert!(index.remove("nope").is_none());
        index.insert(Feature::new("empty", Geometry::LineString(vec![]), Value::Null), false);
        assert_eq!(index.len(), 1);
        assert!(index.remove("empty").is_some());
    }
}

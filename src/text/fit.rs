//! Font size that makes a text fill a polygon.
//!
//! The objective compares the flat text length against the total length of
//! the writable bands at a trial size, and a binary search looks for its
//! sign change. The objective is only assumed to be monotonic: a
//! pathological polygon can send the search to a local rather than global
//! best size.

use crate::config::FitConfig;
use crate::geometry::Polygon;
use crate::scanline::writable_segments;

use super::data::Text;

/// Total band length at `font_size`, discounted toward larger sizes.
pub fn weighted_segment_length(
    polygon: &Polygon,
    font_size: f64,
    line_height_factor: f64,
    log_discount: f64,
) -> f64 {
    let line_height = font_size * line_height_factor;
    let mut total = 0.0;
    let mut band = 0;
    while let Some(segments) = writable_segments(polygon, line_height, band) {
        total += segments.iter().map(|s| s.length()).sum::<f64>();
        band += 1;
    }
    total * (1.0 - font_size.ln() / log_discount)
}

/// Integer binary search driven by the sign of `objective`.
///
/// A positive pivot keeps `[min, pivot]`, a negative one keeps
/// `[pivot + 1, max]`, and zero stops. An inverted range returns its
/// (floored) midpoint instead of looping.
pub fn binary_search(mut min: i64, mut max: i64, mut objective: impl FnMut(i64) -> f64) -> i64 {
    loop {
        let pivot = min + (max - min).div_euclid(2);
        if max <= min {
            return pivot;
        }
        let value = objective(pivot);
        if value > 0.0 {
            max = pivot;
        } else if value < 0.0 {
            min = pivot + 1;
        } else {
            return pivot;
        }
    }
}

/// Font size for `text` so that it fills `polygon` without overflowing.
///
/// The search settles where the text first outgrows the bands; when that
/// size leaves no band at all, the result steps down to the largest size
/// that still has a first band. Returns the lower search bound when the
/// text has no font.
pub fn auto_fit_size(
    polygon: &Polygon,
    text: &Text,
    line_height_factor: f64,
    config: &FitConfig,
) -> f64 {
    let base_length = text.flat_length(1.0);
    if base_length <= 0.0 {
        return config.min_size as f64;
    }

    let size = binary_search(config.min_size, config.max_size, |pivot| {
        let size = pivot as f64;
        let bands =
            weighted_segment_length(polygon, size, line_height_factor, config.log_discount);
        (size * base_length - bands).floor()
    });

    let has_band =
        |size: i64| writable_segments(polygon, size as f64 * line_height_factor, 0).is_some();
    let size = if has_band(size) {
        size
    } else {
        let first_without = binary_search(config.min_size, size, |pivot| {
            if has_band(pivot) { -1.0 } else { 1.0 }
        });
        (first_without - 1).max(config.min_size)
    };
    log::debug!("Auto-fit settled on font size {}", size);
    size as f64
}

//! Horizontal writable bands inside a polygon.

use crate::geometry::{Point, Polygon, Segment, Vector, line_intersect};

/// Interior runs of the polygon along band `band`.
///
/// The scan line sits `(band + 1) * line_height` below the top of the
/// polygon's extent. Returns `None` once that offset exceeds the extent
/// height ("no more bands") and an empty list for a band that lies within the
/// height but crosses no interior.
pub fn writable_segments(polygon: &Polygon, line_height: f64, band: usize) -> Option<Vec<Segment>> {
    let extent = polygon.extent()?;
    // a non-positive step would never run out of bands
    if line_height.is_nan() || line_height <= 0.0 {
        return None;
    }
    let offset = (band as f64 + 1.0) * line_height;
    if offset > extent.height() {
        return None;
    }

    let origin = Point::new(extent.min.x, extent.max.y - offset);
    let direction = Vector::new(extent.width(), 0.0);
    let hits = scan_intersections(polygon, origin, direction);

    Some(
        hits.chunks_exact(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect(),
    )
}

/// Crossings of the infinite horizontal line through `origin` with every
/// ring edge, sorted by x.
///
/// An edge counts when the scan line's y lies in `[min_y, max_y)` of the edge, so
/// a shared vertex is crossed once and a local maximum not at all.
fn scan_intersections(polygon: &Polygon, origin: Point, direction: Vector) -> Vec<Point> {
    let y = origin.y;
    let mut hits = Vec::new();

    for ring in &polygon.rings {
        for edge in ring.windows(2) {
            let (b0, b1) = (edge[0], edge[1]);
            let (lo, hi) = if b0.y <= b1.y { (b0.y, b1.y) } else { (b1.y, b0.y) };
            if !(lo <= y && y < hi) {
                continue;
            }
            if let Some(p) = line_intersect(origin, direction, b0, b1 - b0, true) {
                hits.push(p);
            }
        }
    }

    hits.sort_by(|a, b| a.x.total_cmp(&b.x));
    hits
}

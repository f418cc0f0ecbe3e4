//! Plane geometry shared by the layout and painting code.
//!
//! Everything is `f64` and unit-less: feature coordinates arrive already in
//! map units and [`Transform`] maps them to screen units.

use euclid::default::{Box2D, Point2D, Transform2D, Vector2D};
use euclid::Angle;

pub type Point = Point2D<f64>;
pub type Vector = Vector2D<f64>;
pub type Extent = Box2D<f64>;

/// Tolerance for degenerate lengths, and for parallel lines relative to
/// the product of their direction lengths.
pub const EPSILON: f64 = 1e-9;

/// Directional pair of points.
///
/// Used both as a text channel and as the result of a scan intersection.
/// A zero-length segment is legal and simply has no capacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).length()
    }

    /// Angle of the segment direction, in radians.
    pub fn angle(&self) -> f64 {
        let d = self.end - self.start;
        d.y.atan2(d.x)
    }
}

/// Moves `from` by `distance` toward `to`.
///
/// A degenerate direction leaves the point where it is.
pub fn advance_toward(from: Point, to: Point, distance: f64) -> Point {
    let d = to - from;
    let len = d.length();
    if len < EPSILON {
        return from;
    }
    from + d * (distance / len)
}

/// Intersects `a + t·av` with `b + u·bv`.
///
/// With `infinite` set, `t` and `u` are unbounded; otherwise both must lie
/// in `[0, 1]`. Near-parallel lines and zero-length directions yield `None`.
pub fn line_intersect(a: Point, av: Vector, b: Point, bv: Vector, infinite: bool) -> Option<Point> {
    let cross = av.cross(bv);
    if cross.abs() <= EPSILON * av.length() * bv.length() {
        return None;
    }
    let d = a - b;
    let ta = (bv.x * d.y - bv.y * d.x) / cross;
    let tb = (av.x * d.y - av.y * d.x) / cross;
    if infinite || ((0.0..=1.0).contains(&ta) && (0.0..=1.0).contains(&tb)) {
        Some(a + av * ta)
    } else {
        None
    }
}

/// Bounding box of a point set, `None` when empty.
pub fn extent_of<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Extent> {
    let mut it = points.into_iter();
    let first = *it.next()?;
    let mut ext = Extent::new(first, first);
    for p in it {
        ext.min = ext.min.min(*p);
        ext.max = ext.max.max(*p);
    }
    Some(ext)
}

/// Square of the larger side of `ext`, centred on it.
pub fn max_square(ext: &Extent) -> Extent {
    let half = ext.width().max(ext.height()) / 2.0;
    let c = ext.center();
    Extent::new(
        Point::new(c.x - half, c.y - half),
        Point::new(c.x + half, c.y + half),
    )
}

/// Grows `ext` by `margin` on every side.
pub fn buffer(ext: &Extent, margin: f64) -> Extent {
    Extent::new(
        Point::new(ext.min.x - margin, ext.min.y - margin),
        Point::new(ext.max.x + margin, ext.max.y + margin),
    )
}

/// Closed ring around `ext`, counter-clockwise from its bottom-left corner.
pub fn extent_ring(ext: &Extent) -> Vec<Point> {
    vec![
        ext.min,
        Point::new(ext.max.x, ext.min.y),
        ext.max,
        Point::new(ext.min.x, ext.max.y),
        ext.min,
    ]
}

/// Outer ring followed by zero or more holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<Point>>) -> Self {
        Self { rings }
    }

    /// Single rectangular ring around `ext`.
    pub fn from_extent(ext: &Extent) -> Self {
        Self::new(vec![extent_ring(ext)])
    }

    /// Bounding box of every ring, `None` without points.
    pub fn extent(&self) -> Option<Extent> {
        extent_of(self.rings.iter().flatten())
    }
}

/// Affine map from map units to screen units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    inner: Transform2D<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            inner: Transform2D::identity(),
        }
    }

    /// Builds a transform from a canvas-style `[a, b, c, d, e, f]` matrix,
    /// i.e. `x' = a·x + c·y + e` and `y' = b·x + d·y + f`.
    pub fn from_flat_matrix(m: [f64; 6]) -> Self {
        Self {
            inner: Transform2D::new(m[0], m[1], m[2], m[3], m[4], m[5]),
        }
    }

    /// The `[a, b, c, d, e, f]` matrix, as [`from_flat_matrix`](Self::from_flat_matrix) reads it.
    pub fn to_flat_matrix(&self) -> [f64; 6] {
        self.inner.to_array()
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            inner: Transform2D::scale(sx, sy),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            inner: Transform2D::translation(dx, dy),
        }
    }

    /// Rotation by `angle` radians around `center`.
    pub fn rotation_around(angle: f64, center: Point) -> Self {
        let inner = Transform2D::translation(-center.x, -center.y)
            .then_rotate(Angle::radians(angle))
            .then_translate(center.to_vector());
        Self { inner }
    }

    /// Returns a transform that first rotates around `center`, then applies `self`.
    pub fn rotate_around(&self, angle: f64, center: Point) -> Self {
        Self::rotation_around(angle, center).then(self)
    }

    /// Returns a transform applying `self` first and `other` second.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            inner: self.inner.then(&other.inner),
        }
    }

    /// Maps one point.
    pub fn apply(&self, p: Point) -> Point {
        self.inner.transform_point(p)
    }

    /// Maps every point of `points`.
    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.apply(*p)).collect()
    }

    /// Horizontal scale factor, the length of the transformed unit x vector.
    ///
    /// Map transforms are uniform, so this stands for the scale as a whole.
    pub fn scale_factor(&self) -> f64 {
        self.inner.m11.hypot(self.inner.m12)
    }

    /// Bounding box of the transformed corners of `ext`.
    pub fn apply_extent(&self, ext: &Extent) -> Extent {
        let corners = extent_ring(ext);
        let mapped = self.apply_all(&corners[..4]);
        extent_of(&mapped).unwrap_or(*ext)
    }
}

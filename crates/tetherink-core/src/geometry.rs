//! Geometry primitives shared by the line engine and the bounds accumulator.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Significant digits kept when rounding away floating point noise.
pub const NOISE_DIGITS: i32 = 15;

/// Rounding step used when no precision is configured.
pub const NOISE_STEP: f64 = 1e-15;

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Top-left corner.
    pub position: Point,
    pub size: Size,
}

impl Bounds {
    pub fn new(position: Point, size: Size) -> Self {
        Self { position, size }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Smallest bounds containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        self.to_rect().union(other.to_rect()).into()
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            position: rect.origin(),
            size: rect.size(),
        }
    }
}

/// Axis-aligned envelope of a set of points, `None` when empty.
pub fn envelope(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p)))
}

/// Envelope of the `width × height` rectangle at the local origin after `transform`.
pub fn transformed_rect_envelope(transform: Affine, width: f64, height: f64) -> Rect {
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(width, 0.0),
        Point::new(width, height),
        Point::new(0.0, height),
    ];
    envelope(corners.map(|corner| transform * corner)).unwrap_or(Rect::ZERO)
}

/// Frame of content anchored at `origin`: offset by `offset`, then rotated by
/// `degrees` about the anchor.
pub fn anchored_frame(origin: Point, degrees: f64, offset: Vec2) -> Affine {
    Affine::translate(origin.to_vec2()) * Affine::rotate(degrees.to_radians()) * Affine::translate(offset)
}

/// Apply only the linear part of an affine map to a vector.
pub fn apply_linear(transform: Affine, v: Vec2) -> Vec2 {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

/// Unit normal of a tangent: the tangent turned by +90°.
///
/// Degenerate tangents yield the zero vector.
pub fn unit_normal(tangent: Vec2) -> Vec2 {
    let len = tangent.hypot();
    if len < f64::EPSILON {
        return Vec2::ZERO;
    }
    Vec2::new(-tangent.y / len, tangent.x / len)
}

/// Round to `digits` significant digits.
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let exponent = digits - 1 - magnitude;
    let factor = 10f64.powi(exponent.abs());
    if !factor.is_finite() {
        return value;
    }
    if exponent >= 0 {
        (value * factor).round() / factor
    } else {
        (value / factor).round() * factor
    }
}

/// Round to the nearest multiple of `step`, with floating point noise removed.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    round_significant((value / step).round() * step, NOISE_DIGITS)
}

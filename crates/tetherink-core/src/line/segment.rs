//! Segment evaluation for straight, axis-aligned and bezier segments.

use kurbo::{
    Affine, BezPath, CubicBez, ParamCurve, ParamCurveDeriv, ParamCurveExtrema, ParamCurveNearest, Point,
    Vec2,
};

/// Accuracy passed to kurbo's nearest-point search on curves.
const NEAREST_ACCURACY: f64 = 1e-12;

/// Step used to estimate tangents where the curve derivative vanishes.
const TANGENT_PROBE: f64 = 1e-6;

/// A resolved line segment. The start point is the end of the previous segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSegment {
    /// Straight line to `end`.
    Straight { end: Point },
    /// Right-angle path to `end`.
    ///
    /// For `vertical_pos >= 0` the path goes horizontally to
    /// `start.x + vertical_pos * (end.x - start.x)`, vertically to `end.y`, then
    /// horizontally to `end`. Negative values go vertically first, bending at
    /// `start.y + |vertical_pos| * (end.y - start.y)`.
    Axis { end: Point, vertical_pos: f64 },
    /// Cubic bezier curve to `end`.
    Bezier { c1: Point, c2: Point, end: Point },
}

impl LineSegment {
    pub fn end(&self) -> Point {
        match *self {
            LineSegment::Straight { end }
            | LineSegment::Axis { end, .. }
            | LineSegment::Bezier { end, .. } => end,
        }
    }

    /// Point at segment-local position `t`.
    pub fn point(&self, start: Point, t: f64) -> Point {
        match *self {
            LineSegment::Straight { end } => start.lerp(end, t),
            LineSegment::Axis { end, vertical_pos } => {
                let corners = axis_corners(start, end, vertical_pos);
                let (leg, local) = axis_leg(&corners, t);
                corners[leg].lerp(corners[leg + 1], local)
            }
            LineSegment::Bezier { c1, c2, end } => CubicBez::new(start, c1, c2, end).eval(t),
        }
    }

    /// Direction of travel at segment-local position `t` (not normalized).
    pub fn tangent(&self, start: Point, t: f64) -> Vec2 {
        match *self {
            LineSegment::Straight { end } => end - start,
            LineSegment::Axis { end, vertical_pos } => {
                let corners = axis_corners(start, end, vertical_pos);
                let (leg, _) = axis_leg(&corners, t);
                corners[leg + 1] - corners[leg]
            }
            LineSegment::Bezier { c1, c2, end } => {
                let curve = CubicBez::new(start, c1, c2, end);
                let tangent = curve.deriv().eval(t).to_vec2();
                if tangent.hypot() > f64::EPSILON {
                    return tangent;
                }
                let before = curve.eval((t - TANGENT_PROBE).max(0.0));
                let after = curve.eval((t + TANGENT_PROBE).min(1.0));
                after - before
            }
        }
    }

    /// Nearest segment-local position to `p`, with the squared distance.
    pub fn nearest(&self, start: Point, p: Point) -> (f64, f64) {
        match *self {
            LineSegment::Straight { end } => nearest_on_line(start, end, p),
            LineSegment::Axis { end, vertical_pos } => {
                let corners = axis_corners(start, end, vertical_pos);
                let lengths = leg_lengths(&corners);
                let total: f64 = lengths.iter().sum();
                if total < f64::EPSILON {
                    return (0.0, (p - start).hypot2());
                }
                let mut best = (0.0, f64::INFINITY);
                let mut travelled = 0.0;
                for (leg, length) in lengths.iter().enumerate() {
                    let (local, dist_sq) = nearest_on_line(corners[leg], corners[leg + 1], p);
                    if dist_sq < best.1 {
                        best = ((travelled + local * length) / total, dist_sq);
                    }
                    travelled += length;
                }
                best
            }
            LineSegment::Bezier { c1, c2, end } => {
                let nearest = CubicBez::new(start, c1, c2, end).nearest(p, NEAREST_ACCURACY);
                (nearest.t, nearest.distance_sq)
            }
        }
    }

    /// Corners inside the segment with the incoming and outgoing leg
    /// directions. Only axis-aligned segments have any.
    pub fn interior_corners(&self, start: Point) -> Vec<(Point, Vec2, Vec2)> {
        let LineSegment::Axis { end, vertical_pos } = *self else {
            return Vec::new();
        };
        let corners = axis_corners(start, end, vertical_pos);
        let lengths = leg_lengths(&corners);
        let legs: Vec<usize> = (0..3).filter(|leg| lengths[*leg] >= f64::EPSILON).collect();
        legs.windows(2)
            .map(|pair| {
                let (incoming, outgoing) = (pair[0], pair[1]);
                (
                    corners[outgoing],
                    corners[incoming + 1] - corners[incoming],
                    corners[outgoing + 1] - corners[outgoing],
                )
            })
            .collect()
    }

    /// Parameters where the segment, placed by `transform`, reaches an
    /// extreme x or y. Straight legs have their extremes at the corners.
    pub fn extrema(&self, start: Point, transform: Affine) -> Vec<f64> {
        match *self {
            LineSegment::Bezier { c1, c2, end } => (transform * CubicBez::new(start, c1, c2, end))
                .extrema()
                .into_iter()
                .collect(),
            LineSegment::Straight { .. } | LineSegment::Axis { .. } => Vec::new(),
        }
    }

    /// Append this segment to a path whose current point is `start`.
    pub fn append_to(&self, path: &mut BezPath, start: Point) {
        match *self {
            LineSegment::Straight { end } => path.line_to(end),
            LineSegment::Axis { end, vertical_pos } => {
                for corner in &axis_corners(start, end, vertical_pos)[1..] {
                    path.line_to(*corner);
                }
            }
            LineSegment::Bezier { c1, c2, end } => path.curve_to(c1, c2, end),
        }
    }
}

/// Corners of an axis-aligned segment: start, two bends, end.
fn axis_corners(start: Point, end: Point, vertical_pos: f64) -> [Point; 4] {
    if vertical_pos >= 0.0 {
        let x = start.x + vertical_pos * (end.x - start.x);
        [start, Point::new(x, start.y), Point::new(x, end.y), end]
    } else {
        let y = start.y + vertical_pos.abs() * (end.y - start.y);
        [start, Point::new(start.x, y), Point::new(end.x, y), end]
    }
}

fn leg_lengths(corners: &[Point; 4]) -> [f64; 3] {
    [
        corners[0].distance(corners[1]),
        corners[1].distance(corners[2]),
        corners[2].distance(corners[3]),
    ]
}

/// Leg index and leg-local position for arc-length position `t`.
///
/// Zero-length legs are skipped so the returned leg always has a direction
/// unless the whole segment is degenerate.
fn axis_leg(corners: &[Point; 4], t: f64) -> (usize, f64) {
    let lengths = leg_lengths(corners);
    let total: f64 = lengths.iter().sum();
    if total < f64::EPSILON {
        return (0, 0.0);
    }
    let target = t.clamp(0.0, 1.0) * total;
    let mut travelled = 0.0;
    let mut last_leg = 0;
    for (leg, length) in lengths.iter().enumerate() {
        if *length < f64::EPSILON {
            continue;
        }
        last_leg = leg;
        if target <= travelled + length {
            return (leg, (target - travelled) / length);
        }
        travelled += length;
    }
    (last_leg, 1.0)
}

fn nearest_on_line(a: Point, b: Point, p: Point) -> (f64, f64) {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return (0.0, (p - a).hypot2());
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    (t, (p - a.lerp(b, t)).hypot2())
}

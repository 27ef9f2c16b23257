//! Line engine: evaluation and projection on composite lines.
//!
//! A [`Line`] is a start point followed by segments. Each segment owns an equal
//! share of the global position range `[0, 1]`, so global position `pos` lies
//! on segment `floor(pos * n)`. A [`TransformedLine`] places a line in world
//! space; every query answers in world coordinates.

mod segment;

pub use segment::LineSegment;

use crate::content::LinePosition;
use crate::geometry::{apply_linear, unit_normal};
use kurbo::{Affine, BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};

/// A composite line in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Point,
    pub segments: Vec<LineSegment>,
}

impl Line {
    pub fn new(start: Point, segments: Vec<LineSegment>) -> Self {
        Self { start, segments }
    }

    /// Outline of a `width × height` rectangle starting at its top-left corner.
    ///
    /// The outline runs down the left edge first so normals point outwards.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(
            Point::ZERO,
            vec![
                LineSegment::Straight { end: Point::new(0.0, height) },
                LineSegment::Straight { end: Point::new(width, height) },
                LineSegment::Straight { end: Point::new(width, 0.0) },
                LineSegment::Straight { end: Point::ZERO },
            ],
        )
    }

    /// Start point of segment `index`.
    pub fn segment_start(&self, index: usize) -> Point {
        match index.checked_sub(1).and_then(|prev| self.segments.get(prev)) {
            Some(previous) => previous.end(),
            None => self.start,
        }
    }
}

/// A line placed in world space by an affine transform.
///
/// The transform must be a similarity (translation, rotation, uniform scale),
/// as shape frames are. Projection searches in local space and compares in
/// world space, which agree only under such maps.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedLine {
    pub line: Line,
    pub transform: Affine,
}

/// Result of projecting a point onto a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProjection {
    /// Global position in `[0, 1]`.
    pub pos: f64,
    /// Zero-based segment index.
    pub segment: usize,
    /// Position local to `segment`.
    pub relative_pos: f64,
    /// Signed perpendicular distance; positive on the side the normal points to.
    pub distance: f64,
}

impl LineProjection {
    /// Position to store in a line point, segment-local or global.
    pub fn to_line_position(&self, has_segment: bool) -> LinePosition {
        if has_segment {
            LinePosition::Segment {
                segment: self.segment,
                relative: self.relative_pos,
            }
        } else {
            LinePosition::Global(self.pos)
        }
    }
}

impl TransformedLine {
    pub fn new(line: Line, transform: Affine) -> Self {
        Self { line, transform }
    }

    /// A line already in world coordinates.
    pub fn untransformed(line: Line) -> Self {
        Self::new(line, Affine::IDENTITY)
    }

    pub fn segment_count(&self) -> usize {
        self.line.segments.len()
    }

    /// Global position of a segment-local position.
    pub fn global_pos(&self, segment: usize, relative: f64) -> f64 {
        let count = self.segment_count().max(1) as f64;
        (segment as f64 + relative) / count
    }

    pub fn start_point(&self) -> Point {
        self.transform * self.line.start
    }

    pub fn end_point(&self) -> Point {
        let last = self.line.segments.last().map_or(self.line.start, LineSegment::end);
        self.transform * last
    }

    /// World point on segment `segment` at local position `relative`, without offset.
    pub fn segment_point(&self, segment: usize, relative: f64) -> Point {
        let local = match self.line.segments.get(segment) {
            Some(s) => s.point(self.line.segment_start(segment), relative),
            None => self.line.start,
        };
        self.transform * local
    }

    /// World tangent on segment `segment` at local position `relative`.
    pub fn segment_tangent(&self, segment: usize, relative: f64) -> Vec2 {
        match self.line.segments.get(segment) {
            Some(s) => apply_linear(
                self.transform,
                s.tangent(self.line.segment_start(segment), relative),
            ),
            None => Vec2::ZERO,
        }
    }

    /// World unit normal on segment `segment` at local position `relative`.
    pub fn segment_normal(&self, segment: usize, relative: f64) -> Vec2 {
        unit_normal(self.segment_tangent(segment, relative))
    }

    /// World point at a segment-local position, offset by `distance` along the normal.
    pub fn segment_point_at_distance(&self, segment: usize, relative: f64, distance: f64) -> Point {
        let point = self.segment_point(segment, relative);
        if distance == 0.0 {
            return point;
        }
        point + self.segment_normal(segment, relative) * distance
    }

    /// World point at `pos`, offset by `distance` along the normal.
    pub fn point_at(&self, pos: LinePosition, distance: f64) -> Point {
        let (segment, relative) = pos.split(self.segment_count());
        self.segment_point_at_distance(segment, relative, distance)
    }

    /// World tangent at `pos`.
    pub fn tangent_at(&self, pos: LinePosition) -> Vec2 {
        let (segment, relative) = pos.split(self.segment_count());
        self.segment_tangent(segment, relative)
    }

    /// World unit normal at `pos`.
    pub fn normal_at(&self, pos: LinePosition) -> Vec2 {
        let (segment, relative) = pos.split(self.segment_count());
        self.segment_normal(segment, relative)
    }

    /// World corners where two straight pieces meet, with the incoming and
    /// outgoing directions: segment junctions and axis-aligned bends.
    pub fn joins(&self) -> Vec<(Point, Vec2, Vec2)> {
        let mut joins = Vec::new();
        for (index, segment) in self.line.segments.iter().enumerate() {
            if index > 0 {
                joins.push((
                    self.segment_point(index, 0.0),
                    self.segment_tangent(index - 1, 1.0),
                    self.segment_tangent(index, 0.0),
                ));
            }
            for (corner, incoming, outgoing) in segment.interior_corners(self.line.segment_start(index)) {
                joins.push((
                    self.transform * corner,
                    apply_linear(self.transform, incoming),
                    apply_linear(self.transform, outgoing),
                ));
            }
        }
        joins
    }

    /// Segment-local parameters where segment `segment` reaches an extreme
    /// world x or y.
    pub fn segment_extrema(&self, segment: usize) -> Vec<f64> {
        match self.line.segments.get(segment) {
            Some(s) => s.extrema(self.line.segment_start(segment), self.transform),
            None => Vec::new(),
        }
    }

    /// Project `point` onto the nearest position of the line.
    ///
    /// Ties between segments keep the earlier segment.
    pub fn project_point(&self, point: Point) -> LineProjection {
        let mut best: Option<(usize, f64, f64)> = None;
        let local_point = self.transform.inverse() * point;
        for (index, segment) in self.line.segments.iter().enumerate() {
            let start = self.line.segment_start(index);
            let (t, _) = segment.nearest(start, local_point);
            let dist_sq = (self.segment_point(index, t) - point).hypot2();
            if best.is_none_or(|(_, _, best_dist)| dist_sq < best_dist) {
                best = Some((index, t, dist_sq));
            }
        }

        let Some((segment, relative_pos, _)) = best else {
            return LineProjection {
                pos: 0.0,
                segment: 0,
                relative_pos: 0.0,
                distance: 0.0,
            };
        };
        let on_line = self.segment_point(segment, relative_pos);
        let normal = self.segment_normal(segment, relative_pos);
        LineProjection {
            pos: self.global_pos(segment, relative_pos),
            segment,
            relative_pos,
            distance: (point - on_line).dot(normal),
        }
    }

    /// The line as a world-space path.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.line.start);
        for (index, segment) in self.line.segments.iter().enumerate() {
            segment.append_to(&mut path, self.line.segment_start(index));
        }
        path.apply_affine(self.transform);
        path
    }
}

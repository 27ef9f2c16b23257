//! Bounding boxes of shapes, markers and connectors.

use crate::content::{Connector, Content, ContentSource, LineCap, LineJoin, Marker, Shape, StrokeStyle};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{anchored_frame, envelope, transformed_rect_envelope, unit_normal, Bounds};
use crate::line::TransformedLine;
use crate::resolve::Resolver;
use kurbo::{Point, Rect, Shape as _, Vec2};

/// Samples per segment used to trace the outer edges of a stroke, on top of
/// the curve extrema.
const STROKE_SAMPLES: usize = 16;

/// Bounds of a shape anchored at `pos`: the `width × height` box shifted by
/// `(dx, dy)` and rotated about `pos`.
pub fn shape_bounds(pos: Point, shape: &Shape) -> Bounds {
    let frame = anchored_frame(pos, shape.rotation, Vec2::new(shape.dx, shape.dy));
    transformed_rect_envelope(frame, shape.width, shape.height).into()
}

/// Bounds of a marker placed on `anchor` and rotated by `angle` degrees.
pub fn marker_bounds(anchor: Point, angle: f64, marker: &Marker) -> Bounds {
    let offset = Vec2::new(-marker.width * marker.ref_x, -marker.height * marker.ref_y);
    let frame = anchored_frame(anchor, angle, offset);
    transformed_rect_envelope(frame, marker.width, marker.height).into()
}

/// Bounds of a connector including its stroke, caps and markers.
pub fn connector_bounds<G: ContentSource>(
    resolver: &mut Resolver<'_, G>,
    connector: &Connector,
) -> CanvasResult<Bounds> {
    let line = resolver.connector_line(connector)?;
    let mut rect = line.to_path().bounding_box();

    if connector.stroke.width > 0.0 {
        if let Some(stroke) = stroke_envelope(&line, &connector.stroke) {
            rect = rect.union(stroke);
        }
    }

    let graph = resolver.graph();
    for marker_id in [&connector.start_marker, &connector.end_marker].into_iter().flatten() {
        let marker = graph.marker(marker_id)?;
        let (anchor, angle) = resolver.marker_placement(marker)?;
        rect = rect.union(marker_bounds(anchor, angle, marker).to_rect());
    }
    Ok(rect.into())
}

/// Envelope of the stroke outline: both offset sides of every segment, the
/// joins between pieces and the end caps.
fn stroke_envelope(line: &TransformedLine, stroke: &StrokeStyle) -> Option<Rect> {
    let half_width = stroke.width / 2.0;
    let mut points = Vec::new();
    for segment in 0..line.segment_count() {
        let uniform = (0..=STROKE_SAMPLES).map(|step| step as f64 / STROKE_SAMPLES as f64);
        for t in uniform.chain(line.segment_extrema(segment)) {
            let point = line.segment_point(segment, t);
            let normal = line.segment_normal(segment, t) * half_width;
            points.push(point + normal);
            points.push(point - normal);
        }
    }

    for (vertex, incoming, outgoing) in line.joins() {
        points.extend(join_points(vertex, incoming, outgoing, half_width, stroke));
    }

    let last = line.segment_count().saturating_sub(1);
    let ends = [
        (line.start_point(), -line.segment_tangent(0, 0.0)),
        (line.end_point(), line.segment_tangent(last, 1.0)),
    ];
    for (point, outward) in ends {
        points.extend(cap_points(point, outward, half_width, stroke.cap));
    }
    envelope(points)
}

/// Extreme points of the join at `vertex` between pieces running along
/// `incoming` and `outgoing`.
fn join_points(
    vertex: Point,
    incoming: Vec2,
    outgoing: Vec2,
    half_width: f64,
    stroke: &StrokeStyle,
) -> Vec<Point> {
    let (n_in, n_out) = (unit_normal(incoming), unit_normal(outgoing));
    if n_in == Vec2::ZERO || n_out == Vec2::ZERO {
        return Vec::new();
    }
    // Ends of both pieces; a bevel adds nothing beyond them.
    let mut points = vec![
        vertex + n_in * half_width,
        vertex - n_in * half_width,
        vertex + n_out * half_width,
        vertex - n_out * half_width,
    ];
    let turn = incoming.normalize().cross(outgoing.normalize());
    if turn.abs() < 1e-12 {
        return points;
    }
    match stroke.join {
        LineJoin::Bevel => {}
        LineJoin::Round => {
            let r = Vec2::new(half_width, half_width);
            points.extend([vertex - r, vertex + r]);
        }
        LineJoin::Miter => {
            // The tip lies on the outer side, opposite to the turn.
            let bisector = n_in + n_out;
            let len_sq = bisector.hypot2();
            if len_sq > f64::EPSILON && 2.0 / len_sq.sqrt() <= stroke.miter_limit {
                let outer = -turn.signum();
                points.push(vertex + bisector * (outer * 2.0 * half_width / len_sq));
            }
        }
    }
    points
}

/// Extreme points of a cap at `point`, facing along `outward`.
fn cap_points(point: Point, outward: Vec2, half_width: f64, cap: LineCap) -> Vec<Point> {
    match cap {
        LineCap::Butt => Vec::new(),
        LineCap::Round => {
            let r = Vec2::new(half_width, half_width);
            vec![point - r, point + r]
        }
        LineCap::Square => {
            let length = outward.hypot();
            if length < f64::EPSILON {
                return Vec::new();
            }
            let along = outward / length * half_width;
            let across = Vec2::new(-along.y, along.x);
            vec![point + along + across, point + along - across]
        }
    }
}

/// Union of all bounds.
pub fn merge(boxes: &[Bounds]) -> CanvasResult<Bounds> {
    let (first, rest) = boxes.split_first().ok_or(CanvasError::EmptyBounds)?;
    Ok(rest.iter().fold(*first, |acc, bounds| acc.union(bounds)))
}

/// Bounds of all top-level shapes and connectors.
pub fn canvas_bounds<G: ContentSource>(graph: &G) -> CanvasResult<Bounds> {
    let mut resolver = Resolver::new(graph);
    let mut boxes = Vec::new();
    for content in graph.all_content().filter(|content| content.parent().is_none()) {
        match content {
            Content::Shape(shape) => {
                let pos = match &shape.pos {
                    Some(pos) => resolver.point(pos)?,
                    None => Point::ZERO,
                };
                boxes.push(shape_bounds(pos, shape));
            }
            Content::Connector(connector) => boxes.push(connector_bounds(&mut resolver, connector)?),
            Content::Point(_) | Content::Marker(_) => {}
        }
    }
    log::debug!("Canvas bounds over {} items", boxes.len());
    merge(&boxes)
}

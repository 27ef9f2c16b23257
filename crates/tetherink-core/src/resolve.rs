//! World positions of relational content.
//!
//! Points are resolved on demand and cached for the lifetime of one
//! [`Resolver`]. The resolver borrows an immutable snapshot; create a new one
//! whenever the snapshot is rebuilt.

use crate::content::{
    CanvasPoint, Connector, ConnectorSegment, Content, ContentId, ContentSource, Marker,
    MarkerAnchor, Shape,
};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{anchored_frame, apply_linear};
use crate::line::{Line, LineSegment, TransformedLine};
use kurbo::{Affine, Point, Vec2};
use std::collections::{HashMap, HashSet};

/// Resolves points, frames and lines of a content snapshot.
pub struct Resolver<'a, G: ContentSource> {
    graph: &'a G,
    points: HashMap<ContentId, Point>,
    in_progress: HashSet<ContentId>,
}

impl<'a, G: ContentSource> Resolver<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            points: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// The snapshot being resolved.
    pub fn graph(&self) -> &'a G {
        self.graph
    }

    /// World position of a point.
    pub fn point(&mut self, id: &str) -> CanvasResult<Point> {
        if let Some(point) = self.points.get(id) {
            return Ok(*point);
        }
        let graph = self.graph;
        let point = graph.point(id)?;

        self.enter(id)?;
        let resolved = self.resolve_point(id, point);
        self.in_progress.remove(id);

        let resolved = resolved?;
        self.points.insert(id.to_string(), resolved);
        Ok(resolved)
    }

    fn resolve_point(&mut self, id: &str, point: &CanvasPoint) -> CanvasResult<Point> {
        match point {
            CanvasPoint::Absolute(p) => Ok(self.frame_of(id)? * Point::new(p.x, p.y)),
            CanvasPoint::Relative(p) => {
                let anchor = self.anchor(&p.target)?;
                let frame = self.frame_of(id)?;
                let offset = apply_linear(frame, Vec2::new(p.offset_x, p.offset_y));
                Ok(anchor + offset)
            }
            CanvasPoint::Line(p) => Ok(self.line(&p.line_provider)?.point_at(p.pos, p.distance)),
        }
    }

    /// Position that relative points targeting `id` are measured from.
    ///
    /// Points give their own position, shapes the origin of their frame and
    /// connectors the end of their last segment.
    pub fn anchor(&mut self, id: &str) -> CanvasResult<Point> {
        let graph = self.graph;
        match graph.resolve(id)? {
            Content::Point(_) => self.point(id),
            Content::Shape(shape) => Ok(self.shape_frame(shape)? * Point::ZERO),
            Content::Connector(connector) => self.point(connector.end()?),
            Content::Marker(_) => Err(CanvasError::UnexpectedKind {
                id: id.to_string(),
                expected: "point, shape or connector",
            }),
        }
    }

    /// Transform of the nearest enclosing shape or marker of `id`, identity at top level.
    pub fn frame_of(&mut self, id: &str) -> CanvasResult<Affine> {
        let graph = self.graph;
        let mut seen = HashSet::new();
        let mut current = id;
        while let Some(parent) = graph.parent_of(current) {
            if !seen.insert(parent.id()) {
                return Err(CanvasError::CyclicReference(parent.id().to_string()));
            }
            match parent {
                Content::Shape(shape) => return self.shape_frame(shape),
                Content::Marker(marker) => return self.marker_frame(marker),
                Content::Point(_) | Content::Connector(_) => current = parent.id(),
            }
        }
        Ok(Affine::IDENTITY)
    }

    /// Frame of a shape: its anchor, rotated by the shape rotation on top of
    /// the enclosing frame's rotation, shifted by `(dx, dy)`.
    pub fn shape_frame(&mut self, shape: &Shape) -> CanvasResult<Affine> {
        self.enter(&shape.id)?;
        let frame = self.resolve_shape_frame(shape);
        self.in_progress.remove(shape.id());
        frame
    }

    fn resolve_shape_frame(&mut self, shape: &Shape) -> CanvasResult<Affine> {
        let parent_frame = self.frame_of(shape.id())?;
        let origin = match &shape.pos {
            Some(pos) => self.point(pos)?,
            None => parent_frame * Point::ZERO,
        };
        let degrees = frame_rotation(parent_frame) + shape.rotation;
        Ok(anchored_frame(origin, degrees, Vec2::new(shape.dx, shape.dy)))
    }

    /// Endpoint a marker sits on and its rotation in degrees.
    ///
    /// End markers follow the direction of travel, start markers point
    /// backwards out of the connector.
    pub fn marker_placement(&mut self, marker: &Marker) -> CanvasResult<(Point, f64)> {
        let graph = self.graph;
        let connector = graph.connector(&marker.connector)?;
        let line = self.connector_line(connector)?;
        let last = line.segment_count().saturating_sub(1);
        let (point, direction) = match marker.anchor {
            MarkerAnchor::Start => (line.start_point(), -line.segment_tangent(0, 0.0)),
            MarkerAnchor::End => (line.end_point(), line.segment_tangent(last, 1.0)),
        };
        let degrees = if direction.hypot() < f64::EPSILON {
            0.0
        } else {
            direction.atan2().to_degrees()
        };
        Ok((point, degrees))
    }

    /// Frame of a marker: the `(ref_x, ref_y)` fraction of its box on the endpoint.
    pub fn marker_frame(&mut self, marker: &Marker) -> CanvasResult<Affine> {
        self.enter(&marker.id)?;
        let placement = self.marker_placement(marker);
        self.in_progress.remove(marker.id());
        let (point, degrees) = placement?;
        let offset = Vec2::new(-marker.width * marker.ref_x, -marker.height * marker.ref_y);
        Ok(anchored_frame(point, degrees, offset))
    }

    /// Line of a line provider: a connector path or a shape outline.
    pub fn line(&mut self, provider: &str) -> CanvasResult<TransformedLine> {
        let graph = self.graph;
        match graph.resolve(provider)? {
            Content::Connector(connector) => self.connector_line(connector),
            Content::Shape(shape) => Ok(TransformedLine::new(
                Line::rectangle(shape.width, shape.height),
                self.shape_frame(shape)?,
            )),
            Content::Point(_) | Content::Marker(_) => Err(CanvasError::UnexpectedKind {
                id: provider.to_string(),
                expected: "line provider",
            }),
        }
    }

    /// World-space path of a connector.
    pub fn connector_line(&mut self, connector: &Connector) -> CanvasResult<TransformedLine> {
        if connector.segments.is_empty() {
            return Err(CanvasError::InvalidConnector(connector.id.clone()));
        }
        let start = self.point(&connector.start)?;
        let mut segments = Vec::with_capacity(connector.segments.len());
        for segment in &connector.segments {
            let resolved = match segment {
                ConnectorSegment::Line { end } => LineSegment::Straight {
                    end: self.point(end)?,
                },
                ConnectorSegment::Axis { end, vertical_pos } => LineSegment::Axis {
                    end: self.point(end)?,
                    vertical_pos: *vertical_pos,
                },
                ConnectorSegment::Bezier {
                    end,
                    start_control_point,
                    end_control_point,
                } => LineSegment::Bezier {
                    c1: self.point(start_control_point)?,
                    c2: self.point(end_control_point)?,
                    end: self.point(end)?,
                },
            };
            segments.push(resolved);
        }
        Ok(TransformedLine::untransformed(Line::new(start, segments)))
    }

    fn enter(&mut self, id: &str) -> CanvasResult<()> {
        if !self.in_progress.insert(id.to_string()) {
            log::warn!("Reference cycle through {id}");
            return Err(CanvasError::CyclicReference(id.to_string()));
        }
        Ok(())
    }
}

/// Rotation of a frame in degrees.
fn frame_rotation(frame: Affine) -> f64 {
    let [a, b, ..] = frame.as_coeffs();
    b.atan2(a).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AbsolutePoint, ContentStore, LinePoint, LinePosition, RelativePoint};

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < EPS
    }

    #[test]
    fn test_absolute_point_in_shape_frame() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("p", 100.0, 50.0));
        store.add(Shape::with_id("s", 40.0, 20.0).at("p").offset(10.0, 0.0));
        store.add_child("s", AbsolutePoint::with_id("inner", 5.0, 5.0)).unwrap();

        let mut resolver = Resolver::new(&store);
        assert!(close(resolver.point("inner").unwrap(), Point::new(115.0, 55.0)));
    }

    #[test]
    fn test_rotated_shape_frame() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("p", 0.0, 0.0));
        store.add(Shape::with_id("s", 40.0, 20.0).at("p").rotated(90.0));
        store.add_child("s", AbsolutePoint::with_id("inner", 10.0, 0.0)).unwrap();

        let mut resolver = Resolver::new(&store);
        assert!(close(resolver.point("inner").unwrap(), Point::new(0.0, 10.0)));
    }

    #[test]
    fn test_relative_point_targets() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 10.0, 10.0));
        store.add(AbsolutePoint::with_id("b", 50.0, 10.0));
        store.add(Shape::with_id("s", 10.0, 10.0).at("a").offset(-5.0, -5.0));
        store.add(Connector::straight("c", "a", "b"));
        store.add(RelativePoint::with_id("to_point", "a", 1.0, 2.0));
        store.add(RelativePoint::with_id("to_shape", "s", 0.0, 3.0));
        store.add(RelativePoint::with_id("to_connector", "c", 0.0, -4.0));

        let mut resolver = Resolver::new(&store);
        assert!(close(resolver.point("to_point").unwrap(), Point::new(11.0, 12.0)));
        assert!(close(resolver.point("to_shape").unwrap(), Point::new(5.0, 8.0)));
        assert!(close(resolver.point("to_connector").unwrap(), Point::new(50.0, 6.0)));
    }

    #[test]
    fn test_line_point_on_connector() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("b", 100.0, 0.0));
        store.add(Connector::straight("c", "a", "b"));
        store.add(LinePoint::with_id("l", "c", LinePosition::Global(0.25), 5.0));

        let mut resolver = Resolver::new(&store);
        assert!(close(resolver.point("l").unwrap(), Point::new(25.0, 5.0)));
    }

    #[test]
    fn test_line_point_on_point_is_rejected() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(LinePoint::with_id("l", "a", LinePosition::Global(0.5), 0.0));

        let mut resolver = Resolver::new(&store);
        assert!(matches!(
            resolver.point("l"),
            Err(CanvasError::UnexpectedKind { expected: "line provider", .. })
        ));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut store = ContentStore::new();
        store.add(RelativePoint::with_id("a", "b", 1.0, 0.0));
        store.add(RelativePoint::with_id("b", "a", 1.0, 0.0));

        let mut resolver = Resolver::new(&store);
        assert!(matches!(resolver.point("a"), Err(CanvasError::CyclicReference(_))));
    }

    #[test]
    fn test_marker_placement() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("b", 0.0, 100.0));
        store.add(Connector::straight("c", "a", "b"));
        store
            .add_child("c", Marker::with_id("end", "c", MarkerAnchor::End, 10.0, 6.0).with_ref(1.0, 0.5))
            .unwrap();
        store
            .add_child("c", Marker::with_id("start", "c", MarkerAnchor::Start, 10.0, 6.0))
            .unwrap();

        let mut resolver = Resolver::new(&store);
        let end = store.marker("end").unwrap();
        let (point, degrees) = resolver.marker_placement(end).unwrap();
        assert!(close(point, Point::new(0.0, 100.0)));
        assert!((degrees - 90.0).abs() < EPS);

        // The reference point of the marker box lands on the endpoint.
        let frame = resolver.marker_frame(end).unwrap();
        assert!(close(frame * Point::new(10.0, 3.0), Point::new(0.0, 100.0)));

        let start = store.marker("start").unwrap();
        let (point, degrees) = resolver.marker_placement(start).unwrap();
        assert!(close(point, Point::ZERO));
        assert!((degrees + 90.0).abs() < EPS);
    }

    #[test]
    fn test_unresolved_reference() {
        let mut store = ContentStore::new();
        store.add(RelativePoint::with_id("r", "ghost", 0.0, 0.0));

        let mut resolver = Resolver::new(&store);
        assert_eq!(
            resolver.point("r"),
            Err(CanvasError::UnresolvedId("ghost".into()))
        );
    }
}

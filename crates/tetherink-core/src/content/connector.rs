//! Connector content.

use super::{ContentId, LinePosition, MarkerAnchor, new_content_id};
use crate::error::{CanvasError, CanvasResult};
use serde::{Deserialize, Serialize};

/// Stroke cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Stroke join style at interior corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineJoin {
    /// Sharp corner, cut to a bevel when longer than the miter limit.
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Miter limit used when none is given, as in SVG.
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

fn default_miter_limit() -> f64 {
    DEFAULT_MITER_LIMIT
}

/// Stroke properties that affect the rendered footprint of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: f64,
    #[serde(default)]
    pub cap: LineCap,
    #[serde(default)]
    pub join: LineJoin,
    /// Maximum ratio of miter length to stroke width.
    #[serde(default = "default_miter_limit")]
    pub miter_limit: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
}

/// A connector segment, ending at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectorSegment {
    /// Straight line to `end`.
    Line { end: ContentId },
    /// Right-angle path to `end`, bending at `vertical_pos` (see
    /// [`crate::line::LineSegment::Axis`]).
    Axis { end: ContentId, vertical_pos: f64 },
    /// Cubic bezier curve to `end`.
    Bezier {
        end: ContentId,
        start_control_point: ContentId,
        end_control_point: ContentId,
    },
}

impl ConnectorSegment {
    pub fn end(&self) -> &str {
        match self {
            ConnectorSegment::Line { end }
            | ConnectorSegment::Axis { end, .. }
            | ConnectorSegment::Bezier { end, .. } => end,
        }
    }

    /// Control points of a bezier segment.
    pub fn control_points(&self) -> Option<(&str, &str)> {
        match self {
            ConnectorSegment::Bezier {
                start_control_point,
                end_control_point,
                ..
            } => Some((start_control_point.as_str(), end_control_point.as_str())),
            ConnectorSegment::Line { .. } | ConnectorSegment::Axis { .. } => None,
        }
    }
}

/// An ordered chain of segments between points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub(crate) id: ContentId,
    #[serde(default)]
    pub parent: Option<ContentId>,
    /// Start point.
    pub start: ContentId,
    /// Segments, at least one.
    pub segments: Vec<ConnectorSegment>,
    #[serde(default)]
    pub start_marker: Option<ContentId>,
    #[serde(default)]
    pub end_marker: Option<ContentId>,
    #[serde(default)]
    pub stroke: StrokeStyle,
}

impl Connector {
    pub fn new(start: impl Into<ContentId>, segments: Vec<ConnectorSegment>) -> Self {
        Self::with_id(new_content_id(), start, segments)
    }

    pub fn with_id(
        id: impl Into<ContentId>,
        start: impl Into<ContentId>,
        segments: Vec<ConnectorSegment>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: None,
            start: start.into(),
            segments,
            start_marker: None,
            end_marker: None,
            stroke: StrokeStyle::default(),
        }
    }

    /// Create a straight connector between two points.
    pub fn straight(
        id: impl Into<ContentId>,
        start: impl Into<ContentId>,
        end: impl Into<ContentId>,
    ) -> Self {
        Self::with_id(id, start, vec![ConnectorSegment::Line { end: end.into() }])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// End point of the last segment.
    pub fn end(&self) -> CanvasResult<&str> {
        self.segments
            .last()
            .map(ConnectorSegment::end)
            .ok_or_else(|| CanvasError::InvalidConnector(self.id.clone()))
    }

    /// Start point of segment `index`: the previous segment's end, or the
    /// connector start for the first segment.
    pub fn segment_start(&self, index: usize) -> &str {
        match index.checked_sub(1).and_then(|prev| self.segments.get(prev)) {
            Some(previous) => previous.end(),
            None => &self.start,
        }
    }

    /// Every point that defines segment `index`.
    pub fn segment_points(&self, index: usize) -> Vec<&str> {
        let mut points = vec![self.segment_start(index)];
        if let Some(segment) = self.segments.get(index) {
            points.push(segment.end());
            if let Some((first, second)) = segment.control_points() {
                points.push(first);
                points.push(second);
            }
        }
        points
    }

    /// Segment a line position falls on.
    pub fn segment_at(&self, pos: &LinePosition) -> usize {
        pos.segment_index(self.segments.len())
    }

    /// Segment a marker at `anchor` sits on.
    pub fn marker_segment(&self, anchor: MarkerAnchor) -> usize {
        match anchor {
            MarkerAnchor::Start => 0,
            MarkerAnchor::End => self.segments.len().saturating_sub(1),
        }
    }

    /// Point a marker at `anchor` is attached to.
    pub fn anchor_point(&self, anchor: MarkerAnchor) -> CanvasResult<&str> {
        match anchor {
            MarkerAnchor::Start => Ok(self.start.as_str()),
            MarkerAnchor::End => self.end(),
        }
    }

    /// Marker id attached at `anchor`.
    pub fn marker(&self, anchor: MarkerAnchor) -> Option<&str> {
        match anchor {
            MarkerAnchor::Start => self.start_marker.as_deref(),
            MarkerAnchor::End => self.end_marker.as_deref(),
        }
    }
}

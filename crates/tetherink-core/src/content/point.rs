//! Point content: absolute, relative and line-anchored points.

use super::{ContentId, new_content_id};
use serde::{Deserialize, Serialize};

/// A point with literal coordinates in its parent frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsolutePoint {
    pub(crate) id: ContentId,
    #[serde(default)]
    pub parent: Option<ContentId>,
    pub x: f64,
    pub y: f64,
}

impl AbsolutePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self::with_id(new_content_id(), x, y)
    }

    pub fn with_id(id: impl Into<ContentId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            parent: None,
            x,
            y,
        }
    }
}

/// A point offset from another point, shape or connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub(crate) id: ContentId,
    #[serde(default)]
    pub parent: Option<ContentId>,
    /// Point, shape or connector this point follows.
    pub target: ContentId,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    /// Whether the offset itself can be edited, letting the point move
    /// independently of its target.
    #[serde(default)]
    pub editable: bool,
}

impl RelativePoint {
    pub fn new(target: impl Into<ContentId>, offset_x: f64, offset_y: f64) -> Self {
        Self::with_id(new_content_id(), target, offset_x, offset_y)
    }

    pub fn with_id(
        id: impl Into<ContentId>,
        target: impl Into<ContentId>,
        offset_x: f64,
        offset_y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            parent: None,
            target: target.into(),
            offset_x,
            offset_y,
            editable: false,
        }
    }

    /// Mark the point as independently movable (builder style).
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

/// Position along a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinePosition {
    /// Fraction of the whole line in `[0, 1]`; every segment owns an equal share.
    Global(f64),
    /// Segment index and fraction local to that segment.
    Segment { segment: usize, relative: f64 },
}

impl LinePosition {
    /// Split into (segment index, segment-local fraction) for a line with
    /// `segment_count` segments.
    pub fn split(&self, segment_count: usize) -> (usize, f64) {
        let count = segment_count.max(1);
        match *self {
            LinePosition::Global(pos) => {
                let scaled = pos.clamp(0.0, 1.0) * count as f64;
                let segment = (scaled.floor() as usize).min(count - 1);
                (segment, scaled - segment as f64)
            }
            LinePosition::Segment { segment, relative } => {
                if segment >= count {
                    (count - 1, 1.0)
                } else {
                    (segment, relative)
                }
            }
        }
    }

    /// Index of the segment this position lies on.
    pub fn segment_index(&self, segment_count: usize) -> usize {
        self.split(segment_count).0
    }
}

/// A point anchored on the outline of a shape or along a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub(crate) id: ContentId,
    #[serde(default)]
    pub parent: Option<ContentId>,
    /// Shape or connector providing the line.
    pub line_provider: ContentId,
    pub pos: LinePosition,
    /// Perpendicular offset from the line.
    #[serde(default)]
    pub distance: f64,
}

impl LinePoint {
    pub fn new(line_provider: impl Into<ContentId>, pos: LinePosition, distance: f64) -> Self {
        Self::with_id(new_content_id(), line_provider, pos, distance)
    }

    pub fn with_id(
        id: impl Into<ContentId>,
        line_provider: impl Into<ContentId>,
        pos: LinePosition,
        distance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            parent: None,
            line_provider: line_provider.into(),
            pos,
            distance,
        }
    }
}

/// Enum wrapper for all point kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanvasPoint {
    Absolute(AbsolutePoint),
    Relative(RelativePoint),
    Line(LinePoint),
}

impl CanvasPoint {
    pub fn id(&self) -> &str {
        match self {
            CanvasPoint::Absolute(p) => &p.id,
            CanvasPoint::Relative(p) => &p.id,
            CanvasPoint::Line(p) => &p.id,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            CanvasPoint::Absolute(p) => p.parent.as_deref(),
            CanvasPoint::Relative(p) => p.parent.as_deref(),
            CanvasPoint::Line(p) => p.parent.as_deref(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: ContentId) {
        match self {
            CanvasPoint::Absolute(p) => p.parent = Some(parent),
            CanvasPoint::Relative(p) => p.parent = Some(parent),
            CanvasPoint::Line(p) => p.parent = Some(parent),
        }
    }
}

//! Canvas content model.
//!
//! Content is stored as an arena of nodes keyed by string id. Every cross
//! reference (`pos`, `target`, `line_provider`, segment ends, control points,
//! parents) is an id, never an owning pointer, so the graph may be walked in
//! any direction without ownership cycles.

mod connector;
mod marker;
mod point;
mod shape;
mod store;

pub use connector::{Connector, ConnectorSegment, DEFAULT_MITER_LIMIT, LineCap, LineJoin, StrokeStyle};
pub use marker::{Marker, MarkerAnchor};
pub use point::{AbsolutePoint, CanvasPoint, LinePoint, LinePosition, RelativePoint};
pub use shape::Shape;
pub use store::ContentStore;

use crate::error::{CanvasError, CanvasResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a piece of canvas content.
pub type ContentId = String;

/// Generate a fresh content id.
pub(crate) fn new_content_id() -> ContentId {
    Uuid::new_v4().to_string()
}

/// Enum wrapper for all content kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Shape(Shape),
    Point(CanvasPoint),
    Connector(Connector),
    Marker(Marker),
}

impl Content {
    pub fn id(&self) -> &str {
        match self {
            Content::Shape(s) => &s.id,
            Content::Point(p) => p.id(),
            Content::Connector(c) => &c.id,
            Content::Marker(m) => &m.id,
        }
    }

    /// Id of the enclosing content, `None` for top-level content.
    pub fn parent(&self) -> Option<&str> {
        match self {
            Content::Shape(s) => s.parent.as_deref(),
            Content::Point(p) => p.parent(),
            Content::Connector(c) => c.parent.as_deref(),
            Content::Marker(m) => Some(m.connector.as_str()),
        }
    }

    /// Human readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Content::Shape(_) => "shape",
            Content::Point(_) => "point",
            Content::Connector(_) => "connector",
            Content::Marker(_) => "marker",
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Content::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&CanvasPoint> {
        match self {
            Content::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Content::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<&Marker> {
        match self {
            Content::Marker(m) => Some(m),
            _ => None,
        }
    }

    /// Ids this content references, excluding its parent and children.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Content::Shape(s) => s.pos.as_deref().into_iter().collect(),
            Content::Point(CanvasPoint::Absolute(_)) => Vec::new(),
            Content::Point(CanvasPoint::Relative(p)) => vec![p.target.as_str()],
            Content::Point(CanvasPoint::Line(p)) => vec![p.line_provider.as_str()],
            Content::Connector(c) => {
                let mut ids = vec![c.start.as_str()];
                for segment in &c.segments {
                    ids.push(segment.end());
                    if let Some((first, second)) = segment.control_points() {
                        ids.push(first);
                        ids.push(second);
                    }
                }
                ids.extend(c.start_marker.as_deref());
                ids.extend(c.end_marker.as_deref());
                ids
            }
            Content::Marker(m) => vec![m.connector.as_str()],
        }
    }

    /// Ids of owned child content.
    pub fn children(&self) -> &[ContentId] {
        match self {
            Content::Shape(s) => &s.children,
            Content::Marker(m) => &m.children,
            Content::Point(_) | Content::Connector(_) => &[],
        }
    }
}

impl From<Shape> for Content {
    fn from(shape: Shape) -> Self {
        Content::Shape(shape)
    }
}

impl From<CanvasPoint> for Content {
    fn from(point: CanvasPoint) -> Self {
        Content::Point(point)
    }
}

impl From<AbsolutePoint> for Content {
    fn from(point: AbsolutePoint) -> Self {
        Content::Point(CanvasPoint::Absolute(point))
    }
}

impl From<RelativePoint> for Content {
    fn from(point: RelativePoint) -> Self {
        Content::Point(CanvasPoint::Relative(point))
    }
}

impl From<LinePoint> for Content {
    fn from(point: LinePoint) -> Self {
        Content::Point(CanvasPoint::Line(point))
    }
}

impl From<Connector> for Content {
    fn from(connector: Connector) -> Self {
        Content::Connector(connector)
    }
}

impl From<Marker> for Content {
    fn from(marker: Marker) -> Self {
        Content::Marker(marker)
    }
}

/// Read access to an immutable content snapshot.
///
/// Lookups are expected to be O(1) or O(log n). The typed helpers turn a
/// missing id into [`CanvasError::UnresolvedId`] and a content of the wrong
/// kind into [`CanvasError::UnexpectedKind`].
pub trait ContentSource {
    /// Look up content by id.
    fn get(&self, id: &str) -> Option<&Content>;

    /// Iterate over all content in the snapshot.
    fn all_content(&self) -> impl Iterator<Item = &Content>;

    /// Get the enclosing content of `id`.
    fn parent_of(&self, id: &str) -> Option<&Content> {
        self.get(id)?.parent().and_then(|parent| self.get(parent))
    }

    /// Look up content by id, failing on unknown ids.
    fn resolve(&self, id: &str) -> CanvasResult<&Content> {
        self.get(id)
            .ok_or_else(|| CanvasError::UnresolvedId(id.to_string()))
    }

    fn shape(&self, id: &str) -> CanvasResult<&Shape> {
        let content = self.resolve(id)?;
        content.as_shape().ok_or_else(|| unexpected(id, "shape"))
    }

    fn point(&self, id: &str) -> CanvasResult<&CanvasPoint> {
        let content = self.resolve(id)?;
        content.as_point().ok_or_else(|| unexpected(id, "point"))
    }

    fn connector(&self, id: &str) -> CanvasResult<&Connector> {
        let content = self.resolve(id)?;
        content.as_connector().ok_or_else(|| unexpected(id, "connector"))
    }

    fn marker(&self, id: &str) -> CanvasResult<&Marker> {
        let content = self.resolve(id)?;
        content.as_marker().ok_or_else(|| unexpected(id, "marker"))
    }
}

fn unexpected(id: &str, expected: &'static str) -> CanvasError {
    CanvasError::UnexpectedKind {
        id: id.to_string(),
        expected,
    }
}

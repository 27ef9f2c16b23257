//! Shape content.

use super::{ContentId, new_content_id};
use serde::{Deserialize, Serialize};

/// A sized, rotatable piece of content anchored to a point.
///
/// The shape occupies the `width × height` rectangle whose top-left corner is
/// `(dx, dy)` away from its anchor, rotated by `rotation` degrees about the
/// anchor. A shape is also a coordinate frame for its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ContentId,
    /// Enclosing content.
    #[serde(default)]
    pub parent: Option<ContentId>,
    /// Anchor point (None = the canvas origin).
    #[serde(default)]
    pub pos: Option<ContentId>,
    /// Rotation about the anchor in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Horizontal offset from the anchor.
    #[serde(default)]
    pub dx: f64,
    /// Vertical offset from the anchor.
    #[serde(default)]
    pub dy: f64,
    pub width: f64,
    pub height: f64,
    /// Ordered child content.
    #[serde(default)]
    pub children: Vec<ContentId>,
}

impl Shape {
    /// Create a new unanchored shape.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_id(new_content_id(), width, height)
    }

    /// Create a new shape with a specific ID.
    pub fn with_id(id: impl Into<ContentId>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            parent: None,
            pos: None,
            rotation: 0.0,
            dx: 0.0,
            dy: 0.0,
            width,
            height,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Anchor the shape to a point (builder style).
    pub fn at(mut self, pos: impl Into<ContentId>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    /// Set the rotation in degrees (builder style).
    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the offset from the anchor (builder style).
    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }
}

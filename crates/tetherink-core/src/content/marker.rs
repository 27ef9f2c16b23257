//! Connector markers.

use super::{ContentId, new_content_id};
use serde::{Deserialize, Serialize};

/// Connector end a marker is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAnchor {
    Start,
    End,
}

/// An arrowhead or decoration at a connector endpoint.
///
/// A marker is a nested coordinate frame: its `width × height` box is placed so
/// that the fraction `(ref_x, ref_y)` of the box sits on the connector endpoint,
/// rotated along the connector direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub(crate) id: ContentId,
    /// Owning connector.
    pub connector: ContentId,
    pub anchor: MarkerAnchor,
    #[serde(default)]
    pub ref_x: f64,
    #[serde(default)]
    pub ref_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub children: Vec<ContentId>,
}

impl Marker {
    pub fn new(connector: impl Into<ContentId>, anchor: MarkerAnchor, width: f64, height: f64) -> Self {
        Self::with_id(new_content_id(), connector, anchor, width, height)
    }

    pub fn with_id(
        id: impl Into<ContentId>,
        connector: impl Into<ContentId>,
        anchor: MarkerAnchor,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            connector: connector.into(),
            anchor,
            ref_x: 0.0,
            ref_y: 0.0,
            width,
            height,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the reference fractions (builder style).
    pub fn with_ref(mut self, ref_x: f64, ref_y: f64) -> Self {
        self.ref_x = ref_x;
        self.ref_y = ref_y;
        self
    }
}

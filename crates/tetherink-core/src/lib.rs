//! TetherInk Core Library
//!
//! Geometric core of the TetherInk diagram editor: decides what moves when
//! content is dragged, projects points onto connectors and shape outlines,
//! and computes bounding boxes for the canvas container.

pub mod bounds;
pub mod content;
pub mod error;
pub mod geometry;
pub mod line;
pub mod precision;
pub mod resolve;
pub mod selection;

pub use bounds::{canvas_bounds, connector_bounds, marker_bounds, merge, shape_bounds};
pub use content::{Content, ContentId, ContentSource, ContentStore};
pub use error::{CanvasError, CanvasResult};
pub use geometry::Bounds;
pub use line::{Line, LineProjection, LineSegment, TransformedLine};
pub use precision::{PrecisionSettings, project_onto_provider, project_with_precision};
pub use resolve::Resolver;
pub use selection::{MoveSelection, MoveSelectionEngine, compute_move_selection};

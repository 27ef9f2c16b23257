//! In-memory content snapshot.

use super::{CanvasPoint, Content, ContentId, ContentSource, MarkerAnchor, new_content_id};
use crate::error::{CanvasError, CanvasResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serialized form of a snapshot: content in insertion order.
#[derive(Serialize, Deserialize)]
struct StoreData {
    id: String,
    content: Vec<Content>,
}

/// An arena of canvas content keyed by id.
///
/// The store is built once per diagram evaluation and then only read. Content
/// keeps its insertion order, which is the order `all_content` yields.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    /// Snapshot identifier.
    pub id: String,
    content: HashMap<ContentId, Content>,
    order: Vec<ContentId>,
}

impl ContentStore {
    /// Create a new empty snapshot.
    pub fn new() -> Self {
        Self {
            id: new_content_id(),
            content: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add content. Content with an id already present replaces the old entry
    /// and keeps its position.
    pub fn add(&mut self, content: impl Into<Content>) -> ContentId {
        let content = content.into();
        let id = content.id().to_string();
        if self.content.insert(id.clone(), content).is_none() {
            self.order.push(id.clone());
        }
        id
    }

    /// Add content as the last child of `parent`.
    ///
    /// Shapes and markers list the child in their `children`; a marker added to
    /// a connector occupies the connector's marker slot for its anchor.
    pub fn add_child(&mut self, parent: &str, content: impl Into<Content>) -> CanvasResult<ContentId> {
        let mut content = content.into();
        let child_id = content.id().to_string();
        match &mut content {
            Content::Shape(shape) => shape.parent = Some(parent.to_string()),
            Content::Point(point) => point.set_parent(parent.to_string()),
            Content::Connector(connector) => connector.parent = Some(parent.to_string()),
            Content::Marker(marker) => marker.connector = parent.to_string(),
        }
        let anchor = content.as_marker().map(|marker| marker.anchor);

        let parent_content = self
            .content
            .get_mut(parent)
            .ok_or_else(|| CanvasError::UnresolvedId(parent.to_string()))?;
        match (parent_content, anchor) {
            (Content::Connector(connector), Some(MarkerAnchor::Start)) => {
                connector.start_marker = Some(child_id.clone());
            }
            (Content::Connector(connector), Some(MarkerAnchor::End)) => {
                connector.end_marker = Some(child_id.clone());
            }
            (Content::Shape(shape), None) => shape.children.push(child_id.clone()),
            (Content::Marker(marker), None) => marker.children.push(child_id.clone()),
            (other, _) => {
                return Err(CanvasError::UnexpectedKind {
                    id: other.id().to_string(),
                    expected: "container",
                });
            }
        }
        Ok(self.add(content))
    }

    /// Remove content (children are not removed).
    pub fn remove(&mut self, id: &str) -> Option<Content> {
        self.order.retain(|content_id| content_id != id);
        self.content.remove(id)
    }

    /// Top-level content in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Content> {
        self.all_content().filter(|content| content.parent().is_none())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check that every referenced id resolves and every connector has a segment.
    pub fn validate(&self) -> CanvasResult<()> {
        for content in self.all_content() {
            if let Content::Connector(connector) = content {
                if connector.segments.is_empty() {
                    return Err(CanvasError::InvalidConnector(connector.id.clone()));
                }
            }
            let parent = content.parent().into_iter();
            let children = content.children().iter().map(String::as_str);
            for id in content.references().into_iter().chain(parent).chain(children) {
                self.resolve(id)?;
            }
            if let Content::Point(CanvasPoint::Relative(point)) = content {
                if point.target == point.id {
                    return Err(CanvasError::CyclicReference(point.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Serialize the snapshot to JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        let data = StoreData {
            id: self.id.clone(),
            content: self.all_content().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Read a snapshot from JSON.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let data: StoreData = serde_json::from_str(json)?;
        let mut store = Self {
            id: data.id,
            content: HashMap::with_capacity(data.content.len()),
            order: Vec::with_capacity(data.content.len()),
        };
        for content in data.content {
            store.add(content);
        }
        Ok(store)
    }
}

impl ContentSource for ContentStore {
    fn get(&self, id: &str) -> Option<&Content> {
        self.content.get(id)
    }

    fn all_content(&self) -> impl Iterator<Item = &Content> {
        self.order.iter().filter_map(|id| self.content.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AbsolutePoint, Connector, Marker, RelativePoint, Shape};

    fn sample_store() -> ContentStore {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("p", 10.0, 20.0));
        store.add(Shape::with_id("s", 100.0, 50.0).at("p"));
        store
            .add_child("s", AbsolutePoint::with_id("inner", 5.0, 5.0))
            .unwrap();
        store.add(AbsolutePoint::with_id("q", 200.0, 20.0));
        store.add(Connector::straight("c", "p", "q"));
        store
            .add_child("c", Marker::with_id("m", "c", MarkerAnchor::End, 10.0, 10.0))
            .unwrap();
        store
    }

    #[test]
    fn test_store_creation() {
        let store = ContentStore::new();
        assert!(store.is_empty());
        assert!(!store.id.is_empty());
    }

    #[test]
    fn test_add_child_links_parent() {
        let store = sample_store();
        assert_eq!(store.parent_of("inner").map(Content::id), Some("s"));
        assert_eq!(store.shape("s").unwrap().children, vec!["inner".to_string()]);
        assert_eq!(store.connector("c").unwrap().end_marker.as_deref(), Some("m"));
        assert_eq!(store.parent_of("m").map(Content::id), Some("c"));
    }

    #[test]
    fn test_add_child_to_point_fails() {
        let mut store = sample_store();
        let result = store.add_child("p", AbsolutePoint::with_id("x", 0.0, 0.0));
        assert!(matches!(result, Err(CanvasError::UnexpectedKind { .. })));
    }

    #[test]
    fn test_insertion_order_and_roots() {
        let store = sample_store();
        let ids: Vec<&str> = store.all_content().map(Content::id).collect();
        assert_eq!(ids, vec!["p", "s", "inner", "q", "c", "m"]);
        let roots: Vec<&str> = store.roots().map(Content::id).collect();
        assert_eq!(roots, vec!["p", "s", "q", "c"]);
    }

    #[test]
    fn test_typed_lookup_errors() {
        let store = sample_store();
        assert_eq!(
            store.shape("missing").unwrap_err(),
            CanvasError::UnresolvedId("missing".into())
        );
        assert!(matches!(
            store.connector("p"),
            Err(CanvasError::UnexpectedKind { expected: "connector", .. })
        ));
    }

    #[test]
    fn test_validate() {
        let mut store = sample_store();
        assert!(store.validate().is_ok());

        store.add(RelativePoint::with_id("r", "nowhere", 1.0, 1.0));
        assert_eq!(
            store.validate(),
            Err(CanvasError::UnresolvedId("nowhere".into()))
        );
        store.remove("r");

        store.add(Connector::with_id("empty", "p", Vec::new()));
        assert_eq!(
            store.validate(),
            Err(CanvasError::InvalidConnector("empty".into()))
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let store = sample_store();
        let json = store.to_json().unwrap();
        let restored = ContentStore::from_json(&json).unwrap();

        assert_eq!(restored.id, store.id);
        assert_eq!(restored.len(), store.len());
        for content in store.all_content() {
            assert_eq!(restored.get(content.id()), Some(content));
        }
    }

    #[test]
    fn test_from_json_tagged_content() {
        let json = r#"{
            "id": "doc",
            "content": [
                {"type": "point", "kind": "absolute", "id": "a", "x": 1.0, "y": 2.0},
                {"type": "point", "kind": "line", "id": "l", "line_provider": "s", "pos": 0.5},
                {"type": "shape", "id": "s", "pos": "a", "width": 10.0, "height": 5.0}
            ]
        }"#;
        let store = ContentStore::from_json(json).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.shape("s").is_ok());
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ContentStore::from_json("{not json"),
            Err(CanvasError::Serialization(_))
        ));
    }
}

//! Move selection: which content a drag must edit, and what follows along.
//!
//! Selecting content does not always mean editing its coordinates. A
//! connector is moved by moving the end of its last segment, a shape anchored
//! to a point is moved by moving that point, and so on. The engine expands a
//! selection into the content that needs an explicit delta, prunes entries
//! already carried by others, then sweeps the snapshot for content that moves
//! as a side effect.

use crate::content::{CanvasPoint, Connector, Content, ContentId, ContentSource, MarkerAnchor};
use crate::error::CanvasResult;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Result of a move-selection computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSelection {
    /// Content that receives an explicit coordinate delta.
    pub moved_elements: BTreeSet<ContentId>,
    /// Content whose position changes only as a side effect.
    pub implicitly_moved_elements: BTreeSet<ContentId>,
    /// Some segment had only part of its points moved.
    pub has_conflict: bool,
}

impl MoveSelection {
    /// Every id that moves, explicitly or not.
    pub fn all_moved(&self) -> BTreeSet<ContentId> {
        self.moved_elements
            .union(&self.implicitly_moved_elements)
            .cloned()
            .collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.moved_elements.contains(id) || self.implicitly_moved_elements.contains(id)
    }
}

/// Compute the move selection for `selected` over `graph`.
pub fn compute_move_selection<'s, G: ContentSource>(
    graph: &G,
    selected: impl IntoIterator<Item = &'s str>,
) -> CanvasResult<MoveSelection> {
    let mut engine = MoveSelectionEngine::new(graph);
    engine.expand(selected)?;
    engine.prune()?;
    engine.sweep()?;
    Ok(engine.finish())
}

/// Stepwise move-selection computation over one snapshot.
///
/// The implicit-move memo lives as long as the engine; use a fresh engine per
/// selection.
pub struct MoveSelectionEngine<'a, G: ContentSource> {
    graph: &'a G,
    selection: MoveSelection,
    implicit: HashMap<ContentId, bool>,
    in_progress: HashSet<ContentId>,
}

impl<'a, G: ContentSource> MoveSelectionEngine<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            selection: MoveSelection::default(),
            implicit: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Current state of the selection.
    pub fn selection(&self) -> &MoveSelection {
        &self.selection
    }

    /// Replace selected content with the content whose coordinates must be edited.
    pub fn expand<'s>(&mut self, selected: impl IntoIterator<Item = &'s str>) -> CanvasResult<()> {
        let graph = self.graph;
        let mut queue: VecDeque<ContentId> = selected.into_iter().map(str::to_string).collect();
        let mut visited = HashSet::new();

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            match graph.resolve(&id)? {
                Content::Connector(connector) => queue.push_back(connector.end()?.to_string()),
                Content::Marker(marker) => {
                    let connector = graph.connector(&marker.connector)?;
                    queue.push_back(connector.anchor_point(marker.anchor)?.to_string());
                }
                Content::Shape(shape) => {
                    if let Some(pos) = &shape.pos {
                        queue.push_back(pos.clone());
                    }
                    self.selection.moved_elements.insert(id);
                }
                Content::Point(CanvasPoint::Relative(point)) if !point.editable => {
                    queue.push_back(point.target.clone());
                }
                Content::Point(_) => {
                    self.selection.moved_elements.insert(id);
                }
            }
        }
        Ok(())
    }

    /// Transfer moved content already carried by other moved content to the
    /// implicit set. Partial segment moves raise the conflict flag.
    pub fn prune(&mut self) -> CanvasResult<()> {
        let candidates: Vec<ContentId> = self.selection.moved_elements.iter().cloned().collect();
        for id in candidates {
            if self.implicitly_moved(&id, true)? {
                log::debug!("{id} already moves with the selection");
                self.selection.moved_elements.remove(&id);
                self.selection.implicitly_moved_elements.insert(id);
            }
        }
        Ok(())
    }

    /// Add every shape and point that moves as a side effect to the implicit set.
    pub fn sweep(&mut self) -> CanvasResult<()> {
        let graph = self.graph;
        for content in graph.all_content() {
            if !matches!(content, Content::Shape(_) | Content::Point(_)) {
                continue;
            }
            let id = content.id();
            if self.selection.contains(id) {
                continue;
            }
            if self.implicitly_moved(id, false)? {
                self.selection.implicitly_moved_elements.insert(id.to_string());
            }
        }
        Ok(())
    }

    pub fn finish(self) -> MoveSelection {
        let selection = self.selection;
        log::debug!(
            "Move selection: {} moved, {} implicitly moved",
            selection.moved_elements.len(),
            selection.implicitly_moved_elements.len()
        );
        if selection.has_conflict {
            log::warn!("Move selection contains partially moved segments");
        }
        selection
    }

    fn is_moved(&mut self, id: &str, checks: bool) -> CanvasResult<bool> {
        if self.selection.contains(id) {
            return Ok(true);
        }
        self.implicitly_moved(id, checks)
    }

    fn implicitly_moved(&mut self, id: &str, checks: bool) -> CanvasResult<bool> {
        if let Some(moved) = self.implicit.get(id) {
            return Ok(*moved);
        }
        if !self.in_progress.insert(id.to_string()) {
            log::warn!("Reference cycle through {id}, treating it as not moved");
            return Ok(false);
        }
        let moved = self.evaluate(id, checks);
        self.in_progress.remove(id);

        let moved = moved?;
        self.implicit.insert(id.to_string(), moved);
        Ok(moved)
    }

    fn evaluate(&mut self, id: &str, checks: bool) -> CanvasResult<bool> {
        let graph = self.graph;
        match graph.resolve(id)? {
            Content::Shape(shape) => match &shape.pos {
                Some(pos) => self.is_moved(pos, checks),
                None => self.frame_moved(id, checks),
            },
            Content::Point(CanvasPoint::Absolute(_)) => self.frame_moved(id, checks),
            Content::Point(CanvasPoint::Relative(point)) => match graph.resolve(&point.target)? {
                Content::Connector(connector) => self.is_moved(connector.end()?, checks),
                _ => self.is_moved(&point.target, checks),
            },
            Content::Point(CanvasPoint::Line(point)) => match graph.resolve(&point.line_provider)? {
                Content::Shape(_) => self.is_moved(&point.line_provider, checks),
                Content::Connector(connector) => {
                    self.segment_moved(connector, connector.segment_at(&point.pos), checks)
                }
                _ => Ok(false),
            },
            Content::Marker(marker) => {
                let connector = graph.connector(&marker.connector)?;
                self.marker_moved(connector, marker.anchor, checks)
            }
            Content::Connector(_) => Ok(false),
        }
    }

    /// Whether the nearest enclosing shape or marker of `id` moves.
    fn frame_moved(&mut self, id: &str, checks: bool) -> CanvasResult<bool> {
        let graph = self.graph;
        let mut seen = HashSet::new();
        let mut current = id;
        while let Some(parent) = graph.parent_of(current) {
            if !seen.insert(parent.id()) {
                log::warn!("Parent cycle through {}, treating {id} as not moved", parent.id());
                return Ok(false);
            }
            match parent {
                Content::Shape(shape) => return self.is_moved(shape.id(), checks),
                Content::Marker(marker) => {
                    let connector = graph.connector(&marker.connector)?;
                    return self.marker_moved(connector, marker.anchor, checks);
                }
                Content::Point(_) | Content::Connector(_) => current = parent.id(),
            }
        }
        Ok(false)
    }

    fn marker_moved(&mut self, connector: &Connector, anchor: MarkerAnchor, checks: bool) -> CanvasResult<bool> {
        self.segment_moved(connector, connector.marker_segment(anchor), checks)
    }

    /// A segment moves when all of its points move.
    fn segment_moved(&mut self, connector: &Connector, index: usize, checks: bool) -> CanvasResult<bool> {
        let points = connector.segment_points(index);
        let mut moved = 0;
        for point in &points {
            if self.is_moved(point, checks)? {
                moved += 1;
            }
        }
        if moved == points.len() {
            return Ok(true);
        }
        if checks && moved > 0 {
            log::warn!(
                "Segment {index} of {} is partially moved ({moved} of {} points)",
                connector.id(),
                points.len()
            );
            self.selection.has_conflict = true;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        AbsolutePoint, ConnectorSegment, ContentStore, LinePoint, LinePosition, Marker,
        RelativePoint, Shape,
    };
    use crate::error::CanvasError;

    fn ids(items: &[&str]) -> BTreeSet<ContentId> {
        items.iter().map(|id| id.to_string()).collect()
    }

    fn bezier_store() -> ContentStore {
        let mut store = ContentStore::new();
        for (id, x, y) in [("a", 0.0, 0.0), ("b", 100.0, 0.0), ("c1", 30.0, 50.0), ("c2", 70.0, 50.0)] {
            store.add(AbsolutePoint::with_id(id, x, y));
        }
        store.add(Connector::with_id(
            "c",
            "a",
            vec![ConnectorSegment::Bezier {
                end: "b".into(),
                start_control_point: "c1".into(),
                end_control_point: "c2".into(),
            }],
        ));
        store.add(LinePoint::with_id("l", "c", LinePosition::Global(0.5), 0.0));
        store
    }

    #[test]
    fn test_shape_with_pos_moves_its_anchor() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("p", 10.0, 10.0));
        store.add(Shape::with_id("s", 40.0, 20.0).at("p"));

        let mut engine = MoveSelectionEngine::new(&store);
        engine.expand(["s"]).unwrap();
        assert_eq!(engine.selection().moved_elements, ids(&["p", "s"]));

        let selection = compute_move_selection(&store, ["s"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["p"]));
        assert_eq!(selection.implicitly_moved_elements, ids(&["s"]));
        assert!(!selection.has_conflict);
    }

    #[test]
    fn test_connector_moves_its_end() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("e", 50.0, 0.0));
        store.add(Connector::straight("c", "a", "e"));

        let selection = compute_move_selection(&store, ["c"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["e"]));
        assert!(!selection.all_moved().contains("c"));
        assert!(selection.implicitly_moved_elements.is_empty());
    }

    #[test]
    fn test_locked_relative_point_moves_its_target() {
        let mut store = ContentStore::new();
        store.add(Shape::with_id("t", 10.0, 10.0));
        store.add(RelativePoint::with_id("r", "t", 5.0, 0.0));

        let selection = compute_move_selection(&store, ["r"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["t"]));
        assert_eq!(selection.implicitly_moved_elements, ids(&["r"]));
    }

    #[test]
    fn test_editable_relative_point_is_recorded() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("t", 0.0, 0.0));
        store.add(RelativePoint::with_id("r", "t", 5.0, 0.0).editable());

        let selection = compute_move_selection(&store, ["r"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["r"]));

        // With its target selected too, it only follows along.
        let selection = compute_move_selection(&store, ["r", "t"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["t"]));
        assert_eq!(selection.implicitly_moved_elements, ids(&["r"]));
    }

    #[test]
    fn test_unmoved_control_point_raises_conflict() {
        let store = bezier_store();
        let selection = compute_move_selection(&store, ["a", "b", "l"]).unwrap();
        assert!(selection.has_conflict);
        // The segment does not count as moved, so the line point keeps its delta.
        assert_eq!(selection.moved_elements, ids(&["a", "b", "l"]));
    }

    #[test]
    fn test_fully_moved_bezier_carries_line_point() {
        let store = bezier_store();
        let selection = compute_move_selection(&store, ["a", "b", "c1", "c2", "l"]).unwrap();
        assert!(!selection.has_conflict);
        assert_eq!(selection.moved_elements, ids(&["a", "b", "c1", "c2"]));
        assert_eq!(selection.implicitly_moved_elements, ids(&["l"]));
    }

    #[test]
    fn test_partial_straight_segment_conflict() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("b", 100.0, 0.0));
        store.add(Connector::straight("c", "a", "b"));
        store.add(LinePoint::with_id("l", "c", LinePosition::Global(0.5), 0.0));

        let selection = compute_move_selection(&store, ["a", "l"]).unwrap();
        assert!(selection.has_conflict);

        // The sweep runs without checks: no conflict from unselected content.
        let selection = compute_move_selection(&store, ["a"]).unwrap();
        assert!(!selection.has_conflict);
        assert!(!selection.implicitly_moved_elements.contains("l"));
    }

    #[test]
    fn test_line_point_follows_its_segment() {
        let mut store = ContentStore::new();
        for (id, x) in [("a", 0.0), ("b", 50.0), ("c", 100.0)] {
            store.add(AbsolutePoint::with_id(id, x, 0.0));
        }
        store.add(Connector::with_id(
            "conn",
            "a",
            vec![
                ConnectorSegment::Line { end: "b".into() },
                ConnectorSegment::Line { end: "c".into() },
            ],
        ));
        store.add(LinePoint::with_id("l", "conn", LinePosition::Global(0.75), 0.0));

        let selection = compute_move_selection(&store, ["b", "c"]).unwrap();
        assert!(selection.implicitly_moved_elements.contains("l"));

        let selection = compute_move_selection(&store, ["a", "b"]).unwrap();
        assert!(!selection.implicitly_moved_elements.contains("l"));
        assert!(!selection.has_conflict);
    }

    #[test]
    fn test_sweep_finds_downstream_content() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("p", 0.0, 0.0));
        store.add(Shape::with_id("s", 40.0, 20.0).at("p"));
        store.add_child("s", AbsolutePoint::with_id("q", 5.0, 5.0)).unwrap();
        store.add(AbsolutePoint::with_id("x", 200.0, 0.0));
        store.add(Connector::straight("c", "x", "q"));
        store.add(RelativePoint::with_id("r", "c", 0.0, 10.0).editable());
        store.add(LinePoint::with_id("outline", "s", LinePosition::Global(0.5), 0.0));

        let selection = compute_move_selection(&store, ["s"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["p"]));
        assert_eq!(
            selection.implicitly_moved_elements,
            ids(&["outline", "q", "r", "s"])
        );
        assert!(selection.moved_elements.is_disjoint(&selection.implicitly_moved_elements));
    }

    #[test]
    fn test_closure_over_dependency_chain() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("root", 0.0, 0.0));
        let mut previous = "root".to_string();
        for i in 0..5 {
            let id = format!("r{i}");
            store.add(RelativePoint::with_id(id.clone(), previous, 1.0, 0.0).editable());
            previous = id;
        }
        store.add(AbsolutePoint::with_id("other", 9.0, 9.0));

        let selection = compute_move_selection(&store, ["root"]).unwrap();
        assert_eq!(selection.implicitly_moved_elements, ids(&["r0", "r1", "r2", "r3", "r4"]));
        assert!(!selection.all_moved().contains("other"));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut store = bezier_store();
        store.add(Shape::with_id("s", 10.0, 10.0).at("a"));

        let mut engine = MoveSelectionEngine::new(&store);
        engine.expand(["s", "a", "b", "l"]).unwrap();
        engine.prune().unwrap();
        let once = engine.selection().clone();
        engine.prune().unwrap();
        assert_eq!(engine.selection(), &once);
        assert!(once.moved_elements.is_disjoint(&once.implicitly_moved_elements));
    }

    #[test]
    fn test_marker_moves_its_anchor_point() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("b", 100.0, 0.0));
        store.add(Connector::straight("c", "a", "b"));
        store
            .add_child("c", Marker::with_id("m", "c", MarkerAnchor::End, 10.0, 10.0))
            .unwrap();
        store.add_child("m", AbsolutePoint::with_id("k", 1.0, 1.0)).unwrap();

        let selection = compute_move_selection(&store, ["m"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["b"]));
        assert!(!selection.implicitly_moved_elements.contains("k"));

        let selection = compute_move_selection(&store, ["a", "m"]).unwrap();
        assert_eq!(selection.moved_elements, ids(&["a", "b"]));
        assert_eq!(selection.implicitly_moved_elements, ids(&["k"]));
    }

    #[test]
    fn test_marker_child_with_partial_segment_raises_conflict() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(AbsolutePoint::with_id("b", 100.0, 0.0));
        store.add(Connector::straight("c", "a", "b"));
        store
            .add_child("c", Marker::with_id("m", "c", MarkerAnchor::End, 10.0, 10.0))
            .unwrap();
        store.add_child("m", AbsolutePoint::with_id("k", 1.0, 1.0)).unwrap();

        let selection = compute_move_selection(&store, ["a", "k"]).unwrap();
        assert!(selection.has_conflict);
        assert_eq!(selection.moved_elements, ids(&["a", "k"]));
        assert!(selection.implicitly_moved_elements.is_empty());
    }

    #[test]
    fn test_segment_positioned_line_point_follows_its_segment() {
        let mut store = ContentStore::new();
        for (id, x) in [("a", 0.0), ("b", 50.0), ("c", 100.0)] {
            store.add(AbsolutePoint::with_id(id, x, 0.0));
        }
        store.add(Connector::with_id(
            "conn",
            "a",
            vec![
                ConnectorSegment::Line { end: "b".into() },
                ConnectorSegment::Line { end: "c".into() },
            ],
        ));
        store.add(LinePoint::with_id(
            "l",
            "conn",
            LinePosition::Segment { segment: 1, relative: 0.5 },
            0.0,
        ));

        let selection = compute_move_selection(&store, ["b", "c"]).unwrap();
        assert_eq!(selection.implicitly_moved_elements, ids(&["l"]));
        assert!(!selection.has_conflict);

        let selection = compute_move_selection(&store, ["a", "b"]).unwrap();
        assert!(!selection.implicitly_moved_elements.contains("l"));
        assert!(!selection.has_conflict);

        let selection = compute_move_selection(&store, ["b", "l"]).unwrap();
        assert!(selection.has_conflict);
        assert_eq!(selection.moved_elements, ids(&["b", "l"]));
    }

    #[test]
    fn test_line_point_on_point_provider_is_not_moved() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(LinePoint::with_id("l", "a", LinePosition::Global(0.5), 0.0));

        let selection = compute_move_selection(&store, ["a"]).unwrap();
        assert!(selection.implicitly_moved_elements.is_empty());
    }

    #[test]
    fn test_unresolved_id_is_an_error() {
        let store = ContentStore::new();
        assert_eq!(
            compute_move_selection(&store, ["ghost"]),
            Err(CanvasError::UnresolvedId("ghost".into()))
        );

        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(RelativePoint::with_id("r", "missing", 0.0, 0.0));
        assert!(matches!(
            compute_move_selection(&store, ["a"]),
            Err(CanvasError::UnresolvedId(_))
        ));
    }

    #[test]
    fn test_reference_cycle_is_not_moved() {
        let mut store = ContentStore::new();
        store.add(AbsolutePoint::with_id("a", 0.0, 0.0));
        store.add(RelativePoint::with_id("r1", "r2", 0.0, 0.0).editable());
        store.add(RelativePoint::with_id("r2", "r1", 0.0, 0.0).editable());

        let selection = compute_move_selection(&store, ["a"]).unwrap();
        assert!(selection.implicitly_moved_elements.is_empty());
    }

    #[test]
    fn test_selection_serializes_camel_case() {
        let selection = MoveSelection {
            moved_elements: ids(&["a"]),
            implicitly_moved_elements: BTreeSet::new(),
            has_conflict: false,
        };
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["movedElements"][0], "a");
        assert_eq!(json["hasConflict"], false);
    }
}

//! Entities and the connectors between them.
//!
//! The diagram is a directed graph: entities are nodes and every connector
//! is an edge carrying its `Path`. Entities are owned here only as far as
//! connectors need them (key, bounds, outline); everything else about a
//! status or workflow lives in the document layer.

use crate::geometry::{Outline, Point, Rect, boundary_point};
use crate::id::EntityId;
use crate::model::{Anchor, Origin, Path, PathSnapshot, Waypoint};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt;

/// A box or oval that connectors attach to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub bounds: Rect,
    pub outline: Outline,
}

impl Entity {
    pub fn new(id: EntityId, bounds: Rect, outline: Outline) -> Self {
        Self {
            id,
            bounds,
            outline,
        }
    }
}

/// Handle of a connector inside one `Diagram`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(EdgeIndex);

impl ConnectorId {
    pub fn index(&self) -> usize {
        self.0.index()
    }

    pub fn from_index(index: usize) -> Self {
        ConnectorId(EdgeIndex::new(index))
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connector:{}", self.0.index())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    graph: StableDiGraph<Entity, Path>,
    index: HashMap<EntityId, NodeIndex>,
}

impl Diagram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Entities ────────────────────────────────────────────────────────

    /// # Errors
    /// Fails if an entity with the same key already exists.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), String> {
        if self.index.contains_key(&entity.id) {
            return Err(format!("entity {} already exists", entity.id));
        }
        let idx = self.graph.add_node(entity);
        self.index.insert(entity.id, idx);
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Move or resize an entity and re-seat every attached connector end.
    /// Returns the connectors whose geometry changed.
    pub fn move_entity(&mut self, id: EntityId, bounds: Rect) -> Vec<ConnectorId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        self.graph[idx].bounds = bounds;
        let attached = self.connectors_of(id);
        for &c in &attached {
            self.refresh_anchors(c);
        }
        attached
    }

    /// Remove an entity together with every connector attached to it.
    /// Returns the removed connectors so their editors can be torn down.
    pub fn remove_entity(&mut self, id: EntityId) -> Vec<ConnectorId> {
        let Some(idx) = self.index.remove(&id) else {
            return Vec::new();
        };
        let attached = self.connectors_of_index(idx);
        self.graph.remove_node(idx);
        log::debug!("removed entity {id} and {} connector(s)", attached.len());
        attached
    }

    // ─── Connectors ──────────────────────────────────────────────────────

    /// Draw a connector between two entities through the given bends.
    ///
    /// # Errors
    /// Fails if either entity is unknown or both ends are the same entity.
    pub fn add_connector(
        &mut self,
        from: EntityId,
        to: EntityId,
        waypoints: impl IntoIterator<Item = (Point, Origin)>,
    ) -> Result<ConnectorId, String> {
        let from_idx = *self
            .index
            .get(&from)
            .ok_or_else(|| format!("unknown entity {from}"))?;
        let to_idx = *self
            .index
            .get(&to)
            .ok_or_else(|| format!("unknown entity {to}"))?;
        if from_idx == to_idx {
            return Err(format!("connector from {from} to itself"));
        }

        let bends: Vec<Waypoint> = waypoints
            .into_iter()
            .map(|(pos, origin)| Waypoint::new(pos, origin))
            .collect();
        let first = bends.first().map(|w| w.position);
        let last = bends.last().map(|w| w.position);
        let (start, end) = anchor_points(&self.graph[from_idx], &self.graph[to_idx], first, last);

        let path = Path::with_waypoints(Anchor::new(from, start), Anchor::new(to, end), bends);
        let edge = self.graph.add_edge(from_idx, to_idx, path);
        Ok(ConnectorId(edge))
    }

    /// Recreate a connector from a persisted snapshot.
    ///
    /// # Errors
    /// Same as `add_connector`.
    pub fn add_connector_from_snapshot(
        &mut self,
        snapshot: &PathSnapshot,
    ) -> Result<ConnectorId, String> {
        self.add_connector(
            snapshot.start,
            snapshot.end,
            snapshot.waypoints.iter().map(|r| (r.position(), r.origin)),
        )
    }

    pub fn remove_connector(&mut self, id: ConnectorId) -> Option<Path> {
        self.graph.remove_edge(id.0)
    }

    pub fn path(&self, id: ConnectorId) -> Option<&Path> {
        self.graph.edge_weight(id.0)
    }

    pub fn path_mut(&mut self, id: ConnectorId) -> Option<&mut Path> {
        self.graph.edge_weight_mut(id.0)
    }

    pub fn connectors(&self) -> Vec<ConnectorId> {
        self.graph.edge_indices().map(ConnectorId).collect()
    }

    /// Connectors starting or ending at `entity`.
    pub fn connectors_of(&self, entity: EntityId) -> Vec<ConnectorId> {
        match self.index.get(&entity) {
            Some(&idx) => self.connectors_of_index(idx),
            None => Vec::new(),
        }
    }

    fn connectors_of_index(&self, idx: NodeIndex) -> Vec<ConnectorId> {
        let mut out: Vec<ConnectorId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| ConnectorId(e.id()))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Re-resolve both attachment points of a connector from the current
    /// entity bounds and its first/last bend. Returns `false` if unknown.
    pub fn refresh_anchors(&mut self, id: ConnectorId) -> bool {
        let Some((from_idx, to_idx)) = self.graph.edge_endpoints(id.0) else {
            return false;
        };
        let from = self.graph[from_idx];
        let to = self.graph[to_idx];
        let Some(path) = self.graph.edge_weight_mut(id.0) else {
            return false;
        };
        let first = path.waypoints().first().map(|w| w.position);
        let last = path.waypoints().last().map(|w| w.position);
        let (start, end) = anchor_points(&from, &to, first, last);
        path.set_anchor_points(start, end);
        true
    }
}

/// Start and end attachment points: each end faces its adjacent bend, or
/// the other entity's center when the connector is straight.
fn anchor_points(
    from: &Entity,
    to: &Entity,
    first: Option<Point>,
    last: Option<Point>,
) -> (Point, Point) {
    let start_toward = first.unwrap_or_else(|| to.bounds.center());
    let end_toward = last.unwrap_or_else(|| from.bounds.center());
    (
        boundary_point(&from.bounds, from.outline, start_toward),
        boundary_point(&to.bounds, to.outline, end_toward),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_boxes() -> Diagram {
        let mut d = Diagram::new();
        d.add_entity(Entity::new(
            EntityId::intern("open"),
            Rect::new(0.0, 0.0, 100.0, 40.0),
            Outline::Rect,
        ))
        .unwrap();
        d.add_entity(Entity::new(
            EntityId::intern("done"),
            Rect::new(300.0, 0.0, 100.0, 40.0),
            Outline::Rect,
        ))
        .unwrap();
        d
    }

    #[test]
    fn straight_connector_attaches_to_facing_edges() {
        let mut d = two_boxes();
        let c = d
            .add_connector(EntityId::intern("open"), EntityId::intern("done"), [])
            .unwrap();
        let path = d.path(c).unwrap();
        assert_eq!(path.start().point, Point::new(100.0, 20.0));
        assert_eq!(path.end().point, Point::new(300.0, 20.0));
    }

    #[test]
    fn anchors_face_the_adjacent_bend() {
        let mut d = two_boxes();
        let c = d
            .add_connector(
                EntityId::intern("open"),
                EntityId::intern("done"),
                [(Point::new(50.0, 200.0), Origin::OriginDefined)],
            )
            .unwrap();
        let path = d.path(c).unwrap();
        assert_eq!(path.start().point, Point::new(50.0, 40.0));
    }

    #[test]
    fn duplicate_entity_is_rejected() {
        let mut d = two_boxes();
        let err = d
            .add_entity(Entity::new(
                EntityId::intern("open"),
                Rect::new(0.0, 0.0, 1.0, 1.0),
                Outline::Rect,
            ))
            .unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn unknown_or_self_connector_is_rejected() {
        let mut d = two_boxes();
        assert!(d
            .add_connector(EntityId::intern("open"), EntityId::intern("nowhere"), [])
            .is_err());
        assert!(d
            .add_connector(EntityId::intern("open"), EntityId::intern("open"), [])
            .is_err());
    }

    #[test]
    fn moving_entity_reseats_anchor() {
        let mut d = two_boxes();
        let c = d
            .add_connector(EntityId::intern("open"), EntityId::intern("done"), [])
            .unwrap();
        let changed = d.move_entity(EntityId::intern("done"), Rect::new(300.0, 100.0, 100.0, 40.0));
        assert_eq!(changed, vec![c]);
        let end = d.path(c).unwrap().end().point;
        assert!((end.x - 300.0).abs() < 1e-9 || (end.y - 100.0).abs() < 1e-9, "{end:?}");
    }

    #[test]
    fn removing_entity_cascades_to_connectors() {
        let mut d = two_boxes();
        let c = d
            .add_connector(EntityId::intern("open"), EntityId::intern("done"), [])
            .unwrap();
        let removed = d.remove_entity(EntityId::intern("open"));
        assert_eq!(removed, vec![c]);
        assert!(d.path(c).is_none());
        assert!(d.connectors().is_empty());
    }

    #[test]
    fn snapshot_roundtrip_through_diagram() {
        let mut d = two_boxes();
        let c = d
            .add_connector(
                EntityId::intern("open"),
                EntityId::intern("done"),
                [
                    (Point::new(150.0, 120.0), Origin::OriginDefined),
                    (Point::new(250.0, 120.0), Origin::UserCreated),
                ],
            )
            .unwrap();
        let snap = d.path(c).unwrap().snapshot();
        let c2 = d.add_connector_from_snapshot(&snap).unwrap();
        assert_eq!(d.path(c2).unwrap().snapshot(), snap);
        assert_eq!(d.connectors_of(EntityId::intern("done")), vec![c, c2]);
    }
}

//! Waypoint and path model for one multi-segment connector.
//!
//! A `Path` stores only the interior waypoints; the two anchors are implicit
//! endpoints whose attachment points are cached here and refreshed by the
//! diagram when an entity moves. Segment `i` runs from point `i` to point
//! `i + 1` of `[start, waypoints…, end]`.
//!
//! Every mutation ends with a normalization pass that drops coinciding
//! consecutive points, so a zero-length segment never survives an edit.

use crate::geometry::{Point, midpoint};
use crate::id::{EntityId, WaypointId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Waypoint ────────────────────────────────────────────────────────────

/// Where a waypoint came from. Set once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Loaded from the document. Never removed by merge evaluation.
    #[serde(rename = "origin")]
    OriginDefined,
    /// Created by splitting a segment in the editor.
    #[serde(rename = "user")]
    UserCreated,
}

/// A bend point on a connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    id: WaypointId,
    pub position: Point,
    origin: Origin,
}

impl Waypoint {
    pub fn new(position: Point, origin: Origin) -> Self {
        Self {
            id: WaypointId::fresh(),
            position,
            origin,
        }
    }

    pub fn origin_defined(position: Point) -> Self {
        Self::new(position, Origin::OriginDefined)
    }

    pub fn user_created(position: Point) -> Self {
        Self::new(position, Origin::UserCreated)
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Only user-created waypoints may be removed by merge evaluation.
    pub fn is_deletable(&self) -> bool {
        self.origin == Origin::UserCreated
    }
}

// ─── Anchor ──────────────────────────────────────────────────────────────

/// One end of a connector: the entity it attaches to plus the resolved
/// attachment point on that entity's outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub entity: EntityId,
    pub point: Point,
}

impl Anchor {
    pub fn new(entity: EntityId, point: Point) -> Self {
        Self { entity, point }
    }
}

// ─── Path ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Path {
    start: Anchor,
    end: Anchor,
    waypoints: SmallVec<[Waypoint; 4]>,
}

impl Path {
    /// A straight connector with no bends.
    pub fn new(start: Anchor, end: Anchor) -> Self {
        Self {
            start,
            end,
            waypoints: SmallVec::new(),
        }
    }

    /// A connector with the given bends, normalized.
    pub fn with_waypoints(
        start: Anchor,
        end: Anchor,
        waypoints: impl IntoIterator<Item = Waypoint>,
    ) -> Self {
        let mut path = Self {
            start,
            end,
            waypoints: waypoints.into_iter().collect(),
        };
        path.normalize(None);
        path
    }

    pub fn start(&self) -> &Anchor {
        &self.start
    }

    pub fn end(&self) -> &Anchor {
        &self.end
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    pub fn index_of(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    /// Full point sequence `[start, waypoints…, end]`.
    pub fn points(&self) -> Vec<Point> {
        let mut pts = Vec::with_capacity(self.waypoints.len() + 2);
        pts.push(self.start.point);
        pts.extend(self.waypoints.iter().map(|w| w.position));
        pts.push(self.end.point);
        pts
    }

    /// Point `i` of the full sequence (0 = start anchor).
    fn point_at(&self, i: usize) -> Option<Point> {
        let n = self.waypoints.len();
        match i {
            0 => Some(self.start.point),
            i if i <= n => Some(self.waypoints[i - 1].position),
            i if i == n + 1 => Some(self.end.point),
            _ => None,
        }
    }

    /// Always `waypoints + 1`: even a bare connector has one segment.
    pub fn segment_count(&self) -> usize {
        self.waypoints.len() + 1
    }

    pub fn segment(&self, i: usize) -> Option<(Point, Point)> {
        if i >= self.segment_count() {
            return None;
        }
        Some((self.point_at(i)?, self.point_at(i + 1)?))
    }

    pub fn segment_midpoints(&self) -> Vec<Point> {
        self.points()
            .windows(2)
            .map(|w| midpoint(w[0], w[1]))
            .collect()
    }

    /// Previous and next point (anchor or waypoint) around a waypoint.
    pub fn neighbors(&self, id: WaypointId) -> Option<(Point, Point)> {
        let i = self.index_of(id)? + 1;
        Some((self.point_at(i - 1)?, self.point_at(i + 1)?))
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Reposition a waypoint. Position-only unless the new position
    /// coincides with a neighbor, in which case normalization drops one of
    /// the pair (see `normalize`). Returns `false` if the id is unknown.
    pub fn move_waypoint(&mut self, id: WaypointId, position: Point) -> bool {
        let Some(wp) = self.waypoints.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        wp.position = position;
        self.normalize(Some(id));
        true
    }

    /// Insert a waypoint so it splits segment `segment`. Returns the id if
    /// the waypoint survives normalization, `None` if the segment index is
    /// out of range or the insert was healed away.
    pub fn insert_waypoint(&mut self, segment: usize, waypoint: Waypoint) -> Option<WaypointId> {
        if segment >= self.segment_count() {
            return None;
        }
        let id = waypoint.id;
        self.waypoints.insert(segment, waypoint);
        self.normalize(Some(id));
        self.index_of(id).map(|_| id)
    }

    pub fn remove_waypoint(&mut self, id: WaypointId) -> Option<Waypoint> {
        let idx = self.index_of(id)?;
        let removed = self.waypoints.remove(idx);
        self.normalize(None);
        Some(removed)
    }

    /// Refresh the cached attachment points (after an entity moved).
    pub fn set_anchor_points(&mut self, start: Point, end: Point) {
        self.start.point = start;
        self.end.point = end;
        self.normalize(None);
    }

    /// Drop waypoints until no two consecutive points coincide.
    ///
    /// Anchors are never dropped. Within a coinciding pair the victim is,
    /// in order of preference: a user-created waypoint other than `keep`,
    /// `keep` itself if user-created, an origin-defined waypoint other than
    /// `keep`, then `keep`. Ties go to the later waypoint.
    fn normalize(&mut self, keep: Option<WaypointId>) {
        loop {
            let pts = self.points();
            let Some(i) = pts.windows(2).position(|w| w[0] == w[1]) else {
                break;
            };

            let n = self.waypoints.len();
            let rank = |w: &Waypoint| match (w.origin, Some(w.id) == keep) {
                (Origin::UserCreated, false) => 0,
                (Origin::UserCreated, true) => 1,
                (Origin::OriginDefined, false) => 2,
                (Origin::OriginDefined, true) => 3,
            };
            // Point j of the full sequence is waypoint j - 1 when 1 <= j <= n.
            let victim = [i, i + 1]
                .into_iter()
                .filter(|&j| j >= 1 && j <= n)
                .map(|j| j - 1)
                .min_by_key(|&k| (rank(&self.waypoints[k]), std::cmp::Reverse(k)));

            let Some(k) = victim else {
                log::debug!(
                    "anchors {} and {} coincide; nothing to drop",
                    self.start.entity,
                    self.end.entity
                );
                break;
            };
            let wp = self.waypoints.remove(k);
            log::debug!("dropped coinciding waypoint {} at {:?}", wp.id, wp.position);
        }
    }

    // ─── Snapshot ────────────────────────────────────────────────────────

    /// Read-only export for the persistence layer.
    pub fn snapshot(&self) -> PathSnapshot {
        PathSnapshot {
            start: self.start.entity,
            end: self.end.entity,
            waypoints: self
                .waypoints
                .iter()
                .map(|w| WaypointRecord {
                    x: w.position.x,
                    y: w.position.y,
                    origin: w.origin,
                })
                .collect(),
        }
    }

    /// Rebuild a path from a snapshot. Waypoints get fresh ids.
    pub fn from_snapshot(snapshot: &PathSnapshot, start_point: Point, end_point: Point) -> Self {
        Self::with_waypoints(
            Anchor::new(snapshot.start, start_point),
            Anchor::new(snapshot.end, end_point),
            snapshot
                .waypoints
                .iter()
                .map(|r| Waypoint::new(Point::new(r.x, r.y), r.origin)),
        )
    }
}

/// Serializable view of a path: anchor keys plus ordered `(position, origin)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSnapshot {
    pub start: EntityId,
    pub end: EntityId,
    pub waypoints: Vec<WaypointRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub x: f64,
    pub y: f64,
    pub origin: Origin,
}

impl WaypointRecord {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

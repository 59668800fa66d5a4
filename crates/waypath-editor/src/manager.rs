//! Node manager: the bridge between one connector's `Path` and the
//! draggable node proxies drawn over it.
//!
//! The manager never owns the path. Every operation that needs geometry
//! borrows it, so proxies read the path and never the other way around.
//! Rendering instructions are queued as `ProxyChange`s and drained by the
//! host after each event.
//!
//! Proxy ids come from a per-manager counter and are never reused, so an
//! id captured before a rebuild can't alias a proxy created after it.

use crate::session::{DragTarget, InteractionSession, Phase};
use waypath_core::{
    MergeOutcome, MergeSettings, NodeProxy, Path, Point, ProxyChange, ProxyId, ProxyKind,
    ProxyState, WaypointId, evaluate_merge, split_segment,
};

#[derive(Debug, Clone)]
pub struct NodeManager {
    proxies: Vec<NodeProxy>,
    shown: bool,
    next_id: u32,
    session: InteractionSession,
    changes: Vec<ProxyChange>,
    merge: MergeSettings,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new(MergeSettings::default())
    }
}

impl NodeManager {
    pub fn new(merge: MergeSettings) -> Self {
        Self {
            proxies: Vec::new(),
            shown: false,
            next_id: 0,
            session: InteractionSession::new(),
            changes: Vec::new(),
            merge,
        }
    }

    pub fn set_merge_settings(&mut self, merge: MergeSettings) {
        self.merge = merge;
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    /// Live proxies in placement order (midpoints first, then waypoints).
    pub fn proxies(&self) -> &[NodeProxy] {
        &self.proxies
    }

    pub fn proxy(&self, id: ProxyId) -> Option<&NodeProxy> {
        self.proxies.iter().find(|p| p.id == id)
    }

    pub fn waypoint_nodes(&self) -> impl Iterator<Item = &NodeProxy> + '_ {
        self.proxies.iter().filter(|p| p.is_waypoint())
    }

    pub fn midpoint_nodes(&self) -> impl Iterator<Item = &NodeProxy> + '_ {
        self.proxies.iter().filter(|p| p.is_midpoint())
    }

    /// The proxy currently bound to `waypoint`, if shown.
    pub fn proxy_for(&self, waypoint: WaypointId) -> Option<ProxyId> {
        self.proxies
            .iter()
            .find(|p| p.waypoint() == Some(waypoint))
            .map(|p| p.id)
    }

    /// Take the rendering instructions queued since the last drain.
    pub fn drain_changes(&mut self) -> Vec<ProxyChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    // ─── Visibility ──────────────────────────────────────────────────────

    /// Build one proxy per waypoint and per segment. No-op when shown.
    pub fn show(&mut self, path: &Path) -> bool {
        if self.shown {
            log::debug!("show ignored: proxies already shown");
            return false;
        }
        self.shown = true;
        self.place_all(path);
        log::debug!(
            "showing {} waypoint and {} midpoint node(s)",
            path.len(),
            path.segment_count()
        );
        true
    }

    /// Destroy every proxy and discard any running drag. No-op when hidden.
    pub fn hide(&mut self) -> bool {
        if !self.shown {
            return false;
        }
        if self.session.is_dragging() {
            log::debug!("hide discards the active drag");
        }
        self.session.discard();
        self.remove_all();
        self.shown = false;
        true
    }

    pub fn on_selected(&mut self, path: &Path) -> bool {
        self.show(path)
    }

    pub fn on_deselected(&mut self) -> bool {
        self.hide()
    }

    // ─── Hover ───────────────────────────────────────────────────────────

    /// Point the hover highlight at `proxy` (or nothing). Ignored while
    /// dragging. Returns `true` if any proxy changed state.
    pub fn hover(&mut self, proxy: Option<ProxyId>) -> bool {
        if !self.shown {
            return false;
        }
        let proxy = proxy.filter(|id| self.proxy(*id).is_some());
        let previous = self.session.hovered();
        if !self.session.hover(proxy) {
            return false;
        }
        if let Some(prev) = previous {
            self.set_state(prev, ProxyState::Normal);
        }
        if let Some(cur) = proxy {
            self.set_state(cur, ProxyState::Hover);
        }
        true
    }

    // ─── Drag protocol ───────────────────────────────────────────────────

    /// Open a drag on `proxy`. Rejected while another drag is active, when
    /// hidden, or when `proxy` is not live.
    pub fn begin_drag(&mut self, proxy: ProxyId) -> bool {
        if !self.shown {
            log::debug!("begin_drag on {proxy} ignored: nodes hidden");
            return false;
        }
        if self.session.is_dragging() {
            log::debug!("begin_drag on {proxy} ignored: drag already active");
            return false;
        }
        let Some(node) = self.proxy(proxy).copied() else {
            log::debug!("begin_drag on stale {proxy} ignored");
            return false;
        };

        let target = match node.kind {
            ProxyKind::Waypoint { waypoint, .. } => DragTarget::Waypoint { proxy, waypoint },
            ProxyKind::Midpoint { segment } => DragTarget::Midpoint { proxy, segment },
        };
        if let Some(hovered) = self.session.hovered() {
            self.set_state(hovered, ProxyState::Normal);
        }
        self.session.begin(target);
        self.set_state(proxy, ProxyState::Dragging);
        true
    }

    /// Apply one pointer move to the dragged node.
    ///
    /// A waypoint target moves its waypoint and repositions the proxies.
    /// A midpoint target splits its segment on the first move and the drag
    /// continues on the new waypoint. Returns `false` without a drag.
    pub fn update_drag(&mut self, path: &mut Path, position: Point) -> bool {
        let Some(target) = self.session.target().filter(|_| self.session.is_dragging()) else {
            log::debug!("update_drag ignored: no active drag");
            return false;
        };
        let first = self.session.mark_moved();

        match target {
            DragTarget::Waypoint { waypoint, .. } => {
                if !path.move_waypoint(waypoint, position) {
                    log::debug!("drag target {waypoint} is gone; ending drag");
                    self.session.discard();
                    self.rebuild(path);
                    return true;
                }
                log::trace!("moved {waypoint} to ({}, {})", position.x, position.y);
                if self.matches_topology(path) {
                    self.sync_positions(path);
                } else {
                    // Normalization dropped a coinciding bend.
                    self.rebuild(path);
                    self.rebind(waypoint);
                }
            }
            DragTarget::Midpoint { segment, .. } => {
                if !first {
                    return false;
                }
                match split_segment(path, segment, position) {
                    Some(waypoint) => {
                        self.rebuild(path);
                        self.rebind(waypoint);
                    }
                    None => {
                        log::debug!("split of segment {segment} rejected; ending drag");
                        self.session.discard();
                        self.rebuild(path);
                    }
                }
            }
        }
        true
    }

    /// Close the drag and run merge evaluation on the moved waypoint.
    ///
    /// Returns the merge outcome, or `None` when no drag was active or the
    /// drag never left its midpoint.
    pub fn end_drag(&mut self, path: &mut Path) -> Option<MergeOutcome> {
        let Some(target) = self.session.finish() else {
            log::debug!("end_drag ignored: no active drag");
            return None;
        };
        match target {
            DragTarget::Waypoint { proxy, waypoint } => {
                let outcome = evaluate_merge(path, waypoint, &self.merge);
                if outcome.is_merged() {
                    self.rebuild(path);
                } else {
                    self.set_state(proxy, ProxyState::Normal);
                }
                log::debug!("released {waypoint}: {outcome:?}");
                Some(outcome)
            }
            DragTarget::Midpoint { proxy, .. } => {
                self.set_state(proxy, ProxyState::Normal);
                None
            }
        }
    }

    /// Drop the running drag, keeping whatever moves were already applied.
    pub fn discard_session(&mut self) {
        if let Some(target) = self.session.target() {
            self.set_state(target.proxy(), ProxyState::Normal);
        }
        if let Some(hovered) = self.session.hovered() {
            self.set_state(hovered, ProxyState::Normal);
        }
        self.session.discard();
    }

    /// Re-place proxies after the path changed from outside a drag
    /// (anchors re-seated, snapshot restored).
    pub fn refresh(&mut self, path: &Path) {
        if !self.shown {
            return;
        }
        if self.matches_topology(path) {
            self.sync_positions(path);
            return;
        }
        self.rebuild(path);
        match self.session.target() {
            Some(DragTarget::Waypoint { waypoint, .. }) => self.rebind(waypoint),
            Some(DragTarget::Midpoint { .. }) => {
                log::debug!("segments changed under a midpoint drag; ending drag");
                self.session.discard();
            }
            None => {}
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn place_all(&mut self, path: &Path) {
        for (segment, position) in path.segment_midpoints().into_iter().enumerate() {
            self.place(ProxyKind::Midpoint { segment }, position);
        }
        for wp in path.waypoints() {
            let kind = ProxyKind::Waypoint {
                waypoint: wp.id(),
                origin: wp.origin(),
            };
            self.place(kind, wp.position);
        }
    }

    fn place(&mut self, kind: ProxyKind, position: Point) -> ProxyId {
        let id = ProxyId(self.next_id);
        self.next_id += 1;
        let proxy = NodeProxy {
            id,
            kind,
            position,
            state: ProxyState::Normal,
        };
        self.proxies.push(proxy);
        self.changes.push(ProxyChange::Place(proxy));
        id
    }

    fn remove_all(&mut self) {
        for proxy in self.proxies.drain(..) {
            self.changes.push(ProxyChange::Remove(proxy.id));
        }
    }

    fn rebuild(&mut self, path: &Path) {
        self.remove_all();
        if !self.session.is_dragging() {
            self.session.hover(None);
        }
        self.place_all(path);
        log::debug!("rebuilt {} node proxies", self.proxies.len());
    }

    /// Point the running drag at the fresh proxy of `waypoint`, or end it
    /// if the waypoint did not survive.
    fn rebind(&mut self, waypoint: WaypointId) {
        if !self.session.is_dragging() {
            return;
        }
        match self.proxy_for(waypoint) {
            Some(proxy) => {
                self.session
                    .retarget(DragTarget::Waypoint { proxy, waypoint });
                self.set_state(proxy, ProxyState::Dragging);
            }
            None => {
                log::debug!("{waypoint} was healed away; ending drag");
                self.session.discard();
            }
        }
    }

    fn set_state(&mut self, id: ProxyId, state: ProxyState) {
        if let Some(proxy) = self.proxies.iter_mut().find(|p| p.id == id) {
            if proxy.state != state {
                proxy.state = state;
                self.changes.push(ProxyChange::Update(*proxy));
            }
        }
    }

    /// Whether the proxies still line up one-to-one with the path's
    /// waypoints and segments.
    fn matches_topology(&self, path: &Path) -> bool {
        self.midpoint_nodes().count() == path.segment_count()
            && path
                .waypoints()
                .iter()
                .map(|w| w.id())
                .eq(self.proxies.iter().filter_map(|p| p.waypoint()))
    }

    fn sync_positions(&mut self, path: &Path) {
        let midpoints = path.segment_midpoints();
        for proxy in &mut self.proxies {
            let position = match proxy.kind {
                ProxyKind::Midpoint { segment } => midpoints.get(segment).copied(),
                ProxyKind::Waypoint { waypoint, .. } => path.waypoint(waypoint).map(|w| w.position),
            };
            if let Some(position) = position {
                if proxy.position != position {
                    proxy.position = position;
                    self.changes.push(ProxyChange::Update(*proxy));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use waypath_core::{Anchor, EntityId, Origin, Waypoint};

    fn bare_path() -> Path {
        Path::new(
            Anchor::new(EntityId::intern("a"), Point::new(0.0, 0.0)),
            Anchor::new(EntityId::intern("b"), Point::new(100.0, 0.0)),
        )
    }

    fn bent_path(origin: Origin) -> (Path, WaypointId) {
        let wp = Waypoint::new(Point::new(50.0, 50.0), origin);
        let id = wp.id();
        let path = Path::with_waypoints(*bare_path().start(), *bare_path().end(), [wp]);
        (path, id)
    }

    fn only_midpoint(m: &NodeManager) -> ProxyId {
        let ids: Vec<ProxyId> = m.midpoint_nodes().map(|p| p.id).collect();
        assert_eq!(ids.len(), 1);
        ids[0]
    }

    #[test]
    fn show_builds_nodes_from_path() {
        let (path, id) = bent_path(Origin::OriginDefined);
        let mut m = NodeManager::default();
        assert!(m.show(&path));
        assert_eq!(m.waypoint_nodes().count(), 1);
        assert_eq!(m.midpoint_nodes().count(), 2);
        let positions: Vec<Point> = m.midpoint_nodes().map(|p| p.position).collect();
        assert_eq!(positions, vec![Point::new(25.0, 25.0), Point::new(75.0, 25.0)]);
        assert!(m.proxy_for(id).is_some());
        assert_eq!(m.drain_changes().len(), 3);
    }

    #[test]
    fn show_and_hide_are_idempotent() {
        let path = bare_path();
        let mut m = NodeManager::default();
        m.show(&path);
        let first: Vec<NodeProxy> = m.proxies().to_vec();
        m.drain_changes();

        assert!(!m.show(&path));
        assert_eq!(m.proxies(), first.as_slice());
        assert!(!m.has_changes());

        assert!(m.hide());
        assert_eq!(m.drain_changes(), vec![ProxyChange::Remove(first[0].id)]);
        assert!(!m.hide());
        assert!(m.proxies().is_empty());
        assert!(!m.has_changes());
    }

    #[test]
    fn drag_requires_shown_nodes() {
        let mut m = NodeManager::default();
        assert!(!m.begin_drag(ProxyId(0)));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn update_and_end_without_drag_are_noops() {
        let mut path = bare_path();
        let mut m = NodeManager::default();
        m.show(&path);
        m.drain_changes();
        assert!(!m.update_drag(&mut path, Point::new(10.0, 10.0)));
        assert_eq!(m.end_drag(&mut path), None);
        assert!(path.is_empty());
        assert!(!m.has_changes());
    }

    #[test]
    fn midpoint_drag_splits_on_first_move_and_becomes_waypoint_drag() {
        let mut path = bare_path();
        let mut m = NodeManager::default();
        m.show(&path);
        let mid = only_midpoint(&m);
        assert!(m.begin_drag(mid));

        m.update_drag(&mut path, Point::new(50.0, 50.0));
        assert_eq!(path.len(), 1);
        let wp = path.waypoints()[0];
        assert_eq!(wp.origin(), Origin::UserCreated);
        assert!(m.proxy(mid).is_none(), "old proxy id must not survive the rebuild");

        let Some(DragTarget::Waypoint { proxy, waypoint }) = m.session().target() else {
            panic!("drag should continue on the new waypoint");
        };
        assert_eq!(waypoint, wp.id());
        assert_eq!(m.proxy(proxy).map(|p| p.state), Some(ProxyState::Dragging));

        // Later moves only reposition.
        m.update_drag(&mut path, Point::new(60.0, 40.0));
        assert_eq!(path.len(), 1);
        assert_eq!(path.waypoints()[0].position, Point::new(60.0, 40.0));
        assert_eq!(m.proxy(proxy).map(|p| p.position), Some(Point::new(60.0, 40.0)));
    }

    #[test]
    fn waypoint_drag_moves_adjacent_midpoints_only() {
        let (mut path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        let proxy = m.proxy_for(id).unwrap();
        m.begin_drag(proxy);
        m.drain_changes();

        m.update_drag(&mut path, Point::new(50.0, 80.0));
        let updated: Vec<Point> = m
            .drain_changes()
            .into_iter()
            .map(|c| match c {
                ProxyChange::Update(p) => p.position,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            updated,
            vec![
                Point::new(25.0, 40.0),
                Point::new(75.0, 40.0),
                Point::new(50.0, 80.0)
            ]
        );
        assert_eq!(m.proxy_for(id), Some(proxy));
    }

    #[test]
    fn second_begin_keeps_existing_drag() {
        let (path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        let wp_proxy = m.proxy_for(id).unwrap();
        let mid = m.midpoint_nodes().next().unwrap().id;

        assert!(m.begin_drag(wp_proxy));
        let before = m.session().target();
        assert!(!m.begin_drag(mid));
        assert_eq!(m.session().target(), before);
        assert_eq!(m.phase(), Phase::Dragging);
    }

    #[test]
    fn release_on_straight_line_merges_user_bend() {
        let (mut path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        m.begin_drag(m.proxy_for(id).unwrap());
        m.update_drag(&mut path, Point::new(50.0, 9.0));

        let outcome = m.end_drag(&mut path).unwrap();
        assert!(outcome.is_merged());
        assert!(path.is_empty());
        assert_eq!(m.waypoint_nodes().count(), 0);
        assert_eq!(m.midpoint_nodes().count(), 1);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn release_keeps_origin_bend_on_straight_line() {
        let (mut path, id) = bent_path(Origin::OriginDefined);
        let mut m = NodeManager::default();
        m.show(&path);
        let proxy = m.proxy_for(id).unwrap();
        m.begin_drag(proxy);
        m.update_drag(&mut path, Point::new(50.0, 0.5));

        assert_eq!(m.end_drag(&mut path), Some(MergeOutcome::Protected));
        assert_eq!(path.len(), 1);
        assert_eq!(m.proxy(proxy).map(|p| p.state), Some(ProxyState::Normal));
    }

    #[test]
    fn dragging_onto_an_anchor_heals_and_ends_the_drag() {
        let (mut path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        m.begin_drag(m.proxy_for(id).unwrap());

        m.update_drag(&mut path, Point::new(0.0, 0.0));
        assert!(path.is_empty());
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.midpoint_nodes().count(), 1);
        assert_eq!(m.end_drag(&mut path), None);
    }

    #[test]
    fn hide_mid_drag_discards_session_but_keeps_applied_moves() {
        let (mut path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        m.begin_drag(m.proxy_for(id).unwrap());
        m.update_drag(&mut path, Point::new(40.0, 60.0));

        m.hide();
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(path.waypoint(id).map(|w| w.position), Some(Point::new(40.0, 60.0)));
        assert_eq!(m.end_drag(&mut path), None);
    }

    #[test]
    fn hover_highlights_one_proxy_at_a_time() {
        let (path, id) = bent_path(Origin::UserCreated);
        let mut m = NodeManager::default();
        m.show(&path);
        let wp = m.proxy_for(id).unwrap();
        let mid = m.midpoint_nodes().next().unwrap().id;

        assert!(m.hover(Some(wp)));
        assert_eq!(m.phase(), Phase::Hover);
        assert!(m.hover(Some(mid)));
        assert_eq!(m.proxy(wp).map(|p| p.state), Some(ProxyState::Normal));
        assert_eq!(m.proxy(mid).map(|p| p.state), Some(ProxyState::Hover));
        assert!(!m.hover(Some(mid)));
        assert!(m.hover(None));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn refresh_follows_moved_anchor() {
        let mut path = bare_path();
        let mut m = NodeManager::default();
        m.show(&path);
        let mid = only_midpoint(&m);

        path.set_anchor_points(Point::new(0.0, 0.0), Point::new(100.0, 40.0));
        m.refresh(&path);
        assert_eq!(m.proxy(mid).map(|p| p.position), Some(Point::new(50.0, 20.0)));
    }

    #[test]
    fn proxy_ids_are_never_reused() {
        let path = bare_path();
        let mut m = NodeManager::default();
        m.show(&path);
        let first = only_midpoint(&m);
        m.hide();
        m.show(&path);
        assert_ne!(only_midpoint(&m), first);
    }
}

//! Integration tests: node manager drag protocol end to end.
//!
//! Drives a `NodeManager` against a bare `Path` the way a canvas host
//! would: show on select, begin/update/end per pointer gesture, drain the
//! queued proxy changes after each step.

use pretty_assertions::assert_eq;
use waypath_core::{
    Anchor, EntityId, MergeOutcome, Origin, Path, Point, ProxyChange, ProxyId, ProxyState,
    Waypoint,
};
use waypath_editor::{DragTarget, NodeManager, Phase};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn straight_path() -> Path {
    Path::new(
        Anchor::new(EntityId::intern("left"), Point::new(0.0, 0.0)),
        Anchor::new(EntityId::intern("right"), Point::new(100.0, 0.0)),
    )
}

fn midpoint_of_segment(m: &NodeManager, segment: usize) -> ProxyId {
    m.midpoint_nodes()
        .find(|p| matches!(p.kind, waypath_core::ProxyKind::Midpoint { segment: s } if s == segment))
        .map(|p| p.id)
        .expect("no midpoint node for segment")
}

/// Drag a node from press to release in one go.
fn drag(m: &mut NodeManager, path: &mut Path, proxy: ProxyId, to: &[Point]) -> Option<MergeOutcome> {
    assert!(m.begin_drag(proxy), "begin_drag on {proxy} rejected");
    for &p in to {
        m.update_drag(path, p);
    }
    m.end_drag(path)
}

#[test]
fn end_to_end_split_then_straighten() {
    init_logging();
    let mut path = straight_path();
    let mut m = NodeManager::default();

    // Select: one segment, no bends.
    m.on_selected(&path);
    assert_eq!(m.midpoint_nodes().count(), 1);
    assert_eq!(m.waypoint_nodes().count(), 0);

    // Pull the midpoint out: a bend appears.
    let mid = midpoint_of_segment(&m, 0);
    let outcome = drag(&mut m, &mut path, mid, &[Point::new(50.0, 50.0)]);
    assert_eq!(outcome, Some(MergeOutcome::Kept));
    assert_eq!(path.len(), 1);
    assert_eq!(path.waypoints()[0].origin(), Origin::UserCreated);
    assert_eq!(m.waypoint_nodes().count(), 1);
    assert_eq!(m.midpoint_nodes().count(), 2);

    // Push it back onto the line: it merges away on release.
    let bend = m.waypoint_nodes().next().map(|p| p.id).unwrap();
    let outcome = drag(&mut m, &mut path, bend, &[Point::new(50.0, 0.1)]);
    assert!(outcome.is_some_and(|o| o.is_merged()));
    assert!(path.is_empty());
    assert_eq!(m.waypoint_nodes().count(), 0);
    assert_eq!(m.midpoint_nodes().count(), 1);
    assert_eq!(m.phase(), Phase::Idle);
}

#[test]
fn splitting_each_segment_inserts_at_its_index() {
    init_logging();
    for segment in 0..3 {
        let mut path = Path::with_waypoints(
            *straight_path().start(),
            *straight_path().end(),
            [
                Waypoint::origin_defined(Point::new(30.0, 40.0)),
                Waypoint::origin_defined(Point::new(70.0, 40.0)),
            ],
        );
        let mut m = NodeManager::default();
        m.show(&path);
        let target = Point::new(20.0 + 30.0 * segment as f64, -60.0);

        let mid = midpoint_of_segment(&m, segment);
        m.begin_drag(mid);
        m.update_drag(&mut path, target);

        assert_eq!(path.len(), 3);
        let wp = path.waypoints()[segment];
        assert_eq!(wp.position, target);
        assert_eq!(wp.origin(), Origin::UserCreated);
        assert_eq!(
            m.session().target(),
            m.proxy_for(wp.id())
                .map(|proxy| DragTarget::Waypoint { proxy, waypoint: wp.id() })
        );
    }
}

#[test]
fn merge_thresholds_on_release() {
    init_logging();
    // (release point, merged?)
    let cases = [
        (Point::new(50.0, 0.5), true),   // ~1.1°
        (Point::new(50.0, 9.0), true),   // 9 units off the line
        (Point::new(50.0, 30.0), false), // ~62°, 30 units
    ];
    for (release, merged) in cases {
        let mut path = straight_path();
        let mut m = NodeManager::default();
        m.show(&path);
        let mid = midpoint_of_segment(&m, 0);
        let outcome = drag(&mut m, &mut path, mid, &[Point::new(50.0, 50.0), release]);
        assert_eq!(
            outcome.is_some_and(|o| o.is_merged()),
            merged,
            "release at {release:?}"
        );
        assert_eq!(path.len(), if merged { 0 } else { 1 });
    }
}

#[test]
fn origin_bend_is_never_merged() {
    init_logging();
    let wp = Waypoint::origin_defined(Point::new(50.0, 40.0));
    let id = wp.id();
    let mut path = Path::with_waypoints(*straight_path().start(), *straight_path().end(), [wp]);
    let mut m = NodeManager::default();
    m.show(&path);

    let proxy = m.proxy_for(id).unwrap();
    let outcome = drag(&mut m, &mut path, proxy, &[Point::new(50.0, 0.0)]);
    assert_eq!(outcome, Some(MergeOutcome::Protected));
    assert_eq!(path.waypoint(id).map(|w| w.position), Some(Point::new(50.0, 0.0)));
}

#[test]
fn second_press_during_drag_changes_nothing() {
    init_logging();
    let mut path = straight_path();
    let mut m = NodeManager::default();
    m.show(&path);
    let mid = midpoint_of_segment(&m, 0);
    m.begin_drag(mid);
    m.update_drag(&mut path, Point::new(50.0, 50.0));

    let target = m.session().target();
    let other = midpoint_of_segment(&m, 1);
    assert!(!m.begin_drag(other));
    assert_eq!(m.session().target(), target);
    assert_eq!(m.phase(), Phase::Dragging);
    assert_eq!(m.proxy(other).map(|p| p.state), Some(ProxyState::Normal));
}

#[test]
fn deselect_mid_drag_keeps_applied_geometry() {
    init_logging();
    let mut path = straight_path();
    let mut m = NodeManager::default();
    m.show(&path);
    m.begin_drag(midpoint_of_segment(&m, 0));
    m.update_drag(&mut path, Point::new(50.0, 50.0));
    m.update_drag(&mut path, Point::new(50.0, 1.0));

    m.on_deselected();
    assert_eq!(m.phase(), Phase::Idle);
    assert!(m.proxies().is_empty());
    // No release happened, so no merge ran.
    assert_eq!(path.len(), 1);
    assert_eq!(path.waypoints()[0].position, Point::new(50.0, 1.0));
}

#[test]
fn rendering_changes_follow_the_split() {
    init_logging();
    let mut path = straight_path();
    let mut m = NodeManager::default();
    m.show(&path);
    let mid = midpoint_of_segment(&m, 0);
    m.begin_drag(mid);
    m.drain_changes();

    m.update_drag(&mut path, Point::new(50.0, 50.0));
    let changes = m.drain_changes();
    assert_eq!(changes.first(), Some(&ProxyChange::Remove(mid)));
    let placed = changes
        .iter()
        .filter(|c| matches!(c, ProxyChange::Place(_)))
        .count();
    assert_eq!(placed, 3);
    assert!(matches!(
        changes.last(),
        Some(ProxyChange::Update(p)) if p.state == ProxyState::Dragging && p.is_waypoint()
    ));
}

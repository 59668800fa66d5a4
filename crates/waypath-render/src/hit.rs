//! Hit testing: pointer position → node proxy or connector segment.
//!
//! Proxies are checked front-to-back (last placed = topmost). Waypoint
//! nodes are always checked before midpoint nodes, so a bend sitting close
//! to a segment's midpoint stays grabbable.

use waypath_core::geometry::point_to_segment_distance;
use waypath_core::{NodeMetrics, NodeProxy, Path, Point, ProxyId, ProxyKind};

/// Find the proxy under `p`, or `None` for background.
pub fn hit_test_proxies(proxies: &[NodeProxy], p: Point, metrics: &NodeMetrics) -> Option<ProxyId> {
    let hit = |proxy: &&NodeProxy| proxy_contains(proxy, p, metrics);

    proxies
        .iter()
        .rev()
        .filter(|proxy| proxy.is_waypoint())
        .find(hit)
        .or_else(|| {
            proxies
                .iter()
                .rev()
                .filter(|proxy| proxy.is_midpoint())
                .find(hit)
        })
        .map(|proxy| proxy.id)
}

fn proxy_contains(proxy: &NodeProxy, p: Point, metrics: &NodeMetrics) -> bool {
    match proxy.kind {
        ProxyKind::Waypoint { .. } => {
            proxy.position.distance_to(p) <= metrics.waypoint_radius + metrics.hit_slop
        }
        ProxyKind::Midpoint { .. } => {
            let half = metrics.midpoint_half_size + metrics.hit_slop;
            (p.x - proxy.position.x).abs() <= half && (p.y - proxy.position.y).abs() <= half
        }
    }
}

/// Find the segment of `path` closest to `p`, if within `tolerance`.
pub fn hit_test_path(path: &Path, p: Point, tolerance: f64) -> Option<usize> {
    let pts = path.points();
    pts.windows(2)
        .enumerate()
        .map(|(i, w)| (i, point_to_segment_distance(p, w[0], w[1])))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

//! Diagram → Vello drawing commands.
//!
//! Entities are painted first, connectors over them, and the node proxies
//! of the selected connector last so they always sit on top.

use kurbo::{Affine, BezPath, Cap, Circle, Ellipse as KurboEllipse, Join, Rect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use vello::Scene;
use waypath_core::{
    ConnectorId, Diagram, EditorConfig, Entity, NodeColors, NodeMetrics, NodePalette, NodeProxy,
    Outline, Path, Point, ProxyKind, Rgba,
};

const LINE_WIDTH: f64 = 1.5;
const SELECTED_LINE_WIDTH: f64 = 2.5;
const ARROW_LENGTH: f64 = 10.0;
const ARROW_HALF_WIDTH: f64 = 5.0;

/// Paint a whole diagram. `proxies` are the node proxies of the selected
/// connectors.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_diagram(
    scene: &mut Scene,
    diagram: &Diagram,
    selected: &[ConnectorId],
    proxies: &[NodeProxy],
    config: &EditorConfig,
) {
    for entity in diagram.entities() {
        paint_entity(scene, entity, &config.palette);
    }
    for id in diagram.connectors() {
        match diagram.path(id) {
            Some(path) => paint_connector(scene, path, selected.contains(&id), &config.palette),
            None => log::trace!("skip {id}: no path"),
        }
    }
    paint_proxies(scene, proxies, &config.nodes, &config.palette);
}

pub fn paint_entity(scene: &mut Scene, entity: &Entity, palette: &NodePalette) {
    let b = entity.bounds;
    let fill = Color::from_rgba8(0xFF, 0xFF, 0xFF, 0xFF);
    let stroke = KurboStroke::new(1.0);
    let outline = to_color(palette.line);
    match entity.outline {
        Outline::Rect => {
            let shape = Rect::new(b.x, b.y, b.x + b.width, b.y + b.height);
            scene.fill(Fill::NonZero, Affine::IDENTITY, fill, None, &shape);
            scene.stroke(&stroke, Affine::IDENTITY, outline, None, &shape);
        }
        Outline::Ellipse => {
            let c = b.center();
            let shape = KurboEllipse::new((c.x, c.y), (b.width / 2.0, b.height / 2.0), 0.0);
            scene.fill(Fill::NonZero, Affine::IDENTITY, fill, None, &shape);
            scene.stroke(&stroke, Affine::IDENTITY, outline, None, &shape);
        }
    }
}

/// Stroke the polyline of a connector and put an arrowhead on its end.
pub fn paint_connector(scene: &mut Scene, path: &Path, selected: bool, palette: &NodePalette) {
    let points = path.points();
    let Some((first, rest)) = points.split_first() else {
        return;
    };

    let mut line = BezPath::new();
    line.move_to(to_kurbo(*first));
    for p in rest {
        line.line_to(to_kurbo(*p));
    }

    let (width, color) = if selected {
        (SELECTED_LINE_WIDTH, palette.selection)
    } else {
        (LINE_WIDTH, palette.line)
    };
    let stroke = KurboStroke {
        width,
        join: Join::Round,
        start_cap: Cap::Round,
        end_cap: Cap::Round,
        ..Default::default()
    };
    let color = to_color(color);
    scene.stroke(&stroke, Affine::IDENTITY, color, None, &line);

    if let [.., from, to] = points.as_slice() {
        if let Some(head) = arrowhead(*from, *to) {
            scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &head);
        }
    }
}

/// Paint node proxies in placement order: later proxies draw on top.
pub fn paint_proxies(
    scene: &mut Scene,
    proxies: &[NodeProxy],
    metrics: &NodeMetrics,
    palette: &NodePalette,
) {
    for proxy in proxies {
        let colors = palette.colors(&proxy.kind, proxy.state);
        let center = to_kurbo(proxy.position);
        match proxy.kind {
            ProxyKind::Waypoint { .. } => {
                let shape = Circle::new(center, metrics.waypoint_radius);
                fill_and_outline(scene, &shape, &colors);
            }
            ProxyKind::Midpoint { .. } => {
                let h = metrics.midpoint_half_size;
                let shape = Rect::new(center.x - h, center.y - h, center.x + h, center.y + h);
                fill_and_outline(scene, &shape, &colors);
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn fill_and_outline<S: kurbo::Shape>(scene: &mut Scene, shape: &S, colors: &NodeColors) {
    scene.fill(Fill::NonZero, Affine::IDENTITY, to_color(colors.fill), None, shape);
    if colors.outline_width > 0.0 {
        let stroke = KurboStroke::new(colors.outline_width);
        scene.stroke(&stroke, Affine::IDENTITY, to_color(colors.outline), None, shape);
    }
}

/// Corners of an arrowhead pointing along `from → to`, tip first. `None`
/// for a zero-length segment.
pub fn arrowhead_points(from: Point, to: Point) -> Option<[Point; 3]> {
    let dir = to - from;
    let len = dir.length();
    if len == 0.0 {
        return None;
    }
    let (ux, uy) = (dir.dx / len, dir.dy / len);
    let (bx, by) = (to.x - ux * ARROW_LENGTH, to.y - uy * ARROW_LENGTH);
    Some([
        to,
        Point::new(bx - uy * ARROW_HALF_WIDTH, by + ux * ARROW_HALF_WIDTH),
        Point::new(bx + uy * ARROW_HALF_WIDTH, by - ux * ARROW_HALF_WIDTH),
    ])
}

fn arrowhead(from: Point, to: Point) -> Option<BezPath> {
    let [tip, left, right] = arrowhead_points(from, to)?;
    let mut head = BezPath::new();
    head.move_to(to_kurbo(tip));
    head.line_to(to_kurbo(left));
    head.line_to(to_kurbo(right));
    head.close_path();
    Some(head)
}

fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

fn to_color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

//! Canvas2D software renderer.
//!
//! Draws the diagram to an HTML `<canvas>` via `CanvasRenderingContext2d`:
//! entities, connector polylines with arrowheads, then the node proxies of
//! the selected connectors on top.

use std::f64::consts::TAU;
use waypath_core::{Entity, EditorConfig, NodeProxy, Outline, Path, ProxyKind};
use waypath_editor::ConnectorEditor;
use waypath_render::paint::arrowhead_points;
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub entity_fill: &'static str,
    pub entity_stroke: &'static str,
    pub line: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            entity_fill: "#FFFFFF",
            entity_stroke: "#86868B",
            line: "#333333",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            entity_fill: "#2C2C2E",
            entity_stroke: "#636366",
            line: "#D1D1D6",
        }
    }
}

/// Render the whole diagram. Call once per frame.
pub fn render_diagram(
    ctx: &CanvasRenderingContext2d,
    editor: &ConnectorEditor,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    let diagram = editor.diagram();
    for entity in diagram.entities() {
        draw_entity(ctx, entity, theme);
    }

    let selected: Vec<_> = editor.selection().connectors().collect();
    let selection_css = editor.config().palette.selection.to_css();
    for c in diagram.connectors() {
        if let Some(path) = diagram.path(c) {
            if selected.contains(&c) {
                draw_connector(ctx, path, &selection_css, 2.5);
            } else {
                draw_connector(ctx, path, theme.line, 1.5);
            }
        }
    }

    draw_proxies(ctx, &editor.shown_proxies(), editor.config());
}

fn draw_entity(ctx: &CanvasRenderingContext2d, entity: &Entity, theme: &CanvasTheme) {
    let b = entity.bounds;
    ctx.set_fill_style_str(theme.entity_fill);
    ctx.set_stroke_style_str(theme.entity_stroke);
    ctx.set_line_width(1.0);
    match entity.outline {
        Outline::Rect => {
            ctx.fill_rect(b.x, b.y, b.width, b.height);
            ctx.stroke_rect(b.x, b.y, b.width, b.height);
        }
        Outline::Ellipse => {
            let c = b.center();
            ctx.begin_path();
            let _ = ctx.ellipse(c.x, c.y, b.width / 2.0, b.height / 2.0, 0.0, 0.0, TAU);
            ctx.fill();
            ctx.stroke();
        }
    }
}

fn draw_connector(ctx: &CanvasRenderingContext2d, path: &Path, color: &str, width: f64) {
    let points = path.points();
    let Some((first, rest)) = points.split_first() else {
        return;
    };

    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.set_line_join("round");
    ctx.set_line_cap("round");
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();

    if let [.., from, to] = points.as_slice() {
        if let Some([tip, left, right]) = arrowhead_points(*from, *to) {
            ctx.set_fill_style_str(color);
            ctx.begin_path();
            ctx.move_to(tip.x, tip.y);
            ctx.line_to(left.x, left.y);
            ctx.line_to(right.x, right.y);
            ctx.close_path();
            ctx.fill();
        }
    }
}

fn draw_proxies(ctx: &CanvasRenderingContext2d, proxies: &[NodeProxy], config: &EditorConfig) {
    let metrics = &config.nodes;
    for proxy in proxies {
        let colors = config.palette.colors(&proxy.kind, proxy.state);
        let p = proxy.position;
        ctx.set_fill_style_str(&colors.fill.to_css());
        ctx.set_stroke_style_str(&colors.outline.to_css());
        ctx.set_line_width(colors.outline_width);
        match proxy.kind {
            ProxyKind::Waypoint { .. } => {
                ctx.begin_path();
                let _ = ctx.arc(p.x, p.y, metrics.waypoint_radius, 0.0, TAU);
                ctx.fill();
                ctx.stroke();
            }
            ProxyKind::Midpoint { .. } => {
                let h = metrics.midpoint_half_size;
                ctx.fill_rect(p.x - h, p.y - h, h * 2.0, h * 2.0);
                ctx.stroke_rect(p.x - h, p.y - h, h * 2.0, h * 2.0);
            }
        }
    }
}

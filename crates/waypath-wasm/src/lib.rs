//! WASM bridge for Waypath: exposes the connector editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Connectors are addressed by
//! their numeric index; entities by their string key. Structured data
//! crosses the boundary as JSON strings.

mod render2d;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use waypath_core::{
    ConnectorId, EditorConfig, Entity, EntityId, Origin, Outline, PathSnapshot, Point, Rect, Rgba,
    Theme, WaypointRecord,
};
use waypath_editor::{ConnectorEditor, InputEvent, Modifiers, SelectionItem};
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
#[wasm_bindgen]
pub struct WaypathCanvas {
    editor: ConnectorEditor,
    width: f64,
    height: f64,
    dark_mode: bool,
}

#[wasm_bindgen]
impl WaypathCanvas {
    /// Create a new canvas controller with the given dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        Self {
            editor: ConnectorEditor::new(EditorConfig::default()),
            width,
            height,
            dark_mode: false,
        }
    }

    /// Replace the editor configuration from a (partial) JSON object.
    /// Returns `false` and keeps the old config on a parse error.
    pub fn set_config(&mut self, json: &str) -> bool {
        match EditorConfig::from_json(json) {
            Ok(mut config) => {
                config.palette = config.palette.with_theme(self.theme());
                self.editor.set_config(config);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Render the diagram to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_diagram(ctx, &self.editor, self.width, self.height, &theme);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Switch light/dark. The selection color follows the theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
        self.editor.set_theme(self.theme());
    }

    /// Override the selection color with `#RRGGBB` or `#RRGGBBAA`.
    pub fn set_selection_color(&mut self, hex: &str) -> bool {
        match Rgba::from_hex(hex) {
            Some(color) => {
                self.editor.set_selection_color(color);
                true
            }
            None => false,
        }
    }

    // ─── Diagram ─────────────────────────────────────────────────────────

    /// Add a box (`ellipse = false`) or oval entity. Returns `false` if the
    /// key is taken.
    pub fn add_entity(&mut self, key: &str, x: f64, y: f64, w: f64, h: f64, ellipse: bool) -> bool {
        let outline = if ellipse { Outline::Ellipse } else { Outline::Rect };
        let entity = Entity::new(EntityId::intern(key), Rect::new(x, y, w, h), outline);
        self.editor
            .add_entity(entity)
            .map_err(|e| log::warn!("{e}"))
            .is_ok()
    }

    /// Move or resize an entity. Returns `true` if any connector moved.
    pub fn move_entity(&mut self, key: &str, x: f64, y: f64, w: f64, h: f64) -> bool {
        !self
            .editor
            .move_entity(EntityId::intern(key), Rect::new(x, y, w, h))
            .is_empty()
    }

    /// Remove an entity and its connectors. Returns the removed connector
    /// indices as a JSON array.
    pub fn remove_entity(&mut self, key: &str) -> String {
        let removed: Vec<usize> = self
            .editor
            .remove_entity(EntityId::intern(key))
            .into_iter()
            .map(|c| c.index())
            .collect();
        serde_json::to_string(&removed).unwrap_or_else(|_| "[]".to_string())
    }

    /// Add a connector. `waypoints_json` is an array of
    /// `{"x":..,"y":..,"origin":"origin"|"user"}`. Returns the connector
    /// index, or `undefined` on error.
    pub fn add_connector(&mut self, from: &str, to: &str, waypoints_json: &str) -> Option<u32> {
        let waypoints = parse_waypoints(waypoints_json)
            .map_err(|e| log::warn!("{e}"))
            .ok()?;
        self.editor
            .add_connector(EntityId::intern(from), EntityId::intern(to), waypoints)
            .map_err(|e| log::warn!("{e}"))
            .ok()
            .and_then(to_js_index)
    }

    /// Restore a connector from `get_snapshot` output.
    pub fn add_connector_from_snapshot(&mut self, json: &str) -> Option<u32> {
        let snapshot: PathSnapshot = serde_json::from_str(json)
            .map_err(|e| log::warn!("invalid snapshot: {e}"))
            .ok()?;
        self.editor
            .add_connector_from_snapshot(&snapshot)
            .map_err(|e| log::warn!("{e}"))
            .ok()
            .and_then(to_js_index)
    }

    pub fn remove_connector(&mut self, index: u32) -> bool {
        self.editor
            .remove_connector(ConnectorId::from_index(index as usize))
            .is_some()
    }

    /// Snapshot of one connector as JSON, or `"null"` if unknown.
    pub fn get_snapshot(&self, index: u32) -> String {
        let snapshot = self.editor.snapshot(ConnectorId::from_index(index as usize));
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "null".to_string())
    }

    /// Snapshots of every connector: `[{"index":n,"path":{..}}, ..]`.
    pub fn get_snapshots(&self) -> String {
        #[derive(Serialize)]
        struct Entry {
            index: usize,
            path: PathSnapshot,
        }
        let entries: Vec<Entry> = self
            .editor
            .snapshots()
            .into_iter()
            .map(|(c, path)| Entry {
                index: c.index(),
                path,
            })
            .collect();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_connector(&mut self, index: u32) -> bool {
        self.editor
            .select_connector(ConnectorId::from_index(index as usize))
    }

    pub fn clear_selection(&mut self) -> bool {
        self.editor.clear_selection()
    }

    pub fn select_box(&mut self, x: f64, y: f64, w: f64, h: f64) -> bool {
        self.editor.select_box(Rect::new(x, y, w, h))
    }

    /// Current selection: `{"entities":[..],"connectors":[..]}`.
    pub fn get_selection(&self) -> String {
        #[derive(Serialize, Default)]
        struct SelectionView {
            entities: Vec<String>,
            connectors: Vec<usize>,
        }
        let mut view = SelectionView::default();
        for item in self.editor.selection().items() {
            match item {
                SelectionItem::Entity(id) => view.entities.push(id.as_str().to_string()),
                SelectionItem::Connector(c) => view.connectors.push(c.index()),
            }
        }
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Handle pointer down. Returns `true` if a redraw is needed.
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.dispatch(InputEvent::from_pointer_down(x, y, mods))
    }

    pub fn handle_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.dispatch(InputEvent::from_pointer_move(x, y, mods))
    }

    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.dispatch(InputEvent::from_pointer_up(x, y, mods))
    }

    /// Index of the connector being dragged, or `undefined`.
    pub fn dragging_connector(&self) -> Option<u32> {
        self.editor.dragging().and_then(to_js_index)
    }
}

impl WaypathCanvas {
    fn theme(&self) -> Theme {
        if self.dark_mode { Theme::Dark } else { Theme::Light }
    }

    fn dispatch(&mut self, event: InputEvent) -> bool {
        let redraw = self.editor.handle_input(&event);
        // Canvas2D repaints everything each frame; queued proxy changes are
        // only needed by retained-mode hosts.
        self.editor.drain_changes();
        redraw
    }
}

fn to_js_index(c: ConnectorId) -> Option<u32> {
    u32::try_from(c.index()).ok()
}

/// Parse `[{"x":..,"y":..,"origin":..}, ..]`. An empty string means no bends.
fn parse_waypoints(json: &str) -> Result<Vec<(Point, Origin)>, String> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<WaypointRecord> =
        serde_json::from_str(json).map_err(|e| format!("invalid waypoints: {e}"))?;
    Ok(records.iter().map(|r| (r.position(), r.origin)).collect())
}

/// Route panics to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Waypath WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

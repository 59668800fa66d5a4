//! Connector editor: the diagram plus one node manager per connector.
//!
//! Routes pointer input the way a canvas host delivers it:
//!
//! - **Down**: a node proxy of a selected connector starts a drag; anything
//!   else (connector line, entity, empty canvas) goes to the selection.
//! - **Move**: feeds the running drag, or moves the hover highlight.
//! - **Up**: ends the drag and runs merge evaluation.
//!
//! After every drag step the connector's anchors are re-seated toward its
//! new first/last bend.

use crate::input::{InputEvent, Modifiers};
use crate::manager::NodeManager;
use crate::selection::{Selection, SelectionEvent, SelectionItem};
use std::collections::HashMap;
use waypath_core::{
    ConnectorId, Diagram, EditorConfig, Entity, EntityId, NodeProxy, Origin, Path, PathSnapshot,
    Point, ProxyChange, ProxyId, Rect, Rgba, Theme,
};
use waypath_render::hit::{hit_test_path, hit_test_proxies};

#[derive(Debug, Clone)]
pub struct ConnectorEditor {
    diagram: Diagram,
    managers: HashMap<ConnectorId, NodeManager>,
    selection: Selection,
    config: EditorConfig,
    /// Connector owning the running drag.
    dragging: Option<ConnectorId>,
    /// Changes of managers torn down since the last drain.
    retired: Vec<(ConnectorId, ProxyChange)>,
}

impl Default for ConnectorEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl ConnectorEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_diagram(Diagram::new(), config)
    }

    pub fn with_diagram(diagram: Diagram, config: EditorConfig) -> Self {
        let managers = diagram
            .connectors()
            .into_iter()
            .map(|c| (c, NodeManager::new(config.merge)))
            .collect();
        Self {
            diagram,
            managers,
            selection: Selection::new(),
            config,
            dragging: None,
            retired: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn manager(&self, id: ConnectorId) -> Option<&NodeManager> {
        self.managers.get(&id)
    }

    pub fn path(&self, id: ConnectorId) -> Option<&Path> {
        self.diagram.path(id)
    }

    pub fn dragging(&self) -> Option<ConnectorId> {
        self.dragging
    }

    /// Proxies of every selected connector, for painting.
    pub fn shown_proxies(&self) -> Vec<NodeProxy> {
        self.selection
            .connectors()
            .filter_map(|c| self.managers.get(&c))
            .flat_map(|m| m.proxies().iter().copied())
            .collect()
    }

    // ─── Configuration ───────────────────────────────────────────────────

    pub fn set_config(&mut self, config: EditorConfig) {
        for manager in self.managers.values_mut() {
            manager.set_merge_settings(config.merge);
        }
        self.config = config;
    }

    pub fn set_selection_color(&mut self, color: Rgba) {
        self.config.palette = self.config.palette.clone().with_selection_color(color);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.palette = self.config.palette.clone().with_theme(theme);
    }

    // ─── Diagram edits ───────────────────────────────────────────────────

    /// # Errors
    /// Fails if the entity key is taken.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), String> {
        self.diagram.add_entity(entity)
    }

    pub fn move_entity(&mut self, id: EntityId, bounds: Rect) -> Vec<ConnectorId> {
        let changed = self.diagram.move_entity(id, bounds);
        for &c in &changed {
            self.refresh_manager(c);
        }
        changed
    }

    /// Remove an entity, its connectors, and their node managers.
    pub fn remove_entity(&mut self, id: EntityId) -> Vec<ConnectorId> {
        let removed = self.diagram.remove_entity(id);
        for &c in &removed {
            self.teardown(c);
        }
        self.selection.forget(SelectionItem::Entity(id));
        removed
    }

    /// # Errors
    /// Fails if either entity is unknown or both ends are the same.
    pub fn add_connector(
        &mut self,
        from: EntityId,
        to: EntityId,
        waypoints: impl IntoIterator<Item = (Point, Origin)>,
    ) -> Result<ConnectorId, String> {
        let c = self.diagram.add_connector(from, to, waypoints)?;
        self.managers.insert(c, NodeManager::new(self.config.merge));
        Ok(c)
    }

    /// # Errors
    /// Same as `add_connector`.
    pub fn add_connector_from_snapshot(
        &mut self,
        snapshot: &PathSnapshot,
    ) -> Result<ConnectorId, String> {
        let c = self.diagram.add_connector_from_snapshot(snapshot)?;
        self.managers.insert(c, NodeManager::new(self.config.merge));
        Ok(c)
    }

    /// Remove a connector. A drag on it is discarded.
    pub fn remove_connector(&mut self, id: ConnectorId) -> Option<Path> {
        self.teardown(id);
        self.diagram.remove_connector(id)
    }

    pub fn snapshot(&self, id: ConnectorId) -> Option<PathSnapshot> {
        self.diagram.path(id).map(Path::snapshot)
    }

    pub fn snapshots(&self) -> Vec<(ConnectorId, PathSnapshot)> {
        self.diagram
            .connectors()
            .into_iter()
            .filter_map(|c| self.snapshot(c).map(|s| (c, s)))
            .collect()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_connector(&mut self, id: ConnectorId) -> bool {
        if self.diagram.path(id).is_none() {
            return false;
        }
        self.click(Some(SelectionItem::Connector(id)), Modifiers::NONE)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.click(None, Modifiers::NONE)
    }

    /// Select every entity, or failing that every connector, lying fully
    /// inside `area`.
    pub fn select_box(&mut self, area: Rect) -> bool {
        let inside = |p: Point| area.contains(p);
        let entities = self.diagram.entities().filter(|e| {
            let b = e.bounds;
            inside(Point::new(b.x, b.y)) && inside(Point::new(b.x + b.width, b.y + b.height))
        });
        let mut items: Vec<SelectionItem> = entities.map(|e| SelectionItem::Entity(e.id)).collect();
        items.extend(
            self.diagram
                .connectors()
                .into_iter()
                .filter(|&c| {
                    self.diagram
                        .path(c)
                        .is_some_and(|path| path.points().into_iter().all(inside))
                })
                .map(SelectionItem::Connector),
        );

        let before = self.selection.items().to_vec();
        let events = self.selection.select_many(items);
        self.apply_selection(events);
        before != self.selection.items()
    }

    fn click(&mut self, item: Option<SelectionItem>, modifiers: Modifiers) -> bool {
        let before = self.selection.items().to_vec();
        let events = self.selection.click(item, modifiers.toggles_selection());
        self.apply_selection(events);
        before != self.selection.items()
    }

    fn apply_selection(&mut self, events: Vec<(ConnectorId, SelectionEvent)>) {
        for (c, event) in events {
            let (Some(manager), Some(path)) = (self.managers.get_mut(&c), self.diagram.path(c))
            else {
                continue;
            };
            match event {
                SelectionEvent::Selected => {
                    manager.on_selected(path);
                }
                SelectionEvent::Deselected => {
                    if self.dragging == Some(c) {
                        self.dragging = None;
                    }
                    manager.on_deselected();
                }
            }
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle one pointer event. Returns `true` if a redraw is needed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let p = event.position();
        match event {
            InputEvent::PointerDown { modifiers, .. } => self.pointer_down(p, *modifiers),
            InputEvent::PointerMove { .. } => self.pointer_move(p),
            InputEvent::PointerUp { .. } => self.pointer_up(),
        }
    }

    fn pointer_down(&mut self, p: Point, modifiers: Modifiers) -> bool {
        if self.dragging.is_some() {
            log::debug!("pointer down ignored: drag in progress");
            return false;
        }
        if let Some((c, proxy)) = self.hit_proxy(p) {
            let started = self
                .managers
                .get_mut(&c)
                .is_some_and(|m| m.begin_drag(proxy));
            if started {
                self.dragging = Some(c);
                return true;
            }
        }
        let item = self.hit_item(p);
        self.click(item, modifiers)
    }

    fn pointer_move(&mut self, p: Point) -> bool {
        let Some(c) = self.dragging else {
            return self.update_hover(p);
        };
        let (Some(manager), Some(path)) = (self.managers.get_mut(&c), self.diagram.path_mut(c))
        else {
            self.dragging = None;
            return false;
        };
        let moved = manager.update_drag(path, p);
        if !manager.session().is_dragging() {
            self.dragging = None;
        }
        self.diagram.refresh_anchors(c);
        self.refresh_manager(c);
        moved
    }

    fn pointer_up(&mut self) -> bool {
        let Some(c) = self.dragging.take() else {
            return false;
        };
        if let (Some(manager), Some(path)) = (self.managers.get_mut(&c), self.diagram.path_mut(c)) {
            if let Some(outcome) = manager.end_drag(path) {
                log::debug!("{c} released: {outcome:?}");
            }
        }
        self.diagram.refresh_anchors(c);
        self.refresh_manager(c);
        true
    }

    fn update_hover(&mut self, p: Point) -> bool {
        let hit = self.hit_proxy(p);
        let shown: Vec<ConnectorId> = self.selection.connectors().collect();
        let mut changed = false;
        for c in shown {
            if let Some(manager) = self.managers.get_mut(&c) {
                let proxy = hit.filter(|(hc, _)| *hc == c).map(|(_, proxy)| proxy);
                changed |= manager.hover(proxy);
            }
        }
        changed
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Topmost node proxy under `p` among the selected connectors.
    fn hit_proxy(&self, p: Point) -> Option<(ConnectorId, ProxyId)> {
        let shown: Vec<ConnectorId> = self.selection.connectors().collect();
        shown.into_iter().rev().find_map(|c| {
            let manager = self.managers.get(&c)?;
            hit_test_proxies(manager.proxies(), p, &self.config.nodes).map(|proxy| (c, proxy))
        })
    }

    /// Connector line or entity under `p`. Lines are painted over entities.
    fn hit_item(&self, p: Point) -> Option<SelectionItem> {
        let tolerance = self.config.nodes.line_tolerance;
        let line = self.diagram.connectors().into_iter().rev().find(|&c| {
            self.diagram
                .path(c)
                .and_then(|path| hit_test_path(path, p, tolerance))
                .is_some()
        });
        if let Some(c) = line {
            return Some(SelectionItem::Connector(c));
        }
        self.diagram
            .entities()
            .filter(|e| e.bounds.contains(p))
            .last()
            .map(|e| SelectionItem::Entity(e.id))
    }

    // ─── Rendering handoff ───────────────────────────────────────────────

    /// Take every queued proxy change, torn-down connectors first.
    pub fn drain_changes(&mut self) -> Vec<(ConnectorId, ProxyChange)> {
        let mut out = std::mem::take(&mut self.retired);
        let mut ids: Vec<ConnectorId> = self.managers.keys().copied().collect();
        ids.sort();
        for c in ids {
            if let Some(manager) = self.managers.get_mut(&c) {
                out.extend(manager.drain_changes().into_iter().map(|ch| (c, ch)));
            }
        }
        out
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn refresh_manager(&mut self, c: ConnectorId) {
        if let (Some(manager), Some(path)) = (self.managers.get_mut(&c), self.diagram.path(c)) {
            manager.refresh(path);
            if self.dragging == Some(c) && !manager.session().is_dragging() {
                self.dragging = None;
            }
        }
    }

    /// Implicit hide for a connector that is going away.
    fn teardown(&mut self, c: ConnectorId) {
        if self.dragging == Some(c) {
            log::debug!("{c} removed mid-drag; discarding session");
            self.dragging = None;
        }
        self.selection.forget(SelectionItem::Connector(c));
        if let Some(mut manager) = self.managers.remove(&c) {
            manager.hide();
            self.retired
                .extend(manager.drain_changes().into_iter().map(|ch| (c, ch)));
        }
    }
}

//! Selection gateway.
//!
//! Selection is typed: it holds either entities or connectors, never a
//! mix. The kind of the first selected item sets the mode.
//!
//! - Plain click: replace the selection with the clicked item.
//! - Click on empty canvas: clear.
//! - Ctrl/Cmd click: toggle the item, but only if it matches the mode.
//! - Box selection: entities take precedence over connectors; a box of the
//!   other kind replaces the selection instead of joining it.
//!
//! Every operation reports which connectors were selected or deselected so
//! the owner can show or hide their node managers.

use smallvec::SmallVec;
use waypath_core::{ConnectorId, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionItem {
    Entity(EntityId),
    Connector(ConnectorId),
}

impl SelectionItem {
    pub fn mode(&self) -> SelectionMode {
        match self {
            SelectionItem::Entity(_) => SelectionMode::Entities,
            SelectionItem::Connector(_) => SelectionMode::Connectors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Entities,
    Connectors,
}

/// What a connector's node manager should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected,
    Deselected,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    items: SmallVec<[SelectionItem; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: SelectionItem) -> bool {
        self.items.contains(&item)
    }

    /// `None` while nothing is selected.
    pub fn mode(&self) -> Option<SelectionMode> {
        self.items.first().map(SelectionItem::mode)
    }

    pub fn connectors(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.items.iter().filter_map(|item| match item {
            SelectionItem::Connector(c) => Some(*c),
            SelectionItem::Entity(_) => None,
        })
    }

    /// Pointer click on `item` (`None` = empty canvas).
    pub fn click(
        &mut self,
        item: Option<SelectionItem>,
        toggle: bool,
    ) -> Vec<(ConnectorId, SelectionEvent)> {
        let before = self.items.clone();
        match (item, toggle) {
            (None, _) => self.items.clear(),
            (Some(item), false) => {
                self.items.clear();
                self.items.push(item);
            }
            (Some(item), true) => {
                if let Some(pos) = self.items.iter().position(|i| *i == item) {
                    self.items.remove(pos);
                } else if self.mode().is_none_or(|mode| mode == item.mode()) {
                    self.items.push(item);
                } else {
                    log::debug!("ignored {:?} toggle in {:?} selection", item.mode(), self.mode());
                }
            }
        }
        diff(&before, &self.items)
    }

    /// Rubber-band selection of everything inside a box.
    pub fn select_many(
        &mut self,
        items: impl IntoIterator<Item = SelectionItem>,
    ) -> Vec<(ConnectorId, SelectionEvent)> {
        let items: Vec<SelectionItem> = items.into_iter().collect();
        if items.is_empty() {
            return Vec::new();
        }
        let has_entities = items.iter().any(|i| i.mode() == SelectionMode::Entities);
        let wanted = if has_entities {
            SelectionMode::Entities
        } else {
            SelectionMode::Connectors
        };
        let before = self.items.clone();
        if self.mode().is_some_and(|mode| mode != wanted) {
            self.items.clear();
        }
        for item in items.into_iter().filter(|i| i.mode() == wanted) {
            if !self.items.contains(&item) {
                self.items.push(item);
            }
        }
        diff(&before, &self.items)
    }

    pub fn clear(&mut self) -> Vec<(ConnectorId, SelectionEvent)> {
        self.click(None, false)
    }

    /// Forget an item that no longer exists. Reports nothing: the owner is
    /// already tearing it down.
    pub fn forget(&mut self, item: SelectionItem) -> bool {
        let before = self.items.len();
        self.items.retain(|i| *i != item);
        self.items.len() != before
    }
}

fn diff(before: &[SelectionItem], after: &[SelectionItem]) -> Vec<(ConnectorId, SelectionEvent)> {
    let connector = |item: &SelectionItem| match item {
        SelectionItem::Connector(c) => Some(*c),
        SelectionItem::Entity(_) => None,
    };
    let removed = before
        .iter()
        .filter(|i| !after.contains(*i))
        .filter_map(connector)
        .map(|c| (c, SelectionEvent::Deselected));
    let added = after
        .iter()
        .filter(|i| !before.contains(*i))
        .filter_map(connector)
        .map(|c| (c, SelectionEvent::Selected));
    removed.chain(added).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(n: usize) -> SelectionItem {
        SelectionItem::Connector(ConnectorId::from_index(n))
    }

    fn entity(key: &str) -> SelectionItem {
        SelectionItem::Entity(EntityId::intern(key))
    }

    #[test]
    fn plain_click_replaces() {
        let mut s = Selection::new();
        assert_eq!(
            s.click(Some(line(0)), false),
            vec![(ConnectorId::from_index(0), SelectionEvent::Selected)]
        );
        assert_eq!(
            s.click(Some(line(1)), false),
            vec![
                (ConnectorId::from_index(0), SelectionEvent::Deselected),
                (ConnectorId::from_index(1), SelectionEvent::Selected),
            ]
        );
        assert_eq!(s.items(), &[line(1)]);
    }

    #[test]
    fn clicking_the_selected_item_again_reports_nothing() {
        let mut s = Selection::new();
        s.click(Some(line(0)), false);
        assert!(s.click(Some(line(0)), false).is_empty());
    }

    #[test]
    fn modifier_click_toggles_same_kind_only() {
        let mut s = Selection::new();
        s.click(Some(line(0)), false);
        s.click(Some(line(1)), true);
        assert_eq!(s.items(), &[line(0), line(1)]);

        assert!(s.click(Some(entity("draft")), true).is_empty());
        assert_eq!(s.mode(), Some(SelectionMode::Connectors));

        assert_eq!(
            s.click(Some(line(0)), true),
            vec![(ConnectorId::from_index(0), SelectionEvent::Deselected)]
        );
        assert_eq!(s.items(), &[line(1)]);
    }

    #[test]
    fn empty_canvas_clears() {
        let mut s = Selection::new();
        s.click(Some(line(2)), false);
        assert_eq!(
            s.click(None, false),
            vec![(ConnectorId::from_index(2), SelectionEvent::Deselected)]
        );
        assert!(s.is_empty());
        assert_eq!(s.mode(), None);
    }

    #[test]
    fn box_selection_prefers_entities() {
        let mut s = Selection::new();
        s.click(Some(line(0)), false);
        let events = s.select_many([line(3), entity("review"), entity("done")]);
        assert_eq!(
            events,
            vec![(ConnectorId::from_index(0), SelectionEvent::Deselected)]
        );
        assert_eq!(s.items(), &[entity("review"), entity("done")]);
    }

    #[test]
    fn box_of_lines_joins_line_selection() {
        let mut s = Selection::new();
        s.click(Some(line(0)), false);
        let events = s.select_many([line(0), line(4)]);
        assert_eq!(
            events,
            vec![(ConnectorId::from_index(4), SelectionEvent::Selected)]
        );
        assert_eq!(s.connectors().count(), 2);
    }

    #[test]
    fn forget_is_silent() {
        let mut s = Selection::new();
        s.click(Some(line(5)), false);
        assert!(s.forget(line(5)));
        assert!(!s.forget(line(5)));
        assert!(s.is_empty());
    }
}

//! Visual node proxies: the draggable handles drawn over a selected
//! connector.
//!
//! Proxies are derived values. They are rebuilt from the path whenever its
//! topology changes and never feed back into it.

use crate::geometry::Point;
use crate::id::{ProxyId, WaypointId};
use crate::model::Origin;
use serde::{Deserialize, Serialize};

/// What a proxy is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// Bound to an existing waypoint; dragging moves it.
    Waypoint { waypoint: WaypointId, origin: Origin },
    /// Bound to the midpoint of segment `segment`; dragging splits it.
    Midpoint { segment: usize },
}

/// Styling state the renderer picks colors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyState {
    #[default]
    Normal,
    Hover,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeProxy {
    pub id: ProxyId,
    pub kind: ProxyKind,
    pub position: Point,
    pub state: ProxyState,
}

impl NodeProxy {
    pub fn is_waypoint(&self) -> bool {
        matches!(self.kind, ProxyKind::Waypoint { .. })
    }

    pub fn is_midpoint(&self) -> bool {
        matches!(self.kind, ProxyKind::Midpoint { .. })
    }

    pub fn waypoint(&self) -> Option<WaypointId> {
        match self.kind {
            ProxyKind::Waypoint { waypoint, .. } => Some(waypoint),
            ProxyKind::Midpoint { .. } => None,
        }
    }
}

/// One instruction for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyChange {
    /// A new proxy to draw.
    Place(NodeProxy),
    /// An existing proxy moved or changed state.
    Update(NodeProxy),
    /// A proxy to erase.
    Remove(ProxyId),
}

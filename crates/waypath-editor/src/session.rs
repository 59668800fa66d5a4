//! Interaction session: the per-connector pointer state machine.
//!
//! ```text
//! Idle ⇄ Hover        pointer enters / leaves a node proxy
//! Idle|Hover → Dragging   begin (pointer pressed on a proxy)
//! Dragging → Idle     finish (pointer released) or discard (teardown)
//! ```
//!
//! The session only tracks state. Geometry changes are applied by the
//! `NodeManager` as each move arrives.

use waypath_core::{ProxyId, WaypointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Hover,
    Dragging,
}

/// The node proxy a drag is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// Moving an existing bend.
    Waypoint { proxy: ProxyId, waypoint: WaypointId },
    /// Pulling a segment's midpoint; becomes a `Waypoint` target on the
    /// first move.
    Midpoint { proxy: ProxyId, segment: usize },
}

impl DragTarget {
    pub fn proxy(&self) -> ProxyId {
        match *self {
            DragTarget::Waypoint { proxy, .. } | DragTarget::Midpoint { proxy, .. } => proxy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionSession {
    phase: Phase,
    target: Option<DragTarget>,
    hovered: Option<ProxyId>,
    moved: bool,
}

impl InteractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> Option<DragTarget> {
        self.target
    }

    pub fn hovered(&self) -> Option<ProxyId> {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    /// Whether the current drag has received at least one move.
    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Track the proxy under an unpressed pointer. Ignored while dragging.
    /// Returns `true` if the hovered proxy changed.
    pub fn hover(&mut self, proxy: Option<ProxyId>) -> bool {
        if self.is_dragging() || self.hovered == proxy {
            return false;
        }
        self.hovered = proxy;
        self.phase = if proxy.is_some() {
            Phase::Hover
        } else {
            Phase::Idle
        };
        true
    }

    /// Start dragging `target`. A second begin while dragging is rejected
    /// and leaves the running drag untouched.
    pub fn begin(&mut self, target: DragTarget) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.phase = Phase::Dragging;
        self.target = Some(target);
        self.hovered = None;
        self.moved = false;
        true
    }

    /// Rebind the running drag (midpoint → new waypoint after a split).
    pub fn retarget(&mut self, target: DragTarget) {
        if self.is_dragging() {
            self.target = Some(target);
        }
    }

    /// Record a move. Returns `true` for the first move of the drag.
    pub fn mark_moved(&mut self) -> bool {
        let first = !self.moved;
        self.moved = true;
        first
    }

    /// End the drag normally, handing back its target.
    pub fn finish(&mut self) -> Option<DragTarget> {
        if !self.is_dragging() {
            return None;
        }
        let target = self.target.take();
        *self = Self::default();
        target
    }

    /// Drop the drag without completing it.
    pub fn discard(&mut self) {
        *self = Self::default();
    }
}

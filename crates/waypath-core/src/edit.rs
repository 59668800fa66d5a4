//! Split and merge rules that keep a connector topologically clean.
//!
//! - **Split**: dragging a segment's midpoint inserts a user-created bend.
//! - **Merge**: when a user-created bend is released where its two segments
//!   are nearly collinear, the bend is removed again.
//!
//! The merge check uses two criteria because each one alone misses cases:
//! the angle test catches long, shallow detours and the distance test
//! catches short kinks. Either one firing makes the bend redundant.

use crate::geometry::{Point, angle_between, point_to_segment_distance};
use crate::id::WaypointId;
use crate::model::{Path, Waypoint};
use serde::{Deserialize, Serialize};

/// Thresholds for merge evaluation. Both comparisons are strict (`<`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Maximum bend angle, in degrees, still considered straight.
    pub angle_threshold_deg: f64,
    /// Maximum offset of the bend from the line joining its neighbors,
    /// in diagram units.
    pub distance_threshold: f64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 5.0,
            distance_threshold: 10.0,
        }
    }
}

/// Result of evaluating one waypoint after a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Origin-defined; never merged.
    Protected,
    /// Bend is significant; nothing changed.
    Kept,
    /// Bend was redundant and has been removed.
    Merged(Waypoint),
    /// The id is not on this path (already removed).
    Missing,
}

impl MergeOutcome {
    /// Whether the path's topology changed.
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }
}

/// Split segment `segment` by inserting a user-created waypoint at
/// `position`. The new waypoint takes index `segment` in the waypoint list.
pub fn split_segment(path: &mut Path, segment: usize, position: Point) -> Option<WaypointId> {
    let id = path.insert_waypoint(segment, Waypoint::user_created(position));
    match id {
        Some(id) => log::debug!("split segment {segment} at {position:?} -> {id}"),
        None => log::debug!("split of segment {segment} at {position:?} rejected"),
    }
    id
}

/// Whether `current` adds nothing visible between `prev` and `next`.
pub fn is_redundant(prev: Point, current: Point, next: Point, settings: &MergeSettings) -> bool {
    let angle = angle_between(current - prev, next - current);
    if angle < settings.angle_threshold_deg {
        return true;
    }
    point_to_segment_distance(current, prev, next) < settings.distance_threshold
}

/// Run merge evaluation for the waypoint that was just moved or created.
pub fn evaluate_merge(path: &mut Path, id: WaypointId, settings: &MergeSettings) -> MergeOutcome {
    let Some(wp) = path.waypoint(id) else {
        return MergeOutcome::Missing;
    };
    if !wp.is_deletable() {
        return MergeOutcome::Protected;
    }
    let current = wp.position;
    let Some((prev, next)) = path.neighbors(id) else {
        return MergeOutcome::Missing;
    };

    // Removing the bend would leave its neighbors coinciding, and healing
    // that drops a second waypoint.
    if prev == next {
        log::debug!("kept {id}: neighbors coincide at {prev:?}");
        return MergeOutcome::Kept;
    }
    if !is_redundant(prev, current, next, settings) {
        return MergeOutcome::Kept;
    }

    match path.remove_waypoint(id) {
        Some(removed) => {
            log::debug!("merged redundant waypoint {id} at {current:?}");
            MergeOutcome::Merged(removed)
        }
        None => MergeOutcome::Missing,
    }
}

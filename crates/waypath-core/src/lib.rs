pub mod config;
pub mod diagram;
pub mod edit;
pub mod geometry;
pub mod id;
pub mod model;
pub mod proxy;

pub use config::{EditorConfig, NodeColors, NodeMetrics, NodePalette, Rgba, Theme};
pub use diagram::{ConnectorId, Diagram, Entity};
pub use edit::{MergeOutcome, MergeSettings, evaluate_merge, is_redundant, split_segment};
pub use geometry::{Outline, Point, Rect, Vector};
pub use id::{EntityId, ProxyId, WaypointId};
pub use model::*;
pub use proxy::{NodeProxy, ProxyChange, ProxyKind, ProxyState};

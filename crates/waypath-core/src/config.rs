//! Editor configuration: merge thresholds, node metrics, and node colors.
//!
//! Every section has defaults, so a host may pass a partial JSON object
//! (or none at all).

use crate::edit::MergeSettings;
use crate::proxy::{ProxyKind, ProxyState};
use serde::{Deserialize, Serialize};

/// Top-level configuration for one editor instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub merge: MergeSettings,
    pub nodes: NodeMetrics,
    pub palette: NodePalette,
}

impl EditorConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns a message describing the first invalid field.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid editor config: {e}"))
    }
}

/// Size of node proxies in diagram units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetrics {
    /// Waypoint nodes are circles of this radius.
    pub waypoint_radius: f64,
    /// Midpoint nodes are squares of twice this size.
    pub midpoint_half_size: f64,
    /// Extra pick margin around both kinds.
    pub hit_slop: f64,
    /// Max distance from a connector line that still selects it.
    pub line_tolerance: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            waypoint_radius: 6.0,
            midpoint_half_size: 4.0,
            hit_slop: 2.0,
            line_tolerance: 5.0,
        }
    }
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f64 / 255.0
        )
    }
}

/// Host color scheme. Only the selection color depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Orange on light backgrounds, light blue on dark ones.
    pub const fn selection_color(self) -> Rgba {
        match self {
            Theme::Light => Rgba::rgb(0xFF, 0x8C, 0x00),
            Theme::Dark => Rgba::rgb(0x5D, 0xAD, 0xE2),
        }
    }

    /// Pick a theme from the background color's perceived luminance.
    pub fn for_background(bg: Rgba) -> Self {
        let luminance =
            (bg.r as f64 * 0.299 + bg.g as f64 * 0.587 + bg.b as f64 * 0.114) / 255.0;
        if luminance < 0.5 { Theme::Dark } else { Theme::Light }
    }
}

/// Fill and outline for one node kind in one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeColors {
    pub fill: Rgba,
    pub outline: Rgba,
    pub outline_width: f64,
}

/// Node colors per kind and state. Dragging uses the selection color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePalette {
    pub waypoint_normal: NodeColors,
    pub waypoint_hover: NodeColors,
    pub midpoint_normal: NodeColors,
    pub midpoint_hover: NodeColors,
    pub selection: Rgba,
    /// Stroke color of a connector line.
    pub line: Rgba,
}

impl Default for NodePalette {
    fn default() -> Self {
        Self {
            waypoint_normal: NodeColors {
                fill: Rgba::rgb(0xCC, 0xCC, 0xCC),
                outline: Rgba::rgb(0x66, 0x66, 0x66),
                outline_width: 1.0,
            },
            waypoint_hover: NodeColors {
                fill: Rgba::rgb(0xFF, 0xFF, 0xFF),
                outline: Rgba::rgb(0x33, 0x33, 0x33),
                outline_width: 2.0,
            },
            midpoint_normal: NodeColors {
                fill: Rgba::rgba(0xCC, 0xCC, 0xCC, 0x80),
                outline: Rgba::rgb(0x88, 0x88, 0x88),
                outline_width: 1.0,
            },
            midpoint_hover: NodeColors {
                fill: Rgba::rgba(0xFF, 0xFF, 0xFF, 0x80),
                outline: Rgba::rgb(0x44, 0x44, 0x44),
                outline_width: 1.0,
            },
            selection: Theme::Light.selection_color(),
            line: Rgba::rgb(0x33, 0x33, 0x33),
        }
    }
}

impl NodePalette {
    /// Swap the dragging/selection color (theme change).
    pub fn with_selection_color(mut self, color: Rgba) -> Self {
        self.selection = color;
        self
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        self.with_selection_color(theme.selection_color())
    }

    pub fn colors(&self, kind: &ProxyKind, state: ProxyState) -> NodeColors {
        let waypoint = matches!(kind, ProxyKind::Waypoint { .. });
        match (waypoint, state) {
            (_, ProxyState::Dragging) => NodeColors {
                fill: self.selection,
                outline: self.selection,
                outline_width: 2.0,
            },
            (true, ProxyState::Normal) => self.waypoint_normal,
            (true, ProxyState::Hover) => self.waypoint_hover,
            (false, ProxyState::Normal) => self.midpoint_normal,
            (false, ProxyState::Hover) => self.midpoint_hover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.merge.angle_threshold_deg, 5.0);
        assert_eq!(config.nodes.waypoint_radius, 6.0);
    }

    #[test]
    fn partial_json_overrides_one_field() {
        let config = EditorConfig::from_json(r#"{"merge":{"distance_threshold":4.0}}"#).unwrap();
        assert_eq!(config.merge.distance_threshold, 4.0);
        assert_eq!(config.merge.angle_threshold_deg, 5.0);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = EditorConfig::from_json(r#"{"merge":{"distance_threshold":"far"}}"#).unwrap_err();
        assert!(err.starts_with("invalid editor config"), "{err}");
    }

    #[test]
    fn hex_colors() {
        assert_eq!(Rgba::from_hex("#FF8C00"), Some(Rgba::rgb(255, 140, 0)));
        assert_eq!(Rgba::from_hex("CCCCCC80"), Some(Rgba::rgba(204, 204, 204, 128)));
        assert_eq!(Rgba::from_hex("#FFF"), None);
        assert_eq!(Rgba::from_hex("#GG0000"), None);
    }

    #[test]
    fn signed_hex_pairs_are_rejected() {
        assert_eq!(Rgba::from_hex("#+f+f+f"), None);
        assert_eq!(Rgba::from_hex("-1FFFFF"), None);
        assert_eq!(Rgba::from_hex("#FF 000"), None);
    }

    #[test]
    fn theme_follows_background_luminance() {
        assert_eq!(Theme::for_background(Rgba::rgb(0x1E, 0x1E, 0x1E)), Theme::Dark);
        assert_eq!(Theme::for_background(Rgba::rgb(0xF5, 0xF5, 0xF5)), Theme::Light);
        let palette = NodePalette::default().with_theme(Theme::Dark);
        assert_eq!(palette.selection, Rgba::rgb(0x5D, 0xAD, 0xE2));
    }

    #[test]
    fn dragging_uses_selection_color() {
        let palette = NodePalette::default().with_selection_color(Rgba::rgb(0, 120, 215));
        let colors = palette.colors(&ProxyKind::Midpoint { segment: 0 }, ProxyState::Dragging);
        assert_eq!(colors.fill, Rgba::rgb(0, 120, 215));
    }
}

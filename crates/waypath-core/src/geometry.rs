//! Pure 2D helpers used by the path model and the split/merge rules.
//!
//! Every function is total: callers guarantee finite coordinates, and
//! degenerate input (zero-length vectors, zero-length segments) has a
//! defined answer instead of a failure.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A position in diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self - other).length()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A direction/displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn length(self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.dx * other.dx + self.dy * other.dy
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

/// Unsigned angle between two direction vectors, in degrees (`0..=180`).
///
/// A zero-length vector has no direction; it's treated as continuing the
/// other one, so the result is `0.0`.
pub fn angle_between(v1: Vector, v2: Vector) -> f64 {
    let mag = v1.length() * v2.length();
    if mag == 0.0 {
        return 0.0;
    }
    let cos = (v1.dot(v2) / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Distance from `p` to the segment `a..b`.
///
/// Perpendicular distance when `p` projects inside the segment, otherwise
/// the distance to the nearer endpoint.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * ab.dx, a.y + t * ab.dy);
    p.distance_to(proj)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

// ─── Entity outlines ─────────────────────────────────────────────────────

/// Axis-aligned rectangle (`x`, `y` is the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Outline of an anchor entity: workflows are boxes, statuses are ovals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outline {
    #[default]
    Rect,
    /// Ellipse inscribed in the bounds.
    Ellipse,
}

/// Where the ray from the center of `bounds` toward `toward` leaves the
/// outline. Connector ends sit on this point so lines stop at the shape edge.
pub fn boundary_point(bounds: &Rect, outline: Outline, toward: Point) -> Point {
    let center = bounds.center();
    let dir = toward - center;
    if dir.length() == 0.0 {
        return center;
    }
    let hw = bounds.width / 2.0;
    let hh = bounds.height / 2.0;
    if hw <= 0.0 || hh <= 0.0 {
        return center;
    }

    let scale = match outline {
        Outline::Rect => {
            let sx = if dir.dx == 0.0 {
                f64::INFINITY
            } else {
                hw / dir.dx.abs()
            };
            let sy = if dir.dy == 0.0 {
                f64::INFINITY
            } else {
                hh / dir.dy.abs()
            };
            sx.min(sy)
        }
        Outline::Ellipse => {
            let nx = dir.dx / hw;
            let ny = dir.dy / hh;
            1.0 / nx.hypot(ny)
        }
    };
    center + Vector::new(dir.dx * scale, dir.dy * scale)
}

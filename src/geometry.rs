//! Shared geometry helpers.
//!
//! Normalized coordinates are `f64` fractions of a dimension; pixel-space
//! values are `f64` too so that layout and its inverse (drag) agree exactly.

use serde::{Deserialize, Serialize};

/// Clamp `value` into `[min, max]`. NaN collapses to `min`.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// Clamp a normalized coordinate into `[0, 1]`.
#[inline]
pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Format a normalized value as a whole percentage, e.g. `0.12` → `"12%"`.
pub fn percent(value: f64) -> String {
    format!("{}%", to_slider(value))
}

/// Position of a 0-100 slider for a normalized value.
pub fn to_slider(value: f64) -> u32 {
    (clamp01(value) * 100.0).round() as u32
}

/// Normalized value for a 0-100 slider position.
pub fn from_slider(position: u32) -> f64 {
    clamp01(f64::from(position) / 100.0)
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle, edges included.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

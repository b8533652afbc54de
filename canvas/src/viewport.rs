#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{WHEEL_ZOOM_FACTOR, ZOOM_MAX, ZOOM_MIN};
use crate::geom::{Point, Rect, Size};

/// Viewport state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom), always within `[ZOOM_MIN, ZOOM_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(ZOOM_MIN, ZOOM_MAX)
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.pan_x) / self.zoom, y: (screen.y - self.pan_y) / self.zoom }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point { x: world.x * self.zoom + self.pan_x, y: world.y * self.zoom + self.pan_y }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// World rectangle visible in a viewport of `size` CSS pixels.
    #[must_use]
    pub fn visible_world(&self, size: Size) -> Rect {
        let tl = self.screen_to_world(Point::new(0.0, 0.0));
        Rect::new(tl.x, tl.y, size.width / self.zoom, size.height / self.zoom)
    }

    /// Multiply zoom by `factor`, clamped. With a focal point (screen space),
    /// pan is adjusted so the world point under it stays put.
    ///
    /// Returns whether anything changed. Non-positive or non-finite factors are ignored.
    pub fn zoom_by(&mut self, factor: f64, focal: Option<Point>) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.zoom_to(self.zoom * factor, focal)
    }

    /// Set zoom directly (clamped), optionally keeping `focal` fixed.
    pub fn zoom_to(&mut self, zoom: f64, focal: Option<Point>) -> bool {
        if zoom.is_nan() {
            return false;
        }
        let next = clamp_zoom(zoom);
        if (next - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        if let Some(screen) = focal {
            let world = self.screen_to_world(screen);
            self.pan_x = screen.x - world.x * next;
            self.pan_y = screen.y - world.y * next;
        }
        self.zoom = next;
        true
    }

    /// Translate the pan offset. Unclamped.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan_x += dx;
            self.pan_y += dy;
        }
    }

    /// Zoom 1, pan (0, 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Wheel handling: with the zoom modifier, step zoom around the pointer
    /// (`dy < 0` zooms in); otherwise pan by `(-dx, -dy)`.
    pub fn wheel(&mut self, screen: Point, dx: f64, dy: f64, zoom_modifier: bool) -> bool {
        if zoom_modifier {
            if dy < 0.0 {
                self.zoom_by(WHEEL_ZOOM_FACTOR, Some(screen))
            } else if dy > 0.0 {
                self.zoom_by(1.0 / WHEEL_ZOOM_FACTOR, Some(screen))
            } else {
                false
            }
        } else {
            self.pan_by(-dx, -dy);
            dx != 0.0 || dy != 0.0
        }
    }

    /// Center `content` in a viewport of `size`, scaled to fit inside `padding`
    /// on every side but never above 1.
    ///
    /// Returns false (no change) for degenerate viewports.
    pub fn fit(&mut self, content: Rect, size: Size, padding: f64) -> bool {
        if size.width <= 0.0 || size.height <= 0.0 {
            return false;
        }
        let avail_w = (size.width - 2.0 * padding).max(0.0);
        let avail_h = (size.height - 2.0 * padding).max(0.0);
        let ratio = |avail: f64, extent: f64| if extent > f64::EPSILON { avail / extent } else { f64::INFINITY };
        let scale = clamp_zoom(ratio(avail_w, content.width).min(ratio(avail_h, content.height)).min(1.0));
        let center = content.center();
        self.zoom = scale;
        self.pan_x = size.width / 2.0 - center.x * scale;
        self.pan_y = size.height / 2.0 - center.y * scale;
        true
    }
}

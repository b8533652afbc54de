//! Shared numeric constants for the canvas crate.

// ── Math ────────────────────────────────────────────────────────

/// π / 5 (36°) — angular step for a 10-vertex star polygon.
pub const FRAC_PI_5: f64 = std::f64::consts::PI / 5.0;

/// Inner-to-outer radius ratio for the default 5-point star.
pub const STAR_INNER_RATIO: f64 = 0.5;

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height any object may have, in world units.
pub const MIN_OBJECT_SIZE: f64 = 10.0;

/// Default grid pitch used when snapping is enabled.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

// ── Viewport ────────────────────────────────────────────────────

/// Lower bound for the viewport zoom factor.
pub const ZOOM_MIN: f64 = 0.1;

/// Upper bound for the viewport zoom factor.
pub const ZOOM_MAX: f64 = 5.0;

/// Multiplicative zoom step applied per wheel notch.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

/// Screen padding used by the fit-to-screen shortcut, in CSS pixels.
pub const FIT_PADDING_PX: f64 = 40.0;

// ── History / clipboard ─────────────────────────────────────────

/// Default number of snapshots retained by the history log.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Default offset applied to pasted copies, in world units.
pub const DEFAULT_PASTE_OFFSET: f64 = 20.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles and thin edges.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

/// Rotation increment used when Shift is held during a rotate gesture.
pub const ROTATION_SNAP_DEG: f64 = 15.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge distance in world units.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with Shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Segment length used when a line or arrow is created by a click, in world units.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 100.0;

// ── Raster export ───────────────────────────────────────────────

/// Bounds for the pixels-per-world-unit factor of bitmap export.
pub const RASTER_SCALE_MIN: f64 = 0.1;
pub const RASTER_SCALE_MAX: f64 = 8.0;

/// Largest bitmap edge produced by export, in pixels.
pub const RASTER_MAX_EDGE_PX: u32 = 8192;

/// World-unit margin drawn around the content bounds.
pub const RASTER_MARGIN: f64 = 16.0;

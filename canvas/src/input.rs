//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `Gesture` is the active interaction being tracked between
//! pointer-down and pointer-up, carrying the pre-gesture state needed to
//! commit once on release or restore everything on Escape.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::str::FromStr;

use crate::doc::{CanvasObject, ConnectorEnds, ObjectId, ObjectKind, Polyline, ShapeKind};
use crate::geom::Point;
use crate::hit::ResizeAnchor;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Create a sticky note.
    Sticky,
    /// Create a text object.
    Text,
    /// Create a frame.
    Frame,
    /// Draw a rectangle.
    Rect,
    /// Draw an ellipse.
    Ellipse,
    /// Draw a diamond.
    Diamond,
    /// Draw a five-point star.
    Star,
    /// Draw a triangle.
    Triangle,
    /// Draw a straight line segment.
    Line,
    /// Draw a directed arrow.
    Arrow,
    /// Link two objects.
    Connector,
}

impl Tool {
    /// Whether this tool creates a boxed object (sticky, text, frame, shapes).
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            Self::Sticky
                | Self::Text
                | Self::Frame
                | Self::Rect
                | Self::Ellipse
                | Self::Diamond
                | Self::Star
                | Self::Triangle
        )
    }

    /// Whether this tool creates an edge (line, arrow, connector).
    #[must_use]
    pub fn is_edge(self) -> bool {
        matches!(self, Self::Line | Self::Arrow | Self::Connector)
    }

    #[must_use]
    pub fn creates(self) -> bool {
        self != Self::Select
    }

    /// The object kind this tool creates, with an empty payload.
    #[must_use]
    pub fn kind(self) -> Option<ObjectKind> {
        Some(match self {
            Self::Select => return None,
            Self::Sticky => ObjectKind::Sticky,
            Self::Text => ObjectKind::Text,
            Self::Frame => ObjectKind::Frame,
            Self::Rect => ObjectKind::shape(ShapeKind::Rect),
            Self::Ellipse => ObjectKind::shape(ShapeKind::Ellipse),
            Self::Diamond => ObjectKind::shape(ShapeKind::Diamond),
            Self::Star => ObjectKind::shape(ShapeKind::Star),
            Self::Triangle => ObjectKind::shape(ShapeKind::Triangle),
            Self::Line => ObjectKind::Line(Polyline::default()),
            Self::Arrow => ObjectKind::Arrow(Polyline::default()),
            Self::Connector => ObjectKind::Connector(ConnectorEnds::default()),
        })
    }

    /// CSS cursor shown while the tool is active.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        if self == Self::Select { "default" } else { "crosshair" }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "select" => Self::Select,
            "sticky" => Self::Sticky,
            "text" => Self::Text,
            "frame" => Self::Frame,
            "rect" => Self::Rect,
            "ellipse" => Self::Ellipse,
            "diamond" => Self::Diamond,
            "star" => Self::Star,
            "triangle" => Self::Triangle,
            "line" => Self::Line,
            "arrow" => Self::Arrow,
            "connector" => Self::Connector,
            other => return Err(format!("unknown tool: {other}")),
        })
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    pub const SHIFT: u8 = 1;
    pub const CTRL: u8 = 2;
    pub const ALT: u8 = 4;
    pub const META: u8 = 8;

    /// Decode a host bitmask built from [`Modifiers::SHIFT`] and friends.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            shift: bits & Self::SHIFT != 0,
            ctrl: bits & Self::CTRL != 0,
            alt: bits & Self::ALT != 0,
            meta: bits & Self::META != 0,
        }
    }

    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` index.
    #[must_use]
    pub fn from_dom(index: i16) -> Self {
        match index {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether this is `name`, ignoring ASCII case for single letters.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        if self.0.len() == 1 { self.0.eq_ignore_ascii_case(name) } else { self.0 == name }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The gesture in progress between pointer-down and pointer-up.
///
/// Every active variant keeps the objects as they were before the gesture so
/// that Escape can put them back and pointer-up can tell whether anything changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Panning the viewport with the middle button.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Moving the selection.
    Dragging {
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// Selected objects as they were at pointer-down.
        originals: Vec<CanvasObject>,
    },
    /// Resizing a single object by one of its eight handles.
    Resizing {
        anchor: ResizeAnchor,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        original: CanvasObject,
    },
    /// Rotating a single object around its center.
    Rotating {
        /// Pointer angle (degrees) relative to the center at pointer-down.
        start_angle: f64,
        original: CanvasObject,
    },
    /// Dragging a selection rectangle.
    Marquee {
        start_world: Point,
        current_world: Point,
        /// Selection before the marquee when Shift was held; empty otherwise.
        base: Vec<ObjectId>,
    },
    /// Sizing a provisional object created at pointer-down.
    Drawing {
        id: ObjectId,
        tool: Tool,
        /// World-space corner where the drag started (snapped when enabled).
        anchor_world: Point,
        /// Selection before the provisional object was created.
        selection_before: Vec<ObjectId>,
    },
}

impl Gesture {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

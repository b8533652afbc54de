//! Pointer, wheel and keyboard handlers driving the [`Gesture`] state machine.
//!
//! Pointer-move only applies transient updates. Pointer-up commits at most one
//! history entry for the whole gesture, and Escape puts back whatever the
//! gesture captured at pointer-down.

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use crate::consts::{DEFAULT_SEGMENT_LENGTH, FIT_PADDING_PX, NUDGE_STEP, NUDGE_STEP_LARGE, ROTATION_SNAP_DEG};
use crate::doc::{CanvasObject, ConnectorEnds, NewObject, ObjectId, ObjectKind, PartialObject, Polyline};
use crate::engine::{Action, EngineCore, Observed};
use crate::geom::{Point, Rect, Size};
use crate::group;
use crate::hit::{self, Hit, HitPart, ResizeAnchor};
use crate::input::{Button, Gesture, Key, Modifiers, Tool, WheelDelta};
use crate::selection;

impl EngineCore {
    // --- Pointer ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !screen.is_finite() {
            tracing::warn!(?screen, "ignoring non-finite pointer-down");
            return Vec::new();
        }
        if !self.gesture.is_idle() {
            return Vec::new();
        }
        let before = self.observe();
        let mut actions = Vec::new();
        let world = self.viewport.screen_to_world(screen);
        match button {
            Button::Middle => {
                self.gesture = Gesture::Panning { last_screen: screen };
                self.set_cursor("grabbing", &mut actions);
            }
            Button::Secondary => return Vec::new(),
            Button::Primary if self.tool.creates() => self.begin_drawing(world),
            Button::Primary => self.begin_select(world, modifiers, &mut actions),
        }
        self.respond(&before, false, actions)
    }

    pub fn on_pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> Vec<Action> {
        if !screen.is_finite() {
            return Vec::new();
        }
        let before = self.observe();
        let mut actions = Vec::new();
        let world = self.viewport.screen_to_world(screen);
        let mut gesture = std::mem::take(&mut self.gesture);
        let render = match &mut gesture {
            Gesture::Idle => {
                self.hover(world, &mut actions);
                false
            }
            Gesture::Panning { last_screen } => {
                self.viewport.pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                false
            }
            Gesture::Dragging { start_world, originals } => {
                self.drag_to(*start_world, originals, world);
                true
            }
            Gesture::Resizing { anchor, original, .. } => {
                let (position, size) = resize_geometry(original, *anchor, world, modifiers.shift, self.doc.min_size());
                let partial = PartialObject { position: Some(position), size: Some(size), ..Default::default() };
                self.doc.apply_partial(&original.id, &partial);
                true
            }
            Gesture::Rotating { start_angle, original } => {
                let rotation = rotate_to(original, *start_angle, world, modifiers.shift);
                self.doc.apply_partial(&original.id, &PartialObject::rotation(rotation));
                true
            }
            Gesture::Marquee { start_world, current_world, base } => {
                *current_world = world;
                self.preview_marquee(Rect::from_corners(*start_world, world), base);
                true
            }
            Gesture::Drawing { id, tool, anchor_world, .. } => {
                self.draw_to(*id, *tool, *anchor_world, world);
                true
            }
        };
        self.gesture = gesture;
        self.respond(&before, render, actions)
    }

    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        let before = self.observe();
        let mut actions = Vec::new();
        let world = screen.is_finite().then(|| self.viewport.screen_to_world(screen));
        let render = match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { .. } => false,
            Gesture::Dragging { originals, .. } => {
                let moved: Vec<ObjectId> = originals
                    .iter()
                    .filter(|o| self.doc.get(&o.id).is_some_and(|cur| cur.position != o.position))
                    .map(|o| o.id)
                    .collect();
                if !moved.is_empty() {
                    self.commit(&moved, "move");
                }
                false
            }
            Gesture::Resizing { original, .. } | Gesture::Rotating { original, .. } => {
                if self.doc.get(&original.id).is_some_and(|cur| *cur != original) {
                    self.commit(&[original.id], "transform");
                }
                false
            }
            Gesture::Marquee { start_world, base, .. } => {
                if let Some(world) = world {
                    self.preview_marquee(Rect::from_corners(start_world, world), &base);
                }
                true
            }
            Gesture::Drawing { id, tool, anchor_world, selection_before } => {
                let end = world.unwrap_or(anchor_world);
                self.draw_to(id, tool, anchor_world, end);
                self.finish_drawing(id, tool, anchor_world, end, selection_before);
                true
            }
        };
        match world {
            Some(world) => self.hover(world, &mut actions),
            None => {
                let cursor = self.tool.cursor();
                self.set_cursor(cursor, &mut actions);
            }
        }
        self.respond(&before, render, actions)
    }

    /// Abort the active gesture, restoring the state captured at pointer-down.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let before = self.observe();
        let mut actions = Vec::new();
        let render = match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { .. } => false,
            Gesture::Dragging { originals, .. } => {
                for obj in originals {
                    self.doc.insert(obj);
                }
                true
            }
            Gesture::Resizing { original, .. } | Gesture::Rotating { original, .. } => {
                self.doc.insert(original);
                true
            }
            Gesture::Marquee { base, .. } => {
                self.selection.select(base, false);
                true
            }
            Gesture::Drawing { id, selection_before, .. } => {
                self.doc.remove(&id);
                self.selection.select(selection_before, false);
                true
            }
        };
        let cursor = self.tool.cursor();
        self.set_cursor(cursor, &mut actions);
        self.respond(&before, render, actions)
    }

    // --- Wheel ---

    /// Ctrl/Meta zooms around the pointer; otherwise pans.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !screen.is_finite() || !delta.dx.is_finite() || !delta.dy.is_finite() {
            tracing::warn!(?screen, ?delta, "ignoring non-finite wheel event");
            return Vec::new();
        }
        let before = self.observe();
        self.viewport.wheel(screen, delta.dx, delta.dy, modifiers.command());
        self.actions_since(&before, false)
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Escape") {
            if !self.gesture.is_idle() {
                return self.cancel_gesture();
            }
            let before = self.observe();
            self.selection.clear();
            return self.actions_since(&before, false);
        }
        if !self.gesture.is_idle() {
            return Vec::new();
        }

        let before = self.observe();
        let mut actions = Vec::new();
        let name = key.0.to_ascii_lowercase();
        match (modifiers.command(), name.as_str()) {
            (true, "z") if modifiers.shift => {
                self.redo();
            }
            (true, "z") => {
                self.undo();
            }
            (true, "y") => {
                self.redo();
            }
            (true, "c") => {
                self.copy_selection();
            }
            (true, "v") => {
                self.paste();
            }
            (true, "d") => {
                self.duplicate_selection();
            }
            (true, "a") => {
                self.select_all();
            }
            (true, "g") if modifiers.shift => {
                self.ungroup_selection();
            }
            (true, "g") => {
                self.group_selection();
            }
            (true, "0") => self.reset_viewport(),
            (false, "delete" | "backspace") => {
                self.delete_selection();
            }
            (false, "!" | "1") if modifiers.shift => {
                self.fit_to_screen(FIT_PADDING_PX);
            }
            (false, "arrowleft" | "arrowright" | "arrowup" | "arrowdown") => {
                let step = if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
                let (dx, dy) = match name.as_str() {
                    "arrowleft" => (-step, 0.0),
                    "arrowright" => (step, 0.0),
                    "arrowup" => (0.0, -step),
                    _ => (0.0, step),
                };
                let ids = self.selection.ids();
                self.nudge(&ids, dx, dy);
            }
            (false, "enter") => {
                let Some(obj) = self.selection.single().and_then(|id| self.doc.get(&id)) else {
                    return Vec::new();
                };
                if !matches!(obj.kind, ObjectKind::Sticky | ObjectKind::Text | ObjectKind::Shape { .. }) {
                    return Vec::new();
                }
                actions.push(Action::EditTextRequested { id: obj.id, text: obj.content.clone().unwrap_or_default() });
            }
            _ => return Vec::new(),
        }
        self.respond(&before, false, actions)
    }

    // --- Gesture steps ---

    fn begin_select(&mut self, world: Point, modifiers: Modifiers, actions: &mut Vec<Action>) {
        match hit::hit_test(world, &self.doc, &self.viewport, self.selection.single()) {
            Some(Hit { object_id, part: HitPart::ResizeHandle(anchor) }) => {
                if let Some(original) = self.doc.get(&object_id).cloned() {
                    self.gesture = Gesture::Resizing { anchor, start_world: world, original };
                    self.set_cursor(anchor.cursor(), actions);
                }
            }
            Some(Hit { object_id, part: HitPart::RotateHandle }) => {
                if let Some(original) = self.doc.get(&object_id).cloned() {
                    let start_angle = pointer_angle(original.center(), world);
                    self.gesture = Gesture::Rotating { start_angle, original };
                    self.set_cursor("grabbing", actions);
                }
            }
            Some(Hit { object_id, .. }) => {
                if modifiers.shift {
                    self.select(&[object_id], true);
                } else if !self.selection.contains(&object_id) {
                    self.select(&[object_id], false);
                }
                let originals: Vec<CanvasObject> =
                    self.selection.ids().iter().filter_map(|id| self.doc.get(id)).cloned().collect();
                self.gesture = Gesture::Dragging { start_world: world, originals };
                self.set_cursor("move", actions);
            }
            None => {
                let base = if modifiers.shift {
                    self.selection.ids()
                } else {
                    self.selection.clear();
                    Vec::new()
                };
                self.gesture = Gesture::Marquee { start_world: world, current_world: world, base };
            }
        }
    }

    fn begin_drawing(&mut self, world: Point) {
        let Some(kind) = self.tool.kind() else {
            return;
        };
        let anchor = self.snap_point(world);
        let kind = match kind {
            ObjectKind::Line(_) => ObjectKind::Line(Polyline { points: vec![Point::default(); 2] }),
            ObjectKind::Arrow(_) => ObjectKind::Arrow(Polyline { points: vec![Point::default(); 2] }),
            ObjectKind::Connector(_) => {
                ObjectKind::Connector(ConnectorEnds { from: hit::topmost_body(world, &self.doc, &[]), to: None })
            }
            other => other,
        };
        let selection_before = self.selection.ids();
        let min = self.doc.min_size();
        let id = self.insert_new(NewObject::new(kind).at(anchor.x, anchor.y).sized(min, min));
        self.selection.select([id], false);
        self.gesture = Gesture::Drawing { id, tool: self.tool, anchor_world: anchor, selection_before };
    }

    /// Move every original by the pointer delta. With snapping on, the first
    /// object lands on the grid and the rest keep their offsets to it.
    fn drag_to(&mut self, start: Point, originals: &[CanvasObject], world: Point) {
        let Some(first) = originals.first() else {
            return;
        };
        let mut dx = world.x - start.x;
        let mut dy = world.y - start.y;
        if self.config.snap_to_grid {
            let target = self.snap_point(first.position.offset(dx, dy));
            dx = target.x - first.position.x;
            dy = target.y - first.position.y;
        }
        for obj in originals {
            let moved = obj.position.offset(dx, dy);
            self.doc.apply_partial(&obj.id, &PartialObject::position(moved.x, moved.y));
        }
    }

    fn preview_marquee(&mut self, rect: Rect, base: &[ObjectId]) {
        let hits = selection::marquee_hits(&self.doc, &rect, self.config.marquee_policy);
        let mut ids = group::expand(&self.doc, &hits);
        ids.extend_from_slice(base);
        self.selection.select(ids, false);
    }

    /// Stretch the provisional object between `anchor` and the (snapped) pointer.
    fn draw_to(&mut self, id: ObjectId, tool: Tool, anchor: Point, world: Point) {
        let current = self.snap_point(world);
        let rect = Rect::from_corners(anchor, current);
        let origin = Point::new(rect.x, rect.y);
        let points = vec![
            Point::new(anchor.x - origin.x, anchor.y - origin.y),
            Point::new(current.x - origin.x, current.y - origin.y),
        ];
        let kind = match tool {
            Tool::Line => Some(ObjectKind::Line(Polyline { points })),
            Tool::Arrow => Some(ObjectKind::Arrow(Polyline { points })),
            _ => None,
        };
        let partial = PartialObject {
            position: Some(origin),
            size: Some(Size::new(rect.width, rect.height)),
            kind,
            ..Default::default()
        };
        self.doc.apply_partial(&id, &partial);
    }

    /// Commit the provisional object, or swap a click-sized one for a default-sized object.
    fn finish_drawing(&mut self, id: ObjectId, tool: Tool, anchor: Point, world: Point, before: Vec<ObjectId>) {
        let current = self.snap_point(world);
        let min = self.doc.min_size();
        let is_click = (current.x - anchor.x).abs() < min && (current.y - anchor.y).abs() < min;
        if is_click {
            let provisional = self.doc.remove(&id).map(|o| o.kind);
            let segment = || Polyline { points: vec![Point::default(), Point::new(DEFAULT_SEGMENT_LENGTH, 0.0)] };
            let kind = match tool {
                Tool::Line => ObjectKind::Line(segment()),
                Tool::Arrow => ObjectKind::Arrow(segment()),
                _ => match provisional.or_else(|| tool.kind()) {
                    Some(kind) => kind,
                    None => return,
                },
            };
            self.selection.select(before, false);
            self.create(NewObject::new(kind).at(anchor.x, anchor.y));
            return;
        }

        if tool == Tool::Connector {
            let to = hit::topmost_body(world, &self.doc, &[id]);
            if let Some(obj) = self.doc.get_mut(&id) {
                if let ObjectKind::Connector(ends) = &mut obj.kind {
                    ends.to = to;
                }
            }
        }
        self.selection.select([id], false);
        self.commit(&[id], "draw");
    }

    /// Idle hover feedback: handle and body cursors for the select tool.
    fn hover(&mut self, world: Point, actions: &mut Vec<Action>) {
        let cursor = if self.tool.creates() {
            self.tool.cursor()
        } else {
            match hit::hit_test(world, &self.doc, &self.viewport, self.selection.single()) {
                Some(Hit { part: HitPart::ResizeHandle(anchor), .. }) => anchor.cursor(),
                Some(Hit { part: HitPart::RotateHandle, .. }) => "grab",
                Some(_) => "move",
                None => "default",
            }
        };
        self.set_cursor(cursor, actions);
    }

    fn respond(&self, before: &Observed, render: bool, mut actions: Vec<Action>) -> Vec<Action> {
        actions.extend(self.actions_since(before, render));
        actions
    }
}

/// Angle in degrees of `pt` around `center`, clockwise from +x in screen axes.
fn pointer_angle(center: Point, pt: Point) -> f64 {
    (pt.y - center.y).atan2(pt.x - center.x).to_degrees()
}

/// Rotation for `original` after the pointer moved from `start_angle` to `world`.
pub(crate) fn rotate_to(original: &CanvasObject, start_angle: f64, world: Point, snap: bool) -> f64 {
    let rotation = original.transform.rotation + pointer_angle(original.center(), world) - start_angle;
    if snap { (rotation / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG } else { rotation }
}

fn scale_or_one(scale: f64) -> f64 {
    let scale = scale.abs();
    if scale > f64::EPSILON { scale } else { 1.0 }
}

/// New position and (unscaled) size for dragging `anchor` of `original` to `world`.
///
/// Works in the object's unrotated frame: the dragged edges follow the pointer,
/// the opposite edges stay fixed in world space, and each dimension is clamped
/// to `min_size`. `keep_aspect` only applies to corner handles.
pub(crate) fn resize_geometry(
    original: &CanvasObject,
    anchor: ResizeAnchor,
    world: Point,
    keep_aspect: bool,
    min_size: f64,
) -> (Point, Size) {
    let rect = original.local_rect();
    let local = original.to_local(world);
    let (dx, dy) = anchor.direction();
    let sx = scale_or_one(original.transform.scale_x);
    let sy = scale_or_one(original.transform.scale_y);

    let (mut left, mut top, mut right, mut bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    if dx > 0.0 {
        right = local.x;
    } else if dx < 0.0 {
        left = local.x;
    }
    if dy > 0.0 {
        bottom = local.y;
    } else if dy < 0.0 {
        top = local.y;
    }
    let mut width = (right - left).max(min_size * sx);
    let mut height = (bottom - top).max(min_size * sy);
    if keep_aspect && anchor.is_corner() && rect.width > 0.0 && rect.height > 0.0 {
        let factor = (width / rect.width).max(height / rect.height);
        width = rect.width * factor;
        height = rect.height * factor;
    }

    let new_left = if dx < 0.0 { rect.right() - width } else { rect.x };
    let new_top = if dy < 0.0 { rect.bottom() - height } else { rect.y };
    let center = Point::new(new_left + width / 2.0, new_top + height / 2.0)
        .rotate_around(rect.center(), original.transform.rotation);
    let position = Point::new(
        center.x - width / 2.0 - original.transform.x,
        center.y - height / 2.0 - original.transform.y,
    );
    (position, Size::new(width / sx, height / sy))
}

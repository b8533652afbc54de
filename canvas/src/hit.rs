//! Hit-testing and handle geometry.
//!
//! Everything here works in world coordinates. Screen-space tolerances
//! (handle radius, line slop) are divided by the viewport zoom so handles
//! keep the same on-screen size at every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::consts::{FRAC_PI_5, HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX, STAR_INNER_RATIO};
use crate::doc::{CanvasObject, DocStore, ObjectId, ObjectKind, ShapeKind};
use crate::geom::{self, Point, Rect};
use crate::viewport::Viewport;

/// Segments used to approximate an ellipse outline.
const ELLIPSE_SEGMENTS: u32 = 48;

/// Which part of an object was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
    EdgeBody,
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [Self; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Unit direction of the handle from the object center, in the object's local frame.
    #[must_use]
    pub fn direction(self) -> (f64, f64) {
        match self {
            Self::N => (0.0, -1.0),
            Self::Ne => (1.0, -1.0),
            Self::E => (1.0, 0.0),
            Self::Se => (1.0, 1.0),
            Self::S => (0.0, 1.0),
            Self::Sw => (-1.0, 1.0),
            Self::W => (-1.0, 0.0),
            Self::Nw => (-1.0, -1.0),
        }
    }

    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Self::Ne | Self::Se | Self::Sw | Self::Nw)
    }

    /// CSS resize cursor, ignoring object rotation.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Se | Self::Nw => "nwse-resize",
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub object_id: ObjectId,
    pub part: HitPart,
}

// =============================================================
// Handle geometry
// =============================================================

/// World positions of the eight resize handles, in [`ResizeAnchor::ALL`] order.
#[must_use]
pub fn resize_handle_positions(obj: &CanvasObject) -> [Point; 8] {
    let rect = obj.local_rect();
    let center = rect.center();
    ResizeAnchor::ALL.map(|anchor| {
        let (dx, dy) = anchor.direction();
        Point::new(center.x + dx * rect.width / 2.0, center.y + dy * rect.height / 2.0)
            .rotate_around(center, obj.transform.rotation)
    })
}

/// World position of the rotate handle, a fixed screen distance above the top edge.
#[must_use]
pub fn rotate_handle_position(obj: &CanvasObject, zoom: f64) -> Point {
    let rect = obj.local_rect();
    let center = rect.center();
    Point::new(center.x, rect.y - ROTATE_HANDLE_OFFSET_PX / zoom).rotate_around(center, obj.transform.rotation)
}

/// Outline polygon of a shape sub-type inscribed in `rect` (unrotated).
#[must_use]
pub fn shape_outline(rect: &Rect, shape: ShapeKind) -> Vec<Point> {
    let c = rect.center();
    let hw = rect.width / 2.0;
    let hh = rect.height / 2.0;
    match shape {
        ShapeKind::Rect => rect.corners().to_vec(),
        ShapeKind::Diamond => vec![
            Point::new(c.x, rect.y),
            Point::new(rect.right(), c.y),
            Point::new(c.x, rect.bottom()),
            Point::new(rect.x, c.y),
        ],
        ShapeKind::Triangle => {
            vec![Point::new(c.x, rect.y), Point::new(rect.right(), rect.bottom()), Point::new(rect.x, rect.bottom())]
        }
        ShapeKind::Star => (0..10)
            .map(|i| {
                let angle = FRAC_PI_5.mul_add(f64::from(i), -FRAC_PI_2);
                let ratio = if i % 2 == 0 { 1.0 } else { STAR_INNER_RATIO };
                Point::new(c.x + hw * ratio * angle.cos(), c.y + hh * ratio * angle.sin())
            })
            .collect(),
        ShapeKind::Ellipse => (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let angle = TAU * f64::from(i) / f64::from(ELLIPSE_SEGMENTS);
                Point::new(c.x + hw * angle.cos(), c.y + hh * angle.sin())
            })
            .collect(),
    }
}

/// World-space path of an edge object: polyline points for line/arrow,
/// endpoint centers for a connector. `None` for boxed kinds.
///
/// A connector end that is free or points at a deleted object falls back to
/// the connector's own rectangle (top-left for `from`, bottom-right for `to`).
#[must_use]
pub fn edge_path(obj: &CanvasObject, store: &DocStore) -> Option<Vec<Point>> {
    match &obj.kind {
        ObjectKind::Line(_) | ObjectKind::Arrow(_) => obj.world_points(),
        ObjectKind::Connector(ends) => {
            let rect = obj.local_rect();
            let resolve = |end: Option<ObjectId>| end.and_then(|id| store.get(&id)).map(CanvasObject::center);
            let a = resolve(ends.from).unwrap_or(Point::new(rect.x, rect.y));
            let b = resolve(ends.to).unwrap_or(Point::new(rect.right(), rect.bottom()));
            Some(vec![a, b])
        }
        _ => None,
    }
}

/// Union of every object's bounds and edge path, or `None` for an empty store.
#[must_use]
pub fn content_bounds(store: &DocStore) -> Option<Rect> {
    geom::union_all(store.objects().iter().map(|o| {
        edge_path(o, store)
            .and_then(|path| geom::bounding_box_of_points(&path))
            .map_or_else(|| o.bounds(), |path_bounds| path_bounds.union(&o.bounds()))
    }))
}

// =============================================================
// Hit testing
// =============================================================

fn body_contains(obj: &CanvasObject, world_pt: Point) -> bool {
    let local = obj.to_local(world_pt);
    let rect = obj.local_rect();
    match obj.kind {
        ObjectKind::Shape { shape: ShapeKind::Ellipse } => {
            let c = rect.center();
            let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            let nx = (local.x - c.x) / rx;
            let ny = (local.y - c.y) / ry;
            nx * nx + ny * ny <= 1.0
        }
        ObjectKind::Shape { shape: ShapeKind::Rect } => rect.contains_point(local),
        ObjectKind::Shape { shape } => geom::point_in_polygon(local, &shape_outline(&rect, shape)),
        _ => rect.contains_point(local),
    }
}

fn path_near(path: &[Point], world_pt: Point, tolerance: f64) -> bool {
    match path {
        [] => false,
        [only] => only.distance(world_pt) <= tolerance,
        _ => path
            .windows(2)
            .any(|seg| geom::distance_to_segment(world_pt, seg[0], seg[1]) <= tolerance),
    }
}

fn handle_hit(obj: &CanvasObject, world_pt: Point, zoom: f64) -> Option<HitPart> {
    if obj.kind.is_edge() {
        return None;
    }
    let radius = HANDLE_RADIUS_PX / zoom;
    if rotate_handle_position(obj, zoom).distance(world_pt) <= radius {
        return Some(HitPart::RotateHandle);
    }
    resize_handle_positions(obj)
        .iter()
        .zip(ResizeAnchor::ALL)
        .find(|(pos, _)| pos.distance(world_pt) <= radius)
        .map(|(_, anchor)| HitPart::ResizeHandle(anchor))
}

/// Test which object (if any) is under `world_pt`, checking the handles of
/// `selected` (the single selected object) first, then bodies top-down.
#[must_use]
pub fn hit_test(world_pt: Point, doc: &DocStore, viewport: &Viewport, selected: Option<ObjectId>) -> Option<Hit> {
    let zoom = viewport.zoom;
    if let Some(obj) = selected.and_then(|id| doc.get(&id)) {
        if let Some(part) = handle_hit(obj, world_pt, zoom) {
            return Some(Hit { object_id: obj.id, part });
        }
    }

    let slop = HANDLE_RADIUS_PX / zoom;
    doc.sorted_objects().into_iter().rev().find_map(|obj| match edge_path(obj, doc) {
        Some(path) => {
            let tolerance = slop.max(obj.style().stroke_width() / 2.0);
            path_near(&path, world_pt, tolerance).then_some(Hit { object_id: obj.id, part: HitPart::EdgeBody })
        }
        None => body_contains(obj, world_pt).then_some(Hit { object_id: obj.id, part: HitPart::Body }),
    })
}

/// Topmost object whose body contains `world_pt`, skipping `exclude`. Edges never match.
#[must_use]
pub fn topmost_body(world_pt: Point, doc: &DocStore, exclude: &[ObjectId]) -> Option<ObjectId> {
    doc.sorted_objects()
        .into_iter()
        .rev()
        .filter(|o| !o.kind.is_edge() && !exclude.contains(&o.id))
        .find(|o| body_contains(o, world_pt))
        .map(|o| o.id)
}

//! Document model: canvas objects, their properties, and the in-memory store.
//!
//! This module defines the core data types that describe what is on the canvas
//! (`CanvasObject`, `ObjectKind`), a sparse-update type for incremental edits
//! (`PartialObject`), a creation request (`NewObject`), a typed accessor for the
//! open-ended `style` map (`Style`), and the runtime store that owns all live
//! objects (`DocStore`).
//!
//! Data flows into this layer from snapshot import and from the engine's
//! mutation entry points. The renderer and hit-tester read from `DocStore` via
//! `sorted_objects` to determine draw order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::geom::{self, Point, Rect, Size};

/// Unique identifier for a canvas object.
pub type ObjectId = Uuid;

/// Shared tag linking grouped objects. Not an object itself.
pub type GroupId = Uuid;

/// Open map of visual attributes (fill, stroke, opacity, font, radius, ...).
pub type StyleMap = Map<String, Value>;

/// Wire tag naming the kind of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    Sticky,
    Text,
    Shape,
    Line,
    Arrow,
    Connector,
    Frame,
}

impl KindTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sticky => "sticky",
            Self::Text => "text",
            Self::Shape => "shape",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Connector => "connector",
            Self::Frame => "frame",
        }
    }
}

/// Sub-type of a `shape` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle (optionally rounded via `cornerRadius`).
    #[default]
    Rect,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// Diamond (rhombus) with vertices at bounding-box edge midpoints.
    Diamond,
    /// Five-point star inscribed within the bounding box.
    Star,
    /// Isosceles triangle with its apex at the top edge midpoint.
    Triangle,
}

/// Point list for line and arrow objects, local to the object's position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

/// Endpoint references of a connector. Either end may be free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectorEnds {
    #[serde(default)]
    pub from: Option<ObjectId>,
    #[serde(default)]
    pub to: Option<ObjectId>,
}

/// The kind of a canvas object together with its kind-specific payload.
///
/// Stand-alone serialization is adjacently tagged:
/// `{"kind": "shape", "metadata": {"shape": "ellipse"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "metadata", rename_all = "lowercase")]
pub enum ObjectKind {
    /// Sticky note with text content.
    Sticky,
    /// Free text block.
    Text,
    /// Geometric shape, optionally labeled via `content`.
    Shape { shape: ShapeKind },
    /// Open polyline.
    Line(Polyline),
    /// Polyline with an arrowhead at the last point.
    Arrow(Polyline),
    /// Edge linking two objects by id.
    Connector(ConnectorEnds),
    /// Container frame drawn behind its contents.
    Frame,
}

impl ObjectKind {
    /// A plain rectangle shape.
    #[must_use]
    pub fn shape(shape: ShapeKind) -> Self {
        Self::Shape { shape }
    }

    /// The wire tag for this kind.
    #[must_use]
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Sticky => KindTag::Sticky,
            Self::Text => KindTag::Text,
            Self::Shape { .. } => KindTag::Shape,
            Self::Line(_) => KindTag::Line,
            Self::Arrow(_) => KindTag::Arrow,
            Self::Connector(_) => KindTag::Connector,
            Self::Frame => KindTag::Frame,
        }
    }

    /// The kind-specific payload as a JSON object.
    #[must_use]
    pub fn metadata(&self) -> Value {
        match self {
            Self::Sticky | Self::Text | Self::Frame => Value::Object(Map::new()),
            Self::Shape { shape } => serde_json::json!({ "shape": shape }),
            Self::Line(line) | Self::Arrow(line) => serde_json::json!({ "points": line.points }),
            Self::Connector(ends) => serde_json::json!({ "from": ends.from, "to": ends.to }),
        }
    }

    /// Rebuild a kind from its wire tag and payload.
    ///
    /// A `null` payload is accepted for every kind and yields the default
    /// payload; any other payload must deserialize into the tag's shape.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload does not match the tag.
    pub fn from_parts(tag: KindTag, metadata: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct ShapeMeta {
            #[serde(default)]
            shape: ShapeKind,
        }

        #[derive(Deserialize)]
        struct Empty {}

        let metadata = if metadata.is_null() { Value::Object(Map::new()) } else { metadata };
        Ok(match tag {
            KindTag::Sticky | KindTag::Text | KindTag::Frame => {
                serde_json::from_value::<Empty>(metadata)?;
                match tag {
                    KindTag::Sticky => Self::Sticky,
                    KindTag::Text => Self::Text,
                    _ => Self::Frame,
                }
            }
            KindTag::Shape => Self::Shape { shape: serde_json::from_value::<ShapeMeta>(metadata)?.shape },
            KindTag::Line => Self::Line(serde_json::from_value(metadata)?),
            KindTag::Arrow => Self::Arrow(serde_json::from_value(metadata)?),
            KindTag::Connector => Self::Connector(serde_json::from_value(metadata)?),
        })
    }

    /// Whether this kind is drawn as a stroke rather than a filled box.
    #[must_use]
    pub fn is_edge(&self) -> bool {
        matches!(self, Self::Line(_) | Self::Arrow(_) | Self::Connector(_))
    }

    /// Whether this kind carries editable text.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Sticky | Self::Text | Self::Shape { .. } | Self::Frame)
    }

    /// Polyline points, for line and arrow kinds.
    #[must_use]
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            Self::Line(line) | Self::Arrow(line) => Some(&line.points),
            _ => None,
        }
    }

    /// Size used when a create request omits one.
    #[must_use]
    pub fn default_size(&self) -> Size {
        match self {
            Self::Sticky => Size::new(200.0, 200.0),
            Self::Text => Size::new(200.0, 40.0),
            Self::Shape { .. } => Size::new(150.0, 100.0),
            Self::Frame => Size::new(400.0, 300.0),
            Self::Line(line) | Self::Arrow(line) => geom::bounding_box_of_points(&line.points)
                .map_or(Size::new(100.0, 0.0), |r| Size::new(r.right().max(0.0), r.bottom().max(0.0))),
            Self::Connector(_) => Size::new(100.0, 0.0),
        }
    }
}

/// Offset, independent scale and rotation applied on top of position/size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Clockwise rotation in degrees around the bounds center, in `[0, 360)`.
    #[serde(default)]
    pub rotation: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale_x: 1.0, scale_y: 1.0, rotation: 0.0 }
    }
}

impl Transform {
    /// Copy with rotation normalized into `[0, 360)`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self { rotation: geom::normalize_degrees(self.rotation), ..self }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.scale_x.is_finite()
            && self.scale_y.is_finite()
            && self.rotation.is_finite()
    }
}

/// A canvas object as held in the store, the history log and the clipboard.
///
/// Serialization goes through [`crate::snapshot::ObjectRecord`], which keeps
/// the kind tag and its payload in separate `kind` / `metadata` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::snapshot::ObjectRecord", into = "crate::snapshot::ObjectRecord")]
pub struct CanvasObject {
    /// Unique identifier, immutable after creation.
    pub id: ObjectId,
    /// Kind and kind-specific payload.
    pub kind: ObjectKind,
    /// Top-left anchor in world coordinates.
    pub position: Point,
    /// Unscaled extent; never below the store's minimum.
    pub size: Size,
    pub transform: Transform,
    pub style: StyleMap,
    /// Text payload for sticky, text, labeled shape and frame title.
    pub content: Option<String>,
    /// Stacking order; higher draws on top.
    pub layer: i64,
    /// Shared group tag, if grouped.
    pub group_id: Option<GroupId>,
    /// Contributor who created the object.
    pub author: Option<String>,
    pub created_at: i64,
    /// Bumped on every committed mutation.
    pub updated_at: i64,
}

impl CanvasObject {
    /// Build a live object from a creation request.
    #[must_use]
    pub fn from_new(new: NewObject, id: ObjectId, now_ms: i64, min_size: f64, default_layer: i64) -> Self {
        let size = new.size.unwrap_or_else(|| new.kind.default_size()).clamped(min_size);
        Self {
            id,
            position: new.position.unwrap_or_default(),
            size,
            transform: new.transform.unwrap_or_default().normalized(),
            style: new.style,
            content: new.content,
            layer: new.layer.unwrap_or(default_layer),
            group_id: None,
            author: new.author,
            created_at: now_ms,
            updated_at: now_ms,
            kind: new.kind,
        }
    }

    /// Rectangle covered before rotation: position plus transform offset, size scaled.
    #[must_use]
    pub fn local_rect(&self) -> Rect {
        Rect::new(
            self.position.x + self.transform.x,
            self.position.y + self.transform.y,
            self.size.width * self.transform.scale_x.abs(),
            self.size.height * self.transform.scale_y.abs(),
        )
    }

    /// Axis-aligned world bounds including rotation.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.local_rect().rotated_bounds(self.transform.rotation)
    }

    /// Rotation pivot in world coordinates.
    #[must_use]
    pub fn center(&self) -> Point {
        self.local_rect().center()
    }

    /// Map a world point into this object's unrotated frame.
    #[must_use]
    pub fn to_local(&self, world: Point) -> Point {
        world.rotate_around(self.center(), -self.transform.rotation)
    }

    /// Polyline points in world coordinates (rotation applied), for line and arrow kinds.
    #[must_use]
    pub fn world_points(&self) -> Option<Vec<Point>> {
        let points = self.kind.points()?;
        let origin = self.local_rect();
        let center = origin.center();
        Some(
            points
                .iter()
                .map(|p| {
                    Point::new(origin.x + p.x * self.transform.scale_x, origin.y + p.y * self.transform.scale_y)
                        .rotate_around(center, self.transform.rotation)
                })
                .collect(),
        )
    }

    /// Typed access to the style map.
    #[must_use]
    pub fn style(&self) -> Style<'_> {
        Style::new(&self.style)
    }

    /// Whether every numeric field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite()
            && self.transform.is_finite()
    }
}

/// Request to create an object. Missing geometry is defaulted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    pub kind: ObjectKind,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub transform: Option<Transform>,
    pub style: StyleMap,
    pub content: Option<String>,
    pub layer: Option<i64>,
    pub author: Option<String>,
}

impl NewObject {
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            position: None,
            size: None,
            transform: None,
            style: StyleMap::new(),
            content: None,
            layer: None,
            author: None,
        }
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, key: &str, value: Value) -> Self {
        self.style.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = Some(layer);
        self
    }

    #[must_use]
    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Sparse update for a canvas object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// Style keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<i64>,
    /// Replacement payload; ignored unless its tag matches the object's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectKind>,
}

impl PartialObject {
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { position: Some(Point::new(x, y)), ..Default::default() }
    }

    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self { size: Some(Size::new(width, height)), ..Default::default() }
    }

    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        Self { rotation: Some(degrees), ..Default::default() }
    }

    #[must_use]
    pub fn content(text: impl Into<String>) -> Self {
        Self { content: Some(text.into()), ..Default::default() }
    }

    #[must_use]
    pub fn style(style: StyleMap) -> Self {
        Self { style: Some(style), ..Default::default() }
    }

    /// True when no field would be applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// False when any present position, size, rotation or scale is NaN or infinite.
    #[must_use]
    pub fn has_finite_geometry(&self) -> bool {
        self.position.is_none_or(Point::is_finite)
            && self.size.is_none_or(|s| s.width.is_finite() && s.height.is_finite())
            && [self.rotation, self.scale_x, self.scale_y].iter().flatten().all(|v| v.is_finite())
    }
}

/// Typed access to common style fields from a `CanvasObject.style` map.
pub struct Style<'a> {
    value: &'a StyleMap,
}

impl<'a> Style<'a> {
    /// Wrap a reference to a style map for typed access.
    #[must_use]
    pub fn new(value: &'a StyleMap) -> Self {
        Self { value }
    }

    /// Fill color as a CSS color string, if set.
    #[must_use]
    pub fn fill(&self) -> Option<&'a str> {
        self.value.get("fill").and_then(Value::as_str)
    }

    /// Stroke color as a CSS color string, if set.
    #[must_use]
    pub fn stroke(&self) -> Option<&'a str> {
        self.value.get("stroke").and_then(Value::as_str)
    }

    /// Stroke width in world units. Defaults to `1.0` when absent.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.value
            .get("strokeWidth")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
    }

    /// Opacity in `[0, 1]`. Defaults to `1.0` when absent.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.value
            .get("opacity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }

    /// Font size in world units. Defaults to `16.0` when absent.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.value
            .get("fontSize")
            .and_then(Value::as_f64)
            .unwrap_or(16.0)
    }

    /// Font family. Empty string when absent.
    #[must_use]
    pub fn font_family(&self) -> &'a str {
        self.value
            .get("fontFamily")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Corner radius in world units. Defaults to `0.0` when absent.
    #[must_use]
    pub fn corner_radius(&self) -> f64 {
        self.value
            .get("cornerRadius")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Merge `incoming` into `existing`; `null` values delete keys.
pub fn merge_style(existing: &mut StyleMap, incoming: &StyleMap) {
    for (k, v) in incoming {
        if v.is_null() {
            existing.remove(k);
        } else {
            existing.insert(k.clone(), v.clone());
        }
    }
}

/// In-memory store of canvas objects, kept in insertion order.
#[derive(Debug, Clone)]
pub struct DocStore {
    objects: Vec<CanvasObject>,
    min_size: f64,
}

impl DocStore {
    /// Create an empty store with the default minimum object size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_size(crate::consts::MIN_OBJECT_SIZE)
    }

    /// Create an empty store that clamps sizes to `min_size`.
    #[must_use]
    pub fn with_min_size(min_size: f64) -> Self {
        Self { objects: Vec::new(), min_size }
    }

    /// Minimum width/height enforced on every write.
    #[must_use]
    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    /// Insert or replace an object. If an object with the same `id` already
    /// exists it is overwritten in place.
    pub fn insert(&mut self, mut obj: CanvasObject) {
        obj.size = obj.size.clamped(self.min_size);
        obj.transform = obj.transform.normalized();
        match self.objects.iter_mut().find(|o| o.id == obj.id) {
            Some(slot) => *slot = obj,
            None => self.objects.push(obj),
        }
    }

    /// Remove an object by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<CanvasObject> {
        let idx = self.objects.iter().position(|o| o.id == *id)?;
        Some(self.objects.remove(idx))
    }

    /// Return a reference to an object by id.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == *id)
    }

    /// Return a mutable reference to an object by id.
    ///
    /// Callers are responsible for keeping size and rotation within bounds;
    /// prefer [`DocStore::apply_partial`].
    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|o| o.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Apply a partial update to an existing object. Returns false if the
    /// object doesn't exist or the partial carries non-finite geometry.
    ///
    /// Sizes are clamped to the minimum and rotation is normalized; a kind
    /// payload with a different tag is ignored.
    pub fn apply_partial(&mut self, id: &ObjectId, partial: &PartialObject) -> bool {
        if !partial.has_finite_geometry() {
            tracing::warn!(%id, "ignoring update with non-finite geometry");
            return false;
        }
        let min_size = self.min_size;
        let Some(obj) = self.get_mut(id) else {
            return false;
        };
        if let Some(p) = partial.position {
            obj.position = p;
        }
        if let Some(s) = partial.size {
            obj.size = s.clamped(min_size);
        }
        if let Some(r) = partial.rotation {
            obj.transform.rotation = geom::normalize_degrees(r);
        }
        if let Some(sx) = partial.scale_x {
            obj.transform.scale_x = sx;
        }
        if let Some(sy) = partial.scale_y {
            obj.transform.scale_y = sy;
        }
        if let Some(ref style) = partial.style {
            merge_style(&mut obj.style, style);
        }
        if let Some(ref content) = partial.content {
            obj.content = Some(content.clone());
        }
        if let Some(layer) = partial.layer {
            obj.layer = layer;
        }
        if let Some(ref kind) = partial.kind {
            if kind.tag() == obj.kind.tag() {
                obj.kind = kind.clone();
            } else {
                tracing::debug!(%id, from = ?obj.kind.tag(), to = ?kind.tag(), "ignoring kind change");
            }
        }
        true
    }

    /// Stamp `updated_at` on an existing object.
    pub fn touch(&mut self, id: &ObjectId, now_ms: i64) {
        if let Some(obj) = self.get_mut(id) {
            obj.updated_at = now_ms;
        }
    }

    /// Replace all objects with a full snapshot.
    pub fn load_snapshot(&mut self, objects: Vec<CanvasObject>) {
        self.objects.clear();
        for obj in objects {
            self.insert(obj);
        }
    }

    /// All objects in insertion order.
    #[must_use]
    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    /// Deep copy of the live list, as recorded by history.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanvasObject> {
        self.objects.clone()
    }

    /// Return all objects sorted by `layer` for draw order; ties keep insertion order.
    #[must_use]
    pub fn sorted_objects(&self) -> Vec<&CanvasObject> {
        let mut objs: Vec<&CanvasObject> = self.objects.iter().collect();
        objs.sort_by_key(|o| o.layer);
        objs
    }

    /// Objects matching `pred`, in draw order.
    pub fn query<F>(&self, pred: F) -> Vec<&CanvasObject>
    where
        F: Fn(&CanvasObject) -> bool,
    {
        self.sorted_objects().into_iter().filter(|o| pred(*o)).collect()
    }

    /// Ids of all live objects, in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id).collect()
    }

    /// Layer one above the current topmost object (0 for an empty store).
    #[must_use]
    pub fn next_layer(&self) -> i64 {
        self.objects.iter().map(|o| o.layer).max().map_or(0, |m| m.saturating_add(1))
    }

    /// Layer one below the current bottommost object (0 for an empty store).
    #[must_use]
    pub fn prev_layer(&self) -> i64 {
        self.objects.iter().map(|o| o.layer).min().map_or(0, |m| m.saturating_sub(1))
    }

    /// Number of objects currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for DocStore {
    fn default() -> Self {
        Self::new()
    }
}

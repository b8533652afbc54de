//! `wasm-bindgen` facade over [`EngineCore`].
//!
//! Arguments cross the boundary as strings and numbers: object payloads and id
//! lists are JSON, modifiers are a [`Modifiers`] bitmask and pointer buttons use
//! the DOM `MouseEvent.button` index. Handlers return the resulting
//! [`crate::engine::Action`] list as a JSON array. Failures come back as
//! `"<CODE>: <message>"` strings so the host can switch on the code prefix.

#[cfg(test)]
#[path = "bindings_test.rs"]
mod bindings_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use crate::doc::{GroupId, KindTag, NewObject, ObjectId, ObjectKind, PartialObject, StyleMap, Transform};
use crate::engine::{EngineCore, UpdateMode};
use crate::error::ErrorCode;
use crate::geom::{Point, Rect, Size};
use crate::input::{Button, Key, Modifiers, Tool, WheelDelta};
use crate::selection::MarqueePolicy;

/// Failure decoding a host request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("unknown marquee policy: {0}")]
    UnknownPolicy(String),
}

impl ErrorCode for RequestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_REQUEST_MALFORMED",
            Self::InvalidId(_) => "E_REQUEST_INVALID_ID",
            Self::UnknownTool(_) => "E_REQUEST_UNKNOWN_TOOL",
            Self::UnknownPolicy(_) => "E_REQUEST_UNKNOWN_POLICY",
        }
    }
}

/// Create payload as sent by the host: wire tag plus kind metadata.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    kind: KindTag,
    #[serde(default)]
    metadata: Value,
    #[serde(default)]
    position: Option<Point>,
    #[serde(default)]
    size: Option<Size>,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    style: StyleMap,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    layer: Option<i64>,
    #[serde(default)]
    author: Option<String>,
}

impl CreateRequest {
    fn into_new(self) -> Result<NewObject, RequestError> {
        let mut new = NewObject::new(ObjectKind::from_parts(self.kind, self.metadata)?);
        new.position = self.position;
        new.size = self.size;
        new.transform = self.transform;
        new.style = self.style;
        new.content = self.content;
        new.layer = self.layer;
        new.author = self.author;
        Ok(new)
    }
}

fn fail<E: ErrorCode>(err: &E) -> String {
    format!("{}: {err}", err.error_code())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| fail(&RequestError::from(e)))
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| fail(&RequestError::InvalidId(raw.to_string())))
}

fn parse_ids(json: &str) -> Result<Vec<ObjectId>, String> {
    serde_json::from_str(json).map_err(|e| fail(&RequestError::from(e)))
}

/// Browser-facing engine handle.
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct CanvasEngine {
    core: EngineCore,
}

impl CanvasEngine {
    /// Underlying engine, for native callers.
    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }
}

#[wasm_bindgen]
impl CanvasEngine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Settings ---

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, name: &str) -> Result<(), String> {
        let tool: Tool = name.parse().map_err(|_| fail(&RequestError::UnknownTool(name.to_string())))?;
        self.core.set_tool(tool);
        Ok(())
    }

    #[wasm_bindgen(js_name = setViewportSize)]
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.core.set_viewport_size(width, height);
    }

    #[wasm_bindgen(js_name = setSnapToGrid)]
    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.core.set_snap_to_grid(enabled);
    }

    #[wasm_bindgen(js_name = setMarqueePolicy)]
    pub fn set_marquee_policy(&mut self, name: &str) -> Result<(), String> {
        let policy: MarqueePolicy =
            name.parse().map_err(|_| fail(&RequestError::UnknownPolicy(name.to_string())))?;
        self.core.set_marquee_policy(policy);
        Ok(())
    }

    // --- Objects ---

    /// Create from a JSON request; returns the new id.
    #[wasm_bindgen(js_name = createObject)]
    pub fn create_object(&mut self, json: &str) -> Result<String, String> {
        let request: CreateRequest = serde_json::from_str(json).map_err(|e| fail(&RequestError::from(e)))?;
        let new = request.into_new().map_err(|e| fail(&e))?;
        Ok(self.core.create(new).to_string())
    }

    /// Apply a JSON partial. `transient` skips history (in-gesture preview).
    #[wasm_bindgen(js_name = updateObject)]
    pub fn update_object(&mut self, id: &str, json: &str, transient: bool) -> Result<bool, String> {
        let id = parse_id(id)?;
        let partial: PartialObject = serde_json::from_str(json).map_err(|e| fail(&RequestError::from(e)))?;
        let mode = if transient { UpdateMode::Transient } else { UpdateMode::Commit };
        Ok(self.core.update(&id, &partial, mode))
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, id: &str, text: &str) -> Result<bool, String> {
        let id = parse_id(id)?;
        Ok(self.core.set_text(&id, text))
    }

    #[wasm_bindgen(js_name = deleteObjects)]
    pub fn delete_objects(&mut self, ids_json: &str) -> Result<usize, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.delete(&ids))
    }

    #[wasm_bindgen(js_name = deleteSelection)]
    pub fn delete_selection(&mut self) -> usize {
        self.core.delete_selection()
    }

    /// One object as JSON, or `None` when the id is unknown.
    #[wasm_bindgen(js_name = getObject)]
    pub fn get_object(&self, id: &str) -> Result<Option<String>, String> {
        let id = parse_id(id)?;
        self.core.get(&id).map(to_json).transpose()
    }

    /// Every live object as a JSON array in draw order.
    pub fn objects(&self) -> Result<String, String> {
        to_json(&self.core.query(|_| true))
    }

    #[wasm_bindgen(js_name = bringToFront)]
    pub fn bring_to_front(&mut self, ids_json: &str) -> Result<bool, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.bring_to_front(&ids))
    }

    #[wasm_bindgen(js_name = sendToBack)]
    pub fn send_to_back(&mut self, ids_json: &str) -> Result<bool, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.send_to_back(&ids))
    }

    // --- Selection ---

    pub fn select(&mut self, ids_json: &str, additive: bool) -> Result<bool, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.select(&ids, additive))
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) -> bool {
        self.core.clear_selection()
    }

    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&mut self) -> bool {
        self.core.select_all()
    }

    /// Selected ids as a JSON array.
    pub fn selection(&self) -> Result<String, String> {
        to_json(&self.core.selection())
    }

    #[wasm_bindgen(js_name = marqueeSelect)]
    pub fn marquee_select(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<String, String> {
        to_json(&self.core.marquee_select(&Rect::new(x, y, width, height)))
    }

    // --- Grouping ---

    /// Group the ids; returns the new group id, or `None` (nothing changed) when fewer than two of them are live.
    pub fn group(&mut self, ids_json: &str) -> Result<Option<String>, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.group(&ids).map(|gid| gid.to_string()))
    }

    /// Dissolve a group; returns the former members as a JSON array.
    pub fn ungroup(&mut self, group_id: &str) -> Result<String, String> {
        let gid: GroupId = parse_id(group_id)?;
        to_json(&self.core.ungroup(&gid))
    }

    // --- Clipboard ---

    pub fn copy(&mut self, ids_json: &str) -> Result<usize, String> {
        let ids = parse_ids(ids_json)?;
        Ok(self.core.copy(&ids))
    }

    /// Paste at the configured offset; returns the new ids as a JSON array.
    pub fn paste(&mut self) -> Result<String, String> {
        to_json(&self.core.paste())
    }

    pub fn duplicate(&mut self, ids_json: &str) -> Result<String, String> {
        let ids = parse_ids(ids_json)?;
        to_json(&self.core.duplicate(&ids))
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.core.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.core.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.core.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.core.can_redo()
    }

    // --- Viewport ---

    /// Multiply zoom by `factor`, keeping the screen point `(x, y)` fixed when given.
    pub fn zoom(&mut self, factor: f64, focal_x: Option<f64>, focal_y: Option<f64>) -> bool {
        let focal = focal_x.zip(focal_y).map(|(x, y)| Point::new(x, y));
        self.core.zoom(factor, focal)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.core.pan(dx, dy);
    }

    #[wasm_bindgen(js_name = resetViewport)]
    pub fn reset_viewport(&mut self) {
        self.core.reset_viewport();
    }

    #[wasm_bindgen(js_name = fitToScreen)]
    pub fn fit_to_screen(&mut self, padding: f64) -> bool {
        self.core.fit_to_screen(padding)
    }

    /// `{"panX", "panY", "zoom"}` as JSON.
    pub fn viewport(&self) -> Result<String, String> {
        to_json(&self.core.viewport())
    }

    // --- Snapshot and bitmap ---

    #[wasm_bindgen(js_name = exportSnapshot)]
    pub fn export_snapshot(&self) -> Result<String, String> {
        self.core.export_snapshot().map_err(|e| fail(&e))
    }

    /// Replace the whole canvas; returns the imported object count.
    #[wasm_bindgen(js_name = importSnapshot)]
    pub fn import_snapshot(&mut self, json: &str) -> Result<usize, String> {
        self.core.import_snapshot(json).map_err(|e| fail(&e))
    }

    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self, scale: f64) -> Result<Vec<u8>, String> {
        self.core.export_png(scale).map_err(|e| fail(&e))
    }

    // --- Input ---

    #[wasm_bindgen(js_name = onPointerDown)]
    pub fn on_pointer_down(&mut self, x: f64, y: f64, button: i16, modifiers: u8) -> Result<String, String> {
        let actions =
            self.core.on_pointer_down(Point::new(x, y), Button::from_dom(button), Modifiers::from_bits(modifiers));
        to_json(&actions)
    }

    #[wasm_bindgen(js_name = onPointerMove)]
    pub fn on_pointer_move(&mut self, x: f64, y: f64, modifiers: u8) -> Result<String, String> {
        to_json(&self.core.on_pointer_move(Point::new(x, y), Modifiers::from_bits(modifiers)))
    }

    #[wasm_bindgen(js_name = onPointerUp)]
    pub fn on_pointer_up(&mut self, x: f64, y: f64) -> Result<String, String> {
        to_json(&self.core.on_pointer_up(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = onWheel)]
    pub fn on_wheel(&mut self, x: f64, y: f64, dx: f64, dy: f64, modifiers: u8) -> Result<String, String> {
        let actions = self.core.on_wheel(Point::new(x, y), WheelDelta { dx, dy }, Modifiers::from_bits(modifiers));
        to_json(&actions)
    }

    #[wasm_bindgen(js_name = onKeyDown)]
    pub fn on_key_down(&mut self, key: &str, modifiers: u8) -> Result<String, String> {
        to_json(&self.core.on_key_down(&Key::new(key), Modifiers::from_bits(modifiers)))
    }

    #[wasm_bindgen(js_name = cancelGesture)]
    pub fn cancel_gesture(&mut self) -> Result<String, String> {
        to_json(&self.core.cancel_gesture())
    }
}

//! Clipboard buffer and paste preparation.
//!
//! `copy` stores deep copies; the buffer never references live objects, so
//! later edits or deletes leave it untouched. `prepare_paste` always offsets
//! from the buffered positions, which makes repeated pastes land on the same
//! spot instead of walking across the canvas.

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod clipboard_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::doc::{CanvasObject, GroupId, ObjectId, ObjectKind};

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    buffer: Vec<CanvasObject>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer. Objects are kept in the order given (draw order by convention).
    pub fn copy(&mut self, objects: Vec<CanvasObject>) {
        self.buffer = objects;
    }

    #[must_use]
    pub fn buffer(&self) -> &[CanvasObject] {
        &self.buffer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Build fresh copies of the buffer ready to insert.
    ///
    /// Each copy gets a new id, `position + (dx, dy)`, timestamps `now_ms`, and
    /// a layer counting up from `base_layer` in buffer order. Objects that
    /// shared a group in the buffer share one new group id. Connector ends
    /// that point into the buffer are rewired to the pasted copies.
    #[must_use]
    pub fn prepare_paste(&self, dx: f64, dy: f64, base_layer: i64, now_ms: i64) -> Vec<CanvasObject> {
        let id_map: HashMap<ObjectId, ObjectId> = self.buffer.iter().map(|o| (o.id, Uuid::new_v4())).collect();
        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();

        let mut layer = base_layer;
        let mut out = Vec::with_capacity(self.buffer.len());
        for src in &self.buffer {
            let mut obj = src.clone();
            obj.id = id_map.get(&src.id).copied().unwrap_or_else(Uuid::new_v4);
            obj.position = src.position.offset(dx, dy);
            obj.layer = layer;
            obj.created_at = now_ms;
            obj.updated_at = now_ms;
            obj.group_id = src.group_id.map(|g| *group_map.entry(g).or_insert_with(Uuid::new_v4));
            if let ObjectKind::Connector(ends) = &mut obj.kind {
                ends.from = ends.from.map(|id| id_map.get(&id).copied().unwrap_or(id));
                ends.to = ends.to.map(|id| id_map.get(&id).copied().unwrap_or(id));
            }
            out.push(obj);
            layer = layer.saturating_add(1);
        }
        out
    }
}

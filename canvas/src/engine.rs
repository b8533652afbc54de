use image::RgbaImage;
use serde::Serialize;
use uuid::Uuid;

use crate::clipboard::Clipboard;
use crate::clock;
use crate::config::EngineConfig;
use crate::doc::{CanvasObject, DocStore, GroupId, NewObject, ObjectId, PartialObject};
use crate::error::ErrorCode;
use crate::geom::{self, Point, Rect, Size};
use crate::group;
use crate::history::History;
use crate::hit;
use crate::input::{Gesture, Tool};
use crate::raster::{self, RasterError};
use crate::selection::{self, MarqueePolicy, Selection};
use crate::snapshot::{self, SnapshotError};
use crate::viewport::Viewport;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    RenderNeeded,
    SelectionChanged { ids: Vec<ObjectId> },
    HistoryChanged { can_undo: bool, can_redo: bool },
    EditTextRequested { id: ObjectId, text: String },
    SetCursor { cursor: String },
}

/// Whether an update is a visual-only step inside a gesture or a finished edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Changes the live list only.
    Transient,
    /// Bumps `updated_at` and records one history snapshot.
    #[default]
    Commit,
}

/// Engine state observed before a handler runs, diffed afterwards into [`Action`]s.
#[derive(Debug, Clone)]
pub(crate) struct Observed {
    selection: Vec<ObjectId>,
    revision: u64,
    viewport: Viewport,
}

/// The single owner of the object store, selection, history, clipboard and
/// viewport. Every collaborator entry point goes through here.
///
/// Holds no browser handles so it can be driven from native tests and tools.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub(crate) doc: DocStore,
    pub(crate) selection: Selection,
    pub(crate) history: History,
    pub(crate) clipboard: Clipboard,
    pub(crate) viewport: Viewport,
    pub(crate) config: EngineConfig,
    pub(crate) gesture: Gesture,
    pub(crate) tool: Tool,
    pub(crate) viewport_size: Size,
    pub(crate) cursor: String,
    /// Bumped whenever the history log or its index moves.
    revision: u64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            doc: DocStore::with_min_size(config.min_size),
            selection: Selection::new(),
            history: History::new(Vec::new(), config.history_cap),
            clipboard: Clipboard::new(),
            viewport: Viewport::default(),
            gesture: Gesture::Idle,
            tool: Tool::Select,
            viewport_size: Size::default(),
            cursor: Tool::Select.cursor().to_string(),
            revision: 0,
            config,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn doc(&self) -> &DocStore {
        &self.doc
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Selected ids, sorted.
    #[must_use]
    pub fn selection(&self) -> Vec<ObjectId> {
        self.selection.ids()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ObjectId) -> bool {
        self.selection.contains(id)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Look up an object by id.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&CanvasObject> {
        self.doc.get(id)
    }

    /// Objects matching `pred`, in draw order.
    pub fn query<F>(&self, pred: F) -> Vec<&CanvasObject>
    where
        F: Fn(&CanvasObject) -> bool,
    {
        self.doc.query(pred)
    }

    // --- Settings ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        if width.is_finite() && height.is_finite() {
            self.viewport_size = Size::new(width.max(0.0), height.max(0.0));
        } else {
            tracing::warn!(width, height, "ignoring non-finite viewport size");
        }
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.config.snap_to_grid = enabled;
    }

    pub fn set_marquee_policy(&mut self, policy: MarqueePolicy) {
        self.config.marquee_policy = policy;
    }

    // --- Object store ---

    /// Create an object, select it and record one history entry.
    ///
    /// Missing position defaults to the origin, missing size to the kind's
    /// default, missing layer to one above the current top.
    pub fn create(&mut self, new: NewObject) -> ObjectId {
        let id = self.insert_new(new);
        self.selection.select([id], false);
        self.commit(&[id], "create");
        id
    }

    /// Insert without selecting or committing; the position is snapped when enabled.
    pub(crate) fn insert_new(&mut self, mut new: NewObject) -> ObjectId {
        new.position = Some(self.snap_point(new.position.unwrap_or_default()));
        let id = Uuid::new_v4();
        let obj = CanvasObject::from_new(new, id, clock::now_ms(), self.doc.min_size(), self.doc.next_layer());
        self.doc.insert(obj);
        id
    }

    /// Apply `partial` to `id`. Unknown ids and non-finite geometry are a no-op (returns false).
    pub fn update(&mut self, id: &ObjectId, partial: &PartialObject, mode: UpdateMode) -> bool {
        if !self.doc.apply_partial(id, partial) {
            tracing::debug!(%id, "update not applied");
            return false;
        }
        if mode == UpdateMode::Commit {
            self.commit(&[*id], "update");
        }
        true
    }

    /// Replace the text payload of `id` and commit.
    pub fn set_text(&mut self, id: &ObjectId, text: impl Into<String>) -> bool {
        self.update(id, &PartialObject::content(text), UpdateMode::Commit)
    }

    /// Remove every live id in `ids`. Returns the number removed; nothing removed means no commit.
    pub fn delete(&mut self, ids: &[ObjectId]) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.doc.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.commit(&[], "delete");
        }
        removed
    }

    /// Delete the current selection.
    pub fn delete_selection(&mut self) -> usize {
        let ids = self.selection.ids();
        self.delete(&ids)
    }

    /// Move `ids` to new top layers, keeping their relative order.
    pub fn bring_to_front(&mut self, ids: &[ObjectId]) -> bool {
        let ordered = self.live_in_draw_order(ids);
        let base = self.doc.next_layer();
        self.relayer(&ordered, base, "bring to front")
    }

    /// Move `ids` below every other object, keeping their relative order.
    pub fn send_to_back(&mut self, ids: &[ObjectId]) -> bool {
        let ordered = self.live_in_draw_order(ids);
        let count = i64::try_from(ordered.len()).unwrap_or(i64::MAX);
        let base = self.doc.prev_layer().saturating_sub(count.saturating_sub(1));
        self.relayer(&ordered, base, "send to back")
    }

    fn relayer(&mut self, ordered: &[ObjectId], base: i64, reason: &'static str) -> bool {
        if ordered.is_empty() {
            return false;
        }
        let mut layer = base;
        for id in ordered {
            if let Some(obj) = self.doc.get_mut(id) {
                obj.layer = layer;
            }
            layer = layer.saturating_add(1);
        }
        self.commit(ordered, reason);
        true
    }

    /// Translate `ids` by `(dx, dy)` and commit.
    pub fn nudge(&mut self, ids: &[ObjectId], dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            tracing::warn!(dx, dy, "ignoring non-finite nudge");
            return false;
        }
        let live = self.live_in_draw_order(ids);
        if live.is_empty() {
            return false;
        }
        for id in &live {
            if let Some(obj) = self.doc.get_mut(id) {
                obj.position = obj.position.offset(dx, dy);
            }
        }
        self.commit(&live, "nudge");
        true
    }

    fn live_in_draw_order(&self, ids: &[ObjectId]) -> Vec<ObjectId> {
        self.doc.sorted_objects().into_iter().filter(|o| ids.contains(&o.id)).map(|o| o.id).collect()
    }

    // --- Selection ---

    /// Select `ids` (plus their group mates). Additive unions with the current selection.
    pub fn select(&mut self, ids: &[ObjectId], additive: bool) -> bool {
        let expanded = group::expand(&self.doc, ids);
        self.selection.select(expanded, additive)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selection.clear()
    }

    pub fn select_all(&mut self) -> bool {
        let ids = self.doc.ids();
        self.selection.select(ids, false)
    }

    /// Replace the selection with every object matching `rect` under the configured policy.
    pub fn marquee_select(&mut self, rect: &Rect) -> Vec<ObjectId> {
        let hits = selection::marquee_hits(&self.doc, rect, self.config.marquee_policy);
        self.select(&hits, false);
        self.selection.ids()
    }

    // --- Grouping ---

    /// Tag `ids` with a fresh group and select the group.
    ///
    /// Returns `None` and changes nothing when fewer than two of `ids` are live.
    pub fn group(&mut self, ids: &[ObjectId]) -> Option<GroupId> {
        let gid = group::group(&mut self.doc, ids)?;
        let members = group::members(&self.doc, &gid);
        self.selection.select(members.iter().copied(), false);
        self.commit(&members, "group");
        tracing::debug!(%gid, members = members.len(), "grouped");
        Some(gid)
    }

    /// Group the current selection; `None` when fewer than two ids are selected.
    pub fn group_selection(&mut self) -> Option<GroupId> {
        let ids = self.selection.ids();
        self.group(&ids)
    }

    /// Clear `gid` from every member. Returns the ids that were ungrouped.
    pub fn ungroup(&mut self, gid: &GroupId) -> Vec<ObjectId> {
        let members = group::ungroup(&mut self.doc, gid);
        if !members.is_empty() {
            self.commit(&members, "ungroup");
            tracing::debug!(%gid, members = members.len(), "ungrouped");
        }
        members
    }

    /// Ungroup every group touched by the selection, in one commit.
    pub fn ungroup_selection(&mut self) -> usize {
        let ids = self.selection.ids();
        let mut changed = Vec::new();
        for gid in group::groups_of(&self.doc, &ids) {
            changed.extend(group::ungroup(&mut self.doc, &gid));
        }
        if !changed.is_empty() {
            self.commit(&changed, "ungroup");
        }
        changed.len()
    }

    // --- Clipboard ---

    /// Deep-copy the live objects among `ids` into the clipboard, in draw order.
    /// An empty result leaves the clipboard untouched.
    pub fn copy(&mut self, ids: &[ObjectId]) -> usize {
        let objects: Vec<CanvasObject> = self
            .live_in_draw_order(ids)
            .iter()
            .filter_map(|id| self.doc.get(id))
            .cloned()
            .collect();
        if objects.is_empty() {
            return 0;
        }
        let count = objects.len();
        self.clipboard.copy(objects);
        tracing::debug!(count, "copied to clipboard");
        count
    }

    pub fn copy_selection(&mut self) -> usize {
        let ids = self.selection.ids();
        self.copy(&ids)
    }

    /// Paste the clipboard at the configured offset from the buffered positions.
    /// The pasted ids become the selection. Empty clipboard is a no-op.
    pub fn paste(&mut self) -> Vec<ObjectId> {
        let offset = self.config.paste_offset;
        self.paste_with_offset(offset, offset)
    }

    pub fn paste_with_offset(&mut self, dx: f64, dy: f64) -> Vec<ObjectId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let pasted = self.clipboard.prepare_paste(dx, dy, self.doc.next_layer(), clock::now_ms());
        let ids: Vec<ObjectId> = pasted.iter().map(|o| o.id).collect();
        for obj in pasted {
            self.doc.insert(obj);
        }
        self.selection.select(ids.iter().copied(), false);
        self.commit(&[], "paste");
        tracing::debug!(count = ids.len(), dx, dy, "pasted");
        ids
    }

    /// [`EngineCore::copy`] immediately followed by [`EngineCore::paste`].
    pub fn duplicate(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        if self.copy(ids) == 0 {
            return Vec::new();
        }
        self.paste()
    }

    pub fn duplicate_selection(&mut self) -> Vec<ObjectId> {
        let ids = self.selection.ids();
        self.duplicate(&ids)
    }

    // --- History ---

    /// Step back one snapshot and clear the selection. No-op at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        tracing::debug!(index = self.history.index(), "undo");
        true
    }

    /// Step forward one snapshot and clear the selection. No-op at the tip.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        tracing::debug!(index = self.history.index(), "redo");
        true
    }

    fn restore(&mut self, snapshot: Vec<CanvasObject>) {
        self.doc.load_snapshot(snapshot);
        self.selection.clear();
        self.gesture = Gesture::Idle;
        self.revision += 1;
    }

    /// Stamp `touched`, prune the selection and push the live list into history.
    pub(crate) fn commit(&mut self, touched: &[ObjectId], reason: &'static str) {
        let now = clock::now_ms();
        for id in touched {
            self.doc.touch(id, now);
        }
        self.selection.retain_live(&self.doc);
        self.history.commit(self.doc.snapshot());
        self.revision += 1;
        tracing::debug!(reason, index = self.history.index(), len = self.history.len(), "history commit");
    }

    // --- Viewport ---

    /// Multiply zoom by `factor` (clamped), keeping `focal` (screen space) fixed.
    pub fn zoom(&mut self, factor: f64, focal: Option<Point>) -> bool {
        self.viewport.zoom_by(factor, focal)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
    }

    /// Center all content in the current viewport size without upscaling past 1.
    /// No-op on an empty canvas or a zero-size viewport.
    pub fn fit_to_screen(&mut self, padding: f64) -> bool {
        let Some(content) = hit::content_bounds(&self.doc) else {
            return false;
        };
        self.viewport.fit(content, self.viewport_size, padding)
    }

    // --- Snapshot and bitmap ---

    /// Pretty JSON array of every object record.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if serialization fails.
    pub fn export_snapshot(&self) -> Result<String, SnapshotError> {
        let out = snapshot::encode(self.doc.objects())?;
        tracing::info!(objects = self.doc.len(), bytes = out.len(), "exported snapshot");
        Ok(out)
    }

    /// Compact JSON variant of [`EngineCore::export_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns `Parse` if serialization fails.
    pub fn export_snapshot_compact(&self) -> Result<String, SnapshotError> {
        snapshot::encode_compact(self.doc.objects())
    }

    /// Replace the live list with a decoded snapshot and reset history to it.
    ///
    /// # Errors
    ///
    /// Any decode or validation failure; engine state is untouched in that case.
    pub fn import_snapshot(&mut self, input: &str) -> Result<usize, SnapshotError> {
        let objects = match snapshot::decode(input) {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "rejected snapshot import");
                return Err(e);
            }
        };
        self.doc.load_snapshot(objects);
        self.history.reset(self.doc.snapshot());
        self.selection.clear();
        self.clipboard.clear();
        self.gesture = Gesture::Idle;
        self.revision += 1;
        tracing::info!(objects = self.doc.len(), "imported snapshot");
        Ok(self.doc.len())
    }

    /// Render every object at `scale` pixels per world unit.
    #[must_use]
    pub fn export_bitmap(&self, scale: f64) -> RgbaImage {
        raster::rasterize(&self.doc, scale)
    }

    /// [`EngineCore::export_bitmap`] encoded as PNG.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if the PNG encoder fails.
    pub fn export_png(&self, scale: f64) -> Result<Vec<u8>, RasterError> {
        let bytes = raster::export_png(&self.doc, scale)?;
        tracing::info!(objects = self.doc.len(), bytes = bytes.len(), scale, "exported png");
        Ok(bytes)
    }

    // --- Helpers shared with interaction ---

    pub(crate) fn snap_point(&self, pt: Point) -> Point {
        if self.config.snap_to_grid { geom::snap(pt, self.config.grid_size) } else { pt }
    }

    pub(crate) fn observe(&self) -> Observed {
        Observed { selection: self.selection.ids(), revision: self.revision, viewport: self.viewport }
    }

    /// Diff the engine against `before`. `render` forces a `RenderNeeded`
    /// (transient geometry changes are not otherwise visible in the diff).
    pub(crate) fn actions_since(&self, before: &Observed, render: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut render = render;
        let selection = self.selection.ids();
        if selection != before.selection {
            actions.push(Action::SelectionChanged { ids: selection });
            render = true;
        }
        if self.revision != before.revision {
            actions.push(Action::HistoryChanged { can_undo: self.can_undo(), can_redo: self.can_redo() });
            render = true;
        }
        if self.viewport != before.viewport {
            render = true;
        }
        if render {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Push a `SetCursor` when the cursor changes.
    pub(crate) fn set_cursor(&mut self, cursor: &str, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor.to_string();
            actions.push(Action::SetCursor { cursor: cursor.to_string() });
        }
    }
}

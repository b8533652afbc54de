#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::doc::{ConnectorEnds, ObjectKind, ShapeKind};

// =============================================================
// Helpers
// =============================================================

fn sticky_at(x: f64, y: f64) -> NewObject {
    NewObject::new(ObjectKind::Sticky).at(x, y).sized(100.0, 100.0)
}

fn rect_at(x: f64, y: f64, w: f64, h: f64) -> NewObject {
    NewObject::new(ObjectKind::shape(ShapeKind::Rect)).at(x, y).sized(w, h)
}

fn core_with_three() -> (EngineCore, ObjectId, ObjectId, ObjectId) {
    let mut core = EngineCore::new();
    let a = core.create(sticky_at(0.0, 0.0));
    let b = core.create(sticky_at(200.0, 0.0));
    let c = core.create(sticky_at(400.0, 0.0));
    (core, a, b, c)
}

fn position(core: &EngineCore, id: &ObjectId) -> Point {
    core.get(id).unwrap().position
}

// =============================================================
// Construction and defaults
// =============================================================

#[test]
fn new_core_is_empty() {
    let core = EngineCore::new();
    assert!(core.doc().is_empty());
    assert!(core.selection().is_empty());
    assert_eq!(core.history().len(), 1);
    assert!(!core.can_undo());
    assert!(!core.can_redo());
    assert_eq!(core.viewport(), Viewport::default());
    assert_eq!(core.tool(), Tool::Select);
    assert!(core.gesture().is_idle());
}

#[test]
fn with_config_applies_min_size_and_cap() {
    let config = EngineConfig { min_size: 25.0, history_cap: Some(3), ..EngineConfig::default() };
    let mut core = EngineCore::with_config(config);
    let id = core.create(rect_at(0.0, 0.0, 1.0, 1.0));
    assert_eq!(core.get(&id).unwrap().size, Size::new(25.0, 25.0));
    for i in 0..5 {
        core.create(sticky_at(f64::from(i), 0.0));
    }
    assert_eq!(core.history().len(), 3);
}

// =============================================================
// create / update / delete
// =============================================================

#[test]
fn create_selects_and_commits() {
    let mut core = EngineCore::new();
    let id = core.create(rect_at(100.0, 100.0, 150.0, 100.0));
    assert_eq!(core.selection(), vec![id]);
    assert_eq!(core.doc().len(), 1);
    assert_eq!(core.history().len(), 2);
    assert!(core.can_undo());
}

#[test]
fn create_defaults_missing_geometry() {
    let mut core = EngineCore::new();
    let id = core.create(NewObject::new(ObjectKind::Sticky));
    let obj = core.get(&id).unwrap();
    assert_eq!(obj.position, Point::new(0.0, 0.0));
    assert_eq!(obj.size, Size::new(200.0, 200.0));
    assert_eq!(obj.layer, 0);
    assert_eq!(obj.created_at, obj.updated_at);
}

#[test]
fn create_stacks_layers() {
    let (core, a, b, c) = core_with_three();
    assert_eq!(core.get(&a).unwrap().layer, 0);
    assert_eq!(core.get(&b).unwrap().layer, 1);
    assert_eq!(core.get(&c).unwrap().layer, 2);
    assert_eq!(core.selection(), vec![c]);
}

#[test]
fn create_snaps_position_when_enabled() {
    let mut core = EngineCore::new();
    core.set_snap_to_grid(true);
    let id = core.create(sticky_at(33.0, 47.0));
    assert_eq!(position(&core, &id), Point::new(40.0, 40.0));
    let size = core.get(&id).unwrap().size;
    assert_eq!(size, Size::new(100.0, 100.0));
}

#[test]
fn update_unknown_id_is_silent_noop() {
    let mut core = EngineCore::new();
    let len = core.history().len();
    assert!(!core.update(&Uuid::new_v4(), &PartialObject::position(1.0, 1.0), UpdateMode::Commit));
    assert_eq!(core.history().len(), len);
}

#[test]
fn transient_update_skips_history() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    let len = core.history().len();
    assert!(core.update(&id, &PartialObject::position(50.0, 60.0), UpdateMode::Transient));
    assert_eq!(position(&core, &id), Point::new(50.0, 60.0));
    assert_eq!(core.history().len(), len);
}

#[test]
fn committed_update_records_history() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    let created = core.get(&id).unwrap().updated_at;
    assert!(core.update(&id, &PartialObject::position(50.0, 60.0), UpdateMode::Commit));
    assert_eq!(core.history().len(), 3);
    assert!(core.get(&id).unwrap().updated_at >= created);
    assert_eq!(core.history().current(), core.doc().objects());
}

#[test]
fn non_finite_update_is_rejected_and_export_still_imports() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(10.0, 20.0));
    let len = core.history().len();
    assert!(!core.update(&id, &PartialObject::position(f64::NAN, 0.0), UpdateMode::Commit));
    assert_eq!(position(&core, &id), Point::new(10.0, 20.0));
    assert_eq!(core.history().len(), len);

    let exported = core.export_snapshot().unwrap();
    let mut other = EngineCore::new();
    assert_eq!(other.import_snapshot(&exported).unwrap(), 1);
}

#[test]
fn update_clamps_size_and_normalizes_rotation() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    core.update(&id, &PartialObject::size(-5.0, 3.0), UpdateMode::Commit);
    core.update(&id, &PartialObject::rotation(-90.0), UpdateMode::Commit);
    let obj = core.get(&id).unwrap();
    assert_eq!(obj.size, Size::new(10.0, 10.0));
    assert_eq!(obj.transform.rotation, 270.0);
}

#[test]
fn update_ignores_kind_change() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    let partial = PartialObject { kind: Some(ObjectKind::Frame), ..Default::default() };
    assert!(core.update(&id, &partial, UpdateMode::Commit));
    assert_eq!(core.get(&id).unwrap().kind, ObjectKind::Sticky);
}

#[test]
fn update_merges_style_and_removes_nulls() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0).with_style("fill", json!("#fff")).with_style("stroke", json!("#000")));
    let mut style = crate::doc::StyleMap::new();
    style.insert("fill".into(), json!("#f00"));
    style.insert("stroke".into(), serde_json::Value::Null);
    core.update(&id, &PartialObject::style(style), UpdateMode::Commit);
    let obj = core.get(&id).unwrap();
    assert_eq!(obj.style.get("fill"), Some(&json!("#f00")));
    assert!(!obj.style.contains_key("stroke"));
}

#[test]
fn set_text_commits_content() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    assert!(core.set_text(&id, "hello"));
    assert_eq!(core.get(&id).unwrap().content.as_deref(), Some("hello"));
    assert_eq!(core.history().len(), 3);
}

#[test]
fn delete_removes_from_selection() {
    let (mut core, a, b, _) = core_with_three();
    core.select(&[a, b], false);
    assert_eq!(core.delete(&[a]), 1);
    assert!(core.get(&a).is_none());
    assert_eq!(core.selection(), vec![b]);
}

#[test]
fn delete_unknown_ids_does_not_commit() {
    let (mut core, ..) = core_with_three();
    let len = core.history().len();
    assert_eq!(core.delete(&[Uuid::new_v4()]), 0);
    assert_eq!(core.history().len(), len);
}

#[test]
fn delete_many_is_one_commit() {
    let (mut core, a, b, c) = core_with_three();
    let len = core.history().len();
    assert_eq!(core.delete(&[a, b, c]), 3);
    assert_eq!(core.history().len(), len + 1);
    assert!(core.doc().is_empty());
}

#[test]
fn delete_group_member_leaves_rest_grouped() {
    let (mut core, a, b, c) = core_with_three();
    let gid = core.group(&[a, b, c]).unwrap();
    core.delete(&[a]);
    assert_eq!(core.get(&b).unwrap().group_id, Some(gid));
    assert_eq!(core.get(&c).unwrap().group_id, Some(gid));
}

#[test]
fn query_returns_draw_order() {
    let (mut core, a, b, c) = core_with_three();
    core.send_to_back(&[c]);
    let ids: Vec<ObjectId> = core.query(|o| o.kind == ObjectKind::Sticky).iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![c, a, b]);
}

// =============================================================
// Layers and nudge
// =============================================================

#[test]
fn bring_to_front_preserves_relative_order() {
    let (mut core, a, b, c) = core_with_three();
    assert!(core.bring_to_front(&[b, a]));
    let order: Vec<ObjectId> = core.doc().sorted_objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![c, a, b]);
}

#[test]
fn send_to_back_places_below_everything() {
    let (mut core, a, b, c) = core_with_three();
    assert!(core.send_to_back(&[b, c]));
    let order: Vec<ObjectId> = core.doc().sorted_objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![b, c, a]);
    assert!(core.get(&c).unwrap().layer < core.get(&a).unwrap().layer);
}

#[test]
fn layer_ops_on_unknown_ids_are_noops() {
    let (mut core, ..) = core_with_three();
    let len = core.history().len();
    assert!(!core.bring_to_front(&[Uuid::new_v4()]));
    assert!(!core.send_to_back(&[]));
    assert_eq!(core.history().len(), len);
}

#[test]
fn nudge_moves_and_commits() {
    let (mut core, a, b, _) = core_with_three();
    let len = core.history().len();
    assert!(core.nudge(&[a, b], 10.0, -1.0));
    assert_eq!(position(&core, &a), Point::new(10.0, -1.0));
    assert_eq!(position(&core, &b), Point::new(210.0, -1.0));
    assert_eq!(core.history().len(), len + 1);
    assert!(!core.nudge(&[a], f64::NAN, 0.0));
}

// =============================================================
// Selection
// =============================================================

#[test]
fn select_replaces_and_additive_unions() {
    let (mut core, a, b, _) = core_with_three();
    assert!(core.select(&[a], false));
    assert_eq!(core.selection(), vec![a]);
    core.select(&[b], true);
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(core.selection(), expected);
}

#[test]
fn select_ignores_unknown_ids() {
    let (mut core, a, ..) = core_with_three();
    core.select(&[a, Uuid::new_v4()], false);
    assert_eq!(core.selection(), vec![a]);
}

#[test]
fn select_expands_group() {
    let (mut core, a, b, c) = core_with_three();
    core.group(&[a, b]);
    core.select(&[c], false);
    core.select(&[a], false);
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(core.selection(), expected);
}

#[test]
fn select_all_and_clear() {
    let (mut core, ..) = core_with_three();
    assert!(core.select_all());
    assert_eq!(core.selection().len(), 3);
    assert!(core.clear_selection());
    assert!(core.selection().is_empty());
    assert!(!core.clear_selection());
}

#[test]
fn marquee_intersect_is_default() {
    let mut core = EngineCore::new();
    let id = core.create(rect_at(100.0, 100.0, 150.0, 100.0));
    core.clear_selection();
    let hits = core.marquee_select(&Rect::new(200.0, 150.0, 300.0, 300.0));
    assert_eq!(hits, vec![id]);
}

#[test]
fn marquee_contain_requires_full_coverage() {
    let mut core = EngineCore::new();
    core.set_marquee_policy(MarqueePolicy::Contain);
    let id = core.create(rect_at(100.0, 100.0, 150.0, 100.0));
    assert!(core.marquee_select(&Rect::new(200.0, 150.0, 300.0, 300.0)).is_empty());
    assert_eq!(core.marquee_select(&Rect::new(90.0, 90.0, 210.0, 160.0)), vec![id]);
}

// =============================================================
// Grouping
// =============================================================

#[test]
fn group_tags_members_and_selects_them() {
    let (mut core, a, b, _) = core_with_three();
    let len = core.history().len();
    let gid = core.group(&[a, b]).unwrap();
    assert_eq!(core.get(&a).unwrap().group_id, Some(gid));
    assert_eq!(core.get(&b).unwrap().group_id, Some(gid));
    assert_eq!(core.selection().len(), 2);
    assert_eq!(core.history().len(), len + 1);
}

#[test]
fn group_needs_two_live_objects() {
    let (mut core, a, ..) = core_with_three();
    let len = core.history().len();
    assert!(core.group(&[a]).is_none());
    assert!(core.group(&[a, Uuid::new_v4()]).is_none());
    core.select(&[a], false);
    assert!(core.group_selection().is_none());
    assert_eq!(core.get(&a).unwrap().group_id, None);
    assert_eq!(core.selection(), vec![a]);
    assert_eq!(core.history().len(), len);
}

#[test]
fn regroup_overwrites_previous_group() {
    let (mut core, a, b, c) = core_with_three();
    let first = core.group(&[a, b]).unwrap();
    let second = core.group(&[b, c]).unwrap();
    assert_ne!(first, second);
    assert_eq!(core.get(&a).unwrap().group_id, Some(first));
    assert_eq!(core.get(&b).unwrap().group_id, Some(second));
}

#[test]
fn ungroup_clears_every_member() {
    let (mut core, a, b, c) = core_with_three();
    let gid = core.group(&[a, b, c]).unwrap();
    let cleared = core.ungroup(&gid);
    assert_eq!(cleared.len(), 3);
    assert!(core.doc().objects().iter().all(|o| o.group_id.is_none()));
    let len = core.history().len();
    assert!(core.ungroup(&gid).is_empty());
    assert_eq!(core.history().len(), len);
}

#[test]
fn group_and_ungroup_selection() {
    let (mut core, a, b, _) = core_with_three();
    core.select(&[a, b], false);
    assert!(core.group_selection().is_some());
    core.select(&[a], false);
    assert_eq!(core.ungroup_selection(), 2);
    assert!(core.get(&b).unwrap().group_id.is_none());
}

// =============================================================
// Clipboard
// =============================================================

#[test]
fn paste_offsets_from_buffered_position_each_time() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(10.0, 10.0));
    assert_eq!(core.copy(&[id]), 1);
    let first = core.paste();
    let second = core.paste();
    assert_eq!(first.len(), 1);
    assert_ne!(first, second);
    assert_eq!(position(&core, &first[0]), Point::new(30.0, 30.0));
    assert_eq!(position(&core, &second[0]), Point::new(30.0, 30.0));
    assert_eq!(position(&core, &id), Point::new(10.0, 10.0));
}

#[test]
fn paste_selects_pasted_and_commits_once() {
    let (mut core, a, b, _) = core_with_three();
    core.copy(&[a, b]);
    let len = core.history().len();
    let pasted = core.paste();
    let mut expected = pasted.clone();
    expected.sort();
    assert_eq!(core.selection(), expected);
    assert_eq!(core.history().len(), len + 1);
}

#[test]
fn paste_places_on_top_layers() {
    let (mut core, a, b, c) = core_with_three();
    core.copy(&[b, a]);
    let pasted = core.paste();
    let top = core.get(&c).unwrap().layer;
    assert_eq!(core.get(&pasted[0]).unwrap().layer, top + 1);
    assert_eq!(core.get(&pasted[1]).unwrap().layer, top + 2);
    assert_eq!(core.get(&pasted[0]).unwrap().position, Point::new(20.0, 20.0));
}

#[test]
fn layering_at_max_layer_saturates() {
    let mut core = EngineCore::new();
    let top = core.create(sticky_at(0.0, 0.0));
    let layer = PartialObject { layer: Some(i64::MAX), ..Default::default() };
    assert!(core.update(&top, &layer, UpdateMode::Commit));

    let fresh = core.create(sticky_at(50.0, 0.0));
    assert_eq!(core.get(&fresh).unwrap().layer, i64::MAX);

    core.copy(&[top, fresh]);
    let pasted = core.paste();
    assert_eq!(pasted.len(), 2);
    assert!(pasted.iter().all(|id| core.get(id).is_some_and(|o| o.layer == i64::MAX)));

    assert!(core.bring_to_front(&[top, fresh]));
    assert_eq!(core.get(&fresh).unwrap().layer, i64::MAX);
}

#[test]
fn paste_with_empty_clipboard_is_noop() {
    let mut core = EngineCore::new();
    let len = core.history().len();
    assert!(core.paste().is_empty());
    assert_eq!(core.history().len(), len);
}

#[test]
fn copy_of_unknown_ids_keeps_clipboard() {
    let (mut core, a, ..) = core_with_three();
    core.copy(&[a]);
    assert_eq!(core.copy(&[Uuid::new_v4()]), 0);
    assert_eq!(core.clipboard().len(), 1);
}

#[test]
fn clipboard_holds_copies_not_references() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    core.copy(&[id]);
    core.delete(&[id]);
    let pasted = core.paste();
    assert_eq!(pasted.len(), 1);
    assert_eq!(position(&core, &pasted[0]), Point::new(20.0, 20.0));
}

#[test]
fn paste_gives_groups_fresh_ids() {
    let (mut core, a, b, _) = core_with_three();
    let gid = core.group(&[a, b]).unwrap();
    core.copy(&[a, b]);
    let pasted = core.paste();
    let new_gid = core.get(&pasted[0]).unwrap().group_id.unwrap();
    assert_ne!(new_gid, gid);
    assert_eq!(core.get(&pasted[1]).unwrap().group_id, Some(new_gid));
}

#[test]
fn paste_rewires_connectors_inside_buffer() {
    let (mut core, a, b, c) = core_with_three();
    let link = core.create(NewObject::new(ObjectKind::Connector(ConnectorEnds { from: Some(a), to: Some(c) })));
    core.copy(&[a, link]);
    let pasted = core.paste();
    let ObjectKind::Connector(ends) = core.get(&pasted[1]).unwrap().kind else {
        panic!("expected connector");
    };
    assert_eq!(ends.from, Some(pasted[0]));
    assert_eq!(ends.to, Some(c));
    assert_ne!(ends.from, Some(b));
}

#[test]
fn duplicate_chains_offsets() {
    let mut core = EngineCore::new();
    core.create(sticky_at(0.0, 0.0));
    let first = core.duplicate_selection();
    let second = core.duplicate_selection();
    assert_eq!(position(&core, &first[0]), Point::new(20.0, 20.0));
    assert_eq!(position(&core, &second[0]), Point::new(40.0, 40.0));
    assert_eq!(core.selection(), second);
}

#[test]
fn duplicate_nothing_is_noop() {
    let mut core = EngineCore::new();
    assert!(core.duplicate(&[Uuid::new_v4()]).is_empty());
    assert_eq!(core.history().len(), 1);
}

// =============================================================
// History
// =============================================================

#[test]
fn undo_redo_restore_snapshots_and_clear_selection() {
    let mut core = EngineCore::new();
    let id = core.create(sticky_at(0.0, 0.0));
    core.update(&id, &PartialObject::position(50.0, 0.0), UpdateMode::Commit);
    assert!(core.undo());
    assert_eq!(position(&core, &id), Point::new(0.0, 0.0));
    assert!(core.selection().is_empty());
    assert!(core.undo());
    assert!(core.doc().is_empty());
    assert!(!core.undo());
    assert!(core.redo());
    assert!(core.redo());
    assert_eq!(position(&core, &id), Point::new(50.0, 0.0));
    assert!(!core.redo());
}

#[test]
fn commit_after_undo_drops_redo_branch() {
    let mut core = EngineCore::new();
    core.create(sticky_at(0.0, 0.0));
    core.create(sticky_at(10.0, 0.0));
    core.undo();
    assert!(core.can_redo());
    core.create(sticky_at(20.0, 0.0));
    assert!(!core.can_redo());
    assert_eq!(core.doc().len(), 2);
}

#[test]
fn undo_restores_deleted_object_exactly() {
    let mut core = EngineCore::new();
    let id = core.create(rect_at(100.0, 100.0, 150.0, 100.0).with_content("hi"));
    let before = core.get(&id).unwrap().clone();
    core.delete(&[id]);
    core.undo();
    assert_eq!(core.get(&id), Some(&before));
}

#[test]
fn unbounded_history_keeps_everything() {
    let config = EngineConfig { history_cap: None, ..EngineConfig::default() };
    let mut core = EngineCore::with_config(config);
    for i in 0..120 {
        core.create(sticky_at(f64::from(i), 0.0));
    }
    assert_eq!(core.history().len(), 121);
}

// =============================================================
// Viewport
// =============================================================

#[test]
fn zoom_is_clamped() {
    let mut core = EngineCore::new();
    for _ in 0..10 {
        core.zoom(1.2, None);
    }
    assert_eq!(core.viewport().zoom, 5.0);
    for _ in 0..40 {
        core.zoom(0.5, None);
    }
    assert_eq!(core.viewport().zoom, 0.1);
}

#[test]
fn pan_and_reset() {
    let mut core = EngineCore::new();
    core.pan(30.0, -40.0);
    core.zoom(2.0, None);
    assert_eq!(core.viewport().pan_x, 30.0);
    core.reset_viewport();
    assert_eq!(core.viewport(), Viewport::default());
}

#[test]
fn fit_to_screen_on_empty_canvas_is_noop() {
    let mut core = EngineCore::new();
    core.set_viewport_size(800.0, 600.0);
    core.pan(10.0, 10.0);
    assert!(!core.fit_to_screen(20.0));
    assert_eq!(core.viewport().pan_x, 10.0);
}

#[test]
fn fit_to_screen_never_upscales() {
    let mut core = EngineCore::new();
    core.set_viewport_size(800.0, 600.0);
    core.create(rect_at(0.0, 0.0, 100.0, 100.0));
    assert!(core.fit_to_screen(20.0));
    let vp = core.viewport();
    assert_eq!(vp.zoom, 1.0);
    assert_eq!(vp.world_to_screen(Point::new(50.0, 50.0)), Point::new(400.0, 300.0));
}

#[test]
fn fit_to_screen_shrinks_large_content() {
    let mut core = EngineCore::new();
    core.set_viewport_size(800.0, 600.0);
    core.create(rect_at(0.0, 0.0, 1600.0, 400.0));
    core.fit_to_screen(0.0);
    assert_eq!(core.viewport().zoom, 0.5);
}

#[test]
fn fit_to_screen_needs_viewport_size() {
    let mut core = EngineCore::new();
    core.create(rect_at(0.0, 0.0, 100.0, 100.0));
    assert!(!core.fit_to_screen(20.0));
}

#[test]
fn viewport_size_rejects_non_finite() {
    let mut core = EngineCore::new();
    core.set_viewport_size(640.0, 480.0);
    core.set_viewport_size(f64::NAN, 10.0);
    assert_eq!(core.viewport_size(), Size::new(640.0, 480.0));
}

// =============================================================
// Snapshot and bitmap
// =============================================================

#[test]
fn export_import_round_trip() {
    let (core, ..) = core_with_three();
    let json = core.export_snapshot().unwrap();
    let mut other = EngineCore::new();
    assert_eq!(other.import_snapshot(&json).unwrap(), 3);
    assert_eq!(other.doc().objects(), core.doc().objects());
    assert_eq!(other.history().len(), 1);
    assert!(!other.can_undo());
}

#[test]
fn compact_export_imports_too() {
    let (core, ..) = core_with_three();
    let json = core.export_snapshot_compact().unwrap();
    assert!(!json.contains('\n'));
    let mut other = EngineCore::new();
    assert_eq!(other.import_snapshot(&json).unwrap(), 3);
}

#[test]
fn import_malformed_leaves_state_untouched() {
    let (mut core, a, ..) = core_with_three();
    let before = core.doc().snapshot();
    let history_len = core.history().len();
    let err = core.import_snapshot("{not json").unwrap_err();
    assert_eq!(err.error_code(), "E_SNAPSHOT_PARSE");
    assert_eq!(core.doc().snapshot(), before);
    assert_eq!(core.history().len(), history_len);
    assert!(core.get(&a).is_some());
}

#[test]
fn import_duplicate_ids_is_rejected() {
    let (mut core, ..) = core_with_three();
    let mut records: Vec<serde_json::Value> = serde_json::from_str(&core.export_snapshot().unwrap()).unwrap();
    records.push(records[0].clone());
    let input = serde_json::to_string(&records).unwrap();
    let err = core.import_snapshot(&input).unwrap_err();
    assert_eq!(err.error_code(), "E_SNAPSHOT_DUPLICATE_ID");
    assert_eq!(core.doc().len(), 3);
}

#[test]
fn import_clears_selection_and_clipboard() {
    let (mut core, a, ..) = core_with_three();
    core.copy(&[a]);
    core.import_snapshot("[]").unwrap();
    assert!(core.doc().is_empty());
    assert!(core.selection().is_empty());
    assert!(core.clipboard().is_empty());
}

#[test]
fn export_bitmap_is_pure() {
    let (core, ..) = core_with_three();
    let before = core.doc().snapshot();
    let img = core.export_bitmap(0.5);
    assert!(img.width() > 0);
    assert_eq!(core.doc().snapshot(), before);
    assert_eq!(core.history().len(), 4);
}

#[test]
fn export_png_bytes() {
    let (core, ..) = core_with_three();
    let bytes = core.export_png(1.0).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

// =============================================================
// Actions
// =============================================================

#[test]
fn actions_report_selection_and_history() {
    let mut core = EngineCore::new();
    let before = core.observe();
    let id = core.create(sticky_at(0.0, 0.0));
    let actions = core.actions_since(&before, false);
    assert_eq!(
        actions,
        vec![
            Action::SelectionChanged { ids: vec![id] },
            Action::HistoryChanged { can_undo: true, can_redo: false },
            Action::RenderNeeded,
        ]
    );
}

#[test]
fn actions_empty_when_nothing_changed() {
    let core = EngineCore::new();
    let before = core.observe();
    assert!(core.actions_since(&before, false).is_empty());
    assert_eq!(core.actions_since(&before, true), vec![Action::RenderNeeded]);
}

#[test]
fn viewport_change_requests_render() {
    let mut core = EngineCore::new();
    let before = core.observe();
    core.pan(5.0, 0.0);
    assert_eq!(core.actions_since(&before, false), vec![Action::RenderNeeded]);
}

#[test]
fn action_serializes_with_type_tag() {
    let value = serde_json::to_value(Action::HistoryChanged { can_undo: true, can_redo: false }).unwrap();
    assert_eq!(value, json!({ "type": "historyChanged", "canUndo": true, "canRedo": false }));
    let value = serde_json::to_value(Action::SetCursor { cursor: "move".into() }).unwrap();
    assert_eq!(value, json!({ "type": "setCursor", "cursor": "move" }));
}

#[test]
fn set_cursor_only_reports_changes() {
    let mut core = EngineCore::new();
    let mut actions = Vec::new();
    core.set_cursor("default", &mut actions);
    assert!(actions.is_empty());
    core.set_cursor("move", &mut actions);
    assert_eq!(actions, vec![Action::SetCursor { cursor: "move".into() }]);
}

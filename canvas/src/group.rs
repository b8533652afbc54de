//! Grouping: a flat shared tag across objects.
//!
//! A group is not an object and groups do not nest. Assigning a new group
//! overwrites whatever tag the members carried before.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::doc::{DocStore, GroupId, ObjectId};

/// Tag every live id in `ids` with one fresh group id.
///
/// Returns `None` (and changes nothing) when fewer than two live objects are given.
pub fn group(store: &mut DocStore, ids: &[ObjectId]) -> Option<GroupId> {
    let live: BTreeSet<ObjectId> = ids.iter().copied().filter(|id| store.contains(id)).collect();
    if live.len() < 2 {
        return None;
    }
    let gid = Uuid::new_v4();
    for id in &live {
        if let Some(obj) = store.get_mut(id) {
            obj.group_id = Some(gid);
        }
    }
    Some(gid)
}

/// Clear `gid` from every object carrying it. Returns the ids that changed.
pub fn ungroup(store: &mut DocStore, gid: &GroupId) -> Vec<ObjectId> {
    let members = members(store, gid);
    for id in &members {
        if let Some(obj) = store.get_mut(id) {
            obj.group_id = None;
        }
    }
    members
}

/// Ids of the live objects tagged with `gid`, in insertion order.
#[must_use]
pub fn members(store: &DocStore, gid: &GroupId) -> Vec<ObjectId> {
    store
        .objects()
        .iter()
        .filter(|o| o.group_id.as_ref() == Some(gid))
        .map(|o| o.id)
        .collect()
}

/// Distinct group ids carried by `ids`.
#[must_use]
pub fn groups_of(store: &DocStore, ids: &[ObjectId]) -> BTreeSet<GroupId> {
    ids.iter().filter_map(|id| store.get(id)).filter_map(|o| o.group_id).collect()
}

/// `ids` (live only) plus every object sharing a group with one of them.
#[must_use]
pub fn expand(store: &DocStore, ids: &[ObjectId]) -> Vec<ObjectId> {
    let groups = groups_of(store, ids);
    let wanted: BTreeSet<ObjectId> = ids.iter().copied().collect();
    store
        .objects()
        .iter()
        .filter(|o| wanted.contains(&o.id) || o.group_id.is_some_and(|g| groups.contains(&g)))
        .map(|o| o.id)
        .collect()
}

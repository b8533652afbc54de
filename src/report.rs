//! Summary of a loaded canvas for `boardtool inspect`.

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;

use std::collections::{BTreeMap, BTreeSet};

use canvas::engine::EngineCore;
use canvas::geom::Rect;
use canvas::hit;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub objects: usize,
    /// Object count per wire kind name.
    pub kinds: BTreeMap<&'static str, usize>,
    pub groups: usize,
    /// Union of object and connector bounds; absent for an empty canvas.
    pub bounds: Option<Rect>,
    /// Lowest and highest layer in use.
    pub layers: Option<(i64, i64)>,
    /// Connectors with at least one end pointing at a missing object.
    pub dangling_connectors: usize,
}

#[must_use]
pub fn inspect(core: &EngineCore) -> Report {
    let objects = core.query(|_| true);
    let mut kinds = BTreeMap::new();
    let mut groups = BTreeSet::new();
    let mut dangling_connectors = 0;
    for obj in &objects {
        *kinds.entry(obj.kind.tag().as_str()).or_insert(0) += 1;
        if let Some(gid) = obj.group_id {
            groups.insert(gid);
        }
        if let canvas::doc::ObjectKind::Connector(ends) = &obj.kind {
            let missing = [ends.from, ends.to].into_iter().flatten().any(|id| core.get(&id).is_none());
            if missing {
                dangling_connectors += 1;
            }
        }
    }
    let layers = objects
        .iter()
        .map(|o| o.layer)
        .fold(None, |acc: Option<(i64, i64)>, l| Some(acc.map_or((l, l), |(lo, hi)| (lo.min(l), hi.max(l)))));
    Report {
        objects: objects.len(),
        kinds,
        groups: groups.len(),
        bounds: hit::content_bounds(core.doc()),
        layers,
        dangling_connectors,
    }
}

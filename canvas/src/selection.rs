//! Selection manager: the set of selected object ids and marquee hit-testing.
//!
//! The selection never holds ids that are not live in the store; the engine
//! calls [`Selection::retain_live`] after every structural change (undo, redo,
//! delete, import).

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::doc::{DocStore, ObjectId};
use crate::geom::Rect;

/// Geometric test applied between a marquee and each object's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarqueePolicy {
    /// Any overlap selects the object.
    #[default]
    Intersect,
    /// Only objects fully inside the marquee are selected.
    Contain,
}

impl MarqueePolicy {
    #[must_use]
    pub fn matches(self, marquee: &Rect, bounds: &Rect) -> bool {
        match self {
            Self::Intersect => marquee.intersects(bounds),
            Self::Contain => marquee.contains_rect(bounds),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intersect => "intersect",
            Self::Contain => "contain",
        }
    }
}

impl FromStr for MarqueePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intersect" | "intersection" => Ok(Self::Intersect),
            "contain" | "containment" => Ok(Self::Contain),
            other => Err(other.to_string()),
        }
    }
}

/// Ids of every live object whose bounds match `marquee` under `policy`, in draw order.
#[must_use]
pub fn marquee_hits(store: &DocStore, marquee: &Rect, policy: MarqueePolicy) -> Vec<ObjectId> {
    store
        .sorted_objects()
        .into_iter()
        .filter(|o| policy.matches(marquee, &o.bounds()))
        .map(|o| o.id)
        .collect()
}

/// The current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ObjectId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or, when `additive`, extend) the selection. Returns whether it changed.
    pub fn select<I>(&mut self, ids: I, additive: bool) -> bool
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let incoming: BTreeSet<ObjectId> = ids.into_iter().collect();
        let next = if additive { self.ids.union(&incoming).copied().collect() } else { incoming };
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    /// Drop one id from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, id: &ObjectId) -> bool {
        self.ids.remove(id)
    }

    /// Empty the selection. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        self.ids.clear();
        true
    }

    /// Remove ids that are no longer in `store`. Returns whether anything was dropped.
    pub fn retain_live(&mut self, store: &DocStore) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| store.contains(id));
        self.ids.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    /// Selected ids in ascending id order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.ids.iter().copied().collect()
    }

    /// The selected id when exactly one object is selected.
    #[must_use]
    pub fn single(&self) -> Option<ObjectId> {
        if self.ids.len() == 1 { self.ids.first().copied() } else { None }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

//! Snapshot codec — JSON export/import of the live object list.
//!
//! DESIGN
//! ======
//! The wire form is a JSON array of [`ObjectRecord`]s. A record keeps the kind
//! tag and its payload in two sibling fields (`kind`, `metadata`) so that the
//! document reads like the data model, while [`CanvasObject`] holds them as a
//! single tagged enum. Decoding is two-stage: parse records, then validate and
//! convert each one, so that a payload mismatch is reported with the offending
//! id instead of a bare parse error. Nothing here touches engine state; the
//! engine swaps the decoded list in only after `decode` succeeds.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::doc::{CanvasObject, GroupId, KindTag, ObjectId, ObjectKind, StyleMap, Transform};
use crate::error::ErrorCode;
use crate::geom::{Point, Size};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate object id in snapshot: {0}")]
    DuplicateId(ObjectId),
    #[error("object {id} has non-finite geometry")]
    InvalidGeometry { id: ObjectId },
    #[error("object {id} metadata does not match kind {kind:?}: {source}")]
    Metadata {
        id: ObjectId,
        kind: KindTag,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for SnapshotError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_SNAPSHOT_PARSE",
            Self::DuplicateId(_) => "E_SNAPSHOT_DUPLICATE_ID",
            Self::InvalidGeometry { .. } => "E_SNAPSHOT_INVALID_GEOMETRY",
            Self::Metadata { .. } => "E_SNAPSHOT_METADATA",
        }
    }
}

/// One object as it appears in an exported snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub kind: KindTag,
    #[serde(default)]
    pub metadata: Value,
    pub position: Point,
    /// Kind default when absent.
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub layer: i64,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl From<CanvasObject> for ObjectRecord {
    fn from(obj: CanvasObject) -> Self {
        Self {
            id: obj.id,
            kind: obj.kind.tag(),
            metadata: obj.kind.metadata(),
            position: obj.position,
            size: Some(obj.size),
            transform: obj.transform,
            style: obj.style,
            content: obj.content,
            layer: obj.layer,
            group_id: obj.group_id,
            author: obj.author,
            created_at: obj.created_at,
            updated_at: obj.updated_at,
        }
    }
}

impl TryFrom<ObjectRecord> for CanvasObject {
    type Error = SnapshotError;

    fn try_from(rec: ObjectRecord) -> Result<Self, Self::Error> {
        let kind = ObjectKind::from_parts(rec.kind, rec.metadata).map_err(|source| SnapshotError::Metadata {
            id: rec.id,
            kind: rec.kind,
            source,
        })?;
        let size = rec.size.unwrap_or_else(|| kind.default_size());
        let obj = CanvasObject {
            id: rec.id,
            kind,
            position: rec.position,
            size,
            transform: rec.transform.normalized(),
            style: rec.style,
            content: rec.content,
            layer: rec.layer,
            group_id: rec.group_id,
            author: rec.author,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        };
        if !obj.is_finite() {
            return Err(SnapshotError::InvalidGeometry { id: obj.id });
        }
        Ok(obj)
    }
}

// =============================================================================
// ENCODE
// =============================================================================

fn records(objects: &[CanvasObject]) -> Vec<ObjectRecord> {
    objects.iter().cloned().map(ObjectRecord::from).collect()
}

/// Serialize objects as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns `Parse` if serialization fails (only possible for non-string map keys).
pub fn encode(objects: &[CanvasObject]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&records(objects))?)
}

/// Serialize objects as a single-line JSON array.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_compact(objects: &[CanvasObject]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&records(objects))?)
}

// =============================================================================
// DECODE
// =============================================================================

/// Parse and validate a snapshot produced by [`encode`] or a compatible writer.
///
/// # Errors
///
/// - `Parse` for invalid JSON or records missing required fields.
/// - `Metadata` when a record's payload does not match its kind.
/// - `InvalidGeometry` for NaN/infinite numbers.
/// - `DuplicateId` when two records share an id.
pub fn decode(input: &str) -> Result<Vec<CanvasObject>, SnapshotError> {
    let recs: Vec<ObjectRecord> = serde_json::from_str(input)?;
    let mut seen = HashSet::with_capacity(recs.len());
    let mut objects = Vec::with_capacity(recs.len());
    for rec in recs {
        if !seen.insert(rec.id) {
            return Err(SnapshotError::DuplicateId(rec.id));
        }
        objects.push(CanvasObject::try_from(rec)?);
    }
    Ok(objects)
}

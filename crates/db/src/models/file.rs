//! File entity. Owned by the external uploader; the grouping core reads
//! `url` and `deleted_faces` and writes only `face_group_mapping` and
//! `face_groups_processed_at`.

use facegraph_core::bounding_box::BoundingBox;
use facegraph_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// A deletion tombstone: the bounding box of a face the user removed from
/// this file. Upstream face IDs are not stable across re-indexing runs, so
/// tombstones are matched by box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedFace {
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
}

/// A row from the `media_files` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MediaFile {
    pub user_id: String,
    pub file_id: String,
    /// Image URL; a file without one is treated as unreachable.
    pub url: Option<String>,
    /// The upstream-produced face list. Opaque to the grouping core.
    pub extracted_faces: Json<serde_json::Value>,
    pub deleted_faces: Json<Vec<DeletedFace>>,
    /// Cached `face_id → group_id` map maintained by the grouping core.
    pub face_group_mapping: Json<BTreeMap<String, String>>,
    pub face_groups_processed_at: Option<Timestamp>,
}

impl MediaFile {
    /// A file doc as the uploader would create it, before any grouping pass.
    pub fn new(user_id: &str, file_id: &str, url: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            file_id: file_id.to_string(),
            url: url.map(str::to_string),
            extracted_faces: Json(serde_json::Value::Array(Vec::new())),
            deleted_faces: Json(Vec::new()),
            face_group_mapping: Json(BTreeMap::new()),
            face_groups_processed_at: None,
        }
    }

    /// The tombstoned bounding boxes of this file.
    pub fn tombstones(&self) -> Vec<BoundingBox> {
        self.deleted_faces.0.iter().map(|d| d.bounding_box).collect()
    }
}

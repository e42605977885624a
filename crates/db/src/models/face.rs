//! Face entity: the authoritative `face_id → group_id` mapping.
//!
//! On any conflict between a face doc and a group doc, the face doc wins;
//! group docs are secondary indexes repaired by the reconciler.

use facegraph_core::bounding_box::BoundingBox;
use facegraph_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `faces` table. The `face_id` matches the identifier used
/// by the upstream recognition engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Face {
    pub user_id: String,
    pub face_id: String,
    /// The single group this face belongs to.
    pub group_id: String,
    pub file_id: String,
    /// Absent only for faces added manually by ID, where no box is known.
    pub bounding_box: Option<Json<BoundingBox>>,
    pub confidence: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Face {
    pub fn new(
        user_id: &str,
        face_id: &str,
        group_id: &str,
        file_id: &str,
        bounding_box: Option<BoundingBox>,
        confidence: Option<f64>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            user_id: user_id.to_string(),
            face_id: face_id.to_string(),
            group_id: group_id.to_string(),
            file_id: file_id.to_string(),
            bounding_box: bounding_box.map(Json),
            confidence,
            created_at: now,
            updated_at: now,
        }
    }
}

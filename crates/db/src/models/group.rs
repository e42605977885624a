//! Group entity: a persistent set of face IDs asserted to depict the same
//! person, with a cached leader snapshot for thumbnail rendering.

use facegraph_core::bounding_box::BoundingBox;
use facegraph_core::status::STATUS_UNREVIEWED;
use facegraph_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `face_groups` table.
///
/// `face_ids` never contains duplicates and `face_count` equals its length
/// after every write. `leader_face_id` is a member of `face_ids` whenever
/// the group is non-empty; `leader_file_id` / `leader_bounding_box` cache
/// the leader's source so the UI can render a thumbnail without a face-doc
/// lookup.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FaceGroup {
    pub user_id: String,
    pub group_id: String,
    /// Optional scoping key: when set, matching and merging are confined to
    /// groups sharing this key. Groups without one are global.
    pub interview_id: Option<String>,
    pub face_ids: Json<Vec<String>>,
    pub file_ids: Json<Vec<String>>,
    pub face_count: i64,
    pub leader_face_id: Option<String>,
    pub leader_file_id: Option<String>,
    pub leader_bounding_box: Option<Json<BoundingBox>>,
    pub status: String,
    pub group_name: Option<String>,
    pub person_name: Option<String>,
    /// Audit trail of group IDs absorbed into this one.
    pub merged_from: Json<Vec<String>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FaceGroup {
    /// A fresh, empty, unreviewed group.
    pub fn new(user_id: &str, group_id: &str, interview_id: Option<&str>) -> Self {
        let now = chrono::Utc::now();
        Self {
            user_id: user_id.to_string(),
            group_id: group_id.to_string(),
            interview_id: interview_id.map(str::to_string),
            face_ids: Json(Vec::new()),
            file_ids: Json(Vec::new()),
            face_count: 0,
            leader_face_id: None,
            leader_file_id: None,
            leader_bounding_box: None,
            status: STATUS_UNREVIEWED.to_string(),
            group_name: None,
            person_name: None,
            merged_from: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains_face(&self, face_id: &str) -> bool {
        self.face_ids.0.iter().any(|f| f == face_id)
    }

    /// Append a face ID if not already present, keeping `face_count` in sync.
    pub fn add_face_id(&mut self, face_id: &str) {
        if !self.contains_face(face_id) {
            self.face_ids.0.push(face_id.to_string());
        }
        self.face_count = self.face_ids.0.len() as i64;
    }

    /// Remove a face ID if present, keeping `face_count` in sync. Returns
    /// whether the face was a member.
    pub fn remove_face_id(&mut self, face_id: &str) -> bool {
        let before = self.face_ids.0.len();
        self.face_ids.0.retain(|f| f != face_id);
        self.face_count = self.face_ids.0.len() as i64;
        self.face_ids.0.len() != before
    }

    pub fn add_file_id(&mut self, file_id: &str) {
        if !self.file_ids.0.iter().any(|f| f == file_id) {
            self.file_ids.0.push(file_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_face_id_is_idempotent() {
        let mut group = FaceGroup::new("u1", "g1", None);
        group.add_face_id("f1");
        group.add_face_id("f1");
        assert_eq!(group.face_ids.0, vec!["f1"]);
        assert_eq!(group.face_count, 1);
    }

    #[test]
    fn remove_face_id_updates_count() {
        let mut group = FaceGroup::new("u1", "g1", None);
        group.add_face_id("f1");
        group.add_face_id("f2");
        assert!(group.remove_face_id("f1"));
        assert!(!group.remove_face_id("f1"));
        assert_eq!(group.face_count, 1);
    }
}

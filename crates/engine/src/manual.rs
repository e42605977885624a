//! Manual operations invoked by the application: explicit group creation,
//! drag-and-drop re-assignment, merge, rename, delete.
//!
//! These bypass match resolution, tombstones, and the reachability probe
//! and drive the engine's primitives directly. Groups emptied by a manual
//! move are preserved so faces can be dragged back in; deleting a group
//! removes its member face docs with it.

use tracing::warn;
use uuid::Uuid;

use facegraph_core::status::GroupStatus;
use facegraph_core::CoreError;
use facegraph_db::models::{Face, FaceGroup};
use facegraph_db::repositories::{FaceRepo, GroupRepo};

use crate::engine::GroupEngine;
use crate::error::EngineResult;
use crate::input::FaceInput;

impl GroupEngine {
    /// All groups for a user, most recently updated first.
    pub async fn list_groups(&self, user_id: &str) -> EngineResult<Vec<FaceGroup>> {
        Ok(GroupRepo::list(&self.pool, user_id).await?)
    }

    /// A single group, or `NotFound`.
    pub async fn get_group(&self, user_id: &str, group_id: &str) -> EngineResult<FaceGroup> {
        GroupRepo::get(&self.pool, user_id, group_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "group",
                    id: group_id.to_string(),
                }
                .into()
            })
    }

    /// Build a new group from explicit faces. The first face becomes the
    /// leader. Faces that already belong to another group are moved out of
    /// it; their previous group is preserved even when emptied.
    pub async fn create_group_with_faces(
        &self,
        user_id: &str,
        faces: &[FaceInput],
        name: Option<&str>,
    ) -> EngineResult<FaceGroup> {
        if user_id.is_empty() || faces.is_empty() {
            return Err(
                CoreError::InvalidInput("user_id and at least one face are required".to_string())
                    .into(),
            );
        }

        let group_id = Uuid::new_v4().to_string();
        let mut group = FaceGroup::new(user_id, &group_id, None);
        if let Some(name) = name {
            group.group_name = Some(name.to_string());
            group.person_name = Some(name.to_string());
            group.status = GroupStatus::Named.as_str().to_string();
        }

        for face in faces {
            let existing = FaceRepo::get(&self.pool, user_id, &face.face_id).await?;

            // Moving an already-grouped face detaches it from its old group.
            if let Some(doc) = &existing {
                if doc.group_id != group_id {
                    self.detach_from_group(user_id, &doc.group_id, &face.face_id)
                        .await?;
                }
            }

            let bbox = face
                .bounding_box
                .as_ref()
                .and_then(|p| p.complete())
                .or(existing
                    .as_ref()
                    .and_then(|d| d.bounding_box.as_ref().map(|b| b.0)));
            let file_id = face
                .file_id
                .clone()
                .or(existing.as_ref().map(|d| d.file_id.clone()))
                .unwrap_or_default();
            let confidence = face.confidence.or(existing.as_ref().and_then(|d| d.confidence));

            let doc = Face::new(user_id, &face.face_id, &group_id, &file_id, bbox, confidence);
            FaceRepo::put(&self.pool, &doc).await?;

            group.add_face_id(&face.face_id);
            if !file_id.is_empty() {
                group.add_file_id(&file_id);
            }
            if group.leader_face_id.is_none() {
                group.leader_face_id = Some(face.face_id.clone());
                group.leader_file_id = (!file_id.is_empty()).then(|| file_id.clone());
                group.leader_bounding_box = bbox.map(sqlx::types::Json);
            }
        }

        GroupRepo::put(&self.pool, &group).await?;
        self.get_group(user_id, &group_id).await
    }

    /// Add a face to a group by ID. Idempotent; a face belonging to another
    /// group is moved.
    pub async fn add_face_to_group(
        &self,
        user_id: &str,
        group_id: &str,
        face_id: &str,
        file_id: Option<&str>,
    ) -> EngineResult<()> {
        let mut group = self.get_group(user_id, group_id).await?;
        let existing = FaceRepo::get(&self.pool, user_id, face_id).await?;

        if let Some(doc) = &existing {
            if doc.group_id == group_id && group.contains_face(face_id) {
                return Ok(());
            }
            if doc.group_id != group_id {
                self.detach_from_group(user_id, &doc.group_id, face_id)
                    .await?;
            }
        }

        let resolved_file_id = file_id
            .map(str::to_string)
            .or(existing.as_ref().map(|d| d.file_id.clone()))
            .unwrap_or_default();
        let bbox = existing
            .as_ref()
            .and_then(|d| d.bounding_box.as_ref().map(|b| b.0));
        let confidence = existing.as_ref().and_then(|d| d.confidence);

        let doc = Face::new(
            user_id,
            face_id,
            group_id,
            &resolved_file_id,
            bbox,
            confidence,
        );
        FaceRepo::put(&self.pool, &doc).await?;

        group.add_face_id(face_id);
        if !resolved_file_id.is_empty() {
            group.add_file_id(&resolved_file_id);
        }
        if group.leader_face_id.is_none() {
            group.leader_face_id = Some(face_id.to_string());
            group.leader_file_id = (!resolved_file_id.is_empty()).then_some(resolved_file_id);
            group.leader_bounding_box = bbox.map(sqlx::types::Json);
        }
        GroupRepo::put(&self.pool, &group).await?;
        Ok(())
    }

    /// Remove a face from a group and delete its face doc. Reassigns the
    /// leader when the leader was removed; the group is kept even if it
    /// becomes empty.
    pub async fn remove_face_from_group(
        &self,
        user_id: &str,
        group_id: &str,
        face_id: &str,
    ) -> EngineResult<()> {
        let mut group = self.get_group(user_id, group_id).await?;
        if !group.remove_face_id(face_id) {
            return Err(CoreError::NotFound {
                entity: "face",
                id: face_id.to_string(),
            }
            .into());
        }

        if group.leader_face_id.as_deref() == Some(face_id) {
            self.refresh_leader(&mut group).await?;
        }
        GroupRepo::put(&self.pool, &group).await?;
        FaceRepo::delete(&self.pool, user_id, face_id).await?;
        Ok(())
    }

    /// Delete a group and the face docs of its members.
    pub async fn delete_group(&self, user_id: &str, group_id: &str) -> EngineResult<()> {
        // Ensure it exists so callers get NotFound rather than a silent ack.
        self.get_group(user_id, group_id).await?;
        FaceRepo::delete_by_group(&self.pool, user_id, group_id).await?;
        GroupRepo::delete(&self.pool, user_id, group_id).await?;
        Ok(())
    }

    /// Merge two or more groups; the first ID wins and absorbs the rest.
    /// Missing secondaries are skipped. Returns the surviving group's ID.
    pub async fn merge_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> EngineResult<String> {
        if group_ids.len() < 2 {
            return Err(
                CoreError::InvalidInput("merge requires at least two group IDs".to_string()).into(),
            );
        }

        let mut primary = self.get_group(user_id, &group_ids[0]).await?;
        for group_id in &group_ids[1..] {
            if group_id == &primary.group_id {
                continue;
            }
            match GroupRepo::get(&self.pool, user_id, group_id).await? {
                Some(secondary) => self.merge_into(&mut primary, secondary).await?,
                None => warn!(user_id, %group_id, "Merge target missing; skipping"),
            }
        }
        Ok(primary.group_id)
    }

    /// Set the person label on a group. Renaming implies the `named` status;
    /// membership is untouched.
    pub async fn rename_group(
        &self,
        user_id: &str,
        group_id: &str,
        person_name: &str,
    ) -> EngineResult<FaceGroup> {
        if person_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("person_name must not be empty".to_string()).into());
        }

        let mut group = self.get_group(user_id, group_id).await?;
        let status = GroupStatus::parse(&group.status)
            .unwrap_or(GroupStatus::Unreviewed)
            .transition(GroupStatus::Named)?;
        group.status = status.as_str().to_string();
        group.person_name = Some(person_name.to_string());
        group.group_name = Some(person_name.to_string());
        GroupRepo::put(&self.pool, &group).await?;
        self.get_group(user_id, group_id).await
    }

    /// Delete every group and face doc for a user. Restricted to the
    /// configured test user; everyone else gets `Forbidden`. Returns the
    /// number of groups deleted.
    pub async fn clear_all_groups(&self, user_id: &str) -> EngineResult<u64> {
        if self.config.test_user_id.as_deref() != Some(user_id) {
            return Err(CoreError::Forbidden(
                "clear_all_groups is restricted to the test user".to_string(),
            )
            .into());
        }
        FaceRepo::delete_all_for_user(&self.pool, user_id).await?;
        let deleted = GroupRepo::delete_all_for_user(&self.pool, user_id).await?;
        Ok(deleted)
    }
}

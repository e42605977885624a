//! The group engine: batch ingestion and the merge primitive.
//!
//! Each batch carries one file's worth of faces. Faces are processed in
//! input order so a face can land in a group created by an earlier face of
//! the same batch. Between batches there is no ordering guarantee; two
//! concurrent batches may both create a group for the same identity and a
//! later batch's merge collapses them. The face doc is the source of truth
//! for membership and group docs are secondary indexes, so conflicting
//! writes converge without locks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use facegraph_core::bounding_box::{is_tombstoned, BoundingBox};
use facegraph_core::config::GroupingConfig;
use facegraph_core::CoreError;
use facegraph_db::models::{Face, FaceGroup};
use facegraph_db::repositories::{FaceRepo, FileRepo, GroupRepo};
use facegraph_db::DbPool;

use crate::error::EngineResult;
use crate::input::{BatchOutcome, FaceInput};
use crate::probe::{HttpImageProber, ImageProber};
use crate::recognition::{HttpRecognitionClient, RecognitionClient};
use crate::resolver::MatchResolver;

/// Orchestrates grouping over the persistent store.
pub struct GroupEngine {
    pub(crate) pool: DbPool,
    pub(crate) config: GroupingConfig,
    resolver: MatchResolver,
    prober: Arc<dyn ImageProber>,
}

impl GroupEngine {
    pub fn new(
        pool: DbPool,
        config: GroupingConfig,
        recognition: Arc<dyn RecognitionClient>,
        prober: Arc<dyn ImageProber>,
    ) -> Self {
        let resolver = MatchResolver::new(recognition, config.clone());
        Self {
            pool,
            config,
            resolver,
            prober,
        }
    }

    /// Engine wired to the production HTTP collaborators: the recognition
    /// sidecar at `recognition_base_url` and a HEAD prober using the
    /// configured timeout.
    pub fn with_http_clients(
        pool: DbPool,
        config: GroupingConfig,
        recognition_base_url: &str,
    ) -> Self {
        let recognition = Arc::new(HttpRecognitionClient::new(recognition_base_url));
        let prober = Arc::new(HttpImageProber::new(config.head_timeout_ms));
        Self::new(pool, config, recognition, prober)
    }

    /// Process one file's worth of faces, assigning each to exactly one
    /// group and merging groups as matches connect them.
    ///
    /// Skips (returning an empty outcome, not an error) when the file doc is
    /// missing, has no URL, or its image is unreachable, and when every face
    /// is tombstoned. Individual faces with incomplete bounding boxes are
    /// skipped; re-processing an already-grouped face is a no-op.
    pub async fn process_batch(
        &self,
        user_id: &str,
        file_id: &str,
        faces: &[FaceInput],
        interview_id: Option<&str>,
    ) -> EngineResult<BatchOutcome> {
        if user_id.is_empty() || file_id.is_empty() {
            return Err(CoreError::InvalidInput(
                "user_id and file_id are required".to_string(),
            )
            .into());
        }

        // Source validation: no groups for images the UI cannot render.
        let file = match FileRepo::get(&self.pool, user_id, file_id).await? {
            Some(file) => file,
            None => {
                debug!(user_id, file_id, "File doc missing; skipping batch");
                return Ok(BatchOutcome::empty());
            }
        };
        let url = match &file.url {
            Some(url) => url.clone(),
            None => {
                debug!(user_id, file_id, "File has no URL; skipping batch");
                return Ok(BatchOutcome::empty());
            }
        };
        if !self.prober.is_reachable(&url).await {
            info!(user_id, file_id, "Source image unreachable; skipping batch");
            return Ok(BatchOutcome::empty());
        }

        // Tombstone filter: deleted faces must not come back under fresh IDs.
        let tombstones = file.tombstones();
        let tolerance = self.config.bounding_box_tolerance;
        let candidates: Vec<&FaceInput> = faces
            .iter()
            .filter(|face| {
                let bbox = face.bounding_box.as_ref().and_then(|p| p.complete());
                !is_tombstoned(bbox.as_ref(), &tombstones, tolerance)
            })
            .collect();
        if candidates.is_empty() {
            return Ok(BatchOutcome::empty());
        }

        let mut mapping: BTreeMap<String, String> = BTreeMap::new();
        let mut touched: Vec<String> = Vec::new();
        let mut processed_count = 0usize;

        for face in candidates {
            let bbox = match face.bounding_box.as_ref().and_then(|p| p.complete()) {
                Some(bbox) => bbox,
                None => {
                    warn!(
                        user_id,
                        face_id = %face.face_id,
                        "Face has no valid bounding box; skipping"
                    );
                    continue;
                }
            };

            let group_id = self
                .assign_face(user_id, file_id, face, &bbox, interview_id, &mut mapping)
                .await?;

            mapping.insert(face.face_id.clone(), group_id.clone());
            touched.push(group_id);
            processed_count += 1;
        }

        if !mapping.is_empty() {
            FileRepo::update_mapping(&self.pool, user_id, file_id, &mapping, Utc::now()).await?;
        }

        // Distinct touched groups, re-read so callers see final state.
        let mut groups = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for group_id in &touched {
            if seen.insert(group_id.clone()) {
                if let Some(group) = GroupRepo::get(&self.pool, user_id, group_id).await? {
                    groups.push(group);
                }
            }
        }

        Ok(BatchOutcome {
            processed_count,
            groups,
        })
    }

    /// Assign one face to its group, creating or merging groups as needed.
    /// Returns the ID of the group the face ended up in.
    async fn assign_face(
        &self,
        user_id: &str,
        file_id: &str,
        face: &FaceInput,
        bbox: &BoundingBox,
        interview_id: Option<&str>,
        mapping: &mut BTreeMap<String, String>,
    ) -> EngineResult<String> {
        // Idempotence: a face doc pointing at a live group wins outright.
        if let Some(existing) = FaceRepo::get(&self.pool, user_id, &face.face_id).await? {
            if let Some(group) = GroupRepo::get(&self.pool, user_id, &existing.group_id).await? {
                if group.contains_face(&face.face_id) {
                    debug!(
                        user_id,
                        face_id = %face.face_id,
                        group_id = %group.group_id,
                        "Face already grouped; no-op"
                    );
                    return Ok(group.group_id);
                }
            }
        }

        let matches = self.resolver.resolve(user_id, face).await;
        let mut groups = if matches.is_empty() {
            Vec::new()
        } else {
            GroupRepo::find_containing_any(&self.pool, user_id, &matches, interview_id).await?
        };

        if groups.is_empty() {
            // New identity. Only the processed face joins: faces that appear
            // in the match set but were never themselves presented must not
            // become phantom members.
            return self
                .create_group_for_face(user_id, file_id, face, bbox, interview_id)
                .await;
        }

        // Deterministic primary: earliest creation, then smallest ID.
        groups.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.group_id.cmp(&b.group_id))
        });
        let mut primary = groups.remove(0);
        for secondary in groups {
            let absorbed = secondary.group_id.clone();
            self.merge_into(&mut primary, secondary).await?;
            remap(mapping, &absorbed, &primary.group_id);
        }

        self.attach_face(&mut primary, face, bbox, file_id).await?;
        Ok(primary.group_id)
    }

    /// Create a singleton group for a face and persist its face doc.
    async fn create_group_for_face(
        &self,
        user_id: &str,
        file_id: &str,
        face: &FaceInput,
        bbox: &BoundingBox,
        interview_id: Option<&str>,
    ) -> EngineResult<String> {
        let group_id = Uuid::new_v4().to_string();
        let mut group = FaceGroup::new(user_id, &group_id, interview_id);
        group.add_face_id(&face.face_id);
        group.add_file_id(file_id);
        group.leader_face_id = Some(face.face_id.clone());
        group.leader_file_id = Some(file_id.to_string());
        group.leader_bounding_box = Some(sqlx::types::Json(*bbox));
        GroupRepo::put(&self.pool, &group).await?;

        let doc = Face::new(
            user_id,
            &face.face_id,
            &group_id,
            file_id,
            Some(*bbox),
            face.confidence,
        );
        FaceRepo::put(&self.pool, &doc).await?;

        debug!(user_id, face_id = %face.face_id, %group_id, "Created singleton group");
        Ok(group_id)
    }

    /// Add a face to an existing group and persist its face doc. Idempotent
    /// on membership.
    pub(crate) async fn attach_face(
        &self,
        group: &mut FaceGroup,
        face: &FaceInput,
        bbox: &BoundingBox,
        file_id: &str,
    ) -> EngineResult<()> {
        group.add_face_id(&face.face_id);
        group.add_file_id(file_id);
        if group.leader_face_id.is_none() {
            group.leader_face_id = Some(face.face_id.clone());
            group.leader_file_id = Some(file_id.to_string());
            group.leader_bounding_box = Some(sqlx::types::Json(*bbox));
        }
        GroupRepo::put(&self.pool, group).await?;

        let doc = Face::new(
            &group.user_id,
            &face.face_id,
            &group.group_id,
            file_id,
            Some(*bbox),
            face.confidence,
        );
        FaceRepo::put(&self.pool, &doc).await?;
        Ok(())
    }

    /// Fold `secondary` into `primary`.
    ///
    /// Face docs are repointed before the secondary group doc is deleted:
    /// if a crash lands between the two, the lingering secondary no longer
    /// owns its faces and the reconciler removes it, because face docs win.
    pub(crate) async fn merge_into(
        &self,
        primary: &mut FaceGroup,
        secondary: FaceGroup,
    ) -> EngineResult<()> {
        match FaceRepo::reassign_group(
            &self.pool,
            &primary.user_id,
            &secondary.group_id,
            &primary.group_id,
        )
        .await
        {
            Ok(moved) => debug!(
                primary = %primary.group_id,
                secondary = %secondary.group_id,
                moved,
                "Repointed face docs"
            ),
            // Non-fatal: the reconciler repairs membership from face docs.
            Err(e) => error!(
                primary = %primary.group_id,
                secondary = %secondary.group_id,
                error = %e,
                "Face doc repoint failed during merge; continuing"
            ),
        }

        for face_id in &secondary.face_ids.0 {
            primary.add_face_id(face_id);
        }
        for file_id in &secondary.file_ids.0 {
            primary.add_file_id(file_id);
        }
        for absorbed in &secondary.merged_from.0 {
            if !primary.merged_from.0.contains(absorbed) {
                primary.merged_from.0.push(absorbed.clone());
            }
        }
        if !primary.merged_from.0.contains(&secondary.group_id) {
            primary.merged_from.0.push(secondary.group_id.clone());
        }

        GroupRepo::put(&self.pool, primary).await?;
        GroupRepo::delete(&self.pool, &primary.user_id, &secondary.group_id).await?;

        info!(
            primary = %primary.group_id,
            secondary = %secondary.group_id,
            face_count = primary.face_count,
            "Merged groups"
        );
        Ok(())
    }

    /// Detach a face from the group doc it currently lives in, refreshing
    /// count and leader. The emptied group is preserved. The face doc itself
    /// is left to the caller.
    pub(crate) async fn detach_from_group(
        &self,
        user_id: &str,
        group_id: &str,
        face_id: &str,
    ) -> EngineResult<()> {
        let mut group = match GroupRepo::get(&self.pool, user_id, group_id).await? {
            Some(group) => group,
            None => return Ok(()),
        };
        if !group.remove_face_id(face_id) {
            return Ok(());
        }
        if group.leader_face_id.as_deref() == Some(face_id) {
            self.refresh_leader(&mut group).await?;
        }
        GroupRepo::put(&self.pool, &group).await?;
        Ok(())
    }

    /// Point the leader at the first remaining member (or clear it) and
    /// refresh the cached leader snapshot from that member's face doc.
    pub(crate) async fn refresh_leader(&self, group: &mut FaceGroup) -> EngineResult<()> {
        match group.face_ids.0.first().cloned() {
            Some(face_id) => {
                match FaceRepo::get(&self.pool, &group.user_id, &face_id).await? {
                    Some(doc) => {
                        group.leader_file_id = Some(doc.file_id.clone());
                        group.leader_bounding_box = doc.bounding_box.clone();
                    }
                    None => {
                        warn!(
                            group_id = %group.group_id,
                            %face_id,
                            "New leader has no face doc; clearing leader snapshot"
                        );
                        group.leader_file_id = None;
                        group.leader_bounding_box = None;
                    }
                }
                group.leader_face_id = Some(face_id);
            }
            None => {
                group.leader_face_id = None;
                group.leader_file_id = None;
                group.leader_bounding_box = None;
            }
        }
        Ok(())
    }
}

/// Rewrite accumulated mapping entries when a merge absorbs their group, so
/// the file cache written at the end of the batch points at survivors.
fn remap(mapping: &mut BTreeMap<String, String>, absorbed: &str, survivor: &str) {
    for value in mapping.values_mut() {
        if *value == absorbed {
            *value = survivor.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_rewrites_only_absorbed_entries() {
        let mut mapping: BTreeMap<String, String> = [
            ("f1".to_string(), "g_old".to_string()),
            ("f2".to_string(), "g_keep".to_string()),
        ]
        .into();
        remap(&mut mapping, "g_old", "g_new");
        assert_eq!(mapping["f1"], "g_new");
        assert_eq!(mapping["f2"], "g_keep");
    }
}

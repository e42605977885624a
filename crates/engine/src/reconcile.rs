//! Convergence reconciler.
//!
//! The store offers no cross-document transactions, so a crash between the
//! face-doc phase and the group-doc phase of a merge can leave a group doc
//! that no longer owns its faces. Face docs are authoritative: this module
//! recomputes every group's membership from them, repairs counts and
//! leaders, and removes groups whose members have all moved on. Groups that
//! were already empty (a manual-ops policy) are left alone.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use facegraph_db::repositories::{FaceRepo, GroupRepo};
use facegraph_db::DbPool;

/// Summary of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub groups_checked: usize,
    pub groups_repaired: usize,
    pub groups_removed: usize,
}

/// Repair every group doc of a user from its face docs.
pub async fn reconcile_user(pool: &DbPool, user_id: &str) -> Result<ReconcileReport, sqlx::Error> {
    let mut report = ReconcileReport::default();

    for mut group in GroupRepo::list(pool, user_id).await? {
        report.groups_checked += 1;

        let owned = FaceRepo::list_by_group(pool, user_id, &group.group_id).await?;
        let owned_ids: Vec<String> = owned.iter().map(|f| f.face_id.clone()).collect();
        let owned_set: HashSet<&str> = owned_ids.iter().map(String::as_str).collect();
        let listed_set: HashSet<&str> = group.face_ids.0.iter().map(String::as_str).collect();

        let membership_ok = owned_set == listed_set
            && group.face_count == group.face_ids.0.len() as i64
            && group.face_ids.0.len() == listed_set.len();
        let leader_ok = match &group.leader_face_id {
            Some(leader) => owned_set.contains(leader.as_str()),
            None => owned_set.is_empty(),
        };
        if membership_ok && leader_ok {
            continue;
        }

        // All members moved away: a merge remnant, not a manually emptied
        // group (those list no members to begin with).
        if owned_set.is_empty() && !listed_set.is_empty() {
            GroupRepo::delete(pool, user_id, &group.group_id).await?;
            report.groups_removed += 1;
            info!(user_id, group_id = %group.group_id, "Removed stale group during reconciliation");
            continue;
        }

        let leader_valid = group
            .leader_face_id
            .as_deref()
            .is_some_and(|leader| owned_set.contains(leader));

        group.face_ids.0 = owned_ids;
        group.face_count = group.face_ids.0.len() as i64;

        if !leader_valid {
            match owned.first() {
                Some(doc) => {
                    group.leader_face_id = Some(doc.face_id.clone());
                    group.leader_file_id = Some(doc.file_id.clone());
                    group.leader_bounding_box = doc.bounding_box.clone();
                }
                None => {
                    group.leader_face_id = None;
                    group.leader_file_id = None;
                    group.leader_bounding_box = None;
                }
            }
        }

        GroupRepo::put(pool, &group).await?;
        report.groups_repaired += 1;
        debug!(
            user_id,
            group_id = %group.group_id,
            face_count = group.face_count,
            "Repaired group from face docs"
        );
    }

    if report.groups_repaired > 0 || report.groups_removed > 0 {
        warn!(
            user_id,
            checked = report.groups_checked,
            repaired = report.groups_repaired,
            removed = report.groups_removed,
            "Reconciliation made changes"
        );
    }
    Ok(report)
}

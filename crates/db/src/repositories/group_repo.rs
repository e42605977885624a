//! Repository for the `face_groups` table.

use crate::models::group::FaceGroup;
use crate::DbPool;
use std::collections::HashSet;

const GROUP_COLUMNS: &str = "user_id, group_id, interview_id, face_ids, file_ids, face_count, \
     leader_face_id, leader_file_id, leader_bounding_box, status, group_name, person_name, \
     merged_from, created_at, updated_at";

/// The store's native limit on membership-query (`IN`) clauses. Larger
/// inputs are transparently batched.
pub const CONTAINS_ANY_CHUNK: usize = 30;

/// Provides document-level operations for face groups.
pub struct GroupRepo;

impl GroupRepo {
    /// Fetch a group by ID.
    pub async fn get(
        pool: &DbPool,
        user_id: &str,
        group_id: &str,
    ) -> Result<Option<FaceGroup>, sqlx::Error> {
        let query =
            format!("SELECT {GROUP_COLUMNS} FROM face_groups WHERE user_id = ? AND group_id = ?");
        sqlx::query_as::<_, FaceGroup>(&query)
            .bind(user_id)
            .bind(group_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert a group document. Always stamps `updated_at` with the current
    /// server time; the caller's value is ignored.
    pub async fn put(pool: &DbPool, group: &FaceGroup) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT OR REPLACE INTO face_groups ({GROUP_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(&group.user_id)
            .bind(&group.group_id)
            .bind(&group.interview_id)
            .bind(&group.face_ids)
            .bind(&group.file_ids)
            .bind(group.face_count)
            .bind(&group.leader_face_id)
            .bind(&group.leader_file_id)
            .bind(&group.leader_bounding_box)
            .bind(&group.status)
            .bind(&group.group_name)
            .bind(&group.person_name)
            .bind(&group.merged_from)
            .bind(group.created_at)
            .bind(chrono::Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete a group document. Returns `true` if a row was removed.
    pub async fn delete(
        pool: &DbPool,
        user_id: &str,
        group_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM face_groups WHERE user_id = ? AND group_id = ?")
            .bind(user_id)
            .bind(group_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every group for a user, returning the number removed.
    pub async fn delete_all_for_user(pool: &DbPool, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM face_groups WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List all groups for a user, most recently updated first.
    pub async fn list(pool: &DbPool, user_id: &str) -> Result<Vec<FaceGroup>, sqlx::Error> {
        let query = format!(
            "SELECT {GROUP_COLUMNS} FROM face_groups WHERE user_id = ? ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, FaceGroup>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find every group whose `face_ids` intersects `face_ids`.
    ///
    /// When `interview_id` is supplied, groups scoped to a *different*
    /// interview are excluded; unscoped groups always participate. Inputs
    /// larger than [`CONTAINS_ANY_CHUNK`] are queried in batches and the
    /// result is deduplicated by `group_id`.
    pub async fn find_containing_any(
        pool: &DbPool,
        user_id: &str,
        face_ids: &[String],
        interview_id: Option<&str>,
    ) -> Result<Vec<FaceGroup>, sqlx::Error> {
        let mut found: Vec<FaceGroup> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for chunk in face_ids.chunks(CONTAINS_ANY_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let scope_clause = match interview_id {
                Some(_) => "AND (interview_id IS NULL OR interview_id = ?)",
                None => "",
            };
            let query = format!(
                "SELECT {GROUP_COLUMNS} FROM face_groups \
                 WHERE user_id = ? \
                 AND EXISTS (SELECT 1 FROM json_each(face_groups.face_ids) \
                             WHERE json_each.value IN ({placeholders})) \
                 {scope_clause} \
                 ORDER BY created_at ASC, group_id ASC"
            );

            let mut q = sqlx::query_as::<_, FaceGroup>(&query).bind(user_id);
            for face_id in chunk {
                q = q.bind(face_id);
            }
            if let Some(scope) = interview_id {
                q = q.bind(scope);
            }

            for group in q.fetch_all(pool).await? {
                if seen.insert(group.group_id.clone()) {
                    found.push(group);
                }
            }
        }

        Ok(found)
    }

    /// Every user with at least one group. Used by the reconciliation sweep.
    pub async fn distinct_user_ids(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT user_id FROM face_groups ORDER BY user_id")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(u,)| u).collect())
    }
}

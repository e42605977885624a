//! Repository for the `faces` table.

use crate::models::face::Face;
use crate::DbPool;

const FACE_COLUMNS: &str =
    "user_id, face_id, group_id, file_id, bounding_box, confidence, created_at, updated_at";

/// Provides document-level operations for face docs.
pub struct FaceRepo;

impl FaceRepo {
    /// Fetch a face doc by ID.
    pub async fn get(
        pool: &DbPool,
        user_id: &str,
        face_id: &str,
    ) -> Result<Option<Face>, sqlx::Error> {
        let query = format!("SELECT {FACE_COLUMNS} FROM faces WHERE user_id = ? AND face_id = ?");
        sqlx::query_as::<_, Face>(&query)
            .bind(user_id)
            .bind(face_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert a face doc, stamping `updated_at` with the current server time.
    pub async fn put(pool: &DbPool, face: &Face) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT OR REPLACE INTO faces ({FACE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(&face.user_id)
            .bind(&face.face_id)
            .bind(&face.group_id)
            .bind(&face.file_id)
            .bind(&face.bounding_box)
            .bind(face.confidence)
            .bind(face.created_at)
            .bind(chrono::Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete a face doc. Returns `true` if a row was removed.
    pub async fn delete(pool: &DbPool, user_id: &str, face_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM faces WHERE user_id = ? AND face_id = ?")
            .bind(user_id)
            .bind(face_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every face doc for a user, returning the number removed.
    pub async fn delete_all_for_user(pool: &DbPool, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM faces WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every face doc pointing at a group, returning the number
    /// removed.
    pub async fn delete_by_group(
        pool: &DbPool,
        user_id: &str,
        group_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM faces WHERE user_id = ? AND group_id = ?")
            .bind(user_id)
            .bind(group_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// All face docs currently pointing at a group.
    pub async fn list_by_group(
        pool: &DbPool,
        user_id: &str,
        group_id: &str,
    ) -> Result<Vec<Face>, sqlx::Error> {
        let query = format!(
            "SELECT {FACE_COLUMNS} FROM faces \
             WHERE user_id = ? AND group_id = ? \
             ORDER BY created_at ASC, face_id ASC"
        );
        sqlx::query_as::<_, Face>(&query)
            .bind(user_id)
            .bind(group_id)
            .fetch_all(pool)
            .await
    }

    /// Repoint every face doc in `from_group` at `to_group` in one
    /// set-valued update. Returns the number of faces moved.
    pub async fn reassign_group(
        pool: &DbPool,
        user_id: &str,
        from_group: &str,
        to_group: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE faces SET group_id = ?, updated_at = ? WHERE user_id = ? AND group_id = ?",
        )
        .bind(to_group)
        .bind(chrono::Utc::now())
        .bind(user_id)
        .bind(from_group)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

//! Repository for the `media_files` table.
//!
//! File docs are owned by the external uploader. The grouping core reads
//! them and writes only the `face_group_mapping` cache and its processing
//! timestamp; [`FileRepo::put`] exists for the uploader side (and tests).

use crate::models::file::MediaFile;
use crate::DbPool;
use facegraph_core::types::Timestamp;
use std::collections::BTreeMap;

const FILE_COLUMNS: &str = "user_id, file_id, url, extracted_faces, deleted_faces, \
     face_group_mapping, face_groups_processed_at";

/// Provides document-level operations for file docs.
pub struct FileRepo;

impl FileRepo {
    /// Fetch a file doc by ID.
    pub async fn get(
        pool: &DbPool,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<MediaFile>, sqlx::Error> {
        let query =
            format!("SELECT {FILE_COLUMNS} FROM media_files WHERE user_id = ? AND file_id = ?");
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(user_id)
            .bind(file_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert a full file doc (the uploader's write path).
    pub async fn put(pool: &DbPool, file: &MediaFile) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT OR REPLACE INTO media_files ({FILE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(&file.user_id)
            .bind(&file.file_id)
            .bind(&file.url)
            .bind(&file.extracted_faces)
            .bind(&file.deleted_faces)
            .bind(&file.face_group_mapping)
            .bind(file.face_groups_processed_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Merge `mapping` into the file's `face_group_mapping` and set
    /// `face_groups_processed_at`.
    ///
    /// Uses `json_patch` so entries written by other batches for the same
    /// file are left intact. A missing file doc is a no-op: the mapping is a
    /// cache and the file's owner may have deleted it concurrently.
    pub async fn update_mapping(
        pool: &DbPool,
        user_id: &str,
        file_id: &str,
        mapping: &BTreeMap<String, String>,
        processed_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let patch = serde_json::to_string(mapping).unwrap_or_else(|_| "{}".to_string());
        sqlx::query(
            "UPDATE media_files \
             SET face_group_mapping = json_patch(face_group_mapping, ?), \
                 face_groups_processed_at = ? \
             WHERE user_id = ? AND file_id = ?",
        )
        .bind(patch)
        .bind(processed_at)
        .bind(user_id)
        .bind(file_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

//! In-code schema bootstrap.
//!
//! Tables are created on startup with `CREATE TABLE IF NOT EXISTS`; calling
//! [`init_schema`] repeatedly is harmless. All three document tables are
//! partitioned by `user_id` as the leading primary-key column.

use crate::DbPool;
use tracing::info;

const CREATE_FACE_GROUPS: &str = r#"
CREATE TABLE IF NOT EXISTS face_groups (
    user_id             TEXT NOT NULL,
    group_id            TEXT NOT NULL,
    interview_id        TEXT,
    face_ids            TEXT NOT NULL DEFAULT '[]',
    file_ids            TEXT NOT NULL DEFAULT '[]',
    face_count          INTEGER NOT NULL DEFAULT 0,
    leader_face_id      TEXT,
    leader_file_id      TEXT,
    leader_bounding_box TEXT,
    status              TEXT NOT NULL DEFAULT 'unreviewed',
    group_name          TEXT,
    person_name         TEXT,
    merged_from         TEXT NOT NULL DEFAULT '[]',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    PRIMARY KEY (user_id, group_id)
)
"#;

const CREATE_FACES: &str = r#"
CREATE TABLE IF NOT EXISTS faces (
    user_id      TEXT NOT NULL,
    face_id      TEXT NOT NULL,
    group_id     TEXT NOT NULL,
    file_id      TEXT NOT NULL,
    bounding_box TEXT,
    confidence   REAL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (user_id, face_id)
)
"#;

const CREATE_MEDIA_FILES: &str = r#"
CREATE TABLE IF NOT EXISTS media_files (
    user_id                  TEXT NOT NULL,
    file_id                  TEXT NOT NULL,
    url                      TEXT,
    extracted_faces          TEXT NOT NULL DEFAULT '[]',
    deleted_faces            TEXT NOT NULL DEFAULT '[]',
    face_group_mapping       TEXT NOT NULL DEFAULT '{}',
    face_groups_processed_at TEXT,
    PRIMARY KEY (user_id, file_id)
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_face_groups_updated ON face_groups (user_id, updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_faces_group ON faces (user_id, group_id)",
];

/// Create all tables and indexes if they do not exist.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_FACE_GROUPS, CREATE_FACES, CREATE_MEDIA_FILES] {
        sqlx::query(statement).execute(pool).await?;
    }
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Store schema initialised");
    Ok(())
}

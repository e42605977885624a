//! Integration tests for the store adapter over an in-memory database.

use std::collections::BTreeMap;

use facegraph_core::bounding_box::BoundingBox;
use facegraph_db::models::{Face, FaceGroup, MediaFile};
use facegraph_db::repositories::group_repo::CONTAINS_ANY_CHUNK;
use facegraph_db::repositories::{FaceRepo, FileRepo, GroupRepo};
use facegraph_db::{schema, DbPool};
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool() -> DbPool {
    // A single connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    schema::init_schema(&pool).await.unwrap();
    pool
}

fn bbox(left: f64) -> BoundingBox {
    BoundingBox {
        left,
        top: 0.2,
        width: 0.3,
        height: 0.4,
    }
}

fn group_with_faces(user_id: &str, group_id: &str, face_ids: &[&str]) -> FaceGroup {
    let mut group = FaceGroup::new(user_id, group_id, None);
    for face_id in face_ids {
        group.add_face_id(face_id);
    }
    group
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let pool = memory_pool().await;
    schema::init_schema(&pool).await.unwrap();
    facegraph_db::health_check(&pool).await.unwrap();
}

// ---------------------------------------------------------------------------
// Group CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn group_put_get_round_trip() {
    let pool = memory_pool().await;
    let mut group = group_with_faces("u1", "g1", &["f1", "f2"]);
    group.leader_face_id = Some("f1".to_string());
    GroupRepo::put(&pool, &group).await.unwrap();

    let fetched = GroupRepo::get(&pool, "u1", "g1").await.unwrap().unwrap();
    assert_eq!(fetched.face_ids.0, vec!["f1", "f2"]);
    assert_eq!(fetched.face_count, 2);
    assert_eq!(fetched.leader_face_id.as_deref(), Some("f1"));
    assert_eq!(fetched.status, "unreviewed");
}

#[tokio::test]
async fn group_get_missing_returns_none() {
    let pool = memory_pool().await;
    assert!(GroupRepo::get(&pool, "u1", "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn put_stamps_updated_at() {
    let pool = memory_pool().await;
    let group = group_with_faces("u1", "g1", &["f1"]);
    let stale = group.updated_at;
    GroupRepo::put(&pool, &group).await.unwrap();

    let fetched = GroupRepo::get(&pool, "u1", "g1").await.unwrap().unwrap();
    assert!(fetched.updated_at >= stale);
}

#[tokio::test]
async fn delete_group_reports_existence() {
    let pool = memory_pool().await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g1", &[]))
        .await
        .unwrap();
    assert!(GroupRepo::delete(&pool, "u1", "g1").await.unwrap());
    assert!(!GroupRepo::delete(&pool, "u1", "g1").await.unwrap());
}

#[tokio::test]
async fn list_orders_by_updated_at_desc() {
    let pool = memory_pool().await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g1", &["f1"]))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g2", &["f2"]))
        .await
        .unwrap();

    let groups = GroupRepo::list(&pool, "u1").await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_id, "g2");
    assert_eq!(groups[1].group_id, "g1");
}

#[tokio::test]
async fn groups_are_partitioned_by_user() {
    let pool = memory_pool().await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g1", &["f1"]))
        .await
        .unwrap();
    GroupRepo::put(&pool, &group_with_faces("u2", "g2", &["f1"]))
        .await
        .unwrap();

    assert_eq!(GroupRepo::list(&pool, "u1").await.unwrap().len(), 1);
    let found = GroupRepo::find_containing_any(&pool, "u2", &["f1".to_string()], None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].group_id, "g2");
}

// ---------------------------------------------------------------------------
// find_containing_any
// ---------------------------------------------------------------------------

#[tokio::test]
async fn find_containing_any_intersects() {
    let pool = memory_pool().await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g1", &["f1", "f2"]))
        .await
        .unwrap();
    GroupRepo::put(&pool, &group_with_faces("u1", "g2", &["f3"]))
        .await
        .unwrap();

    let found =
        GroupRepo::find_containing_any(&pool, "u1", &["f2".to_string(), "f9".to_string()], None)
            .await
            .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].group_id, "g1");
}

#[tokio::test]
async fn find_containing_any_dedupes_across_chunks() {
    let pool = memory_pool().await;
    // One group containing many faces, queried with an input list that spans
    // several chunks and hits the group in more than one of them.
    let face_ids: Vec<String> = (0..(CONTAINS_ANY_CHUNK * 2 + 5))
        .map(|i| format!("f{i}"))
        .collect();
    let mut group = FaceGroup::new("u1", "g1", None);
    for face_id in &face_ids {
        group.add_face_id(face_id);
    }
    GroupRepo::put(&pool, &group).await.unwrap();

    let found = GroupRepo::find_containing_any(&pool, "u1", &face_ids, None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn find_containing_any_respects_interview_scope() {
    let pool = memory_pool().await;
    let mut scoped = FaceGroup::new("u1", "g_scoped", Some("ivA"));
    scoped.add_face_id("f1");
    let mut other_scope = FaceGroup::new("u1", "g_other", Some("ivB"));
    other_scope.add_face_id("f1");
    let mut unscoped = FaceGroup::new("u1", "g_global", None);
    unscoped.add_face_id("f1");
    for group in [&scoped, &other_scope, &unscoped] {
        GroupRepo::put(&pool, group).await.unwrap();
    }

    // Scoped lookup: same-scope and unscoped groups participate.
    let found = GroupRepo::find_containing_any(&pool, "u1", &["f1".to_string()], Some("ivA"))
        .await
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|g| g.group_id.as_str()).collect();
    assert!(ids.contains(&"g_scoped"));
    assert!(ids.contains(&"g_global"));
    assert!(!ids.contains(&"g_other"));

    // Unscoped lookup sees everything.
    let found = GroupRepo::find_containing_any(&pool, "u1", &["f1".to_string()], None)
        .await
        .unwrap();
    assert_eq!(found.len(), 3);
}

#[tokio::test]
async fn find_containing_any_empty_input() {
    let pool = memory_pool().await;
    GroupRepo::put(&pool, &group_with_faces("u1", "g1", &["f1"]))
        .await
        .unwrap();
    let found = GroupRepo::find_containing_any(&pool, "u1", &[], None)
        .await
        .unwrap();
    assert!(found.is_empty());
}

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

#[tokio::test]
async fn face_put_get_delete() {
    let pool = memory_pool().await;
    let face = Face::new("u1", "f1", "g1", "file1", Some(bbox(0.1)), Some(0.99));
    FaceRepo::put(&pool, &face).await.unwrap();

    let fetched = FaceRepo::get(&pool, "u1", "f1").await.unwrap().unwrap();
    assert_eq!(fetched.group_id, "g1");
    assert_eq!(fetched.file_id, "file1");
    assert_eq!(fetched.bounding_box.unwrap().0.left, 0.1);

    assert!(FaceRepo::delete(&pool, "u1", "f1").await.unwrap());
    assert!(FaceRepo::get(&pool, "u1", "f1").await.unwrap().is_none());
}

#[tokio::test]
async fn reassign_group_moves_all_faces() {
    let pool = memory_pool().await;
    for face_id in ["f1", "f2"] {
        let face = Face::new("u1", face_id, "g_old", "file1", Some(bbox(0.1)), None);
        FaceRepo::put(&pool, &face).await.unwrap();
    }
    let face = Face::new("u1", "f3", "g_other", "file1", Some(bbox(0.2)), None);
    FaceRepo::put(&pool, &face).await.unwrap();

    let moved = FaceRepo::reassign_group(&pool, "u1", "g_old", "g_new")
        .await
        .unwrap();
    assert_eq!(moved, 2);

    let members = FaceRepo::list_by_group(&pool, "u1", "g_new").await.unwrap();
    assert_eq!(members.len(), 2);
    let untouched = FaceRepo::get(&pool, "u1", "f3").await.unwrap().unwrap();
    assert_eq!(untouched.group_id, "g_other");
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_mapping_merges_entries() {
    let pool = memory_pool().await;
    FileRepo::put(&pool, &MediaFile::new("u1", "file1", Some("http://img/1")))
        .await
        .unwrap();

    let first: BTreeMap<String, String> = [("f1".to_string(), "g1".to_string())].into();
    FileRepo::update_mapping(&pool, "u1", "file1", &first, chrono::Utc::now())
        .await
        .unwrap();

    // A later batch adds a second entry and rewrites the first.
    let second: BTreeMap<String, String> = [
        ("f1".to_string(), "g9".to_string()),
        ("f2".to_string(), "g2".to_string()),
    ]
    .into();
    FileRepo::update_mapping(&pool, "u1", "file1", &second, chrono::Utc::now())
        .await
        .unwrap();

    let file = FileRepo::get(&pool, "u1", "file1").await.unwrap().unwrap();
    assert_eq!(file.face_group_mapping.0.get("f1"), Some(&"g9".to_string()));
    assert_eq!(file.face_group_mapping.0.get("f2"), Some(&"g2".to_string()));
    assert!(file.face_groups_processed_at.is_some());
}

#[tokio::test]
async fn update_mapping_on_missing_file_is_noop() {
    let pool = memory_pool().await;
    let mapping: BTreeMap<String, String> = [("f1".to_string(), "g1".to_string())].into();
    FileRepo::update_mapping(&pool, "u1", "ghost", &mapping, chrono::Utc::now())
        .await
        .unwrap();
    assert!(FileRepo::get(&pool, "u1", "ghost").await.unwrap().is_none());
}

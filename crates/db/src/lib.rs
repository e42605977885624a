//! Store adapter for the face-grouping service.
//!
//! Abstracts the document store behind pool management, schema bootstrap,
//! entity models, and per-entity repositories. Group, face, and file
//! documents are rows keyed by `(user_id, <doc_id>)`; set-valued fields are
//! JSON columns. Every operation is individually atomic at the row level --
//! there are no cross-row transactions, and the engine compensates with its
//! convergence rules.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub mod models;
pub mod repositories;
pub mod schema;

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL, creating the database file
/// if it does not exist yet.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Verify the store is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

//! Pure domain logic for the face-grouping service.
//!
//! This crate has no I/O and no database access: identifier and timestamp
//! aliases, the domain error type, runtime configuration, bounding-box
//! geometry (including the tombstone filter), and the group review state
//! machine. Persistence lives in `facegraph-db`, orchestration in
//! `facegraph-engine`.

pub mod bounding_box;
pub mod config;
pub mod error;
pub mod status;
pub mod types;

pub use error::CoreError;

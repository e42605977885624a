//! The grouping engine: batch ingestion, manual operations, and the
//! convergence reconciler.
//!
//! The engine consumes batches of `(face, matches)` and maintains one
//! invariant above all others: if two faces were ever observed as matching,
//! directly or through any chain of prior merges, they end up in the same
//! group. Persistence goes through the `facegraph-db` store adapter; the
//! recognition backend and the image server are reached through trait
//! objects so the engine can be exercised hermetically.

pub mod engine;
pub mod error;
pub mod input;
pub mod manual;
pub mod probe;
pub mod recognition;
pub mod reconcile;
pub mod resolver;

pub use engine::GroupEngine;
pub use error::{EngineError, EngineResult};
pub use input::{BatchOutcome, FaceInput};

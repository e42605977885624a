use facegraph_core::CoreError;

/// Error type for engine operations.
///
/// Wraps [`CoreError`] for domain conditions and adds the persistence
/// failure mode. Recognition failures never appear here: they are
/// downgraded to an empty match set inside the resolver.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `facegraph-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An underlying store failure. Surfaced to the caller; there is no
    /// partial rollback.
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

//! Error taxonomy for the retrieval core (spec §7).
//!
//! Each variant maps to exactly one error kind from the design: most are
//! surfaced to the caller of the mutating/query operation that produced
//! them, a few are only ever logged and swallowed (see call sites in
//! `retriever.rs`).

use thiserror::Error;

/// Errors produced by the retrieval core.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// `add_image` was given a path that does not exist on disk.
    #[error("input path does not exist: {0}")]
    InputMissing(String),

    /// The external embedder failed to produce a vector for an input.
    #[error("embedding failed: {0}")]
    EmbedFailure(String),

    /// Thumbnail generation failed. Never returned to a caller — always
    /// logged and swallowed, the item is still inserted with `thumbnail: None`.
    #[error("thumbnail generation failed: {0}")]
    ThumbnailFailure(String),

    /// A snapshot write to disk failed after the in-memory state was
    /// already mutated (best-effort durability, spec §7).
    #[error("failed to persist {what} to {path}: {source}")]
    PersistenceFailure {
        /// What was being persisted (e.g. "vector store", "LSH index").
        what: &'static str,
        /// Path the write was attempted against.
        path: String,
        /// Underlying I/O or serialization error.
        #[source]
        source: std::io::Error,
    },

    /// An on-disk snapshot existed but could not be parsed. Never
    /// returned — callers treat this as an empty store/index after logging.
    #[error("snapshot at {path} is corrupt: {reason}")]
    LoadCorruption {
        /// Path of the unreadable snapshot.
        path: String,
        /// Human-readable cause.
        reason: String,
    },

    /// `search` was asked to use `nsw`/`annoy` before the background
    /// rebuild completed. Never returned — the caller silently falls
    /// back to brute force; this variant exists so the fallback can be
    /// logged uniformly with `tracing::warn!(%err, ...)`.
    #[error("index not ready, falling back to brute force: {0}")]
    IndexNotReady(&'static str),

    /// `benchmark_algorithms` was called before the background rebuild
    /// finished. Unlike `IndexNotReady` this one *is* returned to the
    /// caller — there is no fallback for a benchmark, only a refusal.
    #[error("not ready: {0}")]
    NotReady(&'static str),

    /// `BruteForceSearch::new` was constructed with an unrecognized metric name.
    #[error("unknown distance metric: {0}")]
    InvalidMetric(String),

    /// `benchmark_algorithms` was asked for more queries than the store holds.
    #[error("not enough data: store has {have} items, {want} queries requested")]
    NotEnoughData {
        /// Number of items actually in the store.
        have: usize,
        /// Number of queries requested.
        want: usize,
    },

    /// Two vectors (or a vector and a store) of mismatched dimension were
    /// compared. This is a precondition violation (spec §7) and is only
    /// raised from paths that cannot reasonably recover.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension the store/index was constructed with.
        expected: usize,
        /// Dimension of the offending vector.
        got: usize,
    },
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, RetrievalError>;

//! The embedding producer is an external collaborator (spec §1, §6): a
//! frozen image-to-vector feature extractor, `embed(path) -> vector[D]`.
//! The core never implements it — it only defines the contract so that
//! [`crate::retriever::Retriever`] can be generic over whatever embedder
//! the caller plugs in (a real model, a test double, a cached lookup).

use crate::error::Result;

/// Produces a fixed-dimension embedding for an image at `path`.
///
/// Implementations own whatever model state they need; the core only
/// requires that `dim()` matches the dimension the store was opened
/// with, and that `embed` surfaces failures as
/// [`crate::error::RetrievalError::EmbedFailure`].
pub trait Embedder: Send + Sync {
    /// The dimension of every vector this embedder produces.
    fn dim(&self) -> usize;

    /// Embeds the image at `path`. Failures are wrapped as `EmbedFailure`
    /// by the caller if the implementation doesn't already do so.
    fn embed(&self, path: &str) -> Result<Vec<f32>>;
}

/// Thumbnails are opaque, base64-encoded bytes to the core (spec §1) —
/// this is the matching opaque collaborator for producing them.
/// [`crate::retriever::Retriever`] treats a missing generator, or one that
/// fails, as "no thumbnail" rather than an error (spec §4.7, §7
/// `ThumbnailFailure`).
pub trait ThumbnailGenerator: Send + Sync {
    /// Produces raw thumbnail bytes for the image at `path`.
    fn thumbnail(&self, path: &str) -> Result<Vec<u8>>;
}

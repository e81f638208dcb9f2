//! Vector retrieval core for a content-based image retrieval system:
//! distance kernels, a persistent id -> (vector, metadata) store, four
//! interchangeable k-NN search engines (exact brute force, LSH, NSW,
//! Annoy), and a `Retriever` that orchestrates all of them behind a
//! background-rebuild + readiness protocol.
//!
//! This crate does not implement the embedding model, the GUI, the bulk
//! numeric-array importer, or the visualization path — those are external
//! collaborators. See [`embedder::Embedder`] and
//! [`embedder::ThumbnailGenerator`] for the two pluggable contracts.

pub mod distance;
pub mod embedder;
pub mod error;
pub mod index;
pub mod retriever;
pub mod store;

pub use distance::Metric;
pub use embedder::{Embedder, ThumbnailGenerator};
pub use error::{RetrievalError, Result};
pub use index::SearchMethod;
pub use retriever::{IndexParams, Retriever, ScoredItem};
pub use store::{ItemId, Metadata, MetadataPatch, VectorStore};

//! A stand-in for the real feature extractor (spec §1: "the embedding
//! producer ... [is] an opaque function `embed(path) -> vector` of known
//! dimension", out of scope for the core). This binary has no model to
//! load, so it derives a deterministic pseudo-embedding from the file's
//! bytes — same vector every time for the same file, different files
//! land in different places, which is enough to exercise every
//! `Retriever` code path without a real model dependency.

use std::io::Read;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use retrieval_core::error::{RetrievalError, Result};
use retrieval_core::Embedder;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, path: &str) -> Result<Vec<f32>> {
        let mut file = std::fs::File::open(path).map_err(|err| RetrievalError::EmbedFailure(err.to_string()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| RetrievalError::EmbedFailure(err.to_string()))?;

        let seed = fnv1a(&bytes);
        let mut rng = StdRng::seed_from_u64(seed);
        Ok((0..self.dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_file_embeds_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"hello world").unwrap();
        let path = path.to_string_lossy().into_owned();

        let embedder = HashEmbedder::new(16);
        let a = embedder.embed(&path).unwrap();
        let b = embedder.embed(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn different_files_embed_differently() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("a.jpg");
        let p2 = dir.path().join("b.jpg");
        std::fs::write(&p1, b"hello").unwrap();
        std::fs::write(&p2, b"world").unwrap();

        let embedder = HashEmbedder::new(16);
        let a = embedder.embed(&p1.to_string_lossy()).unwrap();
        let b = embedder.embed(&p2.to_string_lossy()).unwrap();
        assert_ne!(a, b);
    }
}

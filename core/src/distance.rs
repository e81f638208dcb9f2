//! Pure distance kernels over equal-length vectors (spec §4.1).
//!
//! All four are scalar, allocation-free, and defined only for vectors of
//! identical length — callers that might cross stores of different
//! dimension must check that themselves; these functions `debug_assert!`
//! the precondition rather than returning a `Result`, matching how the
//! teacher's hot-path functions treat dimension as an invariant (see
//! `AbkveInner::add`/`search` in the reference implementation).

use crate::error::{RetrievalError, Result};

/// A named distance metric, selectable on [`crate::index::brute_force::BruteForceSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// `sqrt(sum((a_i - b_i)^2))`
    Euclidean,
    /// `1 - cosine_similarity(a, b)`; `1` if either vector has zero norm.
    Cosine,
    /// `sum(|a_i - b_i|)`
    Manhattan,
    /// `-dot(a, b)`, so that smaller is still closer.
    Dot,
}

impl Metric {
    /// Parses the metric names used throughout the spec and original
    /// prototype (`"euclidean"`, `"cosine"`, `"manhattan"`, `"dot"`).
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            "manhattan" => Ok(Self::Manhattan),
            "dot" => Ok(Self::Dot),
            other => Err(RetrievalError::InvalidMetric(other.to_string())),
        }
    }

    /// Computes the distance under this metric.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => euclidean(a, b),
            Self::Cosine => cosine(a, b),
            Self::Manhattan => manhattan(a, b),
            Self::Dot => dot(a, b),
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::Euclidean
    }
}

/// `sqrt(sum((a_i - b_i)^2))`
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "euclidean: dimension mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// `1 - (a . b) / (||a|| * ||b||)`. Defined as `1` when either norm is zero.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine: dimension mismatch");
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot_ab: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot_ab / (norm_a * norm_b)
}

/// `sum(|a_i - b_i|)`
pub fn manhattan(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "manhattan: dimension mismatch");
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// `-(a . b)`, negated so that smaller is closer, matching the other metrics.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "dot: dimension mismatch");
    -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>()
}

/// L2 norm, shared by `cosine` and the approximate indexes.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

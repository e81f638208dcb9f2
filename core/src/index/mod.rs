//! Approximate and exact nearest-neighbor engines (spec §4.3–§4.6).
//!
//! Per spec §9 ("Heterogeneous indexes behind one dispatcher"), the four
//! engines are **not** forced behind a single object-safe trait — their
//! capabilities genuinely differ (LSH and brute force re-score against a
//! vector map the caller supplies; NSW and Annoy keep their own copy and
//! support only `build`/`clear`/`query`). [`Retriever`](crate::retriever::Retriever)
//! instead selects among them with the tagged [`SearchMethod`] enum.

pub mod annoy;
pub mod brute_force;
pub mod lsh;
pub mod nsw;

/// Which engine a search should use (spec §6, §7: unknown methods default
/// to brute force).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// Exact scan (spec §4.3).
    BruteForce,
    /// Multi-table random-hyperplane hashing (spec §4.4).
    Lsh,
    /// Navigable small-world graph (spec §4.5).
    Nsw,
    /// Random-projection forest (spec §4.6).
    Annoy,
}

impl SearchMethod {
    /// Parses a method name; anything unrecognized defaults to brute force.
    pub fn parse(name: &str) -> Self {
        match name {
            "lsh" => Self::Lsh,
            "nsw" => Self::Nsw,
            "annoy" => Self::Annoy,
            _ => Self::BruteForce,
        }
    }
}

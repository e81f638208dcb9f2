//! Navigable small-world graph (spec §4.5).
//!
//! The beam-search candidate/result bookkeeping follows the
//! `BinaryHeap<Reverse<Candidate>>` idiom used for graph ANN search
//! elsewhere in the ecosystem (a min-heap of candidates to expand, a
//! max-heap capped at `ef` for the current best results) rather than the
//! original prototype's two parallel negated-key heaps.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use parking_lot::RwLock;
use rand::seq::SliceRandom;

use crate::distance::euclidean;
use crate::store::ItemId;

#[derive(Debug, Clone)]
struct Candidate {
    distance: f32,
    id: ItemId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.id == other.id
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

struct State {
    vectors: HashMap<ItemId, Vec<f32>>,
    adjacency: HashMap<ItemId, Vec<ItemId>>,
    enter_point: Option<ItemId>,
}

/// In-memory, incrementally-built navigable small-world graph (spec §4.5).
pub struct NswIndex {
    m: usize,
    ef_construction: usize,
    state: RwLock<State>,
}

impl NswIndex {
    /// Creates an empty graph with out-degree target `m` and construction
    /// beam width `ef_construction`.
    pub fn new(m: usize, ef_construction: usize) -> Self {
        Self {
            m,
            ef_construction,
            state: RwLock::new(State {
                vectors: HashMap::new(),
                adjacency: HashMap::new(),
                enter_point: None,
            }),
        }
    }

    /// Rebuilds the graph from scratch: shuffles `vectors`' ids and
    /// reinserts them one by one so the entry point is insensitive to
    /// the caller's iteration order (spec §4.5 Public operations).
    pub fn build(&self, vectors: &HashMap<ItemId, Vec<f32>>) {
        let mut state = self.state.write();
        state.vectors = vectors.clone();
        state.adjacency.clear();
        state.enter_point = None;

        let mut ids: Vec<ItemId> = vectors.keys().cloned().collect();
        ids.shuffle(&mut rand::thread_rng());
        for id in ids {
            insert_locked(&mut state, self.m, self.ef_construction, id);
        }
    }

    /// Records `vector` and inserts `id` into the graph (spec §4.5
    /// Public operations).
    pub fn add_item(&self, id: ItemId, vector: Vec<f32>) {
        let mut state = self.state.write();
        state.vectors.insert(id.clone(), vector);
        insert_locked(&mut state, self.m, self.ef_construction, id);
    }

    /// Beam search for the `k` nearest neighbors of `query`, with beam
    /// width `ef` (spec §4.5 Search). Returns an empty list against an
    /// empty graph.
    pub fn query(&self, query: &[f32], k: usize, ef: usize) -> Vec<(ItemId, f32)> {
        let state = self.state.read();
        search_internal(&state, query, k, ef)
    }

    /// Empties the graph and clears the entry point.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.vectors.clear();
        state.adjacency.clear();
        state.enter_point = None;
    }
}

fn insert_locked(state: &mut State, m: usize, ef_construction: usize, new_id: ItemId) {
    if state.enter_point.is_none() {
        state.adjacency.insert(new_id.clone(), Vec::new());
        state.enter_point = Some(new_id);
        return;
    }

    let query = state.vectors[&new_id].clone();
    let candidates = search_internal(state, &query, m, ef_construction);
    let neighbors: Vec<ItemId> = candidates.into_iter().map(|(id, _)| id).collect();

    state.adjacency.insert(new_id.clone(), neighbors.clone());
    for neighbor in &neighbors {
        if let Some(adj) = state.adjacency.get_mut(neighbor) {
            adj.push(new_id.clone());
            if adj.len() > m * 2 {
                prune(state, neighbor, m);
            }
        }
    }
}

/// Keeps only `m` closest neighbors of `node_id`, dropping the rest. Edges
/// are not removed from the dropped side — the graph is allowed to be
/// locally asymmetric after a prune (spec §4.5, P5).
fn prune(state: &mut State, node_id: &ItemId, m: usize) {
    let Some(node_vec) = state.vectors.get(node_id).cloned() else {
        return;
    };
    let neighbors = state.adjacency.get(node_id).cloned().unwrap_or_default();
    let mut scored: Vec<(f32, ItemId)> = neighbors
        .into_iter()
        .filter_map(|n| state.vectors.get(&n).map(|v| (euclidean(&node_vec, v), n)))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(m);
    state.adjacency.insert(node_id.clone(), scored.into_iter().map(|(_, n)| n).collect());
}

fn search_internal(state: &State, query: &[f32], k: usize, ef: usize) -> Vec<(ItemId, f32)> {
    let Some(enter_point) = &state.enter_point else {
        return Vec::new();
    };
    let Some(enter_vec) = state.vectors.get(enter_point) else {
        return Vec::new();
    };

    let start_dist = euclidean(query, enter_vec);
    let mut to_expand: BinaryHeap<std::cmp::Reverse<Candidate>> = BinaryHeap::new();
    to_expand.push(std::cmp::Reverse(Candidate {
        distance: start_dist,
        id: enter_point.clone(),
    }));

    let mut results: BinaryHeap<Candidate> = BinaryHeap::new();
    results.push(Candidate {
        distance: start_dist,
        id: enter_point.clone(),
    });

    let mut visited: HashSet<ItemId> = HashSet::new();
    visited.insert(enter_point.clone());

    while let Some(std::cmp::Reverse(current)) = to_expand.pop() {
        let worst = results.peek().map(|c| c.distance).unwrap_or(f32::INFINITY);
        if current.distance > worst && results.len() >= ef {
            break;
        }

        let neighbors = state.adjacency.get(&current.id).cloned().unwrap_or_default();
        for neighbor in neighbors {
            if visited.contains(&neighbor) {
                continue;
            }
            visited.insert(neighbor.clone());
            let Some(vec) = state.vectors.get(&neighbor) else {
                continue;
            };
            let dist = euclidean(query, vec);
            let worst = results.peek().map(|c| c.distance).unwrap_or(f32::INFINITY);
            if dist < worst || results.len() < ef {
                to_expand.push(std::cmp::Reverse(Candidate {
                    distance: dist,
                    id: neighbor.clone(),
                }));
                results.push(Candidate {
                    distance: dist,
                    id: neighbor,
                });
                if results.len() > ef {
                    results.pop();
                }
            }
        }
    }

    let mut final_results: Vec<(ItemId, f32)> = results.into_iter().map(|c| (c.id, c.distance)).collect();
    final_results.sort_by(|a, b| a.1.total_cmp(&b.1));
    final_results.truncate(k);
    final_results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(n: usize, dim: usize) -> HashMap<ItemId, Vec<f32>> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| (ItemId::new(), (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect()))
            .collect()
    }

    #[test]
    fn empty_graph_query_is_empty() {
        let nsw = NswIndex::new(16, 50);
        assert!(nsw.query(&[1.0, 0.0], 5, 20).is_empty());
    }

    #[test]
    fn single_item_graph_returns_itself() {
        let nsw = NswIndex::new(16, 50);
        let id = ItemId::new();
        nsw.add_item(id.clone(), vec![1.0, 0.0, 0.0]);
        let results = nsw.query(&[1.0, 0.0, 0.0], 1, 20);
        assert_eq!(results[0].0, id);
        assert!(results[0].1.abs() < 1e-6);
    }

    #[test]
    fn clear_empties_graph() {
        let nsw = NswIndex::new(16, 50);
        nsw.build(&vectors(20, 8));
        nsw.clear();
        assert!(nsw.query(&[0.0; 8], 5, 20).is_empty());
    }

    #[test]
    fn p5_adjacency_symmetric_modulo_pruning() {
        let nsw = NswIndex::new(4, 20);
        let store = vectors(60, 8);
        nsw.build(&store);

        let state = nsw.state.read();
        for (id, neighbors) in &state.adjacency {
            for n in neighbors {
                let Some(back) = state.adjacency.get(n) else { continue };
                // Either the edge is mirrored, or `n` was pruned down to
                // degree <= m (so it may have dropped the back-edge).
                assert!(
                    back.contains(id) || back.len() <= nsw.m,
                    "edge {id} -> {n} has no mirror and {n} was not pruned"
                );
            }
        }
    }

    #[test]
    fn degree_never_exceeds_two_m_before_prune_settles() {
        let nsw = NswIndex::new(4, 20);
        nsw.build(&vectors(100, 8));
        let state = nsw.state.read();
        for neighbors in state.adjacency.values() {
            assert!(neighbors.len() <= nsw.m * 2 + 1, "degree blew past the prune bound");
        }
    }
}

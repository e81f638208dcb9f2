//! Forest of random-projection binary trees (spec §4.6).

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::distance::{euclidean, l2_norm};
use crate::store::ItemId;

enum Node {
    Leaf {
        bucket: Vec<ItemId>,
    },
    Split {
        /// Unit hyperplane normal of length D.
        normal: Vec<f32>,
        offset: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn descend(&self, q: &[f32], out: &mut HashSet<ItemId>) {
        match self {
            Node::Leaf { bucket } => out.extend(bucket.iter().cloned()),
            Node::Split { normal, offset, left, right } => {
                let score: f32 = normal.iter().zip(q).map(|(n, x)| n * x).sum::<f32>() + offset;
                if score > 0.0 {
                    right.descend(q, out);
                } else {
                    left.descend(q, out);
                }
            }
        }
    }
}

struct State {
    vectors: HashMap<ItemId, Vec<f32>>,
    roots: Vec<Node>,
}

/// Forest of `num_trees` random-projection trees, rebuilt wholesale on
/// every mutation that invalidates it (spec §4.6).
pub struct AnnoyIndex {
    num_trees: usize,
    max_leaf_size: usize,
    state: RwLock<State>,
}

impl AnnoyIndex {
    /// Creates an empty forest. `max_leaf_size` defaults to 15 per spec §4.6.
    pub fn new(num_trees: usize, max_leaf_size: usize) -> Self {
        Self {
            num_trees,
            max_leaf_size,
            state: RwLock::new(State {
                vectors: HashMap::new(),
                roots: Vec::new(),
            }),
        }
    }

    /// Builds `num_trees` independent trees over `vectors`, each with a
    /// fresh random pivot-pair selection (spec §4.6 Forest construction).
    /// Annoy has no incremental insert — this is the only way to populate it.
    pub fn build(&self, vectors: &HashMap<ItemId, Vec<f32>>) {
        let mut state = self.state.write();
        state.vectors = vectors.clone();
        let ids: Vec<ItemId> = vectors.keys().cloned().collect();

        let mut rng = rand::thread_rng();
        state.roots = (0..self.num_trees)
            .map(|_| build_tree(&state.vectors, &ids, self.max_leaf_size, &mut rng))
            .collect();
    }

    /// Descends every tree once, accumulates leaf buckets into a
    /// candidate set, then exactly rescores with euclidean distance
    /// against the vectors held at build time, skipping ids the caller's
    /// store may have since dropped (spec §4.6 Query).
    pub fn query(&self, query: &[f32], k: usize) -> Vec<(ItemId, f32)> {
        let state = self.state.read();
        let mut candidates: HashSet<ItemId> = HashSet::new();
        for root in &state.roots {
            root.descend(query, &mut candidates);
        }

        let mut scored: Vec<(ItemId, f32)> = candidates
            .into_iter()
            .filter_map(|id| state.vectors.get(&id).map(|v| (id, euclidean(query, v))))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        scored
    }

    /// Empties the forest.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.vectors.clear();
        state.roots.clear();
    }

    /// True if the forest has never been built (or was cleared).
    pub fn is_empty(&self) -> bool {
        self.state.read().roots.is_empty()
    }
}

fn build_tree(vectors: &HashMap<ItemId, Vec<f32>>, indices: &[ItemId], max_leaf_size: usize, rng: &mut impl Rng) -> Node {
    if indices.len() <= max_leaf_size {
        return Node::Leaf { bucket: indices.to_vec() };
    }
    if indices.len() < 2 {
        return Node::Leaf { bucket: indices.to_vec() };
    }

    let mut pair: Vec<&ItemId> = indices.iter().collect();
    pair.shuffle(rng);
    let id1 = pair[0];
    let id2 = pair[1];
    let v1 = &vectors[id1];
    let v2 = &vectors[id2];

    let mut normal: Vec<f32> = v1.iter().zip(v2).map(|(a, b)| a - b).collect();
    let norm_len = l2_norm(&normal);
    if norm_len == 0.0 {
        normal = (0..v1.len()).map(|_| StandardNormal.sample(rng)).collect();
    } else {
        for x in &mut normal {
            *x /= norm_len;
        }
    }

    let midpoint: Vec<f32> = v1.iter().zip(v2).map(|(a, b)| (a + b) / 2.0).collect();
    let offset = -normal.iter().zip(&midpoint).map(|(n, m)| n * m).sum::<f32>();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for idx in indices {
        let v = &vectors[idx];
        let score: f32 = normal.iter().zip(v).map(|(n, x)| n * x).sum::<f32>() + offset;
        if score > 0.0 {
            right.push(idx.clone());
        } else {
            left.push(idx.clone());
        }
    }

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { bucket: indices.to_vec() };
    }

    Node::Split {
        normal,
        offset,
        left: Box::new(build_tree(vectors, &left, max_leaf_size, rng)),
        right: Box::new(build_tree(vectors, &right, max_leaf_size, rng)),
    }
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
    fn empty_forest_query_is_empty() {
        let annoy = AnnoyIndex::new(10, 15);
        assert!(annoy.query(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn p6_query_size_bounded_and_reachable() {
        let annoy = AnnoyIndex::new(8, 15);
        let store = vectors(200, 16);
        annoy.build(&store);

        let (_, q) = store.iter().next().unwrap();
        let results = annoy.query(q, 10);
        assert!(results.len() <= 10);
        for (id, _) in &results {
            assert!(store.contains_key(id));
        }
    }

    #[test]
    fn clear_empties_forest() {
        let annoy = AnnoyIndex::new(5, 15);
        annoy.build(&vectors(30, 8));
        assert!(!annoy.is_empty());
        annoy.clear();
        assert!(annoy.is_empty());
        assert!(annoy.query(&[0.0; 8], 5).is_empty());
    }

    #[test]
    fn small_store_degenerates_to_single_leaf_without_panicking() {
        let annoy = AnnoyIndex::new(4, 15);
        annoy.build(&vectors(1, 8));
        let results = annoy.query(&[0.0; 8], 5);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn duplicate_vectors_do_not_infinite_recurse() {
        let mut store = HashMap::new();
        for _ in 0..50 {
            store.insert(ItemId::new(), vec![1.0, 0.0, 0.0, 0.0]);
        }
        let annoy = AnnoyIndex::new(4, 15);
        annoy.build(&store);
        let results = annoy.query(&[1.0, 0.0, 0.0, 0.0], 10);
        assert!(!results.is_empty());
    }
}

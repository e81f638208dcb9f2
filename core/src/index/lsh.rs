//! Multi-table random-hyperplane hash index (spec §4.4).
//!
//! Ported from the original prototype's `lsh.lsh.LSH` +
//! `lsh.hash_functions.RandomHyperplaneHash`, but — unlike the Python
//! version's single re-entrant `threading.RLock` used both by `index()`
//! and by the `add_vector()` it calls internally — the locked region
//! here never recurses: `index()` takes the write lock once and mutates
//! the tables directly instead of calling the public, self-locking
//! `add_vector`. `parking_lot::RwLock` is not re-entrant, so this
//! restructuring is what buys the same "rebuild holds the lock for its
//! whole duration" guarantee without a deadlock.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::distance::euclidean;
use crate::error::Result;
use crate::store::ItemId;

/// Bucket key: the `H`-bit sign pattern of a vector projected through one
/// table's hyperplanes.
type Signature = Vec<bool>;

#[derive(Serialize, Deserialize, Clone)]
struct Planes {
    dim: usize,
    num_bits: usize,
    /// Row-major `num_bits x dim` matrix.
    values: Vec<f32>,
}

impl Planes {
    fn sample(dim: usize, num_bits: usize, rng: &mut impl rand::Rng) -> Self {
        let values = (0..num_bits * dim)
            .map(|_| StandardNormal.sample(rng))
            .collect();
        Self { dim, num_bits, values }
    }

    fn signature(&self, v: &[f32]) -> Signature {
        (0..self.num_bits)
            .map(|bit| {
                let row = &self.values[bit * self.dim..(bit + 1) * self.dim];
                let projection: f32 = row.iter().zip(v).map(|(p, x)| p * x).sum();
                projection > 0.0
            })
            .collect()
    }
}

type BucketMap = HashMap<Signature, Vec<ItemId>>;

struct State {
    planes: Vec<Planes>,
    tables: Vec<BucketMap>,
}

/// Persistent multi-table LSH index (spec §4.4).
pub struct LshIndex {
    dim: usize,
    num_bits: usize,
    num_tables: usize,
    persistence_prefix: PathBuf,
    state: RwLock<State>,
}

impl LshIndex {
    /// Opens the index at `persistence_prefix`, loading persisted planes
    /// and buckets if present, otherwise sampling fresh hyperplanes
    /// (spec §4.4 Construction).
    pub fn open(dim: usize, num_bits: usize, num_tables: usize, persistence_prefix: impl Into<PathBuf>) -> Self {
        let persistence_prefix = persistence_prefix.into();
        let state = match load_state(&persistence_prefix, num_tables) {
            Ok(Some(state)) => {
                tracing::info!(prefix = %persistence_prefix.display(), "LSH index loaded from disk");
                state
            }
            Ok(None) => fresh_state(dim, num_bits, num_tables),
            Err(err) => {
                tracing::warn!(prefix = %persistence_prefix.display(), %err, "LSH snapshot corrupt, reinitializing");
                fresh_state(dim, num_bits, num_tables)
            }
        };
        Self {
            dim,
            num_bits,
            num_tables,
            persistence_prefix,
            state: RwLock::new(state),
        }
    }

    /// True if every table's bucket map is empty (used at startup to
    /// decide cold-start vs. warm-restart rebuilds, spec §4.7).
    pub fn is_empty(&self) -> bool {
        self.state.read().tables.iter().all(|t| t.is_empty())
    }

    /// Rebuilds all tables from scratch against `vectors`, then persists
    /// (spec §4.4 Index).
    pub fn index(&self, vectors: &HashMap<ItemId, Vec<f32>>) -> Result<()> {
        {
            let mut state = self.state.write();
            for table in &mut state.tables {
                table.clear();
            }
            for (id, vec) in vectors {
                insert_locked(&mut state, id, vec);
            }
        }
        self.save()
    }

    /// Adds a single vector to every table without clearing existing
    /// buckets (spec §4.4 Index, incremental path).
    pub fn add_vector(&self, id: &ItemId, vector: &[f32]) {
        let mut state = self.state.write();
        insert_locked(&mut state, id, vector);
    }

    /// Computes the signature of `query` in every table, unions the
    /// matching buckets, re-scores the candidates with exact euclidean
    /// distance against `vectors`, and returns the `k` closest. A bucket
    /// entry whose id is no longer in `vectors` is skipped silently
    /// (spec §4.4 Query, P4).
    pub fn query(&self, query: &[f32], vectors: &HashMap<ItemId, Vec<f32>>, k: usize) -> Vec<(ItemId, f32)> {
        let state = self.state.read();
        let mut candidates: std::collections::HashSet<&ItemId> = std::collections::HashSet::new();
        for (planes, table) in state.planes.iter().zip(&state.tables) {
            let sig = planes.signature(query);
            if let Some(bucket) = table.get(&sig) {
                candidates.extend(bucket.iter());
            }
        }

        let mut scored: Vec<(ItemId, f32)> = candidates
            .into_iter()
            .filter_map(|id| vectors.get(id).map(|v| (id.clone(), euclidean(query, v))))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        scored
    }

    /// Empties every table's buckets and persists (spec §4.4).
    pub fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            for table in &mut state.tables {
                table.clear();
            }
        }
        self.save()
    }

    /// Writes the bucket maps as one artifact, plus one plane-matrix file
    /// per table (spec §4.4 Persistence, §6).
    pub fn save(&self) -> Result<()> {
        let state = self.state.read();
        save_state(&self.persistence_prefix, &state).map_err(|source| {
            crate::error::RetrievalError::PersistenceFailure {
                what: "LSH index",
                path: self.persistence_prefix.display().to_string(),
                source,
            }
        })
    }
}

fn insert_locked(state: &mut State, id: &ItemId, vector: &[f32]) {
    for (planes, table) in state.planes.iter().zip(&mut state.tables) {
        let sig = planes.signature(vector);
        table.entry(sig).or_default().push(id.clone());
    }
}

fn fresh_state(dim: usize, num_bits: usize, num_tables: usize) -> State {
    let mut rng = rand::thread_rng();
    let planes = (0..num_tables).map(|_| Planes::sample(dim, num_bits, &mut rng)).collect();
    let tables = (0..num_tables).map(|_| BucketMap::new()).collect();
    State { planes, tables }
}

fn tables_path(prefix: &Path) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push("_tables.bin");
    PathBuf::from(p)
}

fn planes_path(prefix: &Path, table: usize) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push(format!("_planes_{table}.bin"));
    PathBuf::from(p)
}

fn load_state(prefix: &Path, num_tables: usize) -> std::io::Result<Option<State>> {
    let tables_file = tables_path(prefix);
    if !tables_file.exists() {
        return Ok(None);
    }
    let tables: Vec<BucketMap> = bincode::deserialize_from(BufReader::new(File::open(&tables_file)?))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut planes = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let path = planes_path(prefix, i);
        let file = File::open(&path)?;
        let p: Planes = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        planes.push(p);
    }
    Ok(Some(State { planes, tables }))
}

fn save_state(prefix: &Path, state: &State) -> std::io::Result<()> {
    if let Some(parent) = prefix.parent() {
        fs::create_dir_all(parent)?;
    }
    let tables_file = File::create(tables_path(prefix))?;
    bincode::serialize_into(BufWriter::new(tables_file), &state.tables)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    for (i, planes) in state.planes.iter().enumerate() {
        let file = File::create(planes_path(prefix, i))?;
        bincode::serialize_into(BufWriter::new(file), planes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }
    Ok(())
}

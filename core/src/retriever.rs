//! Orchestrator: embed -> query -> enrich, owning the store, all four
//! search engines, and the background rebuild / readiness protocol (spec
//! §4.7, §5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;

use crate::embedder::{Embedder, ThumbnailGenerator};
use crate::error::{RetrievalError, Result};
use crate::index::annoy::AnnoyIndex;
use crate::index::brute_force::BruteForceSearch;
use crate::index::lsh::LshIndex;
use crate::index::nsw::NswIndex;
use crate::index::SearchMethod;
use crate::store::{ItemId, Metadata, MetadataPatch, VectorStore};

/// Tuning knobs for the three approximate engines. Defaults match spec
/// §4.4–§4.6's reference configuration (`H=6, T=4`, NSW `M=16,
/// ef_construction=100`, Annoy 15 trees per the original prototype's
/// `crud.py`, `max_leaf_size=15`).
#[derive(Debug, Clone, Copy)]
pub struct IndexParams {
    pub lsh_num_bits: usize,
    pub lsh_num_tables: usize,
    pub nsw_m: usize,
    pub nsw_ef_construction: usize,
    pub nsw_ef_search: usize,
    pub annoy_num_trees: usize,
    pub annoy_max_leaf_size: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            lsh_num_bits: 6,
            lsh_num_tables: 4,
            nsw_m: 16,
            nsw_ef_construction: 100,
            nsw_ef_search: 50,
            annoy_num_trees: 15,
            annoy_max_leaf_size: 15,
        }
    }
}

/// One search hit enriched with the metadata a caller needs to render a
/// result row (spec §6 Retriever surface).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub id: ItemId,
    pub score: f32,
    pub path: String,
    pub category: String,
    pub thumbnail: Option<String>,
}

struct Engines {
    brute_force: BruteForceSearch,
    lsh: LshIndex,
    nsw: NswIndex,
    annoy: AnnoyIndex,
}

/// Orchestrates the embedder, the store, and the four search engines
/// behind a single coarse lock, plus a background rebuild task and a
/// ready-flag (spec §4.7, §5).
pub struct Retriever<E: Embedder> {
    embedder: E,
    thumbnailer: Option<Arc<dyn ThumbnailGenerator>>,
    store: VectorStore,
    engines: Engines,
    /// Serializes any operation that spans store + index state: insert,
    /// delete, reset, benchmark, and the background rebuild (spec §5).
    /// `parking_lot::Mutex` is not reentrant, so — unlike the original
    /// prototype's single `threading.RLock` — every holder takes this
    /// once and never calls another lock-taking method while holding it.
    lock: Mutex<()>,
    status: RwLock<String>,
    ready: AtomicBool,
    nsw_ef_search: usize,
}

impl<E: Embedder + 'static> Retriever<E> {
    /// Opens the store and LSH index from disk, constructs empty NSW/Annoy
    /// graphs, and spawns the background rebuild task (spec §4.7 Startup).
    /// Returns an `Arc` because the background task needs a handle back
    /// into `self`.
    pub fn open(
        embedder: E,
        vector_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
        lsh_prefix: impl Into<PathBuf>,
        params: IndexParams,
    ) -> Arc<Self> {
        Self::open_with_thumbnailer(embedder, None, vector_path, meta_path, lsh_prefix, params)
    }

    /// Same as [`Self::open`] with an optional thumbnail generator plugged in.
    pub fn open_with_thumbnailer(
        embedder: E,
        thumbnailer: Option<Arc<dyn ThumbnailGenerator>>,
        vector_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
        lsh_prefix: impl Into<PathBuf>,
        params: IndexParams,
    ) -> Arc<Self> {
        let status = RwLock::new("Initializing…".to_string());
        let store = VectorStore::open(vector_path, meta_path);

        *status.write() = "Loading LSH…".to_string();
        let dim = embedder.dim();
        let lsh = LshIndex::open(dim, params.lsh_num_bits, params.lsh_num_tables, lsh_prefix);

        let retriever = Arc::new(Self {
            embedder,
            thumbnailer,
            store,
            engines: Engines {
                brute_force: BruteForceSearch::default_metric(),
                lsh,
                nsw: NswIndex::new(params.nsw_m, params.nsw_ef_construction),
                annoy: AnnoyIndex::new(params.annoy_num_trees, params.annoy_max_leaf_size),
            },
            lock: Mutex::new(()),
            status,
            ready: AtomicBool::new(false),
            nsw_ef_search: params.nsw_ef_search,
        });

        retriever.spawn_background_rebuild();
        retriever
    }

    fn spawn_background_rebuild(self: &Arc<Self>) {
        let this = Arc::clone(self);
        std::thread::spawn(move || {
            let _guard = this.lock.lock();

            let vectors = this.store.get_all_vectors();
            let cold_start = !vectors.is_empty() && this.engines.lsh.is_empty();

            if cold_start {
                *this.status.write() = "Indexing…".to_string();
                if let Err(err) = this.engines.lsh.index(&vectors) {
                    tracing::error!(%err, "LSH rebuild failed during cold start");
                }
            }

            *this.status.write() = "Building Graphs…".to_string();
            this.engines.nsw.build(&vectors);
            this.engines.annoy.build(&vectors);

            *this.status.write() = "Ready".to_string();
            this.ready.store(true, Ordering::Release);
            tracing::info!(items = vectors.len(), "background rebuild complete");
        });
    }

    /// Borrows the embedder this retriever was opened with.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Current human-readable status string (spec §4.7 Startup, §6).
    pub fn indexing_status(&self) -> String {
        self.status.read().clone()
    }

    /// True once the background rebuild has populated NSW and Annoy (spec §5).
    pub fn indexes_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Blocks the calling thread, polling [`Self::indexes_ready`], until
    /// either it is true or `timeout` elapses. Not part of spec.md's
    /// Retriever surface — a convenience for tests and the `cli` binary,
    /// which otherwise have no way to wait on a background task that
    /// communicates only via the ready-flag (spec §9 Background rebuild).
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while !self.indexes_ready() {
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// Embeds `path`, mints a fresh id, inserts into the store, adds to
    /// LSH and NSW, and persists store + LSH. Annoy is left stale (spec
    /// §4.7 — it is only rebuilt by `import_batch`/`delete_image`/explicit
    /// refresh). `InputMissing`/`EmbedFailure` are logged and yield
    /// `Ok(None)` rather than propagating (spec §7); a persistence
    /// failure does propagate, since the mutation has already landed in
    /// memory by then.
    pub fn add_image(&self, path: &str, category: Option<&str>) -> Result<Option<ItemId>> {
        if !std::path::Path::new(path).exists() {
            tracing::warn!(path, "add_image: input path does not exist");
            return Ok(None);
        }

        let vector = match self.embedder.embed(path) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(path, %err, "add_image: embedding failed");
                return Ok(None);
            }
        };

        let thumbnail = self.thumbnailer.as_ref().and_then(|gen| match gen.thumbnail(path) {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(err) => {
                tracing::warn!(path, %err, "add_image: thumbnail generation failed, continuing without one");
                None
            }
        });

        let _guard = self.lock.lock();
        let id = ItemId::new();
        let filename = file_name_of(path);
        let mut meta = Metadata::new(path, filename);
        if let Some(category) = category {
            meta.category = category.to_string();
        }
        meta.thumbnail = thumbnail;

        self.store.insert(id.clone(), vector.clone(), meta);
        self.store.save()?;

        self.engines.lsh.add_vector(&id, &vector);
        self.engines.lsh.save()?;

        self.engines.nsw.add_item(id.clone(), vector);

        Ok(Some(id))
    }

    /// Synchronous bulk insert: assigns fresh ids, writes every record,
    /// persists the store once, then fully rebuilds all three approximate
    /// indexes (spec §4.7). Not concurrent with searches — the caller
    /// must gate that itself.
    pub fn import_batch(
        &self,
        vectors: Vec<Vec<f32>>,
        paths: Vec<String>,
        categories: Vec<Option<String>>,
        thumbnails: Option<Vec<Option<String>>>,
    ) -> Result<Vec<ItemId>> {
        let _guard = self.lock.lock();
        let n = vectors.len();
        let mut ids = Vec::with_capacity(n);

        for (i, vector) in vectors.into_iter().enumerate() {
            let id = ItemId::new();
            let path = paths.get(i).cloned().unwrap_or_default();
            let filename = file_name_of(&path);
            let mut meta = Metadata::new(path, filename);
            if let Some(category) = categories.get(i).cloned().flatten() {
                meta.category = category;
            }
            if let Some(thumbs) = &thumbnails {
                meta.thumbnail = thumbs.get(i).cloned().flatten();
            }
            self.store.insert(id.clone(), vector, meta);
            ids.push(id);
        }
        self.store.save()?;
        self.rebuild_all_locked()?;
        Ok(ids)
    }

    /// Embeds `path` and dispatches to [`Self::search_by_vector`] (spec
    /// §4.7 `search`).
    pub fn search(&self, path: &str, k: usize, method: &str) -> Result<Vec<ScoredItem>> {
        let query = self
            .embedder
            .embed(path)
            .map_err(|err| RetrievalError::EmbedFailure(err.to_string()))?;
        Ok(self.search_by_vector(&query, k, method))
    }

    /// Runs `k`-NN against `query` with the named method, downgrading
    /// `nsw`/`annoy` to brute force (with a logged warning) if the
    /// background rebuild has not completed yet (spec §4.7, §5 Readiness,
    /// scenario 6), then enriches every hit with store metadata. Unknown
    /// method names default to brute force (spec §6).
    pub fn search_by_vector(&self, query: &[f32], k: usize, method: &str) -> Vec<ScoredItem> {
        let mut method = SearchMethod::parse(method);
        if matches!(method, SearchMethod::Nsw | SearchMethod::Annoy) && !self.indexes_ready() {
            let which = match method {
                SearchMethod::Nsw => "nsw",
                SearchMethod::Annoy => "annoy",
                _ => unreachable!(),
            };
            let err = RetrievalError::IndexNotReady(which);
            tracing::warn!(%err);
            method = SearchMethod::BruteForce;
        }

        let vectors = self.store.get_all_vectors();
        let hits = match method {
            SearchMethod::BruteForce => self.engines.brute_force.search(query, &vectors, k),
            SearchMethod::Lsh => self.engines.lsh.query(query, &vectors, k),
            SearchMethod::Nsw => self.engines.nsw.query(query, k, self.nsw_ef_search),
            SearchMethod::Annoy => self.engines.annoy.query(query, k),
        };

        self.enrich(hits)
    }

    fn enrich(&self, hits: Vec<(ItemId, f32)>) -> Vec<ScoredItem> {
        hits.into_iter()
            .filter_map(|(id, score)| {
                let meta = self.store.get_metadata(&id)?;
                Some(ScoredItem {
                    id,
                    score,
                    path: meta.path,
                    category: meta.category,
                    thumbnail: meta.thumbnail,
                })
            })
            .collect()
    }

    /// Deletes `id` from the store, persists, and fully rebuilds all three
    /// approximate indexes — LSH buckets and NSW edges may still reference
    /// the id; revalidation against the store suffices, but a rebuild
    /// bounds how much stale state accumulates (spec §4.7).
    pub fn delete_image(&self, id: &ItemId) -> Result<bool> {
        let _guard = self.lock.lock();
        if !self.store.delete(id) {
            return Ok(false);
        }
        self.store.save()?;
        self.rebuild_all_locked()?;
        Ok(true)
    }

    /// Shallow-merges `new_category` into `id`'s metadata and persists
    /// (spec §6 `update_image_metadata`). A no-op, still `Ok`, if `id` is
    /// absent, mirroring [`VectorStore::update`]'s contract.
    pub fn update_image_metadata(&self, id: &ItemId, new_category: Option<&str>) -> Result<()> {
        let _guard = self.lock.lock();
        let patch = MetadataPatch {
            category: new_category.map(|c| c.to_string()),
            ..Default::default()
        };
        self.store.update(id, None, Some(patch));
        self.store.save()
    }

    /// Clears the store and every index, including LSH's on-disk state
    /// (spec §4.7).
    pub fn reset_database(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.store.clear()?;
        self.engines.lsh.clear()?;
        self.engines.nsw.clear();
        self.engines.annoy.clear();
        Ok(())
    }

    /// Returns `(vector, metadata)` for `id`, or `None` if it is absent.
    /// Supplemented from the original prototype's `get_image_details`
    /// (`vector_db/crud.py`); not in spec.md's Retriever surface list, but
    /// not excluded by any Non-goal either.
    pub fn get_item(&self, id: &ItemId) -> Option<(Vec<f32>, Metadata)> {
        let vector = self.store.get_vector(id)?;
        let meta = self.store.get_metadata(id)?;
        Some((vector, meta))
    }

    /// Snapshot of every id, its vector, and its category — raw material
    /// for the out-of-scope dimensionality-reduction/viz path (spec §6
    /// `get_all_embeddings_for_viz`).
    pub fn get_all_embeddings_for_viz(&self) -> (Vec<ItemId>, Vec<Vec<f32>>, Vec<String>) {
        let vectors = self.store.get_all_vectors();
        let mut ids = Vec::with_capacity(vectors.len());
        let mut matrix = Vec::with_capacity(vectors.len());
        let mut categories = Vec::with_capacity(vectors.len());
        for (id, vector) in vectors {
            let category = self
                .store
                .get_metadata(&id)
                .map(|m| m.category)
                .unwrap_or_else(|| "unknown".to_string());
            ids.push(id);
            matrix.push(vector);
            categories.push(category);
        }
        (ids, matrix, categories)
    }

    /// Picks `num_queries` ids uniformly at random, runs every method
    /// against each query's own vector, and reports average latency and
    /// recall@k against brute force as ground truth (spec §4.7, scenario
    /// 3). Refuses if the background rebuild has not completed (spec §5
    /// Readiness), or if the store holds fewer than `num_queries` items
    /// (spec §7 `NotEnoughData`).
    pub fn benchmark_algorithms(&self, num_queries: usize, k: usize) -> Result<String> {
        let _guard = self.lock.lock();
        if !self.indexes_ready() {
            return Err(RetrievalError::NotReady("benchmark_algorithms"));
        }

        let vectors = self.store.get_all_vectors();
        if vectors.len() < num_queries {
            return Err(RetrievalError::NotEnoughData {
                have: vectors.len(),
                want: num_queries,
            });
        }

        let mut ids: Vec<ItemId> = vectors.keys().cloned().collect();
        ids.shuffle(&mut rand::thread_rng());
        let query_ids = &ids[..num_queries];

        let (ground_truth, bf_elapsed) = time_each(query_ids, &vectors, |q| self.engines.brute_force.search(q, &vectors, k));

        let mut report = format!("benchmark: {num_queries} queries, k={k}\n");
        let bf_avg_ms = avg_ms(bf_elapsed, num_queries);
        report.push_str(&format!("brute_force: avg {bf_avg_ms:.3}ms, recall 100.00% (ground truth)\n"));

        let (lsh_results, lsh_elapsed) = time_each(query_ids, &vectors, |q| self.engines.lsh.query(q, &vectors, k));
        let (nsw_results, nsw_elapsed) = time_each(query_ids, &vectors, |q| self.engines.nsw.query(q, k, self.nsw_ef_search));
        let (annoy_results, annoy_elapsed) = time_each(query_ids, &vectors, |q| self.engines.annoy.query(q, k));

        for (name, results, elapsed) in [
            ("lsh", lsh_results, lsh_elapsed),
            ("nsw", nsw_results, nsw_elapsed),
            ("annoy", annoy_results, annoy_elapsed),
        ] {
            let hits: usize = results
                .iter()
                .zip(&ground_truth)
                .map(|(approx, truth)| {
                    let truth_ids: std::collections::HashSet<&ItemId> = truth.iter().map(|(id, _)| id).collect();
                    approx.iter().filter(|(id, _)| truth_ids.contains(id)).count()
                })
                .sum();
            let recall = hits as f64 / (num_queries * k) as f64 * 100.0;
            let avg_ms = avg_ms(elapsed, num_queries);
            let speedup = if avg_ms > 0.0 { bf_avg_ms / avg_ms } else { f64::INFINITY };
            report.push_str(&format!("{name}: avg {avg_ms:.3}ms, recall {recall:.2}%, speedup {speedup:.2}x\n"));
        }

        Ok(report)
    }

    /// Runs `index`/`build` on LSH, NSW, and Annoy against the current
    /// store contents. Shared by `import_batch` and `delete_image` (spec
    /// §4.7: both trigger a full rebuild).
    fn rebuild_all_locked(&self) -> Result<()> {
        let vectors = self.store.get_all_vectors();
        self.engines.lsh.index(&vectors)?;
        self.engines.nsw.build(&vectors);
        self.engines.annoy.build(&vectors);
        Ok(())
    }
}

fn file_name_of(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn avg_ms(elapsed: Duration, n: usize) -> f64 {
    elapsed.as_secs_f64() * 1000.0 / n as f64
}

fn time_each<T>(ids: &[ItemId], vectors: &HashMap<ItemId, Vec<f32>>, mut run: impl FnMut(&[f32]) -> T) -> (Vec<T>, Duration) {
    let start = Instant::now();
    let results: Vec<T> = ids.iter().map(|id| run(&vectors[id])).collect();
    (results, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::test_support::FixedEmbedder;
    use tempfile::tempdir;

    fn open_empty(dir: &std::path::Path, dim: usize) -> Arc<Retriever<FixedEmbedder>> {
        Retriever::open(
            FixedEmbedder::new(dim),
            dir.join("vectors.bin"),
            dir.join("meta.json"),
            dir.join("lsh"),
            IndexParams::default(),
        )
    }

    #[test]
    fn p1_metadata_survives_until_delete() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        std::fs::write(&image, b"x").unwrap();
        let path = image.to_string_lossy().into_owned();

        let retriever = open_empty(dir.path(), 3);
        retriever.embedder().register(&path, vec![1.0, 2.0, 3.0]);
        retriever.wait_until_ready(Duration::from_secs(5));

        let id = retriever.add_image(&path, Some("cat")).unwrap().unwrap();
        let (_, meta) = retriever.get_item(&id).unwrap();
        assert_eq!(meta.category, "cat");

        retriever.delete_image(&id).unwrap();
        assert!(retriever.get_item(&id).is_none());
    }

    #[test]
    fn scenario_4_add_persist_restart_returns_self() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        std::fs::write(&image, b"x").unwrap();
        let path = image.to_string_lossy().into_owned();

        let vector_path = dir.path().join("vectors.bin");
        let meta_path = dir.path().join("meta.json");
        let lsh_prefix = dir.path().join("lsh");

        let id = {
            let embedder = FixedEmbedder::new(4);
            embedder.register(&path, vec![1.0, 0.0, 0.0, 0.0]);
            let retriever = Retriever::open(embedder, &vector_path, &meta_path, &lsh_prefix, IndexParams::default());
            retriever.wait_until_ready(Duration::from_secs(5));
            retriever.add_image(&path, None).unwrap().unwrap()
        };

        let embedder = FixedEmbedder::new(4);
        embedder.register(&path, vec![1.0, 0.0, 0.0, 0.0]);
        let retriever = Retriever::open(embedder, &vector_path, &meta_path, &lsh_prefix, IndexParams::default());
        retriever.wait_until_ready(Duration::from_secs(5));

        let results = retriever.search(&path, 1, "brute_force").unwrap();
        assert_eq!(results[0].id, id);
        assert!(results[0].score.abs() < 1e-6);
    }

    #[test]
    fn scenario_5_reset_clears_every_method() {
        let dir = tempdir().unwrap();
        let retriever = open_empty(dir.path(), 4);

        let mut paths = Vec::new();
        for i in 0..10 {
            let image = dir.path().join(format!("img{i}.jpg"));
            std::fs::write(&image, b"x").unwrap();
            let path = image.to_string_lossy().into_owned();
            retriever.embedder().register(&path, vec![i as f32, 0.0, 0.0, 0.0]);
            paths.push(path);
        }
        retriever.wait_until_ready(Duration::from_secs(5));
        for path in &paths {
            retriever.add_image(path, None).unwrap();
        }

        retriever.reset_database().unwrap();

        for method in ["brute_force", "lsh", "nsw", "annoy"] {
            let results = retriever.search_by_vector(&[0.0, 0.0, 0.0, 0.0], 5, method);
            assert!(results.is_empty(), "{method} should be empty after reset");
        }
    }

    #[test]
    fn scenario_6_nsw_before_ready_falls_back_to_brute_force() {
        let dir = tempdir().unwrap();
        let retriever = open_empty(dir.path(), 4);
        // Force the pre-ready state regardless of how far the background
        // thread has gotten; this test is about the downgrade branch, not
        // a race against it.
        retriever.ready.store(false, Ordering::SeqCst);

        for i in 0..5 {
            retriever
                .store
                .insert(ItemId::new(), vec![i as f32, 0.0, 0.0, 0.0], Metadata::new("x", "x"));
        }

        let query = [2.0, 0.0, 0.0, 0.0];
        let via_nsw = retriever.search_by_vector(&query, 3, "nsw");
        let via_bf = retriever.search_by_vector(&query, 3, "brute_force");
        assert_eq!(via_nsw, via_bf);
    }

    #[test]
    fn benchmark_refuses_before_ready_and_on_tiny_store() {
        let dir = tempdir().unwrap();
        let retriever = open_empty(dir.path(), 4);
        retriever.ready.store(false, Ordering::SeqCst);
        assert!(matches!(retriever.benchmark_algorithms(5, 2), Err(RetrievalError::NotReady(_))));

        retriever.ready.store(true, Ordering::SeqCst);
        assert!(matches!(
            retriever.benchmark_algorithms(5, 2),
            Err(RetrievalError::NotEnoughData { .. })
        ));
    }

    /// Extracts the `recall NN.NN%` figure `benchmark_algorithms` prints
    /// for the line starting with `method`.
    fn recall_of(report: &str, method: &str) -> f64 {
        let line = report
            .lines()
            .find(|line| line.starts_with(&format!("{method}:")))
            .unwrap_or_else(|| panic!("no {method} line in report:\n{report}"));
        let after = line.split("recall ").nth(1).unwrap();
        after.split('%').next().unwrap().parse().unwrap()
    }

    #[test]
    fn scenario_3_random_unit_vectors_meet_recall_floor() {
        use rand::{rngs::StdRng, SeedableRng};
        use rand_distr::{Distribution, StandardNormal};

        const DIM: usize = 32;
        const N: usize = 200;
        const NUM_QUERIES: usize = 50;
        const K: usize = 10;

        let mut rng = StdRng::seed_from_u64(0x5CE_1A2B_3C4D);
        let mut vectors = Vec::with_capacity(N);
        for _ in 0..N {
            let raw: Vec<f32> = (0..DIM).map(|_| StandardNormal.sample(&mut rng)).collect();
            let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
            vectors.push(raw.into_iter().map(|x| x / norm).collect::<Vec<f32>>());
        }
        let paths = (0..N).map(|i| format!("vec-{i}")).collect();
        let categories = vec![None; N];

        let dir = tempdir().unwrap();
        let retriever = open_empty(dir.path(), DIM);
        retriever.wait_until_ready(Duration::from_secs(5));
        retriever.import_batch(vectors, paths, categories, None).unwrap();

        let report = retriever.benchmark_algorithms(NUM_QUERIES, K).unwrap();
        assert!(recall_of(&report, "lsh") >= 40.0, "lsh recall below floor:\n{report}");
        assert!(recall_of(&report, "nsw") >= 85.0, "nsw recall below floor:\n{report}");
    }
}

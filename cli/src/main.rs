//! Thin ops binary wiring [`AppConfig`] to a [`Retriever`]. Exercises the
//! core's public surface end to end; the real embedding model, the GUI,
//! and the bulk numeric-array importer are all out of the core's scope
//! (spec §1) and are not reproduced here either — [`HashEmbedder`] is a
//! deterministic stand-in, not a model.

mod config;
mod embedder;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use retrieval_core::{IndexParams, Retriever};

use config::AppConfig;
use embedder::HashEmbedder;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "retrieval-cli", about = "Demo/ops binary for the vector retrieval core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed and insert a single image.
    Add {
        path: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// k-NN search for an image.
    Search {
        path: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[arg(long, default_value = "brute_force")]
        method: String,
    },
    /// Walk a directory tree, using each file's immediate parent
    /// directory name as its category (`populate_db.py`'s shape).
    Ingest { dir: PathBuf },
    /// Recall/latency report across all four engines (spec §4.7).
    Benchmark {
        #[arg(long, default_value_t = 50)]
        num_queries: usize,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Wipe the store and every index.
    Reset,
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&config.storage_dir)?;

    let retriever = Retriever::open(
        HashEmbedder::new(config.dimension),
        config.vector_path(),
        config.meta_path(),
        config.lsh_prefix(),
        IndexParams::default(),
    );

    match cli.command {
        Command::Add { path, category } => {
            retriever.wait_until_ready(Duration::from_secs(30));
            match retriever.add_image(&path, category.as_deref())? {
                Some(id) => println!("inserted {id}"),
                None => println!("not inserted (missing path or embedding failure; see logs)"),
            }
        }
        Command::Search { path, k, method } => {
            retriever.wait_until_ready(Duration::from_secs(30));
            for hit in retriever.search(&path, k, &method)? {
                println!("{:.4}  {}  [{}]  {}", hit.score, hit.id, hit.category, hit.path);
            }
        }
        Command::Ingest { dir } => {
            retriever.wait_until_ready(Duration::from_secs(30));
            let mut count = 0usize;
            for entry in walk_files(&dir) {
                let category = entry
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned());
                let path = entry.to_string_lossy().into_owned();
                match retriever.add_image(&path, category.as_deref())? {
                    Some(_) => count += 1,
                    None => tracing::warn!(path, "ingest: skipped"),
                }
            }
            println!("ingested {count} images from {}", dir.display());
        }
        Command::Benchmark { num_queries, k } => {
            retriever.wait_until_ready(Duration::from_secs(60));
            print!("{}", retriever.benchmark_algorithms(num_queries, k)?);
        }
        Command::Reset => {
            retriever.wait_until_ready(Duration::from_secs(30));
            retriever.reset_database()?;
            println!("database reset");
        }
    }

    Ok(())
}

/// Recursive directory walk mirroring `populate_db.py`: every file under
/// `dir`, descending into subdirectories.
fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_files(&path));
        } else {
            out.push(path);
        }
    }
    out
}

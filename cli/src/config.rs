//! Env-driven configuration for the demo binary. `core` itself takes no
//! env vars (spec §6) — this is the boundary where that's intentionally
//! crossed, since it lives outside the core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {0} is not a valid {1}: {2}")]
    Invalid(&'static str, &'static str, String),
}

/// Resolved from `RETRIEVAL_*` environment variables (optionally loaded
/// from a `.env` file via `dotenvy`), with defaults for every field so a
/// first run needs no configuration at all.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
    pub dimension: usize,
    pub log_level: String,
}

impl AppConfig {
    /// Loads `.env` if present, then reads env vars, falling back to
    /// defaults rather than panicking on anything missing — unlike the
    /// `.expect()` chain this replaces, a CLI entrypoint should report a
    /// clean error, not a panic, for anything that *is* malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let storage_dir = std::env::var("RETRIEVAL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let dimension = match std::env::var("RETRIEVAL_DIMENSION") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("RETRIEVAL_DIMENSION", "usize", v))?,
            Err(_) => 512,
        };

        let log_level = std::env::var("RETRIEVAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            storage_dir,
            dimension,
            log_level,
        })
    }

    pub fn vector_path(&self) -> PathBuf {
        self.storage_dir.join("vectors.bin")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.storage_dir.join("meta.json")
    }

    pub fn lsh_prefix(&self) -> PathBuf {
        self.storage_dir.join("lsh")
    }
}

//! Output storage.
//!
//! Lays out the generated statistics on disk:
//! - `players/<stem>.json` per player
//! - `races/<stem>.json` per race
//! - `regions/<stem>.json` per region
//! - `leaderboard.json`
//!
//! The aggregation core never touches the filesystem; it hands documents to
//! an `EntitySink`.

mod json;
mod materialize;

pub use json::*;
pub use materialize::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output path {0} exists and is not a directory")]
    NotADirectory(PathBuf),

    #[error("Refusing to replace output directory: {0} was not written by battle-rank")]
    UnmanagedEntry(PathBuf),

    #[error("Sink already committed")]
    AlreadyCommitted,
}

/// Configuration for output paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub output_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn players_dir(&self) -> PathBuf {
        self.output_dir.join(PLAYERS_DIR)
    }

    pub fn races_dir(&self) -> PathBuf {
        self.output_dir.join(RACES_DIR)
    }

    pub fn regions_dir(&self) -> PathBuf {
        self.output_dir.join(REGIONS_DIR)
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.output_dir.join(LEADERBOARD_FILE)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

//! JSON document sinks.
//!
//! `JsonDirSink` builds the complete output tree in a hidden sibling of the
//! output directory and publishes it on commit by renaming it into place, so
//! readers see either the previous tree or the new one. `MemorySink` keeps
//! documents in memory for dry runs and tests.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    EntitySink, OutputDocument, StorageConfig, StorageError, LEADERBOARD_FILE, PLAYERS_DIR,
    RACES_DIR, REGIONS_DIR,
};

/// Entries a published output directory may contain.
const MANAGED_ENTRIES: [&str; 4] = [PLAYERS_DIR, RACES_DIR, REGIONS_DIR, LEADERBOARD_FILE];

/// Hidden path next to `output_dir`, on the same filesystem so renames stay atomic.
fn sibling(output_dir: &Path, tag: &str, run: Uuid) -> PathBuf {
    let name = output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let parent = match output_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.join(format!(".{}.{}-{}", name, tag, run.simple()))
}

/// Refuse to replace a directory holding anything we did not write.
fn check_replaceable(target: &Path) -> Result<(), StorageError> {
    if !target.exists() {
        return Ok(());
    }
    if !target.is_dir() {
        return Err(StorageError::NotADirectory(target.to_path_buf()));
    }
    for entry in fs::read_dir(target)? {
        let entry = entry?;
        let name = entry.file_name();
        if !MANAGED_ENTRIES.iter().any(|m| name.as_os_str() == *m) {
            return Err(StorageError::UnmanagedEntry(entry.path()));
        }
    }
    Ok(())
}

/// Move `staged` to `target`, keeping the old `target` at `backup` until the
/// new tree is in place. On failure the old tree is put back.
fn publish(staged: &Path, target: &Path, backup: &Path) -> Result<(), StorageError> {
    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, backup)?;
    }

    if let Err(e) = fs::rename(staged, target) {
        if had_previous {
            if let Err(restore) = fs::rename(backup, target) {
                error!(
                    "Failed to restore previous output from {:?}: {}",
                    backup, restore
                );
            }
        }
        return Err(e.into());
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(backup) {
            warn!("Failed to remove previous output {:?}: {}", backup, e);
        }
    }
    Ok(())
}

/// Writes documents under the configured output directory.
pub struct JsonDirSink {
    config: StorageConfig,
    staging_dir: PathBuf,
    backup_dir: PathBuf,
    written: usize,
    committed: bool,
}

impl JsonDirSink {
    /// Create a sink with fresh staging and backup directory names.
    pub fn new(config: StorageConfig) -> Self {
        let run = Uuid::new_v4();
        let staging_dir = sibling(&config.output_dir, "staging", run);
        let backup_dir = sibling(&config.output_dir, "previous", run);
        Self {
            config,
            staging_dir,
            backup_dir,
            written: 0,
            committed: false,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Number of documents staged so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn write_json(path: &Path, document: &OutputDocument<'_>) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writeln!(writer).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}

impl EntitySink for JsonDirSink {
    fn persist(&mut self, document: &OutputDocument<'_>) -> Result<(), StorageError> {
        if self.committed {
            return Err(StorageError::AlreadyCommitted);
        }

        let path = self.staging_dir.join(document.relative_path());
        Self::write_json(&path, document)?;
        self.written += 1;

        debug!("Staged {:?} document {:?}", document.kind(), path);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if self.committed {
            return Err(StorageError::AlreadyCommitted);
        }

        // Empty tables still replace stale output with empty directories.
        for dir in [PLAYERS_DIR, RACES_DIR, REGIONS_DIR] {
            fs::create_dir_all(self.staging_dir.join(dir))?;
        }

        let target = &self.config.output_dir;
        check_replaceable(target)?;
        publish(&self.staging_dir, target, &self.backup_dir)?;
        self.committed = true;

        info!("Wrote {} documents to {:?}", self.written, target);
        Ok(())
    }
}

impl Drop for JsonDirSink {
    fn drop(&mut self) {
        if self.committed || !self.staging_dir.exists() {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.staging_dir) {
            warn!(
                "Failed to clean up staging directory {:?}: {}",
                self.staging_dir, e
            );
        }
    }
}

/// Keeps rendered documents in memory, keyed by relative path.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Vec<(PathBuf, Value)>,
    committed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Look up a document by its relative path.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Value> {
        let path = path.as_ref();
        self.documents
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Value)> {
        self.documents.iter().map(|(p, v)| (p.as_path(), v))
    }
}

impl EntitySink for MemorySink {
    fn persist(&mut self, document: &OutputDocument<'_>) -> Result<(), StorageError> {
        if self.committed {
            return Err(StorageError::AlreadyCommitted);
        }
        let value = serde_json::to_value(document)?;
        self.documents.push((document.relative_path(), value));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.committed = true;
        Ok(())
    }
}

//! Backup-then-write persistence for the canonical feed and its artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, Result};
use crate::models::config::FeedConfig;
use crate::models::{FeedRecord, Status};

use super::harden::Hardener;

/// Copy `path` verbatim into `backup_dir` as `<name>.<YYYYmmdd_HHMMSS>.bak`.
///
/// Returns `Ok(None)` when there is nothing to back up yet.
pub fn backup_file(path: &Path, backup_dir: &Path) -> std::result::Result<Option<PathBuf>, PersistenceError> {
    if !path.is_file() {
        return Ok(None);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "feed.json".to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let target = backup_dir.join(format!("{name}.{stamp}.bak"));

    fs::create_dir_all(backup_dir)
        .and_then(|_| fs::copy(path, &target))
        .map_err(|source| PersistenceError::Backup {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(target))
}

/// Serialize `value` as pretty JSON and write it to `path`.
///
/// When `backup_dir` is given the previous file is snapshotted first. A
/// failed snapshot is logged and the write goes ahead.
pub fn write_json<T>(path: &Path, value: &T, backup_dir: Option<&Path>) -> Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(backup_dir) = backup_dir {
        match backup_file(path, backup_dir) {
            Ok(Some(target)) => info!("Backed up {} to {}", path.display(), target.display()),
            Ok(None) => debug!("No previous {} to back up", path.display()),
            Err(e) => warn!("{}; writing anyway", e),
        }
    }

    let content = serde_json::to_string_pretty(value).map_err(PersistenceError::Encode)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, content).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// The canonical combined feed on disk.
#[derive(Debug, Clone)]
pub struct FeedStore {
    path: PathBuf,
    backup_dir: PathBuf,
    backup: bool,
    hardener: Hardener,
}

impl FeedStore {
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
            backup: true,
            hardener: Hardener::default(),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            path: config.paths.combined_path(),
            backup_dir: config.paths.backup_dir(),
            backup: config.feed.backup,
            hardener: Hardener::new(&config.feed),
        }
    }

    /// Enable or disable the snapshot before each write.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_hardener(mut self, hardener: Hardener) -> Self {
        self.hardener = hardener;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Read the feed, accepting records from any producer.
    ///
    /// A missing file is an empty feed. Every loaded record is hardened.
    pub fn load(&self) -> Result<Vec<FeedRecord>> {
        if !self.path.exists() {
            debug!("No feed at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let decode = |source| PersistenceError::Decode {
            path: self.path.clone(),
            source,
        };

        let raw: Vec<Value> = serde_json::from_str(&content).map_err(decode)?;
        let mut records = raw
            .into_iter()
            .map(FeedRecord::from_value)
            .collect::<serde_json::Result<Vec<_>>>()
            .map_err(decode)?;

        self.hardener.harden_all(&mut records);
        debug!("Loaded {} records from {}", records.len(), self.path.display());

        Ok(records)
    }

    /// Harden and persist the full record list.
    pub fn save(&self, records: &mut [FeedRecord]) -> Result<()> {
        self.hardener.harden_all(records);

        let backup_dir = self.backup.then_some(self.backup_dir.as_path());
        write_json(&self.path, &*records, backup_dir)?;

        info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Change one record's review status and persist the feed.
    pub fn set_status(&self, id: &str, status: Status) -> Result<FeedRecord> {
        let mut records = self.load()?;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PersistenceError::UnknownId(id.to_string()))?;
        record.status = status;
        let updated = record.clone();

        self.save(&mut records)?;
        info!("Record {} set to {}", id, status);

        Ok(updated)
    }
}

//! Flat-file article store: one JSON manifest plus one PDF blob per record.
//!
//! Layout under the data directory:
//!
//! ```text
//! articles.json          manifest, a JSON array of records
//! articles.json.lock     advisory lock sidecar
//! pdfs/{id}.pdf          blobs
//! ```
//!
//! Blobs are written before the manifest learns about them and unlinked
//! after the manifest forgets them, so a crash can leave an unreferenced
//! blob but never a record without one.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use shelf_core::{sort_newest_first, ArticleRecord, UNTITLED};
use shelf_logging::{shelf_debug, shelf_info, shelf_warn};
use thiserror::Error;
use uuid::Uuid;

use crate::persist::{
    ensure_dir, probe_writable, AtomicFileWriter, FileLock, LockMode, PersistError, TEMP_SUFFIX,
};

pub const MANIFEST_FILENAME: &str = "articles.json";
pub const BLOB_DIRNAME: &str = "pdfs";
const LOCK_FILENAME: &str = "articles.json.lock";
const SAVED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("manifest {path:?} is not a valid article list: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILENAME)
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join(BLOB_DIRNAME)
    }

    fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILENAME)
    }
}

/// Store handle. Cheap to share behind an `Arc`; holds no lock between calls.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    config: StoreConfig,
    manifest_writer: AtomicFileWriter,
    blob_writer: AtomicFileWriter,
}

impl ManifestStore {
    pub fn new(config: StoreConfig) -> Self {
        let manifest_writer = AtomicFileWriter::new(config.data_dir.clone());
        let blob_writer = AtomicFileWriter::new(config.blob_dir());
        Self {
            config,
            manifest_writer,
            blob_writer,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Creates the data and blob directories. Idempotent.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        ensure_dir(&self.config.data_dir)?;
        let blob_dir = self.config.blob_dir();
        ensure_dir(&blob_dir)?;
        probe_writable(&blob_dir)?;
        Ok(())
    }

    /// All records, in manifest order. A missing or empty manifest is an empty list.
    pub fn load_all(&self) -> Result<Vec<ArticleRecord>, StoreError> {
        if !self.config.manifest_path().exists() {
            return Ok(Vec::new());
        }
        let _guard = self.lock(LockMode::Shared)?;
        self.read_manifest()
    }

    /// Replaces the whole manifest with `records`.
    pub fn save_all(&self, records: &[ArticleRecord]) -> Result<(), StoreError> {
        let _guard = self.lock(LockMode::Exclusive)?;
        self.write_manifest(records)
    }

    /// Stores `pdf_bytes` as a new blob, then appends its record to the manifest.
    ///
    /// If the manifest update fails the blob is left behind as an orphan; see
    /// [`ManifestStore::sweep_orphans`].
    pub fn add_article(
        &self,
        title: &str,
        url: &str,
        domain: &str,
        pdf_bytes: &[u8],
    ) -> Result<ArticleRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        let filename = ArticleRecord::filename_for(&id);
        self.blob_writer.write(&filename, pdf_bytes)?;

        let title = match title.trim() {
            "" => UNTITLED,
            trimmed => trimmed,
        };
        let record = ArticleRecord {
            id,
            title: title.to_string(),
            url: url.to_string(),
            domain: domain.to_string(),
            saved_at: Local::now().format(SAVED_AT_FORMAT).to_string(),
            filename,
        };

        {
            let _guard = self.lock(LockMode::Exclusive)?;
            let mut records = self.read_manifest()?;
            records.push(record.clone());
            self.write_manifest(&records)?;
        }

        shelf_info!(
            "Saved article {} ({} bytes) from {}",
            record.id,
            pdf_bytes.len(),
            record.url
        );
        Ok(record)
    }

    /// Removes a record and then its blob. Returns `false` if `id` is unknown.
    pub fn delete_article(&self, id: &str) -> Result<bool, StoreError> {
        if !self.config.manifest_path().exists() {
            return Ok(false);
        }

        let removed = {
            let _guard = self.lock(LockMode::Exclusive)?;
            let mut records = self.read_manifest()?;
            let Some(index) = records.iter().position(|r| r.id == id) else {
                return Ok(false);
            };
            let removed = records.remove(index);
            self.write_manifest(&records)?;
            removed
        };

        if let Some(blob) = self.blob_path_for(&removed) {
            match fs::remove_file(&blob) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    shelf_debug!("Blob {:?} already gone", blob);
                }
                Err(err) => return Err(PersistError::io("remove blob", &blob, err).into()),
            }
        }

        shelf_info!("Deleted article {}", id);
        Ok(true)
    }

    pub fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>, StoreError> {
        Ok(self.load_all()?.into_iter().find(|r| r.id == id))
    }

    /// Path of the blob for an existing record.
    pub fn blob_path(&self, id: &str) -> Result<Option<PathBuf>, StoreError> {
        Ok(self
            .get_article(id)?
            .and_then(|record| self.blob_path_for(&record)))
    }

    /// Display order: newest first.
    pub fn list_newest_first(&self) -> Result<Vec<ArticleRecord>, StoreError> {
        let mut records = self.load_all()?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Blobs with no manifest record, last modified at least `min_age` ago.
    ///
    /// Younger files are skipped because an add may be between its blob
    /// write and its manifest update.
    pub fn orphan_blobs(&self, min_age: Duration) -> Result<Vec<PathBuf>, StoreError> {
        let referenced: HashSet<String> = self
            .load_all()?
            .into_iter()
            .map(|record| record.filename)
            .collect();

        let blob_dir = self.config.blob_dir();
        let mut orphans: Vec<PathBuf> = list_files(&blob_dir)?
            .into_iter()
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("pdf"))
            .filter(|path| file_name_matches(path, |name| !referenced.contains(name)))
            .filter(|path| is_older_than(path, min_age))
            .collect();
        orphans.sort();
        Ok(orphans)
    }

    /// Deletes orphan blobs and stale temp files left by interrupted writes.
    /// Returns how many files were removed.
    pub fn sweep_orphans(&self, min_age: Duration) -> Result<usize, StoreError> {
        let manifest_prefix = format!("{MANIFEST_FILENAME}.");
        let mut stale_temps: Vec<PathBuf> = list_files(&self.config.data_dir)?
            .into_iter()
            .filter(|path| file_name_matches(path, |name| name.starts_with(&manifest_prefix)))
            .collect();
        stale_temps.extend(list_files(&self.config.blob_dir())?);
        stale_temps.retain(|path| {
            file_name_matches(path, |name| name.ends_with(TEMP_SUFFIX)) && is_older_than(path, min_age)
        });

        let mut removed = 0;
        for path in self.orphan_blobs(min_age)?.into_iter().chain(stale_temps) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    shelf_info!("Removed unreferenced file {:?}", path);
                    removed += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => shelf_warn!("Could not remove {:?}: {}", path, err),
            }
        }
        Ok(removed)
    }

    fn lock(&self, mode: LockMode) -> Result<FileLock, StoreError> {
        ensure_dir(&self.config.data_dir)?;
        Ok(FileLock::acquire(&self.config.lock_path(), mode)?)
    }

    // Callers hold the lock.
    fn read_manifest(&self) -> Result<Vec<ArticleRecord>, StoreError> {
        let path = self.config.manifest_path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistError::io("read manifest", &path, err).into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Manifest { path, source })
    }

    // Callers hold the exclusive lock.
    fn write_manifest(&self, records: &[ArticleRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records).map_err(StoreError::Serialize)?;
        self.manifest_writer.write(MANIFEST_FILENAME, &json)?;
        Ok(())
    }

    fn blob_path_for(&self, record: &ArticleRecord) -> Option<PathBuf> {
        // Only the final component: a tampered manifest must not point outside pdfs/.
        let name = Path::new(&record.filename).file_name()?;
        Some(self.config.blob_dir().join(name))
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(PersistError::io("list", dir, err).into()),
    };
    Ok(entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect())
}

fn file_name_matches(path: &Path, predicate: impl FnOnce(&str) -> bool) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(predicate)
}

fn is_older_than(path: &Path, min_age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(|modified| modified.elapsed().unwrap_or(Duration::ZERO) >= min_age)
        .unwrap_or(false)
}

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory {path:?} missing or not usable: {message}")]
    Dir { path: PathBuf, message: String },
    #[error("failed to {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Ensure a directory exists; create it (and parents) if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    let dir_error = |message: String| PersistError::Dir {
        path: dir.to_path_buf(),
        message,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| dir_error(e.to_string()))?;
        if !meta.is_dir() {
            return Err(dir_error("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| dir_error(e.to_string()))?;
    }
    Ok(())
}

/// Basic writability probe: try creating a temp file.
pub fn probe_writable(dir: &Path) -> Result<(), PersistError> {
    NamedTempFile::new_in(dir).map_err(|e| PersistError::Dir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
///
/// The temp file is a uniquely named sibling (`{filename}.XXXXXX.tmp`), so
/// concurrent writers never share one, and the rename replaces the target in
/// a single step: readers see the old file or the new one.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let prefix = format!("{filename}.");
        let mut tmp = Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| PersistError::io("create temp file in", &self.dir, e))?;
        tmp.write_all(content)
            .and_then(|()| tmp.flush())
            .and_then(|()| tmp.as_file_mut().sync_all())
            .map_err(|e| PersistError::io("write", tmp.path(), e))?;

        tmp.persist(&target)
            .map_err(|e| PersistError::io("rename temp file onto", &target, e.error))?;
        Ok(target)
    }
}

/// Suffix of in-flight temp files written by [`AtomicFileWriter`].
pub const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on a sidecar file, released when dropped.
///
/// The lock file is never renamed or deleted, so every process locking the
/// same path contends on the same object.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks until the lock is granted.
    pub fn acquire(path: &Path, mode: LockMode) -> Result<Self, PersistError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| PersistError::io("open lock file", path, e))?;
        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|e| PersistError::io("lock", path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the handle would release it too; unlock explicitly so the
        // release does not depend on when the descriptor is closed.
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn exclusive_lock_blocks_second_holder_until_drop() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("test.lock");
        let first = FileLock::acquire(&path, LockMode::Exclusive).unwrap();

        let (tx, rx) = mpsc::channel();
        let path_clone = path.clone();
        let waiter = thread::spawn(move || {
            let _second = FileLock::acquire(&path_clone, LockMode::Exclusive).unwrap();
            tx.send(()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
        drop(first);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn shared_locks_coexist() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("test.lock");
        let a = FileLock::acquire(&path, LockMode::Shared).unwrap();
        let b = FileLock::acquire(&path, LockMode::Shared).unwrap();
        assert_eq!(a.path(), b.path());
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().join("nested"));
        writer.write("doc.json", b"[]").unwrap();
        writer.write("doc.json", b"[1]").unwrap();

        let names: Vec<_> = fs::read_dir(writer.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["doc.json".to_string()]);
        assert_eq!(fs::read(writer.dir().join("doc.json")).unwrap(), b"[1]");
    }
}

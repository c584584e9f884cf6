use crate::error::{Error, Result};
use crate::paths;
use crate::storage::Record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name a held file takes inside the holding area.
pub fn held_name(delete_timestamp: i64, original_path: &str) -> String {
    format!("{}_{}", delete_timestamp, paths::basename(original_path))
}

/// What [`HoldingArea::remove`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyGone,
}

/// The directory that physically contains relocated files.
#[derive(Debug, Clone)]
pub struct HoldingArea {
    dir: PathBuf,
    /// File name of the tracking database when it lives inside `dir`;
    /// it and its SQLite side files are not held entries.
    store_file: Option<String>,
}

impl HoldingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HoldingArea {
            dir: dir.into(),
            store_file: None,
        }
    }

    pub fn with_store_file(mut self, db_path: &Path) -> Self {
        if db_path.parent() == Some(self.dir.as_path()) {
            self.store_file = db_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_exists(&self) -> Result<()> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(Error::Io {
                    path: self.dir.clone(),
                    source: io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "exists but is not a directory",
                    ),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::from_io(&self.dir, e)),
        }
        fs::create_dir_all(&self.dir).map_err(|e| Error::from_io(&self.dir, e))?;
        debug!("Created holding area {}", self.dir.display());
        Ok(())
    }

    pub fn path_for(&self, delete_timestamp: i64, original_path: &str) -> PathBuf {
        self.dir.join(held_name(delete_timestamp, original_path))
    }

    pub fn held_path(&self, record: &Record) -> PathBuf {
        self.dir.join(record.held_name())
    }

    pub fn contains(&self, held_path: &Path) -> bool {
        fs::symlink_metadata(held_path).is_ok()
    }

    /// Rename `original` into the holding area. A single rename(2): fails
    /// instead of copying when the two paths are on different filesystems.
    pub fn move_in(&self, original: &Path, held_path: &Path) -> Result<()> {
        fs::rename(original, held_path).map_err(|e| Error::from_io(original, e))?;
        debug!("Moved {} -> {}", original.display(), held_path.display());
        Ok(())
    }

    /// Move a held entry to `destination` without replacing anything there.
    ///
    /// Files and symlinks are hard-linked into place and then unlinked, so an
    /// entry that appears at `destination` after the caller checked it fails
    /// with `AlreadyExists`. Directories are renamed; rename(2) can still
    /// replace an empty directory created at `destination` in the meantime.
    pub fn move_out(&self, held_path: &Path, destination: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(held_path).map_err(|e| Error::from_io(held_path, e))?;
        if meta.is_dir() {
            fs::rename(held_path, destination).map_err(|e| Error::from_io(held_path, e))?;
        } else {
            fs::hard_link(held_path, destination).map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => Error::Io {
                    path: destination.to_path_buf(),
                    source: e,
                },
                _ => Error::from_io(held_path, e),
            })?;
            if let Err(e) = fs::remove_file(held_path) {
                // Leave the held entry as the only copy.
                let _ = fs::remove_file(destination);
                return Err(Error::from_io(held_path, e));
            }
        }
        debug!("Moved {} -> {}", held_path.display(), destination.display());
        Ok(())
    }

    /// Permanently delete a held entry. A missing entry is not an error.
    pub fn remove(&self, held_path: &Path) -> Result<Removal> {
        let meta = match fs::symlink_metadata(held_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::AlreadyGone),
            Err(e) => return Err(Error::from_io(held_path, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(held_path)
        } else {
            fs::remove_file(held_path)
        };
        match result {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Removal::AlreadyGone),
            Err(e) => Err(Error::from_io(held_path, e)),
        }
    }

    /// Names of every held entry, excluding the tracking database files.
    pub fn entries(&self) -> Result<Vec<String>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| Error::from_io(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::from_io(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_store_file(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn is_store_file(&self, name: &str) -> bool {
        match &self.store_file {
            Some(db) => {
                name == db
                    || ["-wal", "-shm", "-journal"]
                        .iter()
                        .any(|suffix| name == format!("{}{}", db, suffix))
            }
            None => false,
        }
    }
}

use crate::config::RecycleConfig;
use crate::error::{Error, Result};
use crate::holding::{self, HoldingArea, Removal};
use crate::paths;
use crate::storage::{NewRecord, Record, TrackingStore};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Upper bound on one-second steps taken to find a free held name.
const MAX_HELD_NAME_PROBES: i64 = 1000;
/// Upper bound on `_restored_N` candidates tried before giving up.
const MAX_RESTORE_NAME_PROBES: u32 = 1000;

pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Result of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub record: Record,
    pub held_path: PathBuf,
    pub retention_secs: u64,
}

/// Everything currently held, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Empty,
    Records(Vec<Record>),
}

impl Listing {
    pub fn records(&self) -> &[Record] {
        match self {
            Listing::Empty => &[],
            Listing::Records(records) => records,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub id: i64,
    pub original_path: PathBuf,
    pub destination: PathBuf,
}

impl Restored {
    /// True when the original location was occupied and a sibling name was used.
    pub fn was_renamed(&self) -> bool {
        self.destination != self.original_path
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Records reclaimed, including those whose held file was already gone.
    pub purged: usize,
    /// Records left in place for the next cycle.
    pub failed: usize,
    /// Subset of `purged` whose held file had disappeared out-of-band.
    pub missing: usize,
}

impl PurgeSummary {
    /// No record was due for purging.
    pub fn is_idle(&self) -> bool {
        self.purged == 0 && self.failed == 0
    }
}

/// Orphans in both directions between the holding area and the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub orphan_files: Vec<PathBuf>,
    pub stale_records: Vec<Record>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.orphan_files.is_empty() && self.stale_records.is_empty()
    }
}

pub struct RecycleEngine {
    store: TrackingStore,
    holding: HoldingArea,
}

impl RecycleEngine {
    pub fn new(store: TrackingStore, holding: HoldingArea) -> Self {
        Self { store, holding }
    }

    /// Create the holding area if needed and open the tracking store.
    pub fn open(config: &RecycleConfig) -> Result<Self> {
        let db_path = config.db_path();
        let holding = HoldingArea::new(&config.recycle_bin_dir).with_store_file(&db_path);
        holding.ensure_exists()?;

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
        }
        let store = TrackingStore::open(&db_path)?;

        debug!(
            "Recycle bin at {}, tracking store at {}",
            holding.dir().display(),
            store.path().display()
        );
        Ok(Self::new(store, holding))
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    pub fn holding(&self) -> &HoldingArea {
        &self.holding
    }

    pub fn delete(&self, path: impl AsRef<Path>, retention_secs: u64) -> Result<Deleted> {
        self.delete_at(path, retention_secs, now_timestamp())
    }

    /// Move `path` into the holding area and track it, using `now` as the
    /// delete time.
    ///
    /// The move happens before the insert. If the insert fails the file stays
    /// in the holding area and [`Error::Untracked`] names where it is.
    pub fn delete_at(&self, path: impl AsRef<Path>, retention_secs: u64, now: i64) -> Result<Deleted> {
        let absolute = paths::absolute(path.as_ref())?;
        self.check_deletable(&absolute)?;

        let original_path = absolute
            .to_str()
            .ok_or_else(|| {
                Error::InvalidArgument(format!("path is not valid UTF-8: {}", absolute.display()))
            })?
            .to_string();
        let retention = i64::try_from(retention_secs).map_err(|_| {
            Error::InvalidArgument(format!("retention of {} seconds is too large", retention_secs))
        })?;

        let (delete_timestamp, held_path) = self.free_held_slot(now, &original_path)?;
        let scheduled_deletion = delete_timestamp.checked_add(retention).ok_or_else(|| {
            Error::InvalidArgument(format!("retention of {} seconds is too large", retention_secs))
        })?;

        let new_record = NewRecord {
            file_type: paths::extension(&original_path),
            original_path,
            delete_timestamp,
            scheduled_deletion,
        };

        self.holding.move_in(&absolute, &held_path)?;

        let id = match self.store.insert(&new_record) {
            Ok(id) => id,
            Err(source) => {
                error!(
                    "Moved {} to {} but failed to record it: {}",
                    new_record.original_path,
                    held_path.display(),
                    source
                );
                return Err(Error::Untracked {
                    held_path,
                    source: Box::new(source),
                });
            }
        };

        info!(
            id,
            scheduled_deletion,
            "Recycled {} as {}",
            new_record.original_path,
            held_path.display()
        );
        Ok(Deleted {
            record: new_record.with_id(id),
            held_path,
            retention_secs,
        })
    }

    pub fn list(&self) -> Result<Listing> {
        let mut records = self.store.list_all()?;
        if records.is_empty() {
            return Ok(Listing::Empty);
        }
        records.sort_by_key(|record| record.id);
        Ok(Listing::Records(records))
    }

    /// Move a held file back to where it came from.
    ///
    /// A record whose held file is gone is removed and reported as
    /// [`Error::Inconsistent`].
    pub fn restore(&self, id: i64) -> Result<Restored> {
        let record = self.store.get(id)?;
        let held_path = self.holding.held_path(&record);

        if !self.holding.contains(&held_path) {
            return Err(self.discard_stale(&record, held_path));
        }

        let parent = paths::dirname(&record.original_path);
        fs::create_dir_all(&parent).map_err(|e| Error::from_io(&parent, e))?;

        let destination = restore_destination(&record.original_path)?;

        match self.holding.move_out(&held_path, &destination) {
            Ok(()) => {}
            // Lost a race with a concurrent purge.
            Err(e) if e.is_not_found() && !self.holding.contains(&held_path) => {
                return Err(self.discard_stale(&record, held_path));
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = self.store.delete(id) {
            warn!(
                "Restored {} but could not remove record {}: {}",
                destination.display(),
                id,
                e
            );
        }

        info!(id, "Restored {}", destination.display());
        Ok(Restored {
            id,
            original_path: PathBuf::from(&record.original_path),
            destination,
        })
    }

    pub fn purge(&self) -> Result<PurgeSummary> {
        self.purge_at(now_timestamp())
    }

    /// Permanently remove every held file whose scheduled deletion is at or
    /// before `now`. Per-file failures are counted, not returned.
    pub fn purge_at(&self, now: i64) -> Result<PurgeSummary> {
        let expired = self.store.find_expired(now)?;
        let mut summary = PurgeSummary::default();

        for record in &expired {
            let held_path = self.holding.held_path(record);
            debug!(
                id = record.id,
                scheduled_deletion = record.scheduled_deletion,
                now,
                "Purging {}",
                held_path.display()
            );

            let removal = match self.holding.remove(&held_path) {
                Ok(removal) => removal,
                Err(e) => {
                    error!("Failed to purge {}: {}", held_path.display(), e);
                    summary.failed += 1;
                    continue;
                }
            };
            if removal == Removal::AlreadyGone {
                warn!(
                    "Held file {} already gone, dropping record {}",
                    held_path.display(),
                    record.id
                );
            }

            match self.store.delete(record.id) {
                Ok(_) => {
                    summary.purged += 1;
                    if removal == Removal::AlreadyGone {
                        summary.missing += 1;
                    }
                }
                Err(e) => {
                    error!("Purged {} but record {} remains: {}", held_path.display(), record.id, e);
                    summary.failed += 1;
                }
            }
        }

        if !summary.is_idle() {
            info!(
                purged = summary.purged,
                failed = summary.failed,
                missing = summary.missing,
                "Purge finished"
            );
        }
        Ok(summary)
    }

    /// Compare the holding area with the store without changing either.
    pub fn audit(&self) -> Result<AuditReport> {
        let mut records = self.store.list_all()?;
        records.sort_by_key(|record| record.id);
        let entries = self.holding.entries()?;

        let present: HashSet<&str> = entries.iter().map(String::as_str).collect();
        let tracked: HashSet<String> = records.iter().map(Record::held_name).collect();

        let orphan_files = entries
            .iter()
            .filter(|name| !tracked.contains(name.as_str()))
            .map(|name| self.holding.dir().join(name))
            .collect::<Vec<_>>();
        let stale_records = records
            .into_iter()
            .filter(|record| !present.contains(record.held_name().as_str()))
            .collect::<Vec<_>>();

        for orphan in &orphan_files {
            warn!("Untracked file in holding area: {}", orphan.display());
        }
        for record in &stale_records {
            warn!("Record {} has no held file", record.id);
        }
        Ok(AuditReport {
            orphan_files,
            stale_records,
        })
    }

    fn check_deletable(&self, absolute: &Path) -> Result<()> {
        if absolute.parent().is_none() {
            return Err(Error::InvalidArgument(
                "refusing to recycle the filesystem root".to_string(),
            ));
        }
        if let Ok(holding_dir) = fs::canonicalize(self.holding.dir()) {
            if absolute.starts_with(&holding_dir) || holding_dir.starts_with(absolute) {
                return Err(Error::InvalidArgument(format!(
                    "{} overlaps the recycle bin itself",
                    absolute.display()
                )));
            }
        }
        Ok(())
    }

    /// First free held name at or after `now`, stepping one second at a time.
    ///
    /// A name is taken when a file sits there or when any record still maps
    /// to it, even a stale one whose file is gone.
    fn free_held_slot(&self, now: i64, original_path: &str) -> Result<(i64, PathBuf)> {
        for offset in 0..MAX_HELD_NAME_PROBES {
            let timestamp = now + offset;
            let held_path = self.holding.path_for(timestamp, original_path);
            if self.holding.contains(&held_path) {
                continue;
            }
            let name = holding::held_name(timestamp, original_path);
            let tracked = self
                .store
                .find_by_delete_timestamp(timestamp)?
                .iter()
                .any(|record| record.held_name() == name);
            if !tracked {
                if offset > 0 {
                    debug!(
                        "Held name taken, using timestamp {} for {}",
                        timestamp, original_path
                    );
                }
                return Ok((timestamp, held_path));
            }
        }
        Err(Error::Io {
            path: self.holding.dir().to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free held name for {}", original_path),
            ),
        })
    }

    fn discard_stale(&self, record: &Record, held_path: PathBuf) -> Error {
        warn!(
            "Record {} points at missing {}, removing it",
            record.id,
            held_path.display()
        );
        if let Err(e) = self.store.delete(record.id) {
            error!("Could not remove stale record {}: {}", record.id, e);
            return e;
        }
        Error::Inconsistent {
            id: record.id,
            held_path,
        }
    }
}

/// `original_path` if free, otherwise the first free `<stem>_restored[_N]<ext>`
/// next to it. The answer can go stale before the move; [`HoldingArea::move_out`]
/// refuses to replace whatever appeared there since.
fn restore_destination(original_path: &str) -> Result<PathBuf> {
    let original = PathBuf::from(original_path);
    if !occupied(&original) {
        return Ok(original);
    }

    let base = paths::basename(original_path);
    let extension = paths::extension(original_path);
    // A dotfile's only dot is not an extension separator here.
    let (stem, ext) = if extension.len() == base.len() {
        (base.as_str(), "")
    } else {
        (&base[..base.len() - extension.len()], extension.as_str())
    };
    let dir = paths::dirname(original_path);

    for attempt in 1..=MAX_RESTORE_NAME_PROBES {
        let suffix = if attempt == 1 {
            "_restored".to_string()
        } else {
            format!("_restored_{}", attempt)
        };
        let candidate = PathBuf::from(paths::join(&dir, &format!("{}{}{}", stem, suffix, ext)));
        if !occupied(&candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::Io {
        path: original,
        source: io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free name to restore to",
        ),
    })
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied on {}: {source}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tracking store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Record {id} had no held file at {}; stale record removed", .held_path.display())]
    Inconsistent { id: i64, held_path: PathBuf },

    #[error("File moved to {} but could not be tracked: {source}", .held_path.display())]
    Untracked {
        held_path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Classify an I/O failure on `path` into the matching error kind.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { path, source },
            _ => Error::Io { path, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let err = Error::from_io("/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());

        let err = Error::from_io("/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::PermissionDenied { .. }));

        let err = Error::from_io("/x", io::Error::from(io::ErrorKind::Other));
        assert!(matches!(err, Error::Io { .. }));
    }
}

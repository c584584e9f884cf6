use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_RETENTION_SECS: u64 = 60;
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;
pub const RECYCLE_BIN_DIR_NAME: &str = ".recycle_bin";
pub const TRACKING_DB_NAME: &str = "tracking.db";

#[derive(Debug, Clone, Deserialize)]
pub struct RecycleConfig {
    /// Holding area; held files live directly in this directory.
    pub recycle_bin_dir: PathBuf,
    /// Tracking database. Defaults to `<recycle_bin_dir>/tracking.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    pub default_retention_secs: u64,
    pub purge_interval_secs: u64,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl RecycleConfig {
    /// Configuration rooted at an explicit holding directory, with defaults elsewhere.
    pub fn with_recycle_bin_dir(dir: impl Into<PathBuf>) -> Self {
        RecycleConfig {
            recycle_bin_dir: dir.into(),
            db_path: None,
            default_retention_secs: DEFAULT_RETENTION_SECS,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
            log_file: None,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.recycle_bin_dir.join(TRACKING_DB_NAME))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

/// Load from defaults, an optional `RecycleBin.toml` in the working
/// directory, then `RECYCLE_BIN_*` environment variables.
pub fn load_configuration() -> Result<RecycleConfig, ConfigError> {
    let home = env::var_os("HOME").map(PathBuf::from);
    load_from(home.as_deref(), None)
}

/// Like [`load_configuration`] with an explicit home directory and config file.
pub fn load_from(
    home: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<RecycleConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("default_retention_secs", DEFAULT_RETENTION_SECS as i64)?
        .set_default("purge_interval_secs", DEFAULT_PURGE_INTERVAL_SECS as i64)?;

    if let Some(home) = home {
        let dir = home.join(RECYCLE_BIN_DIR_NAME);
        builder = builder.set_default("recycle_bin_dir", dir.to_string_lossy().into_owned())?;
    }

    builder = match config_file {
        Some(path) => builder.add_source(ConfigFile::from(path)),
        None => builder.add_source(ConfigFile::with_name("RecycleBin").required(false)),
    };

    let settings = builder
        .add_source(Environment::with_prefix("RECYCLE_BIN").try_parsing(true))
        .build()?;

    if settings.get_string("recycle_bin_dir").is_err() {
        return Err(ConfigError::Message(
            "cannot determine home directory; set recycle_bin_dir".to_string(),
        ));
    }

    let config = settings.try_deserialize::<RecycleConfig>()?;
    if config.purge_interval_secs == 0 {
        return Err(ConfigError::Message(
            "purge_interval_secs must be at least 1".to_string(),
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_rooted_at_home() {
        let home = tempdir().unwrap();
        let empty = home.path().join("empty.toml");
        fs::write(&empty, "").unwrap();

        let config = load_from(Some(home.path()), Some(&empty)).unwrap();
        assert_eq!(config.recycle_bin_dir, home.path().join(".recycle_bin"));
        assert_eq!(
            config.db_path(),
            home.path().join(".recycle_bin").join("tracking.db")
        );
        assert_eq!(config.default_retention_secs, 60);
        assert_eq!(config.purge_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let home = tempdir().unwrap();
        let file = home.path().join("RecycleBin.toml");
        fs::write(
            &file,
            "recycle_bin_dir = \"/srv/bin\"\n\
             db_path = \"/var/lib/recycle/tracking.db\"\n\
             default_retention_secs = 3600\n\
             purge_interval_secs = 5\n",
        )
        .unwrap();

        let config = load_from(Some(home.path()), Some(&file)).unwrap();
        assert_eq!(config.recycle_bin_dir, PathBuf::from("/srv/bin"));
        assert_eq!(
            config.db_path(),
            PathBuf::from("/var/lib/recycle/tracking.db")
        );
        assert_eq!(config.default_retention_secs, 3600);
        assert_eq!(config.purge_interval_secs, 5);
    }

    #[test]
    fn test_zero_purge_interval_is_rejected() {
        let home = tempdir().unwrap();
        let file = home.path().join("RecycleBin.toml");
        fs::write(&file, "purge_interval_secs = 0\n").unwrap();
        let err = load_from(Some(home.path()), Some(&file)).unwrap_err();
        assert!(err.to_string().contains("purge_interval_secs"));
    }

    #[test]
    fn test_missing_home_without_dir_is_error() {
        let tmp = tempdir().unwrap();
        let empty = tmp.path().join("empty.toml");
        fs::write(&empty, "").unwrap();
        assert!(load_from(None, Some(&empty)).is_err());
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "recycle-bin")]
#[command(about = "Move files to a recycle bin and purge them after a retention period", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./RecycleBin.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move a file to the recycle bin
    Delete {
        path: PathBuf,
        /// Seconds to keep the file before it may be purged
        retention_secs: Option<u64>,
    },
    /// List files in the recycle bin
    List,
    /// Restore a file from the recycle bin by id
    Restore { id: i64 },
    /// Permanently remove expired files
    Purge,
    /// Report held files without records and records without files
    Audit,
    /// Purge expired files periodically until interrupted
    Daemon {
        /// Seconds between purge cycles
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
    /// Print configuration values
    PrintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_interval_parses() {
        let cli = Cli::try_parse_from(["recycle-bin", "daemon", "--interval", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Daemon { interval: Some(5) })
        ));
    }

    #[test]
    fn test_daemon_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["recycle-bin", "daemon", "--interval", "0"]).is_err());
    }
}

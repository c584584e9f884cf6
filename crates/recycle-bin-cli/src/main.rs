mod commands;
mod logging;
mod render;

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use recycle_bin_core::{config, Error, RecycleConfig, RecycleEngine, Scheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("Error loading configuration: {}", err).red());
            process::exit(1);
        }
    };

    let default_level = match args.command {
        Some(Commands::Daemon { .. }) => "info",
        _ => "warn",
    };
    let _guard = logging::init_logger(default_level, config.log_file.clone());

    let command = match args.command {
        Some(command) => command,
        None => {
            let _ = Cli::command().print_long_help();
            return;
        }
    };

    match run_command(command, &config) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(err) => {
            eprintln!("{}", format!("Error: {:#}", err).red());
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RecycleConfig, Error> {
    let loaded = match path {
        Some(path) => {
            let home = std::env::var_os("HOME").map(std::path::PathBuf::from);
            config::load_from(home.as_deref(), Some(path))
        }
        None => config::load_configuration(),
    };
    loaded.map_err(Error::from)
}

fn run_command(command: Commands, config: &RecycleConfig) -> anyhow::Result<String> {
    let output = match command {
        Commands::Delete {
            path,
            retention_secs,
        } => {
            let retention = retention_secs.unwrap_or(config.default_retention_secs);
            render::deleted(&open_engine(config)?.delete(&path, retention)?)
        }
        Commands::List => render::listing(&open_engine(config)?.list()?),
        Commands::Restore { id } => render::restored(&open_engine(config)?.restore(id)?),
        Commands::Purge => render::purge_summary(&open_engine(config)?.purge()?),
        Commands::Audit => render::audit(&open_engine(config)?.audit()?),
        Commands::Daemon { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.purge_interval());
            let cycles = run_daemon(open_engine(config)?, interval)?;
            format!("Daemon stopped after {} purge cycles", cycles)
        }
        Commands::PrintConfig => format!(
            "Configuration: {:#?}\nTracking store: {}",
            config,
            config.db_path().display()
        ),
    };
    Ok(output)
}

/// Failing to open the store is fatal for this invocation.
fn open_engine(config: &RecycleConfig) -> anyhow::Result<RecycleEngine> {
    RecycleEngine::open(config).map_err(|err| {
        error!("Could not initialize recycle bin: {}", err);
        anyhow::Error::new(err).context("failed to initialize recycle bin")
    })
}

fn run_daemon(engine: RecycleEngine, interval: Duration) -> anyhow::Result<usize> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    info!("Recycle bin path: {}", engine.holding().dir().display());
    info!("Database path: {}", engine.store().path().display());

    let scheduler = Scheduler::new(Arc::new(engine), interval);
    info!(
        "Running purge check every {} seconds",
        scheduler.interval().as_secs()
    );

    let cycles = runtime.block_on(async move {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_token.cancel();
        });
        scheduler.run(shutdown).await
    });

    info!("Daemon shutting down");
    Ok(cycles)
}

/// Resolves on Ctrl+C, SIGTERM or SIGHUP.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(mut term), Ok(mut hup)) => {
                tokio::select! {
                    _ = term.recv() => info!("Received SIGTERM"),
                    _ = hup.recv() => info!("Received SIGHUP"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => {},
    }

    info!("Preparing to shut down");
}

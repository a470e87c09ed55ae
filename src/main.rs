//! `radsync` command-line interface.

mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use exn::ResultExt;
use radsync_config::{Config, Overrides};
use radsync_library::{RetryPolicy, SyncOptions, rebuild_index, synchronize};
use radsync_remote::{ReqwestTransport, TransportHandle, TransportOptions};
use radsync_storage::BackendHandle;
use radsync_storage::backend::LocalBackend;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Mirror a remote weather-radar directory tree and index its volumes.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON, by extension)
    #[arg(long, global = true, env = "RADSYNC_CONFIG")]
    config: Option<PathBuf>,
    /// Log more; repeat for even more (overridden by RUST_LOG)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Log less; repeat for even less (overridden by RUST_LOG)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mirror the remote tree, prune files gone remotely, rebuild the index
    Sync(SyncArgs),
    /// Rebuild the index from the mirror without touching the network
    Index(MirrorArgs),
}

#[derive(Debug, Args)]
struct MirrorArgs {
    /// Local mirror root
    #[arg(long)]
    mirror: Option<PathBuf>,
    /// Index file, relative to the mirror root
    #[arg(long)]
    index: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Remote directory URL to mirror
    #[arg(long)]
    source: Option<String>,
    #[command(flatten)]
    mirror: MirrorArgs,
    /// Simultaneous downloads
    #[arg(long)]
    file_concurrency: Option<usize>,
    /// Simultaneous directory listings
    #[arg(long)]
    directory_concurrency: Option<usize>,
}

impl MirrorArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            mirror_root: self.mirror.clone(),
            index_file: self.index.clone(),
            ..Overrides::default()
        }
    }
}
impl SyncArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            source_url: self.source.clone(),
            file_concurrency: self.file_concurrency,
            directory_concurrency: self.directory_concurrency,
            ..self.mirror.overrides()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!(error = ?err, "{}", *err);
                ExitCode::FAILURE
            },
        },
        _ = tokio::signal::ctrl_c() => {
            // Unfinished downloads only ever exist as hidden `.part` files,
            // which the next run prunes.
            tracing::warn!("Interrupted");
            ExitCode::from(130)
        },
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = (2 + usize::from(verbose)).saturating_sub(usize::from(quiet)).min(LEVELS.len() - 1);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LEVELS[level]));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync(args) => {
            let config = Config::load(cli.config.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;
            let root = config.source_url().or_raise(|| ErrorKind::Config)?;
            let backend = open_mirror(&config)?;
            let transport_options = TransportOptions {
                read_timeout: config.read_timeout(),
                request_timeout: config.request_timeout(),
                connect_timeout: config.connect_timeout(),
                ..TransportOptions::default()
            };
            let transport: TransportHandle =
                Arc::new(ReqwestTransport::new(&transport_options).or_raise(|| ErrorKind::Transport)?);

            tracing::info!(source = %root, mirror = %config.mirror_root.display(), "Starting sync");
            let report = synchronize(&transport, &backend, &root, &sync_options(&config))
                .await
                .or_raise(|| ErrorKind::Sync)?;
            tracing::info!("Sync complete: {report}");
            if !report.is_clean() {
                tracing::warn!("Some entries failed; they are retried on the next run");
            }
        },
        Command::Index(args) => {
            let config = Config::load(cli.config.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;
            let backend = open_mirror(&config)?;
            let indexed = rebuild_index(&backend, &config.index_file).await.or_raise(|| ErrorKind::Sync)?;
            tracing::info!(indexed, path = %config.mirror_root.join(&config.index_file).display(), "Index rebuilt");
        },
    }
    Ok(())
}

fn open_mirror(config: &Config) -> Result<BackendHandle> {
    let backend = LocalBackend::new("mirror", &config.mirror_root).or_raise(|| ErrorKind::Storage)?;
    Ok(Arc::new(backend))
}

fn sync_options(config: &Config) -> SyncOptions {
    SyncOptions {
        file_concurrency: config.file_concurrency,
        directory_concurrency: config.directory_concurrency,
        max_depth: config.max_depth,
        retry: RetryPolicy::new(config.retry_attempts, config.retry_delay()),
        index_file: config.index_file.clone(),
    }
}

//! geoproof daemon — entry point for running the verification service.

mod config;
mod error;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use geoproof_api::{ApiServer, AppState, Webhook};
use geoproof_ingest::Ingestor;
use geoproof_store::{MemoryStore, VerificationStore};
use geoproof_store_lmdb::environment::DEFAULT_MAP_SIZE;
use geoproof_store_lmdb::LmdbEnvironment;
use geoproof_types::VerificationStatus;

use config::{ServiceConfig, StorageBackend};
use error::DaemonError;

#[derive(Parser)]
#[command(name = "geoproof-daemon", about = "geoproof verification service daemon")]
struct Cli {
    /// Port for the HTTP API.
    #[arg(long, env = "GEOPROOF_PORT")]
    port: Option<u16>,

    /// Data directory for record storage.
    #[arg(long, env = "GEOPROOF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for photo artifacts (defaults to <data-dir>/uploads).
    #[arg(long, env = "GEOPROOF_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Storage backend.
    #[arg(long, value_enum, env = "GEOPROOF_BACKEND")]
    backend: Option<StorageBackend>,

    /// Forward committed records to this URL (fire-and-forget).
    #[arg(long, env = "GEOPROOF_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// CORS origin to allow ("*" or absent means any).
    #[arg(long, env = "GEOPROOF_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Deployment environment label.
    #[arg(long, env = "GEOPROOF_ENV")]
    env: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GEOPROOF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the service.
    Serve,
    /// Remove orphaned photo artifacts and exit (LMDB backend only).
    Sweep,
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, DaemonError> {
    let mut config = match &cli.config {
        Some(path) => {
            let cfg = ServiceConfig::from_toml_file(path)?;
            info!("Loaded config from {}", path.display());
            cfg
        }
        None => ServiceConfig::default(),
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(uploads_dir) = &cli.uploads_dir {
        config.uploads_dir = Some(uploads_dir.clone());
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(url) = &cli.webhook_url {
        config.webhook_url = Some(url.clone());
    }
    if let Some(origin) = &cli.allowed_origin {
        config.allowed_origin = Some(origin.clone());
    }
    if let Some(env) = &cli.env {
        config.env = env.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init_tracing(&config.log_level);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Sweep => sweep(config),
    }
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let (store, ingestor): (Arc<dyn VerificationStore>, Ingestor) = match config.backend {
        StorageBackend::Lmdb => {
            let env = LmdbEnvironment::open(
                &config.data_dir.join("db"),
                &config.effective_uploads_dir(),
                DEFAULT_MAP_SIZE,
            )?;
            let store = Arc::new(env.verification_store());
            let swept = store.sweep_orphans()?;
            if swept > 0 {
                info!("swept {swept} orphaned photo artifacts");
            }
            (store.clone() as Arc<dyn VerificationStore>, Ingestor::new(store))
        }
        StorageBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            (
                store.clone() as Arc<dyn VerificationStore>,
                Ingestor::with_default_status(store, VerificationStatus::Pending),
            )
        }
    };

    let mut state = AppState::new(store, ingestor).with_env(config.env.clone());
    if let Some(url) = &config.webhook_url {
        info!("forwarding committed records to {url}");
        state = state.with_webhook(Webhook::new(url.clone()));
    }

    info!(
        "Starting geoproof service on port {} ({:?} backend, env: {})",
        config.port, config.backend, config.env
    );
    let server =
        ApiServer::new(config.port, state).with_allowed_origin(config.allowed_origin.clone());

    tokio::select! {
        result = server.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received — stopping service");
        }
    }

    info!("geoproof daemon exited cleanly");
    Ok(())
}

fn sweep(config: ServiceConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        config.backend == StorageBackend::Lmdb,
        "sweep only applies to the lmdb backend"
    );
    let env = LmdbEnvironment::open(
        &config.data_dir.join("db"),
        &config.effective_uploads_dir(),
        DEFAULT_MAP_SIZE,
    )?;
    let removed = env.verification_store().sweep_orphans()?;
    info!("removed {removed} orphaned photo artifacts");
    Ok(())
}

//! pndr-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `PNDR__*`
//! environment variables, and serves the assistant API over HTTP.
//!
//! # Loading data
//!
//! ```text
//! pndr-server init-db
//! pndr-server import dump.json
//! pndr-server serve
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pndr_core::catalog::SchemaCatalog;
use pndr_server::Settings;
use pndr_store_sqlite::{Dump, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PNDR indicator assistant server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "PNDR_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Create the store and its tables if they do not exist.
  InitDb,
  /// Load a JSON dump of both tables into the store.
  Import {
    /// JSON object with `recortes_geograficos` and `valoresmeta` arrays.
    dump: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to load settings from {:?}", cli.config))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&settings).await,
    Command::InitDb => {
      let store = open_store(&settings).await?;
      store.close().await?;
      tracing::info!(store = ?settings.store.resolved_path(), "store initialised");
      Ok(())
    }
    Command::Import { dump } => {
      let parsed =
        Dump::from_file(&dump).with_context(|| format!("failed to read dump {dump:?}"))?;
      let store = open_store(&settings).await?;
      store.import(parsed).await.context("import failed")?;
      store.close().await?;
      Ok(())
    }
  }
}

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  let path = settings.store.resolved_path();
  SqliteStore::open(&path, &SchemaCatalog::pndr())
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
  let path = settings.store.resolved_path();
  anyhow::ensure!(
    path.exists(),
    "no store at {path:?}; run `pndr-server init-db` and `pndr-server import` first"
  );

  pndr_server::report_drift(&pndr_server::executor(settings), &SchemaCatalog::pndr())
    .await
    .context("failed to inspect the store schema")?;

  let pipeline = pndr_server::build_pipeline(settings).context("failed to build pipeline")?;
  let app = pndr_server::app(Arc::new(pipeline));

  let address = &settings.server.bind;
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

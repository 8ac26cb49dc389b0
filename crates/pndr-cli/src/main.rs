//! `pndr`: terminal client for the PNDR indicator assistant.
//!
//! # Usage
//!
//! ```text
//! pndr --url http://localhost:8080
//! pndr --print "Qual a Sustentabilidade Fiscal dos municípios da Bahia em 2022?"
//! pndr --print --map-out bahia.geojson "..."
//! ```

mod app;
mod client;
mod report;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pndr", about = "Ask the PNDR indicator assistant from the terminal")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the pndr server (default: http://localhost:8080).
  #[arg(long, env = "PNDR_URL")]
  url: Option<String>,

  /// Seconds to wait for an answer (default: 180).
  #[arg(long, env = "PNDR_TIMEOUT")]
  timeout: Option<u64>,

  /// Print the answer as plain text instead of opening the terminal UI.
  #[arg(long, requires = "question")]
  print: bool,

  /// Write each answer's map as GeoJSON to FILE.
  #[arg(long, value_name = "FILE")]
  map_out: Option<PathBuf>,

  /// Question to ask straight away.
  question: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url:     args
      .url
      .clone()
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    timeout_secs: args.timeout.or(file_cfg.timeout_secs).unwrap_or(180),
  };
  let client = ApiClient::new(api_config)?;

  if args.print {
    return print_answer(&client, &args).await;
  }

  let mut app = App::new(client, args.map_out.clone());
  app.load_indicators().await;
  if let Some(question) = &args.question {
    app.input = question.clone();
    app.pending = Some(question.clone());
    app.status_msg = "Asking…".into();
  }

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

/// `--print`: one question, plain output, no terminal UI.
async fn print_answer(client: &ApiClient, args: &Args) -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let Some(question) = args.question.as_deref() else {
    bail!("--print needs a question");
  };
  let answer = client.ask(question).await?;
  print!("{}", report::render(&answer));

  if let Some(path) = &args.map_out {
    match &answer.map {
      Some(map) => {
        app::write_map(path, map)?;
        eprintln!("map written to {}", path.display());
      }
      None => eprintln!("no map for this answer; {} not written", path.display()),
    }
  }
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // A question submitted last turn: the "asking" frame is already drawn.
    if let Some(question) = app.pending.take() {
      app.ask(question).await;
      continue;
    }

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}

//! glean-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, starts the summarize worker and the competitor-scan cron jobs, and
//! serves the JSON API under `/api`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```text
//! cargo run -p glean-server -- --hash-password
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use glean_api::{AppState, Directory};
use glean_core::competitor::ScanFrequency;
use glean_pipeline::{JobQueue, LogEvents, Scheduler, Worker};
use glean_providers::{FirecrawlClient, OpenAiClient};
use glean_server::{ServerConfig, cron_scheduler, expand_tilde};
use glean_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Glean summarization server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Run one competitor scan (`w` or `m`) immediately and exit.
  #[arg(long, value_name = "FREQUENCY")]
  scan: Option<ScanFrequency>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = glean_api::auth::hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config)?;
  if cfg.accounts.is_empty() {
    tracing::warn!("no accounts configured; every request will be rejected");
  }

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  let directory = Arc::new(Directory::new(cfg.accounts.clone()));
  let llm = Arc::new(OpenAiClient::new(cfg.openai()).context("failed to build LLM client")?);
  let crawler =
    Arc::new(FirecrawlClient::new(cfg.firecrawl()).context("failed to build crawler client")?);

  let scanner = Scheduler::new(
    Arc::clone(&store),
    Arc::clone(&directory),
    Arc::clone(&llm),
    cfg.llm.default_model.clone(),
  )
  .with_concurrency(cfg.scheduler.scan_concurrency);

  // One-shot scan mode.
  if let Some(frequency) = cli.scan {
    let report = scanner.scan(frequency, Utc::now()).await.context("scan failed")?;
    println!("scanned {} competitors, {} failed", report.scanned, report.failed);
    return Ok(());
  }

  // Worker.
  let events = LogEvents::new();
  let (queue, jobs) = JobQueue::new();
  let worker = Worker::new(Arc::clone(&store), crawler, llm, events.clone());
  worker
    .recover()
    .await
    .context("failed to recover interrupted summaries")?;
  tokio::spawn(worker.run(jobs));

  // Cron triggers. Kept alive for the lifetime of `main`.
  let _cron = if cfg.scheduler.enabled {
    let sched = cron_scheduler(&cfg.scheduler, scanner).await?;
    sched.start().await.context("starting scheduler")?;
    Some(sched)
  } else {
    tracing::info!("competitor scans disabled");
    None
  };

  let state = AppState {
    store,
    directory,
    queue,
    events,
    catalog: Arc::new(cfg.catalog()),
  };

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, glean_api::app(state))
    .await
    .context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

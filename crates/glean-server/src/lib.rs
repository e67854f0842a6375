//! Configuration and wiring for the `glean-server` binary.
//!
//! Configuration is read from an optional TOML file layered with
//! `GLEAN_`-prefixed environment variables, using `__` for nesting:
//!
//! ```text
//! GLEAN_PORT=9000
//! GLEAN_LLM__API_KEY=sk-…
//! GLEAN_SCHEDULER__ENABLED=false
//! ```

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use chrono::Utc;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use glean_api::Account;
use glean_core::{
  collab::{Billing, LanguageModel},
  competitor::ScanFrequency,
  store::GleanStore,
};
use glean_pipeline::{ModelCatalog, Scheduler};
use glean_providers::{FirecrawlConfig, OpenAiConfig};
use serde::Deserialize;
use tokio_cron_scheduler::{Job, JobScheduler};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub crawler:    CrawlerConfig,
  #[serde(default)]
  pub llm:        LlmConfig,
  #[serde(default)]
  pub scheduler:  SchedulerConfig,
  #[serde(default)]
  pub accounts:   Vec<Account>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
  #[serde(default = "default_crawler_url")]
  pub base_url:     String,
  #[serde(default)]
  pub api_key:      String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  #[serde(default = "default_llm_url")]
  pub base_url:      String,
  #[serde(default)]
  pub api_key:       String,
  #[serde(default = "default_model")]
  pub default_model: String,
  /// Extra models a pro account may pick per request.
  #[serde(default)]
  pub models:        Vec<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:  u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
  #[serde(default = "default_true")]
  pub enabled:          bool,
  #[serde(default = "default_monthly_cron")]
  pub monthly_cron:     String,
  #[serde(default = "default_weekly_cron")]
  pub weekly_cron:      String,
  #[serde(default = "default_scan_concurrency")]
  pub scan_concurrency: usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/glean/glean.db") }
fn default_crawler_url() -> String { "https://api.firecrawl.dev".into() }
fn default_llm_url() -> String { "https://api.openai.com".into() }
fn default_model() -> String { "gpt-4o-mini".into() }
fn default_timeout_secs() -> u64 { 120 }
fn default_true() -> bool { true }
fn default_monthly_cron() -> String { "0 0 16 1 * *".into() }
fn default_weekly_cron() -> String { "0 30 14 * * Mon".into() }
fn default_scan_concurrency() -> usize { glean_pipeline::scheduler::DEFAULT_SCAN_CONCURRENCY }

impl Default for CrawlerConfig {
  fn default() -> Self {
    Self {
      base_url:     default_crawler_url(),
      api_key:      String::new(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url:      default_llm_url(),
      api_key:       String::new(),
      default_model: default_model(),
      models:        Vec::new(),
      timeout_secs:  default_timeout_secs(),
    }
  }
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      enabled:          true,
      monthly_cron:     default_monthly_cron(),
      weekly_cron:      default_weekly_cron(),
      scan_concurrency: default_scan_concurrency(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and the `GLEAN_*` environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  /// Finish `builder` with the environment layer and deserialize.
  pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .add_source(
        Environment::with_prefix("GLEAN")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("llm.models")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn firecrawl(&self) -> FirecrawlConfig {
    FirecrawlConfig {
      base_url: self.crawler.base_url.clone(),
      api_key:  self.crawler.api_key.clone(),
      timeout:  Duration::from_secs(self.crawler.timeout_secs),
    }
  }

  pub fn openai(&self) -> OpenAiConfig {
    OpenAiConfig {
      base_url: self.llm.base_url.clone(),
      api_key:  self.llm.api_key.clone(),
      timeout:  Duration::from_secs(self.llm.timeout_secs),
    }
  }

  pub fn catalog(&self) -> ModelCatalog {
    ModelCatalog::new(self.llm.default_model.clone(), self.llm.models.iter().cloned())
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Cron triggers ───────────────────────────────────────────────────────────

/// Register the monthly and weekly competitor scans. The returned scheduler
/// has not been started.
pub async fn cron_scheduler<S, B, L>(
  config: &SchedulerConfig,
  scanner: Scheduler<S, B, L>,
) -> anyhow::Result<JobScheduler>
where
  S: GleanStore + 'static,
  B: Billing + 'static,
  L: LanguageModel + 'static,
{
  let sched = JobScheduler::new().await.context("creating scheduler")?;

  for (cron, frequency) in [
    (&config.monthly_cron, ScanFrequency::Monthly),
    (&config.weekly_cron, ScanFrequency::Weekly),
  ] {
    let scanner = scanner.clone();
    let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
      let scanner = scanner.clone();
      Box::pin(async move {
        if let Err(e) = scanner.scan(frequency, Utc::now()).await {
          tracing::error!(frequency = frequency.as_ref(), error = %e, "competitor scan aborted");
        }
      })
    })
    .with_context(|| format!("creating scan job for cron {cron:?}"))?;
    sched.add(job).await.context("adding scan job")?;
    tracing::info!(frequency = frequency.as_ref(), cron = %cron, "competitor scan scheduled");
  }

  Ok(sched)
}

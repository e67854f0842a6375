//! Crawler backed by a Firecrawl-compatible scrape API.

use std::time::Duration;

use glean_core::collab::{CrawledPage, Crawler};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
  pub base_url: String,
  pub api_key:  String,
  pub timeout:  Duration,
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FirecrawlClient {
  client: Client,
  config: FirecrawlConfig,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
  url:     &'a str,
  formats: [&'static str; 2],
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeResponse {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  data:    Option<ScrapeData>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
  markdown: Option<String>,
  html:     Option<String>,
}

impl FirecrawlClient {
  pub fn new(config: FirecrawlConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/v2/scrape", self.config.base_url.trim_end_matches('/'))
  }

  async fn fetch(&self, url: &str) -> Result<CrawledPage> {
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&ScrapeRequest { url, formats: ["markdown", "html"] })
      .send()
      .await?;

    let status = resp.status();
    if page_refused(status) {
      // The job carries on with the other URLs.
      tracing::debug!(%url, status = status.as_u16(), "scrape rejected");
      return Ok(CrawledPage::default());
    }
    if !status.is_success() {
      return Err(Error::Status {
        service: "firecrawl",
        status:  status.as_u16(),
        body:    resp.text().await.unwrap_or_default(),
      });
    }

    let body: ScrapeResponse = resp.json().await?;
    Ok(page_from_response(body))
  }
}

/// Statuses that describe the page (blocked, missing, unsupported) rather
/// than the scrape service. Anything else that is not a success, such as a
/// bad key, exhausted credits or rate limiting, fails the scrape.
fn page_refused(status: StatusCode) -> bool {
  matches!(
    status,
    StatusCode::BAD_REQUEST
      | StatusCode::FORBIDDEN
      | StatusCode::NOT_FOUND
      | StatusCode::GONE
      | StatusCode::UNSUPPORTED_MEDIA_TYPE
      | StatusCode::UNPROCESSABLE_ENTITY
  )
}

fn page_from_response(body: ScrapeResponse) -> CrawledPage {
  match body.data {
    Some(data) if body.success => CrawledPage { markdown: data.markdown, html: data.html },
    _ => CrawledPage::default(),
  }
}

impl Crawler for FirecrawlClient {
  type Error = Error;

  async fn scrape(&self, url: &str) -> Result<CrawledPage> { self.fetch(url).await }
}

//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use glean_core::{
  account::UserId,
  competitor::{CompetitorFields, ScanFrequency},
  library::{BundleFields, DocumentBody},
  log::{LogQuery, LogStatus, NewScrapeLog, Sentiment, StructuredInsights},
  store::GleanStore,
  usage::MonthKey,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn alice() -> UserId { UserId::from("alice") }

fn bob() -> UserId { UserId::from("bob") }

fn new_log(user: &UserId, title: &str) -> NewScrapeLog {
  NewScrapeLog {
    user_id: user.clone(),
    title:   Some(title.into()),
    urls:    vec!["https://a.example".into(), "https://b.example".into()],
    model:   Some("gpt-4o-mini".into()),
  }
}

fn insights(sentiment: Sentiment) -> StructuredInsights {
  StructuredInsights {
    sentiment,
    key_findings:        vec!["Prices went up".into()],
    action_items:        vec!["Review pricing".into()],
    companies_mentioned: vec!["Acme".into()],
    topics_identified:   vec!["pricing".into()],
  }
}

// ─── Scrape logs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_log_starts_processing() {
  let s = store().await;
  let log = s.insert_log(new_log(&alice(), "Q3")).await.unwrap();
  assert_eq!(log.status, LogStatus::Processing);
  assert!(log.summarized_markdown.is_none());

  let fetched = s.get_log(&alice(), log.log_id).await.unwrap().unwrap();
  assert_eq!(fetched.log_id, log.log_id);
  assert_eq!(fetched.urls, log.urls);
  assert_eq!(fetched.status, LogStatus::Processing);
  assert_eq!(fetched.model.as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn complete_log_is_a_single_transition() {
  let s = store().await;
  let log = s.insert_log(new_log(&alice(), "Q3")).await.unwrap();

  let first = s
    .complete_log(log.log_id, "# Summary".into(), insights(Sentiment::Positive))
    .await
    .unwrap();
  assert!(first);

  // A later failure must not overwrite the completed row.
  assert!(!s.fail_log(log.log_id).await.unwrap());
  assert!(
    !s.complete_log(log.log_id, "other".into(), insights(Sentiment::Negative))
      .await
      .unwrap()
  );

  let fetched = s.get_log(&alice(), log.log_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, LogStatus::Completed);
  assert_eq!(fetched.summarized_markdown.as_deref(), Some("# Summary"));
  assert_eq!(fetched.structured_insights, Some(insights(Sentiment::Positive)));
}

#[tokio::test]
async fn fail_log_leaves_content_empty() {
  let s = store().await;
  let log = s.insert_log(new_log(&alice(), "Q3")).await.unwrap();
  assert!(s.fail_log(log.log_id).await.unwrap());

  let fetched = s.get_log(&alice(), log.log_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, LogStatus::Failed);
  assert!(fetched.summarized_markdown.is_none());
  assert!(fetched.structured_insights.is_none());
}

#[tokio::test]
async fn transition_on_missing_log_reports_false() {
  let s = store().await;
  assert!(!s.fail_log(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn processing_logs_spans_users_and_skips_terminal() {
  let s = store().await;
  let stuck_a = s.insert_log(new_log(&alice(), "a")).await.unwrap();
  let stuck_b = s.insert_log(new_log(&bob(), "b")).await.unwrap();
  let done = s.insert_log(new_log(&alice(), "done")).await.unwrap();
  s.complete_log(done.log_id, "# ok".into(), insights(Sentiment::Neutral))
    .await
    .unwrap();

  let ids: Vec<Uuid> = s
    .processing_logs()
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.log_id)
    .collect();
  assert_eq!(ids, vec![stuck_a.log_id, stuck_b.log_id]);
}

#[tokio::test]
async fn logs_are_invisible_to_other_users() {
  let s = store().await;
  let log = s.insert_log(new_log(&alice(), "private")).await.unwrap();

  assert!(s.get_log(&bob(), log.log_id).await.unwrap().is_none());
  let bobs = s.search_logs(&bob(), &LogQuery::default()).await.unwrap();
  assert!(bobs.is_empty());
}

#[tokio::test]
async fn search_logs_newest_first() {
  let s = store().await;
  let first = s.insert_log(new_log(&alice(), "one")).await.unwrap();
  let second = s.insert_log(new_log(&alice(), "two")).await.unwrap();
  let third = s.insert_log(new_log(&alice(), "three")).await.unwrap();

  let all = s.search_logs(&alice(), &LogQuery::default()).await.unwrap();
  let ids: Vec<Uuid> = all.iter().map(|l| l.log_id).collect();
  assert_eq!(ids, vec![third.log_id, second.log_id, first.log_id]);
}

#[tokio::test]
async fn search_logs_filters_combine() {
  let s = store().await;
  let pricing = s.insert_log(new_log(&alice(), "Pricing review")).await.unwrap();
  let hiring = s.insert_log(new_log(&alice(), "Hiring trends")).await.unwrap();
  let pending = s.insert_log(new_log(&alice(), "Pricing draft")).await.unwrap();

  s.complete_log(pricing.log_id, "prices up".into(), insights(Sentiment::Negative))
    .await
    .unwrap();
  s.complete_log(hiring.log_id, "more hires".into(), insights(Sentiment::Positive))
    .await
    .unwrap();

  // Text is case-insensitive and matches title.
  let q = LogQuery { text: Some("pricing".into()), ..Default::default() };
  let hits = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(hits.len(), 2);

  // Text also matches summary body.
  let q = LogQuery { text: Some("HIRES".into()), ..Default::default() };
  let hits = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].log_id, hiring.log_id);

  let q = LogQuery { status: Some(LogStatus::Processing), ..Default::default() };
  let hits = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].log_id, pending.log_id);

  let q = LogQuery {
    text: Some("pricing".into()),
    sentiment: Some(Sentiment::Negative),
    ..Default::default()
  };
  let hits = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].log_id, pricing.log_id);
}

#[tokio::test]
async fn search_logs_treats_wildcards_literally() {
  let s = store().await;
  s.insert_log(new_log(&alice(), "50% off")).await.unwrap();
  s.insert_log(new_log(&alice(), "500 offers")).await.unwrap();

  let q = LogQuery { text: Some("50%".into()), ..Default::default() };
  let hits = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].title.as_deref(), Some("50% off"));
}

#[tokio::test]
async fn search_logs_paginates() {
  let s = store().await;
  for i in 0..5 {
    s.insert_log(new_log(&alice(), &format!("log {i}"))).await.unwrap();
  }
  let q = LogQuery { limit: Some(2), offset: Some(2), ..Default::default() };
  let page = s.search_logs(&alice(), &q).await.unwrap();
  assert_eq!(page.len(), 2);
  assert_eq!(page[0].title.as_deref(), Some("log 2"));
  assert_eq!(page[1].title.as_deref(), Some("log 1"));
}

// ─── URL bundles ─────────────────────────────────────────────────────────────

fn bundle_fields(name: &str) -> BundleFields {
  BundleFields {
    name:        name.into(),
    description: Some("weekly reads".into()),
    urls:        vec!["https://news.example".into()],
  }
}

#[tokio::test]
async fn bundle_crud() {
  let s = store().await;
  let bundle = s.create_bundle(&alice(), bundle_fields("News")).await.unwrap();

  let fetched = s.get_bundle(&alice(), bundle.bundle_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "News");
  assert_eq!(fetched.urls, vec!["https://news.example".to_string()]);

  let updated = s
    .update_bundle(
      &alice(),
      bundle.bundle_id,
      BundleFields {
        name:        "Industry".into(),
        description: None,
        urls:        vec!["https://x.example".into(), "https://y.example".into()],
      },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Industry");
  assert!(updated.description.is_none());
  assert_eq!(updated.urls.len(), 2);
  assert_eq!(updated.created_at, bundle.created_at);

  assert_eq!(s.list_bundles(&alice()).await.unwrap().len(), 1);
  assert!(s.delete_bundle(&alice(), bundle.bundle_id).await.unwrap());
  assert!(s.get_bundle(&alice(), bundle.bundle_id).await.unwrap().is_none());
  assert!(!s.delete_bundle(&alice(), bundle.bundle_id).await.unwrap());
}

#[tokio::test]
async fn bundles_are_scoped_to_owner() {
  let s = store().await;
  let bundle = s.create_bundle(&alice(), bundle_fields("News")).await.unwrap();

  assert!(s.get_bundle(&bob(), bundle.bundle_id).await.unwrap().is_none());
  assert!(
    s.update_bundle(&bob(), bundle.bundle_id, bundle_fields("Stolen"))
      .await
      .unwrap()
      .is_none()
  );
  assert!(!s.delete_bundle(&bob(), bundle.bundle_id).await.unwrap());
  assert!(s.list_bundles(&bob()).await.unwrap().is_empty());

  let still = s.get_bundle(&alice(), bundle.bundle_id).await.unwrap().unwrap();
  assert_eq!(still.name, "News");
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn documents_search_by_text_and_file_name() {
  let s = store().await;
  s.add_document(&alice(), DocumentBody::Text { content: "Quarterly Revenue notes".into() })
    .await
    .unwrap();
  s.add_document(
    &alice(),
    DocumentBody::File {
      storage_id: "blob-1".into(),
      file_name:  "revenue-2026.pdf".into(),
      file_size:  2048,
    },
  )
  .await
  .unwrap();
  s.add_document(&alice(), DocumentBody::Text { content: "hiring plan".into() })
    .await
    .unwrap();
  s.add_document(&bob(), DocumentBody::Text { content: "revenue for bob".into() })
    .await
    .unwrap();

  assert_eq!(s.search_documents(&alice(), None).await.unwrap().len(), 3);
  assert_eq!(s.search_documents(&alice(), Some("  ")).await.unwrap().len(), 3);

  let hits = s.search_documents(&alice(), Some("revenue")).await.unwrap();
  assert_eq!(hits.len(), 2);
  let file = hits
    .iter()
    .find(|d| d.body.file_name().is_some())
    .expect("file document");
  assert_eq!(
    file.body,
    DocumentBody::File {
      storage_id: "blob-1".into(),
      file_name:  "revenue-2026.pdf".into(),
      file_size:  2048,
    }
  );
}

// ─── Competitors ─────────────────────────────────────────────────────────────

fn competitor(name: &str, freq: ScanFrequency) -> CompetitorFields {
  CompetitorFields { name: name.into(), scan_frequency: freq }
}

#[tokio::test]
async fn competitor_crud() {
  let s = store().await;
  let acme = s
    .create_competitor(&alice(), competitor("Acme", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  s.create_competitor(&alice(), competitor("Globex", ScanFrequency::Monthly), None)
    .await
    .unwrap()
    .unwrap();
  assert!(acme.last_scanned_on.is_none());
  assert_eq!(s.list_competitors(&alice()).await.unwrap().len(), 2);
  assert!(s.list_competitors(&bob()).await.unwrap().is_empty());

  let updated = s
    .update_competitor(&alice(), acme.competitor_id, competitor("Acme Corp", ScanFrequency::Monthly))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Acme Corp");
  assert_eq!(updated.scan_frequency, ScanFrequency::Monthly);

  assert!(
    s.update_competitor(&bob(), acme.competitor_id, competitor("x", ScanFrequency::Weekly))
      .await
      .unwrap()
      .is_none()
  );
  assert!(!s.delete_competitor(&bob(), acme.competitor_id).await.unwrap());
  assert!(s.delete_competitor(&alice(), acme.competitor_id).await.unwrap());
  assert_eq!(s.list_competitors(&alice()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn competitor_cap_refuses_extra_insert() {
  let s = store().await;
  for name in ["Acme", "Globex"] {
    assert!(
      s.create_competitor(&alice(), competitor(name, ScanFrequency::Weekly), Some(2))
        .await
        .unwrap()
        .is_some()
    );
  }
  let refused = s
    .create_competitor(&alice(), competitor("Initech", ScanFrequency::Weekly), Some(2))
    .await
    .unwrap();
  assert!(refused.is_none());
  assert_eq!(s.list_competitors(&alice()).await.unwrap().len(), 2);

  // The cap counts the caller's rows only.
  assert!(
    s.create_competitor(&bob(), competitor("Initech", ScanFrequency::Weekly), Some(2))
      .await
      .unwrap()
      .is_some()
  );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_competitor_creates_respect_cap() {
  let s = store().await;
  let mut handles = Vec::new();
  for i in 0..20 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      let fields = competitor(&format!("Co {i}"), ScanFrequency::Weekly);
      s.create_competitor(&alice(), fields, Some(5))
        .await
        .unwrap()
        .is_some()
    }));
  }
  let mut accepted = 0;
  for h in handles {
    if h.await.unwrap() {
      accepted += 1;
    }
  }
  assert_eq!(accepted, 5);
  assert_eq!(s.list_competitors(&alice()).await.unwrap().len(), 5);
}

#[tokio::test]
async fn competitors_due_spans_all_users() {
  let s = store().await;
  s.create_competitor(&alice(), competitor("Acme", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  s.create_competitor(&bob(), competitor("Initech", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  s.create_competitor(&bob(), competitor("Globex", ScanFrequency::Monthly), None)
    .await
    .unwrap()
    .unwrap();

  let weekly = s.competitors_due(ScanFrequency::Weekly).await.unwrap();
  assert_eq!(weekly.len(), 2);
  let monthly = s.competitors_due(ScanFrequency::Monthly).await.unwrap();
  assert_eq!(monthly.len(), 1);
  assert_eq!(monthly[0].name, "Globex");
}

#[tokio::test]
async fn mark_scanned_records_trigger_time() {
  let s = store().await;
  let acme = s
    .create_competitor(&alice(), competitor("Acme", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 0).unwrap();
  s.mark_scanned(acme.competitor_id, at).await.unwrap();

  let fetched = s
    .get_competitor(&alice(), acme.competitor_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.last_scanned_on, Some(at));
}

#[tokio::test]
async fn analyses_newest_first_and_owner_scoped() {
  let s = store().await;
  let acme = s
    .create_competitor(&alice(), competitor("Acme", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  s.append_analysis(acme.competitor_id, "first".into()).await.unwrap();
  s.append_analysis(acme.competitor_id, "second".into()).await.unwrap();

  let list = s
    .list_analyses(&alice(), acme.competitor_id)
    .await
    .unwrap()
    .unwrap();
  let texts: Vec<&str> = list.iter().map(|a| a.analysis.as_str()).collect();
  assert_eq!(texts, vec!["second", "first"]);

  assert!(s.list_analyses(&bob(), acme.competitor_id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_competitor_keeps_analysis_rows() {
  let s = store().await;
  let acme = s
    .create_competitor(&alice(), competitor("Acme", ScanFrequency::Weekly), None)
    .await
    .unwrap()
    .unwrap();
  let analysis = s.append_analysis(acme.competitor_id, "kept".into()).await.unwrap();
  assert!(s.delete_competitor(&alice(), acme.competitor_id).await.unwrap());

  // The owner can no longer list them, but the row itself survives.
  assert!(s.list_analyses(&alice(), acme.competitor_id).await.unwrap().is_none());
  let again = s.append_analysis(acme.competitor_id, "orphan".into()).await.unwrap();
  assert_ne!(again.analysis_id, analysis.analysis_id);
}

// ─── Usage ledger ────────────────────────────────────────────────────────────

#[tokio::test]
async fn usage_counters_increment_per_month() {
  let s = store().await;
  let october: MonthKey = "2026-10".parse().unwrap();
  let november: MonthKey = "2026-11".parse().unwrap();

  assert!(s.usage(&alice(), october).await.unwrap().is_none());

  let u = s.record_summary(&alice(), october, None).await.unwrap().unwrap();
  assert_eq!((u.summary_count, u.competitor_count), (1, 0));
  let u = s.record_summary(&alice(), october, None).await.unwrap().unwrap();
  assert_eq!((u.summary_count, u.competitor_count), (2, 0));
  let u = s.record_analysis(&alice(), october).await.unwrap();
  assert_eq!((u.summary_count, u.competitor_count), (2, 1));

  // A new month starts from zero.
  let u = s.record_summary(&alice(), november, None).await.unwrap().unwrap();
  assert_eq!((u.summary_count, u.competitor_count), (1, 0));
  assert_eq!(u.month, november);

  let oct = s.usage(&alice(), october).await.unwrap().unwrap();
  assert_eq!(oct.summary_count, 2);
  assert!(s.usage(&bob(), october).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_summary_increments_are_not_lost() {
  let s = store().await;
  let month = MonthKey::current();

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.record_summary(&alice(), month, None).await.unwrap();
    }));
  }
  for h in handles {
    h.await.unwrap();
  }

  let u = s.usage(&alice(), month).await.unwrap().unwrap();
  assert_eq!(u.summary_count, 8);
}

#[tokio::test]
async fn summary_cap_refuses_without_incrementing() {
  let s = store().await;
  let month = MonthKey::current();

  for n in 1..=3 {
    let u = s.record_summary(&alice(), month, Some(3)).await.unwrap().unwrap();
    assert_eq!(u.summary_count, n);
  }
  assert!(s.record_summary(&alice(), month, Some(3)).await.unwrap().is_none());
  assert_eq!(s.usage(&alice(), month).await.unwrap().unwrap().summary_count, 3);

  // A zero cap refuses even the first request and creates no row.
  assert!(s.record_summary(&bob(), month, Some(0)).await.unwrap().is_none());
  assert!(s.usage(&bob(), month).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_capped_summaries_stop_at_cap() {
  let s = store().await;
  let month = MonthKey::current();

  let mut handles = Vec::new();
  for _ in 0..30 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.record_summary(&alice(), month, Some(10)).await.unwrap().is_some()
    }));
  }
  let mut accepted = 0;
  for h in handles {
    if h.await.unwrap() {
      accepted += 1;
    }
  }
  assert_eq!(accepted, 10);
  assert_eq!(s.usage(&alice(), month).await.unwrap().unwrap().summary_count, 10);
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_upsert_replaces_prompt() {
  let s = store().await;
  assert!(s.settings(&alice()).await.unwrap().is_none());

  let first = s
    .upsert_settings(&alice(), Some("Be terse.".into()))
    .await
    .unwrap();
  assert_eq!(first.custom_prompt(), Some("Be terse."));

  let cleared = s.upsert_settings(&alice(), None).await.unwrap();
  assert!(cleared.system_prompt.is_none());
  assert!(cleared.updated_at >= first.updated_at);

  let fetched = s.settings(&alice()).await.unwrap().unwrap();
  assert!(fetched.system_prompt.is_none());
  assert!(s.settings(&bob()).await.unwrap().is_none());
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_file_store_is_idempotent() {
  let dir = std::env::temp_dir().join(format!("glean-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("glean.db");

  let log_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.insert_log(new_log(&alice(), "persisted")).await.unwrap().log_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let fetched = s.get_log(&alice(), log_id).await.unwrap();
  assert!(fetched.is_some());

  let _ = std::fs::remove_dir_all(&dir);
}

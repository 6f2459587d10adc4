//! SQLite analytics persistence and summary tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::tempdir;

use modelmux::analytics::{
    AnalyticsRepository, Period, RequestRecord, SqliteAnalyticsStore, UsageTracker,
};
use modelmux::domain::{ProviderKind, Request, Response};

async fn store(dir: &tempfile::TempDir) -> SqliteAnalyticsStore {
    let path = dir.path().join("analytics.db");
    SqliteAnalyticsStore::connect(path.to_str().unwrap())
        .await
        .unwrap()
}

fn record(id: &str, model: &str, age_hours: i64, cost: f64, tokens: i64) -> RequestRecord {
    RequestRecord {
        id: id.to_string(),
        timestamp: (Utc::now() - ChronoDuration::hours(age_hours)).to_rfc3339(),
        model: model.to_string(),
        provider: "openai".to_string(),
        cost,
        latency: 1.0,
        tokens,
    }
}

#[tokio::test]
async fn save_and_find_round_trip() {
    let dir = tempdir().unwrap();
    let store = store(&dir).await;

    let saved = record("r1", "gpt-4", 1, 0.06, 1000);
    store.save(&saved).await.unwrap();

    let since = (Utc::now() - ChronoDuration::hours(2)).to_rfc3339();
    let found = store.find_since(&since).await.unwrap();
    assert_eq!(found, vec![saved]);
}

#[tokio::test]
async fn find_since_excludes_older_records() {
    let dir = tempdir().unwrap();
    let store = store(&dir).await;

    store.save(&record("old", "gpt-4", 48, 0.06, 1000)).await.unwrap();
    store.save(&record("new", "gpt-4", 1, 0.03, 500)).await.unwrap();

    let since = (Utc::now() - ChronoDuration::hours(24)).to_rfc3339();
    let found = store.find_since(&since).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "new");
}

#[tokio::test]
async fn find_by_model_filters_exactly() {
    let dir = tempdir().unwrap();
    let store = store(&dir).await;

    store.save(&record("a", "gpt-4", 1, 0.06, 1000)).await.unwrap();
    store
        .save(&record("b", "claude-3-opus", 1, 0.015, 1000))
        .await
        .unwrap();
    store.save(&record("c", "gpt-4", 2, 0.06, 1000)).await.unwrap();

    let found = store.find_by_model("gpt-4").await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|r| r.model == "gpt-4"));
}

#[tokio::test]
async fn save_is_idempotent_per_id() {
    let dir = tempdir().unwrap();
    let store = store(&dir).await;

    let first = record("same", "gpt-4", 1, 0.06, 1000);
    let mut second = first.clone();
    second.cost = 0.12;
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    let found = store.find_by_model("gpt-4").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].cost, 0.12);
}

#[tokio::test]
async fn summary_aggregates_recent_window() {
    let dir = tempdir().unwrap();
    let store = store(&dir).await;

    store.save(&record("a", "gpt-4", 1, 0.06, 1000)).await.unwrap();
    store
        .save(&record("b", "claude-3-opus", 2, 0.015, 1000))
        .await
        .unwrap();
    // outside the 24 hour window
    store.save(&record("c", "gpt-4", 40, 0.06, 1000)).await.unwrap();

    let tracker = UsageTracker::new(Arc::new(store));
    let summary = tracker.get_summary(Period::Last24Hours).await.unwrap();

    assert_eq!(summary.total_requests, 2);
    assert_eq!(summary.total_cost, 0.075);
    assert_eq!(summary.total_tokens, 2000);
    assert_eq!(summary.by_model.len(), 2);

    let wide = tracker.get_summary(Period::Last7Days).await.unwrap();
    assert_eq!(wide.total_requests, 3);
}

#[tokio::test]
async fn tracker_persists_completions_in_background() {
    let dir = tempdir().unwrap();
    let store = Arc::new(store(&dir).await);
    let tracker = UsageTracker::new(store.clone());

    let request = Request::new("hello").unwrap();
    let response = Response::new("hi", "gpt-4", 0.06, 1.2, 1000).unwrap();
    tracker.track(&request, &response, ProviderKind::OpenAi);

    // the write is spawned; give it a moment to land
    let mut found = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        found = store.find_by_model("gpt-4").await.unwrap();
        if !found.is_empty() {
            break;
        }
    }
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].provider, "openai");
    assert_eq!(found[0].cost, 0.06);
    assert_eq!(found[0].tokens, 1000);
}

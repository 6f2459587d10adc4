//! Usage tracking and cost analytics.
//!
//! Tracking is fire-and-forget: the router hands each finished completion to
//! [`UsageTracker::track`], which spawns the database write and never blocks
//! or fails the request path. Summaries aggregate over named trailing
//! windows.

pub mod aggregator;
pub mod sqlite;

pub use aggregator::{ModelUsage, UsageSummary};
pub use sqlite::SqliteAnalyticsStore;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{ProviderKind, Request, Response};
use crate::error::{Error, Result};

/// Named trailing windows accepted by summary queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Last24Hours,
    Last7Days,
    Last30Days,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last24Hours => "last_24_hours",
            Period::Last7Days => "last_7_days",
            Period::Last30Days => "last_30_days",
        }
    }

    /// Inclusive window start for a window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Last24Hours => now - Duration::hours(24),
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => now - Duration::days(30),
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last_24_hours" => Ok(Period::Last24Hours),
            "last_7_days" => Ok(Period::Last7Days),
            "last_30_days" => Ok(Period::Last30Days),
            other => Err(Error::Validation(format!(
                "unknown period '{other}', expected last_24_hours, last_7_days, or last_30_days"
            ))),
        }
    }
}

/// One completed request, as persisted.
///
/// Timestamps are RFC 3339 UTC strings; fixed formatting keeps string
/// comparison consistent with chronological order.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RequestRecord {
    pub id: String,
    pub timestamp: String,
    pub model: String,
    pub provider: String,
    pub cost: f64,
    pub latency: f64,
    pub tokens: i64,
}

/// Persistence boundary for request records.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn save(&self, record: &RequestRecord) -> Result<()>;
    async fn find_since(&self, since: &str) -> Result<Vec<RequestRecord>>;
    async fn find_by_model(&self, model: &str) -> Result<Vec<RequestRecord>>;
}

/// Records completions and answers summary queries.
pub struct UsageTracker {
    repository: Arc<dyn AnalyticsRepository>,
}

impl UsageTracker {
    pub fn new(repository: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repository }
    }

    /// Persist a completed request without blocking the caller.
    ///
    /// Write failures are logged and dropped.
    pub fn track(&self, request: &Request, response: &Response, provider: ProviderKind) {
        let _ = request;
        let record = RequestRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            model: response.model_used().to_string(),
            provider: provider.as_str().to_string(),
            cost: response.cost(),
            latency: response.latency(),
            tokens: response.tokens() as i64,
        };
        let repository = self.repository.clone();
        tokio::spawn(async move {
            if let Err(err) = repository.save(&record).await {
                tracing::warn!(
                    model = %record.model,
                    error = %err,
                    "Failed to persist usage record"
                );
            }
        });
    }

    /// Aggregate usage over a trailing window ending now.
    pub async fn get_summary(&self, period: Period) -> Result<UsageSummary> {
        let since = period.start(Utc::now()).to_rfc3339();
        let records = self.repository.find_since(&since).await?;
        Ok(aggregator::summarize(period, &records))
    }
}

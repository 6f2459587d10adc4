//! Pure aggregation over persisted request records.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Period, RequestRecord};

/// Per-1K-token price of the assumed "always pick the flagship" baseline
/// that savings are measured against.
pub const BASELINE_PRICE_PER_1K: f64 = 0.06;

/// Usage rolled up for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelUsage {
    pub requests: u64,
    pub cost: f64,
    pub tokens: u64,
}

/// Aggregate usage over one period.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub period: String,
    pub total_requests: u64,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub savings_vs_baseline: f64,
    pub by_model: BTreeMap<String, ModelUsage>,
    pub latency_p50: f64,
    pub latency_p95: f64,
    pub latency_p99: f64,
}

pub fn summarize(period: Period, records: &[RequestRecord]) -> UsageSummary {
    let total_requests = records.len() as u64;
    let total_cost = round6(records.iter().map(|r| r.cost).sum());
    let total_tokens: u64 = records.iter().map(|r| r.tokens.max(0) as u64).sum();

    let baseline_cost = (total_tokens as f64 / 1000.0) * BASELINE_PRICE_PER_1K;
    let savings_vs_baseline = round6(baseline_cost - total_cost);

    let mut by_model: BTreeMap<String, ModelUsage> = BTreeMap::new();
    for record in records {
        let entry = by_model.entry(record.model.clone()).or_insert(ModelUsage {
            requests: 0,
            cost: 0.0,
            tokens: 0,
        });
        entry.requests += 1;
        entry.cost = round6(entry.cost + record.cost);
        entry.tokens += record.tokens.max(0) as u64;
    }

    let mut latencies: Vec<f64> = records.iter().map(|r| r.latency).collect();
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    UsageSummary {
        period: period.as_str().to_string(),
        total_requests,
        total_cost,
        total_tokens,
        savings_vs_baseline,
        by_model,
        latency_p50: percentile(&latencies, 50.0),
        latency_p95: percentile(&latencies, 95.0),
        latency_p99: percentile(&latencies, 99.0),
    }
}

/// Linearly interpolated percentile over an ascending-sorted slice.
///
/// Empty input yields 0.0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return round6(sorted[0]);
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return round6(sorted[lower]);
    }
    let weight = rank - lower as f64;
    round6(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

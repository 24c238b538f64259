// SPDX-License-Identifier: Apache-2.0

//! In-process query metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

#[derive(Default)]
struct QueryMetrics {
    total: AtomicU64,
    failed: AtomicU64,
    timeouts: AtomicU64,
    stale_responses: AtomicU64,
    count_queries: AtomicU64,
    duration_total_ms: AtomicU64,
    duration_max_ms: AtomicU64,
}

static QUERY_METRICS: OnceLock<QueryMetrics> = OnceLock::new();

fn metrics() -> &'static QueryMetrics {
    QUERY_METRICS.get_or_init(QueryMetrics::default)
}

pub fn record_query(duration_ms: f64, success: bool) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();
    metrics.total.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.failed.fetch_add(1, Ordering::Relaxed);
    }
    metrics
        .duration_total_ms
        .fetch_add(duration_ms, Ordering::Relaxed);
    metrics.duration_max_ms.fetch_max(duration_ms, Ordering::Relaxed);
}

pub fn record_timeout() {
    metrics().timeouts.fetch_add(1, Ordering::Relaxed);
}

/// A page or count response arrived after a newer request was issued.
pub fn record_stale_response() {
    metrics().stale_responses.fetch_add(1, Ordering::Relaxed);
}

pub fn record_count_query() {
    metrics().count_queries.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Serialize)]
pub struct QueryMetricsSnapshot {
    pub total: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub stale_responses: u64,
    pub count_queries: u64,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<u64>,
}

pub fn snapshot() -> QueryMetricsSnapshot {
    let metrics = metrics();
    let total = metrics.total.load(Ordering::Relaxed);
    let duration_total = metrics.duration_total_ms.load(Ordering::Relaxed);
    let max_ms = metrics.duration_max_ms.load(Ordering::Relaxed);

    let avg_ms = if total > 0 {
        Some(duration_total as f64 / total as f64)
    } else {
        None
    };

    QueryMetricsSnapshot {
        total,
        failed: metrics.failed.load(Ordering::Relaxed),
        timeouts: metrics.timeouts.load(Ordering::Relaxed),
        stale_responses: metrics.stale_responses.load(Ordering::Relaxed),
        count_queries: metrics.count_queries.load(Ordering::Relaxed),
        avg_ms,
        max_ms: if max_ms > 0 { Some(max_ms) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-global and other tests record into them, so only
    // lower bounds are asserted.
    #[test]
    fn test_metrics_flow() {
        let initial = snapshot();

        record_query(100.0, true);
        record_query(50.0, false);
        let s1 = snapshot();
        assert!(s1.total >= initial.total + 2);
        assert!(s1.failed > initial.failed);

        record_timeout();
        record_stale_response();
        record_count_query();
        let s2 = snapshot();
        assert!(s2.timeouts > initial.timeouts);
        assert!(s2.stale_responses > initial.stale_responses);
        assert!(s2.count_queries > initial.count_queries);

        record_query(99999.0, true);
        assert!(snapshot().max_ms.unwrap_or(0) >= 99999);
    }
}

//! Rolling statistics over a telemetry snapshot.
//!
//! All helpers are total: empty inputs and zero denominators yield `0.0`
//! rather than `NaN`.

use crate::types::{
    AggregateMetrics, DependencyRow, HealthStatus, PerformanceRow, TelemetryKind,
    TelemetrySnapshot,
};
use serde::{Deserialize, Serialize};

/// Arithmetic mean, or `0.0` for an empty iterator.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// `failed / total * 100`, or `0.0` when `total` is zero.
///
/// # Examples
///
/// ```
/// use apmon_common::stats::failure_rate;
///
/// assert_eq!(failure_rate(6, 100), 6.0);
/// assert_eq!(failure_rate(0, 0), 0.0);
/// ```
pub fn failure_rate(failed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    failed as f64 / total as f64 * 100.0
}

impl AggregateMetrics {
    pub fn from_requests(rows: &[PerformanceRow]) -> Self {
        let failed = rows.iter().filter(|r| !r.success).count();
        Self {
            kind: TelemetryKind::Requests,
            count: rows.len(),
            failed,
            avg_duration_ms: mean(rows.iter().map(|r| r.duration_ms)),
            failure_rate: failure_rate(failed, rows.len()),
        }
    }

    pub fn from_dependencies(rows: &[DependencyRow]) -> Self {
        let failed = rows.iter().filter(|r| !r.success).count();
        Self {
            kind: TelemetryKind::Dependencies,
            count: rows.len(),
            failed,
            avg_duration_ms: mean(rows.iter().map(|r| r.duration_ms)),
            failure_rate: failure_rate(failed, rows.len()),
        }
    }

    /// Count-only aggregate for kinds without an outcome flag.
    pub fn from_count(kind: TelemetryKind, count: usize) -> Self {
        Self {
            kind,
            count,
            failed: 0,
            avg_duration_ms: 0.0,
            failure_rate: 0.0,
        }
    }
}

/// Aggregates for all four collections of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub requests: AggregateMetrics,
    pub exceptions: AggregateMetrics,
    pub dependencies: AggregateMetrics,
    pub slow_requests: AggregateMetrics,
}

impl MetricsSummary {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        let mut slow_requests =
            AggregateMetrics::from_count(TelemetryKind::SlowRequests, snapshot.slow_requests.len());
        slow_requests.avg_duration_ms = mean(snapshot.slow_requests.iter().map(|r| r.duration_ms));

        Self {
            requests: AggregateMetrics::from_requests(&snapshot.requests),
            exceptions: AggregateMetrics::from_count(
                TelemetryKind::Exceptions,
                snapshot.exceptions.len(),
            ),
            dependencies: AggregateMetrics::from_dependencies(&snapshot.dependencies),
            slow_requests,
        }
    }

    /// Overall health follows the request failure rate.
    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_failure_rate(self.requests.failure_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(duration_ms: f64, success: bool) -> PerformanceRow {
        PerformanceRow {
            timestamp: Utc::now(),
            name: "GET /api/orders".into(),
            url: "https://shop.example.com/api/orders".into(),
            duration_ms,
            success,
            result_code: if success { "200".into() } else { "500".into() },
        }
    }

    fn dependency(success: bool) -> DependencyRow {
        DependencyRow {
            timestamp: Utc::now(),
            name: "SELECT orders".into(),
            target: "sql-prod".into(),
            dependency_type: "SQL".into(),
            duration_ms: 12.0,
            success,
            result_code: "0".into(),
        }
    }

    #[test]
    fn failure_rate_with_zero_total_is_zero() {
        let rate = failure_rate(0, 0);
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn failure_rate_is_percentage() {
        assert_eq!(failure_rate(1, 4), 25.0);
        assert_eq!(failure_rate(4, 4), 100.0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert_eq!(mean([1000.0, 3000.0]), 2000.0);
    }

    #[test]
    fn request_aggregate_counts_failures() {
        let rows = vec![
            request(100.0, true),
            request(300.0, false),
            request(200.0, true),
            request(400.0, true),
        ];
        let agg = AggregateMetrics::from_requests(&rows);
        assert_eq!(agg.count, 4);
        assert_eq!(agg.failed, 1);
        assert_eq!(agg.avg_duration_ms, 250.0);
        assert_eq!(agg.failure_rate, 25.0);
    }

    #[test]
    fn empty_snapshot_summary_is_healthy() {
        let summary = MetricsSummary::from_snapshot(&TelemetrySnapshot::default());
        assert_eq!(summary.requests.count, 0);
        assert_eq!(summary.requests.failure_rate, 0.0);
        assert_eq!(summary.dependencies.avg_duration_ms, 0.0);
        assert_eq!(summary.health(), HealthStatus::Healthy);
    }

    #[test]
    fn summary_health_tracks_request_failure_rate() {
        let mut requests: Vec<_> = (0..90).map(|_| request(50.0, true)).collect();
        requests.extend((0..10).map(|_| request(50.0, false)));
        let snapshot = TelemetrySnapshot {
            requests,
            dependencies: vec![dependency(true), dependency(false)],
            ..Default::default()
        };
        let summary = MetricsSummary::from_snapshot(&snapshot);
        assert_eq!(summary.requests.failure_rate, 10.0);
        assert_eq!(summary.dependencies.failure_rate, 50.0);
        assert_eq!(summary.health(), HealthStatus::Critical);
        assert_eq!(summary.dependencies.failed, 1);
    }
}

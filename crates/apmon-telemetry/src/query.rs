use apmon_common::types::TelemetryKind;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Lookback threshold, in milliseconds, for the slow-request query.
pub const DEFAULT_SLOW_REQUEST_MS: f64 = 5000.0;

/// Fetch limits per query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    pub requests: usize,
    pub exceptions: usize,
    pub dependencies: usize,
    pub slow_requests: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            requests: 100,
            exceptions: 100,
            dependencies: 100,
            slow_requests: 50,
        }
    }
}

impl FetchLimits {
    pub fn for_kind(&self, kind: TelemetryKind) -> usize {
        match kind {
            TelemetryKind::Requests => self.requests,
            TelemetryKind::Exceptions => self.exceptions,
            TelemetryKind::Dependencies => self.dependencies,
            TelemetryKind::SlowRequests => self.slow_requests,
        }
    }
}

/// Builds the four query shapes over a fixed lookback window.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    pub window: Duration,
    pub limits: FetchLimits,
    pub slow_request_ms: f64,
}

impl QueryCatalog {
    pub fn new(window: Duration, limits: FetchLimits, slow_request_ms: f64) -> Self {
        Self {
            window,
            limits,
            slow_request_ms,
        }
    }

    pub fn query(&self, kind: TelemetryKind) -> String {
        let ago = kql_timespan(self.window);
        let take = self.limits.for_kind(kind);
        match kind {
            TelemetryKind::Requests => format!(
                "requests\n\
                 | where timestamp > ago({ago})\n\
                 | project timestamp, name, url, duration, success, resultCode\n\
                 | order by timestamp desc\n\
                 | take {take}"
            ),
            TelemetryKind::Exceptions => format!(
                "exceptions\n\
                 | where timestamp > ago({ago})\n\
                 | project timestamp, type, outerMessage, operation_Name\n\
                 | order by timestamp desc\n\
                 | take {take}"
            ),
            TelemetryKind::Dependencies => format!(
                "dependencies\n\
                 | where timestamp > ago({ago})\n\
                 | project timestamp, name, target, type, duration, success, resultCode\n\
                 | order by timestamp desc\n\
                 | take {take}"
            ),
            TelemetryKind::SlowRequests => format!(
                "requests\n\
                 | where timestamp > ago({ago})\n\
                 | where duration > {slow}\n\
                 | project timestamp, name, url, duration, resultCode\n\
                 | order by duration desc\n\
                 | take {take}",
                slow = self.slow_request_ms
            ),
        }
    }
}

/// Renders a window as an ISO 8601 duration, e.g. `P30D` or `PT90S`.
///
/// # Examples
///
/// ```
/// use apmon_telemetry::query::iso8601_timespan;
/// use chrono::Duration;
///
/// assert_eq!(iso8601_timespan(Duration::days(30)), "P30D");
/// assert_eq!(iso8601_timespan(Duration::hours(36)), "PT129600S");
/// ```
pub fn iso8601_timespan(window: Duration) -> String {
    let secs = window.num_seconds().max(0);
    if secs > 0 && secs % 86_400 == 0 {
        format!("P{}D", secs / 86_400)
    } else {
        format!("PT{secs}S")
    }
}

/// Renders a window as a KQL timespan literal, e.g. `30d` or `90s`.
pub fn kql_timespan(window: Duration) -> String {
    let secs = window.num_seconds().max(0);
    if secs > 0 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs > 0 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> QueryCatalog {
        QueryCatalog::new(Duration::days(30), FetchLimits::default(), DEFAULT_SLOW_REQUEST_MS)
    }

    #[test]
    fn request_query_uses_window_and_limit() {
        let q = catalog().query(TelemetryKind::Requests);
        assert!(q.starts_with("requests"));
        assert!(q.contains("ago(30d)"));
        assert!(q.contains("take 100"));
    }

    #[test]
    fn slow_request_query_filters_on_duration() {
        let q = catalog().query(TelemetryKind::SlowRequests);
        assert!(q.contains("where duration > 5000"));
        assert!(q.contains("take 50"));
    }

    #[test]
    fn kql_timespan_prefers_largest_unit() {
        assert_eq!(kql_timespan(Duration::hours(24)), "1d");
        assert_eq!(kql_timespan(Duration::hours(6)), "6h");
        assert_eq!(kql_timespan(Duration::seconds(45)), "45s");
    }
}

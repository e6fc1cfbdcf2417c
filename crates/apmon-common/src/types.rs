use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity, ordered from lowest to highest.
///
/// The alerting backend numbers severities from 0 (most severe) to 4
/// (least severe); [`Severity::level`] yields that number.
///
/// # Examples
///
/// ```
/// use apmon_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.level(), 2);
/// assert!(Severity::Critical > Severity::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Verbose,
    Informational,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn level(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Informational => 3,
            Severity::Verbose => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Verbose => write!(f, "verbose"),
            Severity::Informational => write!(f, "informational"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" => Ok(Severity::Verbose),
            "informational" | "info" => Ok(Severity::Informational),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// The four telemetry collections fetched per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    Requests,
    Exceptions,
    Dependencies,
    SlowRequests,
}

impl TelemetryKind {
    pub const ALL: [TelemetryKind; 4] = [
        TelemetryKind::Requests,
        TelemetryKind::Exceptions,
        TelemetryKind::Dependencies,
        TelemetryKind::SlowRequests,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Requests => "Requests",
            Self::Exceptions => "Exceptions",
            Self::Dependencies => "Dependencies",
            Self::SlowRequests => "Slow requests",
        }
    }
}

impl std::fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requests => write!(f, "requests"),
            Self::Exceptions => write!(f, "exceptions"),
            Self::Dependencies => write!(f, "dependencies"),
            Self::SlowRequests => write!(f, "slow_requests"),
        }
    }
}

/// One served request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub url: String,
    /// Duration in milliseconds.
    pub duration_ms: f64,
    pub success: bool,
    pub result_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRow {
    pub timestamp: DateTime<Utc>,
    /// Fully qualified exception type, e.g. `System.TimeoutException`.
    pub exception_type: String,
    pub message: String,
    pub operation_name: String,
}

/// One outbound dependency call (SQL, HTTP, queue, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub target: String,
    pub dependency_type: String,
    pub duration_ms: f64,
    pub success: bool,
    pub result_code: String,
}

/// A request whose duration exceeded the slow-request lookback threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowRequestRow {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub duration_ms: f64,
    pub result_code: String,
}

/// A decoded telemetry record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRow {
    Performance(PerformanceRow),
    Exception(ExceptionRow),
    Dependency(DependencyRow),
    SlowRequest(SlowRequestRow),
}

/// Everything fetched from the telemetry backend in one run.
///
/// Any collection may be empty when its query failed or returned no rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub requests: Vec<PerformanceRow>,
    pub exceptions: Vec<ExceptionRow>,
    pub dependencies: Vec<DependencyRow>,
    pub slow_requests: Vec<SlowRequestRow>,
}

impl TelemetrySnapshot {
    pub fn row_count(&self, kind: TelemetryKind) -> usize {
        match kind {
            TelemetryKind::Requests => self.requests.len(),
            TelemetryKind::Exceptions => self.exceptions.len(),
            TelemetryKind::Dependencies => self.dependencies.len(),
            TelemetryKind::SlowRequests => self.slow_requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        TelemetryKind::ALL.iter().all(|k| self.row_count(*k) == 0)
    }

    /// Files `row` under the collection for its kind.
    pub fn push(&mut self, row: TelemetryRow) {
        match row {
            TelemetryRow::Performance(r) => self.requests.push(r),
            TelemetryRow::Exception(r) => self.exceptions.push(r),
            TelemetryRow::Dependency(r) => self.dependencies.push(r),
            TelemetryRow::SlowRequest(r) => self.slow_requests.push(r),
        }
    }
}

/// Coarse health classification derived from the request failure rate.
///
/// # Examples
///
/// ```
/// use apmon_common::types::HealthStatus;
///
/// assert_eq!(HealthStatus::from_failure_rate(0.5), HealthStatus::Healthy);
/// assert_eq!(HealthStatus::from_failure_rate(3.0), HealthStatus::Warning);
/// assert_eq!(HealthStatus::from_failure_rate(7.5), HealthStatus::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub const WARNING_FAILURE_RATE: f64 = 1.0;
    pub const CRITICAL_FAILURE_RATE: f64 = 5.0;

    pub fn from_failure_rate(failure_rate: f64) -> Self {
        if failure_rate > Self::CRITICAL_FAILURE_RATE {
            Self::Critical
        } else if failure_rate > Self::WARNING_FAILURE_RATE {
            Self::Warning
        } else {
            Self::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived numeric summary of one telemetry collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub kind: TelemetryKind,
    pub count: usize,
    pub failed: usize,
    /// Mean duration in milliseconds; 0 for kinds without durations or no rows.
    pub avg_duration_ms: f64,
    /// Failed share in percent; 0 when there are no rows.
    pub failure_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_levels_match_backend_scale() {
        assert_eq!(Severity::Critical.level(), 0);
        assert_eq!(Severity::Error.level(), 1);
        assert_eq!(Severity::Verbose.level(), 4);
        assert_eq!("info".parse::<Severity>(), Ok(Severity::Informational));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn telemetry_row_is_tagged_by_kind() {
        let row = TelemetryRow::Exception(ExceptionRow {
            timestamp: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            exception_type: "System.TimeoutException".into(),
            message: "timed out".into(),
            operation_name: "GET /health".into(),
        });
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["kind"], "exception");

        let mut snapshot = TelemetrySnapshot::default();
        snapshot.push(row);
        assert_eq!(snapshot.row_count(TelemetryKind::Exceptions), 1);
        assert_eq!(snapshot.row_count(TelemetryKind::Requests), 0);
    }

    #[test]
    fn health_boundaries_are_strict() {
        assert_eq!(HealthStatus::from_failure_rate(1.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_failure_rate(5.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_failure_rate(5.01), HealthStatus::Critical);
    }
}

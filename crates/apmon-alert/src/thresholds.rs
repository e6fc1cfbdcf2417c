use serde::{Deserialize, Serialize};

/// Policy constants. Every value can be overridden independently from the
/// `[thresholds]` table of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Lookback mean request duration (ms) above which a response-time rule is created.
    #[serde(default = "default_response_time_ms")]
    pub response_time_ms: f64,
    /// 24-hour mean request duration (ms) the created rule alerts on.
    #[serde(default = "default_response_time_alert_ms")]
    pub response_time_alert_ms: f64,
    /// Lookback request failure rate (%) above which a failure-rate rule is created.
    #[serde(default = "default_failure_rate_pct")]
    pub failure_rate_pct: f64,
    #[serde(default = "default_failure_rate_alert_pct")]
    pub failure_rate_alert_pct: f64,
    /// Substrings of exception type names treated as critical. Matched literally.
    #[serde(default = "default_critical_exceptions")]
    pub critical_exceptions: Vec<String>,
    #[serde(default = "default_dependency_failure_rate_pct")]
    pub dependency_failure_rate_pct: f64,
    #[serde(default = "default_dependency_failure_alert_pct")]
    pub dependency_failure_alert_pct: f64,
    /// Lookback slow-request count above which a slow-request rule is created.
    #[serde(default = "default_slow_request_count")]
    pub slow_request_count: usize,
    /// 24-hour slow-request count the created rule alerts on.
    #[serde(default = "default_slow_request_alert_count")]
    pub slow_request_alert_count: usize,
    /// Duration (ms) that makes a request slow for the created rule.
    #[serde(default = "default_slow_request_alert_ms")]
    pub slow_request_alert_ms: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            response_time_ms: default_response_time_ms(),
            response_time_alert_ms: default_response_time_alert_ms(),
            failure_rate_pct: default_failure_rate_pct(),
            failure_rate_alert_pct: default_failure_rate_alert_pct(),
            critical_exceptions: default_critical_exceptions(),
            dependency_failure_rate_pct: default_dependency_failure_rate_pct(),
            dependency_failure_alert_pct: default_dependency_failure_alert_pct(),
            slow_request_count: default_slow_request_count(),
            slow_request_alert_count: default_slow_request_alert_count(),
            slow_request_alert_ms: default_slow_request_alert_ms(),
        }
    }
}

fn default_response_time_ms() -> f64 {
    3000.0
}

fn default_response_time_alert_ms() -> f64 {
    5000.0
}

fn default_failure_rate_pct() -> f64 {
    1.0
}

fn default_failure_rate_alert_pct() -> f64 {
    2.0
}

fn default_critical_exceptions() -> Vec<String> {
    ["OutOfMemory", "StackOverflow", "Sql", "Timeout"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_dependency_failure_rate_pct() -> f64 {
    5.0
}

fn default_dependency_failure_alert_pct() -> f64 {
    5.0
}

fn default_slow_request_count() -> usize {
    20
}

fn default_slow_request_alert_count() -> usize {
    10
}

fn default_slow_request_alert_ms() -> f64 {
    8000.0
}

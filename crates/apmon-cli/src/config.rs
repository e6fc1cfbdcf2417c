use apmon_alert::AlertThresholds;
use apmon_telemetry::query::{FetchLimits, DEFAULT_SLOW_REQUEST_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest lookback the telemetry backend retains.
pub const MAX_WINDOW_DAYS: i64 = 730;

pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
pub const OPENAI_API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";

/// Immutable run configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub thresholds: AlertThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Application Insights application id used by the query API.
    pub app_id: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default)]
    pub limits: FetchLimits,
    /// Requests slower than this (ms) are fetched as slow requests.
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: f64,
    #[serde(default = "default_telemetry_timeout_secs")]
    pub timeout_secs: u64,
}

/// The monitored application and where its telemetry resource lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Name used in alert rule names and the report header.
    pub application: String,
    pub resource_group: String,
    pub subscription_id: String,
    /// Application Insights component name when it differs from `application`.
    #[serde(default)]
    pub component: Option<String>,
}

impl TargetConfig {
    pub fn component_name(&self) -> &str {
        self.component.as_deref().unwrap_or(&self.application)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Resource group that holds the alert rules. Empty means the target's group.
    #[serde(default)]
    pub resource_group: String,
    /// Action group the rules notify.
    #[serde(default)]
    pub action_group_id: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_alerting_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resource_group: String::new(),
            action_group_id: String::new(),
            location: default_location(),
            endpoint: None,
            timeout_secs: default_alerting_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    /// Falls back to `AZURE_OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,
    /// Rows per collection included in each prompt.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            deployment: String::new(),
            api_key: None,
            api_version: None,
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_openai_timeout_secs(),
            sample_rows: default_sample_rows(),
        }
    }
}

/// Service principal credentials, or tokens issued out of band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    /// Falls back to `AZURE_CLIENT_SECRET`.
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub telemetry_token: Option<String>,
    #[serde(default)]
    pub management_token: Option<String>,
}

impl AuthConfig {
    fn has_client_credentials(&self) -> bool {
        !self.tenant_id.is_empty()
            && !self.client_id.is_empty()
            && self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    /// Rows displayed per raw-data table.
    #[serde(default = "default_display_rows")]
    pub display_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            display_rows: default_display_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_days() -> i64 {
    30
}

fn default_slow_request_ms() -> f64 {
    DEFAULT_SLOW_REQUEST_MS
}

fn default_telemetry_timeout_secs() -> u64 {
    60
}

fn default_location() -> String {
    "eastus".to_string()
}

fn default_alerting_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> usize {
    800
}

fn default_openai_timeout_secs() -> u64 {
    120
}

fn default_sample_rows() -> usize {
    apmon_ai::prompt::DEFAULT_SAMPLE_ROWS
}

fn default_output_path() -> String {
    "reports/apmon-report.html".to_string()
}

fn default_display_rows() -> usize {
    apmon_report::DEFAULT_DISPLAY_ROWS
}

impl AppConfig {
    /// Reads the TOML file at `path` and fills unset secrets from the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.auth.client_secret.is_none() {
            self.auth.client_secret = lookup(CLIENT_SECRET_ENV).filter(|v| !v.is_empty());
        }
        if self.openai.api_key.is_none() {
            self.openai.api_key = lookup(OPENAI_API_KEY_ENV).filter(|v| !v.is_empty());
        }
    }

    /// Resource group the alert rules are created in.
    pub fn alert_resource_group(&self) -> &str {
        if self.alerting.resource_group.is_empty() {
            &self.target.resource_group
        } else {
            &self.alerting.resource_group
        }
    }

    /// Rejects configurations that would fail only after network calls.
    /// Sections that are disabled are not checked.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut problems = Vec::new();

        if self.telemetry.app_id.trim().is_empty() {
            problems.push("telemetry.app_id is required");
        }
        if self.telemetry.window_days <= 0 {
            problems.push("telemetry.window_days must be positive");
        } else if self.telemetry.window_days > MAX_WINDOW_DAYS {
            problems.push("telemetry.window_days must be at most 730");
        }
        // The slow-request count is taken over capped rows.
        if self.telemetry.limits.slow_requests <= self.thresholds.slow_request_count {
            problems.push(
                "telemetry.limits.slow_requests must be greater than thresholds.slow_request_count",
            );
        }
        if self.target.application.trim().is_empty() {
            problems.push("target.application is required");
        }
        if self.report.display_rows == 0 {
            problems.push("report.display_rows must be positive");
        }
        if self.report.output_path.trim().is_empty() {
            problems.push("report.output_path is required");
        }
        if self.auth.telemetry_token.is_none() && !self.auth.has_client_credentials() {
            problems.push(
                "auth needs tenant_id, client_id and client_secret, or a pre-issued telemetry_token",
            );
        }

        if self.alerting.enabled {
            if self.target.subscription_id.trim().is_empty() {
                problems.push("target.subscription_id is required when alerting is enabled");
            }
            if self.target.resource_group.trim().is_empty() {
                problems.push("target.resource_group is required when alerting is enabled");
            }
            if self.alerting.action_group_id.trim().is_empty() {
                problems.push("alerting.action_group_id is required when alerting is enabled");
            }
            if self.auth.management_token.is_none() && !self.auth.has_client_credentials() {
                problems.push(
                    "auth needs client credentials or a pre-issued management_token when alerting is enabled",
                );
            }
        }

        if self.openai.enabled {
            if self.openai.endpoint.trim().is_empty() {
                problems.push("openai.endpoint is required when narrative analysis is enabled");
            }
            if self.openai.deployment.trim().is_empty() {
                problems.push("openai.deployment is required when narrative analysis is enabled");
            }
            if self.openai.api_key.as_deref().map_or(true, str::is_empty) {
                problems.push("openai.api_key (or AZURE_OPENAI_API_KEY) is required when narrative analysis is enabled");
            }
        }

        if !problems.is_empty() {
            anyhow::bail!("invalid configuration:\n  - {}", problems.join("\n  - "));
        }
        Ok(())
    }
}

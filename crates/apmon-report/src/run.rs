use apmon_ai::Narratives;
use apmon_alert::{AlertSpec, ProvisionReport};
use apmon_common::stats::MetricsSummary;
use apmon_common::types::{HealthStatus, TelemetryKind, TelemetrySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What became of the decided specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Provisioning {
    /// Each spec was looked up and created where missing.
    Done(ProvisionReport),
    /// Decided only. The alerting backend was never contacted.
    DryRun,
    /// The alerting backend could not be set up, so no spec was provisioned.
    Unavailable(String),
}

/// Everything one run produced. Lives only for the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub application: String,
    pub generated_at: DateTime<Utc>,
    pub window_days: i64,
    pub metrics: MetricsSummary,
    pub health: HealthStatus,
    /// Specs chosen by the decision policy, in category order.
    pub decided: Vec<AlertSpec>,
    pub provisioning: Provisioning,
    pub narratives: Narratives,
    pub snapshot: TelemetrySnapshot,
    /// Collections that degraded to empty, with the reason.
    pub telemetry_failures: Vec<(TelemetryKind, String)>,
}

impl RunResult {
    /// Derives metrics and health from `snapshot`. Alerting starts as a dry
    /// run with nothing decided, narration as skipped.
    pub fn new(application: &str, window_days: i64, snapshot: TelemetrySnapshot) -> Self {
        let metrics = MetricsSummary::from_snapshot(&snapshot);
        Self {
            application: application.to_string(),
            generated_at: Utc::now(),
            window_days,
            health: metrics.health(),
            metrics,
            decided: Vec::new(),
            provisioning: Provisioning::DryRun,
            narratives: Narratives::skipped(),
            snapshot,
            telemetry_failures: Vec::new(),
        }
    }
}

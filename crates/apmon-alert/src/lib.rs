//! Alert decision policy and idempotent alert provisioning.
//!
//! [`policy::AlertPolicy`] maps a 30-day [`TelemetrySnapshot`] to zero or more
//! [`AlertSpec`] values through registered [`PolicyRule`] implementations, one
//! per category. Each spec carries a stricter 24-hour query: the lookback
//! decides whether monitoring is warranted, the provisioned rule watches the
//! next 24 hours.
//!
//! [`provisioner::Provisioner`] makes each spec exist exactly once in an
//! [`AlertBackend`], checking by name before creating.

pub mod azure;
pub mod error;
pub mod policy;
pub mod provisioner;
pub mod rules;
pub mod thresholds;


use apmon_common::types::{Severity, TelemetrySnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use policy::AlertPolicy;
pub use provisioner::{AlertOutcome, AlertStatus, ProvisionReport, Provisioner};
pub use thresholds::AlertThresholds;

/// Evaluation frequency and lookback of every provisioned rule.
pub const MONITORING_INTERVAL_MINUTES: u32 = 24 * 60;

/// The rule's own trigger threshold: fire when the query returns any row.
/// The real threshold lives inside the query's filter.
pub const RULE_TRIGGER_THRESHOLD: f64 = 0.0;

/// Human-readable schedule shared by all provisioned rules.
pub const MONITORING_SCHEDULE: &str = "Every 24 hours (24-hour lookback)";

/// Condition families, in provisioning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    ResponseTime,
    FailureRate,
    CriticalExceptions,
    DependencyFailures,
    SlowRequests,
}

impl AlertCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::ResponseTime => "high-response-time",
            Self::FailureRate => "high-failure-rate",
            Self::CriticalExceptions => "critical-exceptions",
            Self::DependencyFailures => "dependency-failures",
            Self::SlowRequests => "slow-requests",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ResponseTime => "High Response Time",
            Self::FailureRate => "High Failure Rate",
            Self::CriticalExceptions => "Critical Exceptions",
            Self::DependencyFailures => "Dependency Failures",
            Self::SlowRequests => "Slow Requests",
        }
    }

    /// Rule name, unique per application within one alerting backend.
    pub fn rule_name(&self, application: &str) -> String {
        format!("{application}-{}", self.slug())
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A monitoring rule that should exist in the alerting backend.
///
/// Identity is [`AlertSpec::name`]; the backend decides whether it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSpec {
    pub name: String,
    pub display_name: String,
    pub category: AlertCategory,
    pub description: String,
    /// Query evaluated by the backend; returns rows only when the condition holds.
    pub query: String,
    pub severity: Severity,
    pub frequency_minutes: u32,
    pub window_minutes: u32,
    /// Threshold embedded in [`AlertSpec::query`], kept for display.
    pub threshold: f64,
}

impl AlertSpec {
    pub fn new(
        application: &str,
        category: AlertCategory,
        severity: Severity,
        description: String,
        query: String,
        threshold: f64,
    ) -> Self {
        Self {
            name: category.rule_name(application),
            display_name: format!("{application}: {}", category.title()),
            category,
            description,
            query,
            severity,
            frequency_minutes: MONITORING_INTERVAL_MINUTES,
            window_minutes: MONITORING_INTERVAL_MINUTES,
            threshold,
        }
    }
}

/// Inputs shared by all policy rules for one decision pass.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub application: &'a str,
    pub lookback_days: i64,
}

/// A single decision: does this snapshot warrant a monitoring rule?
///
/// Rules are pure. Empty collections must yield `None`, never panic.
pub trait PolicyRule: Send + Sync {
    fn category(&self) -> AlertCategory;

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec>;
}

/// Existing rule as reported by the alerting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHandle {
    pub id: String,
    pub name: String,
}

/// The alerting backend: lookup by name and create.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the rule called `name` in `resource_group`, if any.
    async fn find_rule(&self, name: &str, resource_group: &str)
        -> error::Result<Option<RuleHandle>>;

    /// Creates a rule for `spec` that notifies `action_group`.
    async fn create_rule(
        &self,
        spec: &AlertSpec,
        resource_group: &str,
        action_group: &str,
    ) -> error::Result<RuleHandle>;
}

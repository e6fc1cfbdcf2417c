use crate::rules::critical_exceptions::CriticalExceptionsRule;
use crate::rules::dependency_failures::DependencyFailuresRule;
use crate::rules::failure_rate::FailureRateRule;
use crate::rules::response_time::ResponseTimeRule;
use crate::rules::slow_requests::SlowRequestsRule;
use crate::thresholds::AlertThresholds;
use crate::{AlertSpec, PolicyContext, PolicyRule};
use apmon_common::types::{Severity, TelemetrySnapshot};

/// Evaluates policy rules in registration order.
pub struct AlertPolicy {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl AlertPolicy {
    /// The five built-in rules, ordered performance, exceptions,
    /// dependencies, slow requests.
    pub fn new(thresholds: &AlertThresholds) -> Self {
        let rules: Vec<Box<dyn PolicyRule>> = vec![
            Box::new(ResponseTimeRule {
                observed_ms: thresholds.response_time_ms,
                alert_ms: thresholds.response_time_alert_ms,
                severity: Severity::Warning,
            }),
            Box::new(FailureRateRule {
                observed_pct: thresholds.failure_rate_pct,
                alert_pct: thresholds.failure_rate_alert_pct,
                severity: Severity::Error,
            }),
            Box::new(CriticalExceptionsRule {
                patterns: thresholds.critical_exceptions.clone(),
                severity: Severity::Critical,
            }),
            Box::new(DependencyFailuresRule {
                observed_pct: thresholds.dependency_failure_rate_pct,
                alert_pct: thresholds.dependency_failure_alert_pct,
                severity: Severity::Error,
            }),
            Box::new(SlowRequestsRule {
                observed_count: thresholds.slow_request_count,
                alert_count: thresholds.slow_request_alert_count,
                alert_ms: thresholds.slow_request_alert_ms,
                severity: Severity::Warning,
            }),
        ];
        Self { rules }
    }

    pub fn decide(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Vec<AlertSpec> {
        let mut specs = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(snapshot, ctx) {
                Some(spec) => {
                    tracing::info!(
                        category = %rule.category(),
                        rule = %spec.name,
                        severity = %spec.severity,
                        "Monitoring warranted"
                    );
                    specs.push(spec);
                }
                None => {
                    tracing::debug!(category = %rule.category(), "No alert needed");
                }
            }
        }
        specs
    }
}

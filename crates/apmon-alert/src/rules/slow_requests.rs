use super::window_literal;
use crate::{AlertCategory, AlertSpec, PolicyContext, PolicyRule, MONITORING_INTERVAL_MINUTES};
use apmon_common::types::{Severity, TelemetrySnapshot};

/// More than `observed_count` slow requests over the lookback.
pub struct SlowRequestsRule {
    pub observed_count: usize,
    pub alert_count: usize,
    pub alert_ms: f64,
    pub severity: Severity,
}

impl PolicyRule for SlowRequestsRule {
    fn category(&self) -> AlertCategory {
        AlertCategory::SlowRequests
    }

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec> {
        let count = snapshot.slow_requests.len();
        if count <= self.observed_count {
            return None;
        }

        let query = format!(
            "requests\n\
             | where timestamp > ago({window})\n\
             | where duration > {slow_ms}\n\
             | summarize slow_count = count()\n\
             | where slow_count > {alert}",
            window = window_literal(MONITORING_INTERVAL_MINUTES),
            slow_ms = self.alert_ms,
            alert = self.alert_count,
        );
        let description = format!(
            "{count} slow requests in the last {days} days (more than {observed}). \
             Alerts when more than {alert} requests exceed {slow_ms} ms within 24 hours.",
            days = ctx.lookback_days,
            observed = self.observed_count,
            alert = self.alert_count,
            slow_ms = self.alert_ms,
        );

        Some(AlertSpec::new(
            ctx.application,
            self.category(),
            self.severity,
            description,
            query,
            self.alert_count as f64,
        ))
    }
}

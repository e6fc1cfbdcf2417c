use super::window_literal;
use crate::{AlertCategory, AlertSpec, PolicyContext, PolicyRule, MONITORING_INTERVAL_MINUTES};
use apmon_common::stats::failure_rate;
use apmon_common::types::{Severity, TelemetrySnapshot};

/// Dependency calls failed, and their failure rate exceeded `observed_pct`.
pub struct DependencyFailuresRule {
    pub observed_pct: f64,
    pub alert_pct: f64,
    pub severity: Severity,
}

impl PolicyRule for DependencyFailuresRule {
    fn category(&self) -> AlertCategory {
        AlertCategory::DependencyFailures
    }

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec> {
        let total = snapshot.dependencies.len();
        let failed = snapshot.dependencies.iter().filter(|d| !d.success).count();
        if total == 0 || failed == 0 {
            return None;
        }

        let rate = failure_rate(failed, total);
        if rate <= self.observed_pct {
            return None;
        }

        let query = format!(
            "dependencies\n\
             | where timestamp > ago({window})\n\
             | summarize total = count(), failed = countif(success == false)\n\
             | extend failure_rate = iff(total == 0, 0.0, todouble(failed) * 100.0 / total)\n\
             | where failure_rate > {alert}",
            window = window_literal(MONITORING_INTERVAL_MINUTES),
            alert = self.alert_pct,
        );
        let description = format!(
            "{failed} of {total} dependency calls failed over the last {days} days ({rate:.2}%). \
             Alerts when the 24-hour dependency failure rate exceeds {alert}%.",
            days = ctx.lookback_days,
            alert = self.alert_pct,
        );

        Some(AlertSpec::new(
            ctx.application,
            self.category(),
            self.severity,
            description,
            query,
            self.alert_pct,
        ))
    }
}

use super::window_literal;
use crate::{AlertCategory, AlertSpec, PolicyContext, PolicyRule, MONITORING_INTERVAL_MINUTES};
use apmon_common::stats::failure_rate;
use apmon_common::types::{Severity, TelemetrySnapshot};

/// Share of failed requests over the lookback exceeded `observed_pct`.
pub struct FailureRateRule {
    pub observed_pct: f64,
    pub alert_pct: f64,
    pub severity: Severity,
}

impl PolicyRule for FailureRateRule {
    fn category(&self) -> AlertCategory {
        AlertCategory::FailureRate
    }

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec> {
        let total = snapshot.requests.len();
        if total == 0 {
            return None;
        }

        let failed = snapshot.requests.iter().filter(|r| !r.success).count();
        let rate = failure_rate(failed, total);
        if rate <= self.observed_pct {
            return None;
        }

        let query = format!(
            "requests\n\
             | where timestamp > ago({window})\n\
             | summarize total = count(), failed = countif(success == false)\n\
             | extend failure_rate = iff(total == 0, 0.0, todouble(failed) * 100.0 / total)\n\
             | where failure_rate > {alert}",
            window = window_literal(MONITORING_INTERVAL_MINUTES),
            alert = self.alert_pct,
        );
        let description = format!(
            "{failed} of {total} requests failed over the last {days} days ({rate:.2}%, above {observed}%). \
             Alerts when the 24-hour failure rate exceeds {alert}%.",
            days = ctx.lookback_days,
            observed = self.observed_pct,
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

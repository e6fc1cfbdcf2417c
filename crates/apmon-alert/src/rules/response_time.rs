use super::window_literal;
use crate::{AlertCategory, AlertSpec, PolicyContext, PolicyRule, MONITORING_INTERVAL_MINUTES};
use apmon_common::stats::mean;
use apmon_common::types::{Severity, TelemetrySnapshot};

/// Mean request duration over the lookback exceeded `observed_ms`.
pub struct ResponseTimeRule {
    pub observed_ms: f64,
    pub alert_ms: f64,
    pub severity: Severity,
}

impl PolicyRule for ResponseTimeRule {
    fn category(&self) -> AlertCategory {
        AlertCategory::ResponseTime
    }

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec> {
        if snapshot.requests.is_empty() {
            return None;
        }

        let avg = mean(snapshot.requests.iter().map(|r| r.duration_ms));
        if avg <= self.observed_ms {
            return None;
        }

        let query = format!(
            "requests\n\
             | where timestamp > ago({window})\n\
             | summarize avg_duration = avg(duration)\n\
             | where avg_duration > {alert}",
            window = window_literal(MONITORING_INTERVAL_MINUTES),
            alert = self.alert_ms,
        );
        let description = format!(
            "Average response time over the last {days} days was {avg:.0} ms (above {observed} ms). \
             Alerts when the 24-hour average exceeds {alert} ms.",
            days = ctx.lookback_days,
            observed = self.observed_ms,
            alert = self.alert_ms,
        );

        Some(AlertSpec::new(
            ctx.application,
            self.category(),
            self.severity,
            description,
            query,
            self.alert_ms,
        ))
    }
}

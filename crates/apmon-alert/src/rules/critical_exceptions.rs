use super::{kql_string, window_literal};
use crate::{AlertCategory, AlertSpec, PolicyContext, PolicyRule, MONITORING_INTERVAL_MINUTES};
use apmon_common::types::{Severity, TelemetrySnapshot};

/// At least one exception whose type contains a critical pattern.
///
/// Matching is a case-sensitive substring test, both here and in the
/// provisioned query (`contains_cs`).
pub struct CriticalExceptionsRule {
    pub patterns: Vec<String>,
    pub severity: Severity,
}

impl CriticalExceptionsRule {
    pub fn is_critical(&self, exception_type: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| !p.is_empty() && exception_type.contains(p.as_str()))
    }
}

impl PolicyRule for CriticalExceptionsRule {
    fn category(&self) -> AlertCategory {
        AlertCategory::CriticalExceptions
    }

    fn evaluate(&self, snapshot: &TelemetrySnapshot, ctx: &PolicyContext<'_>) -> Option<AlertSpec> {
        let mut matched: Vec<&str> = snapshot
            .exceptions
            .iter()
            .map(|e| e.exception_type.as_str())
            .filter(|t| self.is_critical(t))
            .collect();
        if matched.is_empty() {
            return None;
        }
        let occurrences = matched.len();
        matched.sort_unstable();
        matched.dedup();

        let predicate = self
            .patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| format!("type contains_cs {}", kql_string(p)))
            .collect::<Vec<_>>()
            .join(" or ");
        let query = format!(
            "exceptions\n\
             | where timestamp > ago({window})\n\
             | where {predicate}",
            window = window_literal(MONITORING_INTERVAL_MINUTES),
        );
        let description = format!(
            "{occurrences} critical exception(s) in the last {days} days ({types}). \
             Alerts on any critical exception in the next 24 hours.",
            days = ctx.lookback_days,
            types = matched.join(", "),
        );

        Some(AlertSpec::new(
            ctx.application,
            self.category(),
            self.severity,
            description,
            query,
            0.0,
        ))
    }
}

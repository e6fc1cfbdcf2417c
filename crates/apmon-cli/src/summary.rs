use apmon_common::types::TelemetryKind;
use apmon_report::{Provisioning, RunResult};
use std::fmt;
use std::path::Path;

/// Final counts printed to the terminal after a run.
pub struct RunSummary<'a> {
    run: &'a RunResult,
    output: &'a Path,
}

impl<'a> RunSummary<'a> {
    pub fn new(run: &'a RunResult, output: &'a Path) -> Self {
        Self { run, output }
    }
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.run;
        writeln!(
            f,
            "apmon report for {} (last {} days)",
            run.application, run.window_days
        )?;
        writeln!(f, "  Health:     {}", run.health)?;

        let rows = TelemetryKind::ALL
            .iter()
            .map(|k| format!("{}={}", k, run.snapshot.row_count(*k)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "  Telemetry:  {rows}")?;
        for (kind, error) in &run.telemetry_failures {
            writeln!(f, "  Warning:    {kind} unavailable ({error})")?;
        }

        match &run.provisioning {
            Provisioning::Done(report) => {
                writeln!(
                    f,
                    "  Alerts:     created={} skipped={} failed={} total={}",
                    report.created.len(),
                    report.skipped.len(),
                    report.failed.len(),
                    report.total()
                )?;
                for outcome in &report.failed {
                    writeln!(
                        f,
                        "  Failed:     {} ({})",
                        outcome.spec.name,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    )?;
                }
            }
            Provisioning::DryRun => writeln!(
                f,
                "  Alerts:     {} warranted, dry run (not provisioned)",
                run.decided.len()
            )?,
            Provisioning::Unavailable(reason) => writeln!(
                f,
                "  Alerts:     {} warranted, none provisioned: alerting unavailable ({reason})",
                run.decided.len()
            )?,
        }

        write!(f, "  Report:     {}", self.output.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apmon_alert::{AlertCategory, AlertOutcome, AlertSpec, AlertStatus, ProvisionReport};
    use apmon_common::types::{Severity, TelemetrySnapshot};

    fn outcome(category: AlertCategory, status: AlertStatus) -> AlertOutcome {
        AlertOutcome {
            spec: AlertSpec::new(
                "shop-api",
                category,
                Severity::Error,
                String::new(),
                String::new(),
                0.0,
            ),
            status,
            rule_id: None,
            error: (status == AlertStatus::Failed).then(|| "HTTP 403".to_string()),
        }
    }

    #[test]
    fn lists_counts_and_failures() {
        let mut run = RunResult::new("shop-api", 30, TelemetrySnapshot::default());
        let mut report = ProvisionReport::default();
        report.record(outcome(AlertCategory::ResponseTime, AlertStatus::Created));
        report.record(outcome(AlertCategory::FailureRate, AlertStatus::Failed));
        run.provisioning = Provisioning::Done(report);
        run.telemetry_failures = vec![(TelemetryKind::Exceptions, "timeout".into())];

        let text = RunSummary::new(&run, Path::new("out/report.html")).to_string();
        assert!(text.contains("apmon report for shop-api (last 30 days)"));
        assert!(text.contains("requests=0 exceptions=0 dependencies=0 slow_requests=0"));
        assert!(text.contains("exceptions unavailable (timeout)"));
        assert!(text.contains("created=1 skipped=0 failed=1 total=2"));
        assert!(text.contains("shop-api-high-failure-rate (HTTP 403)"));
        assert!(text.ends_with("Report:     out/report.html"));
    }

    #[test]
    fn dry_run_is_explicit() {
        let run = RunResult::new("shop-api", 30, TelemetrySnapshot::default());
        let text = RunSummary::new(&run, Path::new("r.html")).to_string();
        assert!(text.contains("0 warranted, dry run (not provisioned)"));
    }

    #[test]
    fn unavailable_alerting_names_the_reason() {
        let mut run = RunResult::new("shop-api", 30, TelemetrySnapshot::default());
        run.provisioning = Provisioning::Unavailable("HTTP 401".into());
        let text = RunSummary::new(&run, Path::new("r.html")).to_string();
        assert!(text.contains("none provisioned: alerting unavailable (HTTP 401)"));
        assert!(!text.contains("dry run"));
    }
}

//! Typed view model bound into the report template.
//!
//! Every `String` field here is already HTML-escaped (or, for narrative
//! sections, sanitized HTML). The renderer only concatenates.

use crate::renderer::{html_escape, markdown_to_html};
use crate::run::{Provisioning, RunResult};
use apmon_alert::{AlertOutcome, AlertSpec, AlertStatus, MONITORING_SCHEDULE};
use apmon_common::types::{HealthStatus, TelemetryKind, TelemetrySnapshot};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ReportView {
    pub application: String,
    pub generated_at: String,
    pub window_days: i64,
    pub health: HealthStatus,
    pub metrics: Vec<MetricCard>,
    pub alerts: AlertsView,
    pub narratives: Vec<NarrativeSection>,
    pub tables: Vec<DataTable>,
    /// Telemetry collections that could not be fetched.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct AlertsView {
    pub summary: String,
    pub rows: Vec<AlertRow>,
}

#[derive(Debug, Clone)]
pub struct AlertRow {
    pub name: String,
    pub status: String,
    /// CSS badge modifier.
    pub status_class: &'static str,
    pub schedule: &'static str,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NarrativeSection {
    pub title: &'static str,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct DataTable {
    pub title: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
    /// Rows fetched; `rows.len()` of them are displayed.
    pub total: usize,
}

impl DataTable {
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total
    }
}

impl ReportView {
    /// Builds the view, showing at most `display_rows` rows per raw-data table.
    pub fn from_run(run: &RunResult, display_rows: usize) -> Self {
        Self {
            application: html_escape(&run.application),
            generated_at: run.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            window_days: run.window_days,
            health: run.health,
            metrics: metric_cards(run),
            alerts: alerts_view(run),
            narratives: run
                .narratives
                .sections()
                .into_iter()
                .map(|(title, markdown)| NarrativeSection {
                    title,
                    html: markdown_to_html(markdown),
                })
                .collect(),
            tables: data_tables(&run.snapshot, display_rows),
            warnings: warnings(run),
        }
    }
}

fn warnings(run: &RunResult) -> Vec<String> {
    let mut warnings: Vec<String> = run
        .telemetry_failures
        .iter()
        .map(|(kind, reason)| {
            html_escape(&format!(
                "{} could not be fetched and are shown as empty: {reason}",
                kind.label()
            ))
        })
        .collect();
    if let Provisioning::Unavailable(reason) = &run.provisioning {
        warnings.push(html_escape(&format!(
            "Alert rules could not be provisioned: {reason}"
        )));
    }
    warnings
}

fn metric_cards(run: &RunResult) -> Vec<MetricCard> {
    let m = &run.metrics;
    vec![
        MetricCard {
            label: "Requests",
            value: m.requests.count.to_string(),
            detail: format!("{} failed", m.requests.failed),
        },
        MetricCard {
            label: "Failure rate",
            value: format!("{:.2}%", m.requests.failure_rate),
            detail: format!("Health: {}", run.health),
        },
        MetricCard {
            label: "Avg response time",
            value: format!("{:.0} ms", m.requests.avg_duration_ms),
            detail: format!("over {} days", run.window_days),
        },
        MetricCard {
            label: "Exceptions",
            value: m.exceptions.count.to_string(),
            detail: String::new(),
        },
        MetricCard {
            label: "Dependency calls",
            value: m.dependencies.count.to_string(),
            detail: format!("{:.2}% failed", m.dependencies.failure_rate),
        },
        MetricCard {
            label: "Slow requests",
            value: m.slow_requests.count.to_string(),
            detail: format!("avg {:.0} ms", m.slow_requests.avg_duration_ms),
        },
    ]
}

fn alerts_view(run: &RunResult) -> AlertsView {
    let warranted = run.decided.len();
    match &run.provisioning {
        Provisioning::Done(report) if !report.is_empty() => AlertsView {
            summary: format!(
                "{} created, {} already existed, {} failed ({} total).",
                report.created.len(),
                report.skipped.len(),
                report.failed.len(),
                report.total()
            ),
            rows: report.outcomes().map(outcome_row).collect(),
        },
        Provisioning::DryRun if warranted > 0 => AlertsView {
            summary: format!(
                "Dry run: {warranted} rule(s) were warranted and none were provisioned."
            ),
            rows: run
                .decided
                .iter()
                .map(|spec| pending_row(spec, "Planned (dry run)", "is-warn"))
                .collect(),
        },
        Provisioning::Unavailable(reason) if warranted > 0 => AlertsView {
            summary: html_escape(&format!(
                "Alert provisioning failed: {reason}. {warranted} warranted rule(s) were not created."
            )),
            rows: run
                .decided
                .iter()
                .map(|spec| pending_row(spec, "Not created: alerting unavailable", "is-danger"))
                .collect(),
        },
        _ => AlertsView {
            summary: format!(
                "No monitoring rules were warranted by the last {} days of telemetry.",
                run.window_days
            ),
            rows: Vec::new(),
        },
    }
}

fn outcome_row(outcome: &AlertOutcome) -> AlertRow {
    let (status, status_class) = match outcome.status {
        AlertStatus::Created => ("Created".to_string(), "is-ok"),
        AlertStatus::AlreadyExists => ("Already exists".to_string(), "is-info"),
        AlertStatus::Failed => (
            format!(
                "Failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            "is-danger",
        ),
    };
    AlertRow {
        status: html_escape(&status),
        status_class,
        ..spec_row(&outcome.spec)
    }
}

/// A decided spec that never reached the backend.
fn pending_row(spec: &AlertSpec, status: &str, status_class: &'static str) -> AlertRow {
    AlertRow {
        status: status.to_string(),
        status_class,
        ..spec_row(spec)
    }
}

fn spec_row(spec: &AlertSpec) -> AlertRow {
    AlertRow {
        name: html_escape(&spec.name),
        status: String::new(),
        status_class: "",
        schedule: MONITORING_SCHEDULE,
        severity: format!("Sev{} ({})", spec.severity.level(), spec.severity),
        description: html_escape(&spec.description),
    }
}

const REQUEST_HEADERS: &[&str] = &["Time", "Name", "URL", "Duration (ms)", "Success", "Result"];
const EXCEPTION_HEADERS: &[&str] = &["Time", "Type", "Message", "Operation"];
const DEPENDENCY_HEADERS: &[&str] = &[
    "Time",
    "Name",
    "Target",
    "Type",
    "Duration (ms)",
    "Success",
    "Result",
];
const SLOW_REQUEST_HEADERS: &[&str] = &["Time", "Name", "URL", "Duration (ms)", "Result"];

fn data_tables(snapshot: &TelemetrySnapshot, display_rows: usize) -> Vec<DataTable> {
    vec![
        DataTable {
            title: TelemetryKind::Requests.label(),
            headers: REQUEST_HEADERS,
            rows: snapshot
                .requests
                .iter()
                .take(display_rows)
                .map(|r| {
                    row([
                        time(r.timestamp),
                        r.name.clone(),
                        r.url.clone(),
                        format!("{:.0}", r.duration_ms),
                        yes_no(r.success),
                        r.result_code.clone(),
                    ])
                })
                .collect(),
            total: snapshot.requests.len(),
        },
        DataTable {
            title: TelemetryKind::Exceptions.label(),
            headers: EXCEPTION_HEADERS,
            rows: snapshot
                .exceptions
                .iter()
                .take(display_rows)
                .map(|e| {
                    row([
                        time(e.timestamp),
                        e.exception_type.clone(),
                        e.message.clone(),
                        e.operation_name.clone(),
                    ])
                })
                .collect(),
            total: snapshot.exceptions.len(),
        },
        DataTable {
            title: TelemetryKind::Dependencies.label(),
            headers: DEPENDENCY_HEADERS,
            rows: snapshot
                .dependencies
                .iter()
                .take(display_rows)
                .map(|d| {
                    row([
                        time(d.timestamp),
                        d.name.clone(),
                        d.target.clone(),
                        d.dependency_type.clone(),
                        format!("{:.0}", d.duration_ms),
                        yes_no(d.success),
                        d.result_code.clone(),
                    ])
                })
                .collect(),
            total: snapshot.dependencies.len(),
        },
        DataTable {
            title: TelemetryKind::SlowRequests.label(),
            headers: SLOW_REQUEST_HEADERS,
            rows: snapshot
                .slow_requests
                .iter()
                .take(display_rows)
                .map(|r| {
                    row([
                        time(r.timestamp),
                        r.name.clone(),
                        r.url.clone(),
                        format!("{:.0}", r.duration_ms),
                        r.result_code.clone(),
                    ])
                })
                .collect(),
            total: snapshot.slow_requests.len(),
        },
    ]
}

fn row<const N: usize>(cells: [String; N]) -> Vec<String> {
    cells.iter().map(|c| html_escape(c)).collect()
}

fn time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

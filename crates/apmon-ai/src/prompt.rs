//! Prompt construction for the four narrative sections.
//!
//! Each prompt embeds the aggregate numbers plus at most `sample_rows` rows
//! of the relevant collection as a markdown table.

use crate::narrative::NarrativeInput;
use apmon_common::stats::MetricsSummary;
use chrono::{DateTime, Utc};

pub const DEFAULT_SAMPLE_ROWS: usize = 20;

pub const SYSTEM_ROLE: &str = "You are a senior site reliability engineer. You analyse application \
performance telemetry and explain findings to developers in concise, actionable Markdown.";

pub fn build_performance_prompt(input: &NarrativeInput<'_>) -> String {
    let m = &input.metrics.requests;
    let stats = format!(
        "- Requests sampled: {}\n- Failed requests: {}\n- Failure rate: {:.2}%\n- Average duration: {:.0} ms\n- Slow requests: {}",
        m.count, m.failed, m.failure_rate, m.avg_duration_ms, input.metrics.slow_requests.count
    );

    let mut data = String::from("### Requests\n\n");
    data.push_str(&table(
        &["Time", "Name", "Duration (ms)", "Success", "Result"],
        input.snapshot.requests.iter().take(input.sample_rows).map(|r| {
            vec![
                time(r.timestamp),
                r.name.clone(),
                format!("{:.0}", r.duration_ms),
                r.success.to_string(),
                r.result_code.clone(),
            ]
        }),
    ));
    data.push_str("\n### Slow requests\n\n");
    data.push_str(&table(
        &["Time", "Name", "URL", "Duration (ms)", "Result"],
        input.snapshot.slow_requests.iter().take(input.sample_rows).map(|r| {
            vec![
                time(r.timestamp),
                r.name.clone(),
                r.url.clone(),
                format!("{:.0}", r.duration_ms),
                r.result_code.clone(),
            ]
        }),
    ));

    fill(PERFORMANCE_PROMPT, input, &stats, &data)
}

pub fn build_exceptions_prompt(input: &NarrativeInput<'_>) -> String {
    let stats = format!("- Exceptions sampled: {}", input.metrics.exceptions.count);
    let data = table(
        &["Time", "Type", "Message", "Operation"],
        input.snapshot.exceptions.iter().take(input.sample_rows).map(|e| {
            vec![
                time(e.timestamp),
                e.exception_type.clone(),
                e.message.clone(),
                e.operation_name.clone(),
            ]
        }),
    );
    fill(EXCEPTIONS_PROMPT, input, &stats, &data)
}

pub fn build_dependencies_prompt(input: &NarrativeInput<'_>) -> String {
    let m = &input.metrics.dependencies;
    let stats = format!(
        "- Dependency calls sampled: {}\n- Failed calls: {}\n- Failure rate: {:.2}%\n- Average duration: {:.0} ms",
        m.count, m.failed, m.failure_rate, m.avg_duration_ms
    );
    let data = table(
        &["Time", "Name", "Target", "Type", "Duration (ms)", "Success", "Result"],
        input.snapshot.dependencies.iter().take(input.sample_rows).map(|d| {
            vec![
                time(d.timestamp),
                d.name.clone(),
                d.target.clone(),
                d.dependency_type.clone(),
                format!("{:.0}", d.duration_ms),
                d.success.to_string(),
                d.result_code.clone(),
            ]
        }),
    );
    fill(DEPENDENCIES_PROMPT, input, &stats, &data)
}

pub fn build_recommendations_prompt(input: &NarrativeInput<'_>) -> String {
    let stats = format!("- Overall health: {}", input.metrics.health());
    fill(
        RECOMMENDATIONS_PROMPT,
        input,
        &stats,
        &summary_table(input.metrics),
    )
}

fn fill(template: &str, input: &NarrativeInput<'_>, stats: &str, data: &str) -> String {
    template
        .replace("{{APPLICATION}}", input.application)
        .replace("{{WINDOW_DAYS}}", &input.window_days.to_string())
        .replace("{{STATS}}", stats)
        .replace("{{DATA}}", data)
}

fn summary_table(metrics: &MetricsSummary) -> String {
    let rows = [
        &metrics.requests,
        &metrics.exceptions,
        &metrics.dependencies,
        &metrics.slow_requests,
    ];
    table(
        &["Collection", "Count", "Failed", "Failure rate (%)", "Avg duration (ms)"],
        rows.iter().map(|m| {
            vec![
                m.kind.label().to_string(),
                m.count.to_string(),
                m.failed.to_string(),
                format!("{:.2}", m.failure_rate),
                format!("{:.0}", m.avg_duration_ms),
            ]
        }),
    )
}

fn time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Markdown table; cell text has pipes escaped and newlines flattened.
fn table<I>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut output = String::new();
    let mut body = String::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| cell(c)).collect();
        body.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    if body.is_empty() {
        return "_No rows in this window._\n".to_string();
    }

    output.push_str(&format!("| {} |\n", headers.join(" | ")));
    output.push_str(&format!(
        "|{}\n",
        headers.iter().map(|_| "---|").collect::<String>()
    ));
    output.push_str(&body);
    output
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

const PERFORMANCE_PROMPT: &str = r#"Analyse the request performance of the application "{{APPLICATION}}" over the last {{WINDOW_DAYS}} days.

Aggregates:
{{STATS}}

Sample data:
{{DATA}}

Describe response-time behaviour, failure patterns and the slowest operations. Point out anything that looks like a regression. Answer in Markdown with short paragraphs or bullet lists."#;

const EXCEPTIONS_PROMPT: &str = r#"Analyse the exceptions thrown by the application "{{APPLICATION}}" over the last {{WINDOW_DAYS}} days.

Aggregates:
{{STATS}}

Sample data:
{{DATA}}

Group the exceptions by likely root cause, call out any that indicate resource exhaustion, database or timeout problems, and say which operations are affected. Answer in Markdown."#;

const DEPENDENCIES_PROMPT: &str = r#"Analyse the outbound dependency calls of the application "{{APPLICATION}}" over the last {{WINDOW_DAYS}} days.

Aggregates:
{{STATS}}

Sample data:
{{DATA}}

Identify unreliable or slow dependencies and whether failures cluster on a particular target. Answer in Markdown."#;

const RECOMMENDATIONS_PROMPT: &str = r#"Based on the following {{WINDOW_DAYS}}-day telemetry summary for the application "{{APPLICATION}}", give prioritised recommendations.

{{STATS}}

{{DATA}}

List at most five concrete actions, most urgent first, each with a one-sentence justification. Answer in Markdown."#;

#[cfg(test)]
mod tests {
    use super::*;
    use apmon_common::types::{ExceptionRow, PerformanceRow, TelemetrySnapshot};
    use chrono::TimeZone;

    fn snapshot(requests: usize) -> TelemetrySnapshot {
        let ts = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        TelemetrySnapshot {
            requests: (0..requests)
                .map(|i| PerformanceRow {
                    timestamp: ts,
                    name: format!("GET /api/item/{i}"),
                    url: String::new(),
                    duration_ms: 120.0,
                    success: true,
                    result_code: "200".into(),
                })
                .collect(),
            exceptions: vec![ExceptionRow {
                timestamp: ts,
                exception_type: "System.TimeoutException".into(),
                message: "a | b\nc".into(),
                operation_name: "GET /api/item".into(),
            }],
            ..Default::default()
        }
    }

    fn input<'a>(snapshot: &'a TelemetrySnapshot, metrics: &'a MetricsSummary) -> NarrativeInput<'a> {
        NarrativeInput {
            application: "shop-api",
            window_days: 30,
            snapshot,
            metrics,
            sample_rows: 5,
            max_tokens: 500,
        }
    }

    #[test]
    fn performance_prompt_caps_sample_rows() {
        let snapshot = snapshot(50);
        let metrics = MetricsSummary::from_snapshot(&snapshot);
        let prompt = build_performance_prompt(&input(&snapshot, &metrics));

        assert!(prompt.contains("\"shop-api\" over the last 30 days"));
        assert!(prompt.contains("- Requests sampled: 50"));
        assert!(prompt.contains("GET /api/item/4 |"));
        assert!(!prompt.contains("GET /api/item/5 |"));
        assert!(prompt.contains("| Time | Name | Duration (ms) | Success | Result |"));
        assert!(prompt.contains("_No rows in this window._"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn exception_cells_are_table_safe() {
        let snapshot = snapshot(0);
        let metrics = MetricsSummary::from_snapshot(&snapshot);
        let prompt = build_exceptions_prompt(&input(&snapshot, &metrics));
        assert!(prompt.contains("| 2026-10-01 12:00:00 | System.TimeoutException | a \\| b c | GET /api/item |"));
    }

    #[test]
    fn recommendations_prompt_summarises_every_collection() {
        let snapshot = snapshot(3);
        let metrics = MetricsSummary::from_snapshot(&snapshot);
        let prompt = build_recommendations_prompt(&input(&snapshot, &metrics));
        assert!(prompt.contains("- Overall health: healthy"));
        for label in ["Requests", "Exceptions", "Dependencies", "Slow requests"] {
            assert!(prompt.contains(&format!("| {label} |")), "missing {label}");
        }
    }
}

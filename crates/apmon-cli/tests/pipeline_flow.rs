mod common;

use anyhow::Result;
use apmon_alert::{AlertCategory, AlertStatus};
use apmon_cli::pipeline::Pipeline;
use apmon_cli::summary::RunSummary;
use apmon_common::types::{HealthStatus, TelemetryKind};
use apmon_report::{write_report, Provisioning, ReportRenderer, ReportView};
use common::{test_config, FakeSummarizer, FakeTelemetry, MemoryAlerts, TelemetryFixture};

#[tokio::test]
async fn full_run_provisions_narrates_and_writes_report() -> Result<()> {
    let config = test_config();
    let alerts = MemoryAlerts::default();
    let pipeline = Pipeline::new(&config, Box::new(FakeTelemetry::new(TelemetryFixture::troubled())))
        .with_alert_backend(Box::new(alerts.clone()))
        .with_summarizer(Box::new(FakeSummarizer::default()));

    let run = pipeline.run().await?;

    assert_eq!(run.snapshot.requests.len(), 10);
    assert_eq!(run.snapshot.exceptions.len(), 2);
    assert_eq!(run.snapshot.dependencies.len(), 100);
    assert_eq!(run.snapshot.slow_requests.len(), 21);
    assert_eq!(run.health, HealthStatus::Healthy);
    assert!(run.telemetry_failures.is_empty());

    let categories: Vec<_> = run.decided.iter().map(|s| s.category).collect();
    assert_eq!(
        categories,
        vec![
            AlertCategory::ResponseTime,
            AlertCategory::CriticalExceptions,
            AlertCategory::DependencyFailures,
            AlertCategory::SlowRequests,
        ]
    );

    let Provisioning::Done(report) = &run.provisioning else {
        anyhow::bail!("provisioning should have run");
    };
    assert_eq!(report.created.len(), 4);
    assert_eq!(report.total(), 4);
    assert!(report
        .created
        .iter()
        .all(|o| o.rule_id.as_deref().is_some_and(|id| id.starts_with("/rg/rg-alerts/"))));
    assert_eq!(alerts.create_count(), 4);

    assert!(run.narratives.performance.contains("max 400 tokens"));
    assert!(run.narratives.recommendations.starts_with("**Stable**"));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out/report.html");
    let html = ReportRenderer::render(&ReportView::from_run(&run, config.report.display_rows))?;
    write_report(&path, &html)?;

    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("<h1>shop-api</h1>"));
    assert!(written.contains("shop-api-dependency-failures"));
    assert!(written.contains("Every 24 hours (24-hour lookback)"));
    assert!(written.contains("<strong>Stable</strong>"));
    assert!(written.contains("Showing 20 of 100 rows."));
    assert!(written.contains("Showing 20 of 21 rows."));

    let summary = RunSummary::new(&run, &path).to_string();
    assert!(summary.contains("created=4 skipped=0 failed=0 total=4"));
    Ok(())
}

#[tokio::test]
async fn second_run_finds_existing_rules() -> Result<()> {
    let config = test_config();
    let alerts = MemoryAlerts::default();

    for _ in 0..2 {
        Pipeline::new(&config, Box::new(FakeTelemetry::new(TelemetryFixture::troubled())))
            .with_alert_backend(Box::new(alerts.clone()))
            .run()
            .await?;
    }
    let run = Pipeline::new(&config, Box::new(FakeTelemetry::new(TelemetryFixture::troubled())))
        .with_alert_backend(Box::new(alerts.clone()))
        .run()
        .await?;

    let Provisioning::Done(report) = run.provisioning else {
        anyhow::bail!("provisioning should have run");
    };
    assert!(report.created.is_empty());
    assert_eq!(report.skipped.len(), 4);
    assert!(report.skipped.iter().all(|o| o.status == AlertStatus::AlreadyExists));
    assert_eq!(alerts.create_count(), 4);
    Ok(())
}

#[tokio::test]
async fn failed_collection_degrades_to_empty() -> Result<()> {
    let config = test_config();
    let source = FakeTelemetry {
        failing: vec!["exceptions"],
        ..FakeTelemetry::new(TelemetryFixture::troubled())
    };

    let run = Pipeline::new(&config, Box::new(source)).run().await?;

    assert!(run.snapshot.exceptions.is_empty());
    assert_eq!(run.snapshot.requests.len(), 10);
    assert_eq!(run.telemetry_failures.len(), 1);
    assert_eq!(run.telemetry_failures[0].0, TelemetryKind::Exceptions);
    assert!(run.telemetry_failures[0].1.contains("502"));
    assert!(!run
        .decided
        .iter()
        .any(|s| s.category == AlertCategory::CriticalExceptions));
    Ok(())
}

#[tokio::test]
async fn rejected_telemetry_credentials_abort_the_run() {
    let config = test_config();
    let source = FakeTelemetry {
        reject_all: true,
        ..Default::default()
    };

    let err = Pipeline::new(&config, Box::new(source))
        .with_alert_backend(Box::new(MemoryAlerts::default()))
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("rejected every query"));
}

#[tokio::test]
async fn dry_run_decides_without_provisioning() -> Result<()> {
    let config = test_config();
    let run = Pipeline::new(&config, Box::new(FakeTelemetry::new(TelemetryFixture::troubled())))
        .run()
        .await?;

    assert_eq!(run.provisioning, Provisioning::DryRun);
    assert_eq!(run.decided.len(), 4);
    assert!(run
        .narratives
        .sections()
        .iter()
        .all(|(_, text)| text.contains("skipped")));

    let html = ReportRenderer::render(&ReportView::from_run(&run, 20))?;
    assert!(html.contains("Planned (dry run)"));
    Ok(())
}

#[tokio::test]
async fn unavailable_alerting_backend_is_reported_not_planned() -> Result<()> {
    let config = test_config();
    let run = Pipeline::new(&config, Box::new(FakeTelemetry::new(TelemetryFixture::troubled())))
        .with_alerts_unavailable("token request for https://management.azure.com/.default rejected (401)")
        .run()
        .await?;

    assert_eq!(run.decided.len(), 4);
    let Provisioning::Unavailable(reason) = &run.provisioning else {
        anyhow::bail!("expected unavailable provisioning, got {:?}", run.provisioning);
    };
    assert!(reason.contains("rejected (401)"));

    let html = ReportRenderer::render(&ReportView::from_run(&run, 20))?;
    assert!(html.contains("Alert provisioning failed: token request"));
    assert!(html.contains("4 warranted rule(s) were not created."));
    assert!(!html.contains("Planned"));

    let summary = RunSummary::new(&run, std::path::Path::new("r.html")).to_string();
    assert!(summary.contains("4 warranted, none provisioned: alerting unavailable"));
    assert!(!summary.contains("dry run"));
    Ok(())
}

#[tokio::test]
async fn unbuildable_summarizer_yields_unavailable_sections() -> Result<()> {
    let config = test_config();
    let run = Pipeline::new(&config, Box::new(FakeTelemetry::default()))
        .with_summarizer_unavailable("configuration error: deployment is required")
        .run()
        .await?;

    for (_, text) in run.narratives.sections() {
        assert_eq!(
            text,
            "AI analysis unavailable: configuration error: deployment is required"
        );
    }
    Ok(())
}

#[tokio::test]
async fn out_of_range_window_is_an_error() {
    let mut config = test_config();
    config.telemetry.window_days = i64::MAX;

    let err = Pipeline::new(&config, Box::new(FakeTelemetry::default()))
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[tokio::test]
async fn unavailable_summarizer_fills_placeholders() -> Result<()> {
    let config = test_config();
    let summarizer = FakeSummarizer {
        down: true,
        ..Default::default()
    };

    let run = Pipeline::new(&config, Box::new(FakeTelemetry::default()))
        .with_summarizer(Box::new(summarizer))
        .run()
        .await?;

    for (_, text) in run.narratives.sections() {
        assert!(text.starts_with("AI analysis unavailable: "));
        assert!(text.contains("invalid api key"));
    }
    assert!(run.decided.is_empty());
    Ok(())
}

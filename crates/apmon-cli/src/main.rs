use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apmon_ai::AzureOpenAiProvider;
use apmon_alert::azure::{app_insights_resource_id, ScheduledQueryRuleBackend};
use apmon_cli::auth::{self, TokenScope};
use apmon_cli::config::AppConfig;
use apmon_cli::pipeline::Pipeline;
use apmon_cli::summary::RunSummary;
use apmon_report::{write_report, ReportRenderer, ReportView};
use apmon_telemetry::AppInsightsClient;

#[derive(Parser)]
#[command(name = "apmon")]
#[command(about = "Application performance report and alert provisioning", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config/apmon.toml")]
    config: PathBuf,

    /// Report output path (overrides report.output_path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decide alert rules but do not create them
    #[arg(long)]
    dry_run: bool,

    /// Skip the AI narrative sections
    #[arg(long)]
    skip_narrative: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("apmon=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config '{}'", cli.config.display()))?;
    if cli.dry_run {
        config.alerting.enabled = false;
    }
    if cli.skip_narrative {
        config.openai.enabled = false;
    }
    config.validate()?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.report.output_path));

    let telemetry_token = auth::acquire_token(&config.auth, TokenScope::Telemetry)
        .await
        .context("Authentication to the telemetry backend failed")?;
    let source = AppInsightsClient::new(
        config.telemetry.app_id.clone(),
        config.telemetry.endpoint.clone(),
        telemetry_token,
        config.telemetry.timeout_secs,
    )?;

    let mut pipeline = Pipeline::new(&config, Box::new(source));

    if config.alerting.enabled {
        match build_alert_backend(&config).await {
            Ok(backend) => pipeline = pipeline.with_alert_backend(Box::new(backend)),
            Err(e) => {
                tracing::error!(error = %e, "Alerting backend unavailable, provisioning skipped");
                pipeline = pipeline.with_alerts_unavailable(format!("{e:#}"));
            }
        }
    } else {
        tracing::info!(dry_run = cli.dry_run, "Alerting disabled for this run");
    }

    if config.openai.enabled {
        let provider = AzureOpenAiProvider::new(
            &config.openai.endpoint,
            config.openai.deployment.clone(),
            config.openai.api_key.clone().unwrap_or_default(),
            config.openai.api_version.clone(),
            Some(config.openai.timeout_secs),
            config.openai.temperature,
        );
        match provider {
            Ok(provider) => pipeline = pipeline.with_summarizer(Box::new(provider)),
            Err(e) => {
                tracing::error!(error = %e, "Narrative provider unavailable, analysis skipped");
                pipeline = pipeline.with_summarizer_unavailable(e.to_string());
            }
        }
    }

    let run = pipeline.run().await?;

    let view = ReportView::from_run(&run, config.report.display_rows);
    let html = ReportRenderer::render(&view).context("Failed to render report")?;
    write_report(&output, &html)?;

    println!("{}", RunSummary::new(&run, &output));
    Ok(())
}

async fn build_alert_backend(config: &AppConfig) -> Result<ScheduledQueryRuleBackend> {
    let token = auth::acquire_token(&config.auth, TokenScope::Management).await?;
    let data_source_id = app_insights_resource_id(
        &config.target.subscription_id,
        &config.target.resource_group,
        config.target.component_name(),
    );
    let backend = ScheduledQueryRuleBackend::new(
        config.alerting.endpoint.clone(),
        token,
        config.target.subscription_id.clone(),
        config.alerting.location.clone(),
        data_source_id,
        config.alerting.timeout_secs,
    )?;
    Ok(backend)
}

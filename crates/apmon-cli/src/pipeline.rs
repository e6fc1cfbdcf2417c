//! The sequential run: collect, decide, provision, narrate.
//!
//! Every external call is awaited before the next one starts. Only an
//! out-of-range window or a telemetry backend that rejects every query aborts
//! the run; all other failures are folded into the [`RunResult`].

use crate::config::AppConfig;
use anyhow::Context;
use apmon_ai::{narrate, NarrativeInput, Narratives, NarrativeSummarizer};
use apmon_alert::{AlertBackend, AlertPolicy, PolicyContext, Provisioner};
use apmon_report::{Provisioning, RunResult};
use apmon_telemetry::query::QueryCatalog;
use apmon_telemetry::{TelemetryCollector, TelemetrySource};

/// How the alerting stage runs.
enum AlertStage {
    /// Decide only.
    DryRun,
    Backend(Box<dyn AlertBackend>),
    /// The backend could not be set up.
    Unavailable(String),
}

enum NarrativeStage {
    Skipped,
    Summarizer(Box<dyn NarrativeSummarizer>),
    Unavailable(String),
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    source: Box<dyn TelemetrySource>,
    alerts: AlertStage,
    narratives: NarrativeStage,
}

impl<'a> Pipeline<'a> {
    /// A pipeline that only collects and decides. Provisioning and narration
    /// are enabled by attaching their backends.
    pub fn new(config: &'a AppConfig, source: Box<dyn TelemetrySource>) -> Self {
        Self {
            config,
            source,
            alerts: AlertStage::DryRun,
            narratives: NarrativeStage::Skipped,
        }
    }

    pub fn with_alert_backend(mut self, backend: Box<dyn AlertBackend>) -> Self {
        self.alerts = AlertStage::Backend(backend);
        self
    }

    /// Alerting was requested but its backend could not be built. Decided
    /// specs are reported as not created, with `reason`.
    pub fn with_alerts_unavailable(mut self, reason: impl Into<String>) -> Self {
        self.alerts = AlertStage::Unavailable(reason.into());
        self
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn NarrativeSummarizer>) -> Self {
        self.narratives = NarrativeStage::Summarizer(summarizer);
        self
    }

    /// Narration was requested but no summarizer could be built. Every
    /// section reads "AI analysis unavailable: `reason`".
    pub fn with_summarizer_unavailable(mut self, reason: impl Into<String>) -> Self {
        self.narratives = NarrativeStage::Unavailable(reason.into());
        self
    }

    pub async fn run(&self) -> anyhow::Result<RunResult> {
        let config = self.config;
        let application = config.target.application.as_str();
        let window_days = config.telemetry.window_days;

        tracing::info!(
            application,
            window_days,
            source = %self.source.name(),
            "Collecting telemetry"
        );
        let window = chrono::Duration::try_days(window_days)
            .with_context(|| format!("telemetry window of {window_days} days is out of range"))?;
        let catalog = QueryCatalog::new(
            window,
            config.telemetry.limits,
            config.telemetry.slow_request_ms,
        );
        let collection = TelemetryCollector::new(self.source.as_ref(), catalog)
            .collect()
            .await;
        if collection.is_unauthorized() {
            anyhow::bail!(
                "telemetry backend '{}' rejected every query: {}",
                self.source.name(),
                collection
                    .failures
                    .first()
                    .map(|(_, e)| e.as_str())
                    .unwrap_or("unauthorized")
            );
        }

        let mut run = RunResult::new(application, window_days, collection.snapshot);
        run.telemetry_failures = collection.failures;
        tracing::info!(
            requests = run.metrics.requests.count,
            exceptions = run.metrics.exceptions.count,
            dependencies = run.metrics.dependencies.count,
            slow_requests = run.metrics.slow_requests.count,
            health = %run.health,
            "Telemetry aggregated"
        );

        let ctx = PolicyContext {
            application,
            lookback_days: window_days,
        };
        run.decided = AlertPolicy::new(&config.thresholds).decide(&run.snapshot, &ctx);
        tracing::info!(specs = run.decided.len(), "Alert decisions made");

        run.provisioning = match &self.alerts {
            AlertStage::Backend(backend) => {
                tracing::info!(
                    backend = %backend.name(),
                    resource_group = %config.alert_resource_group(),
                    "Provisioning alert rules"
                );
                let provisioner = Provisioner::new(
                    backend.as_ref(),
                    config.alert_resource_group(),
                    &config.alerting.action_group_id,
                );
                Provisioning::Done(provisioner.provision(&run.decided).await)
            }
            AlertStage::DryRun => {
                tracing::info!(specs = run.decided.len(), "Dry run, alert provisioning skipped");
                Provisioning::DryRun
            }
            AlertStage::Unavailable(reason) => {
                tracing::warn!(
                    specs = run.decided.len(),
                    reason = %reason,
                    "Alerting backend unavailable, no rules provisioned"
                );
                Provisioning::Unavailable(reason.clone())
            }
        };

        run.narratives = match &self.narratives {
            NarrativeStage::Summarizer(summarizer) => {
                let input = NarrativeInput {
                    application,
                    window_days,
                    snapshot: &run.snapshot,
                    metrics: &run.metrics,
                    sample_rows: config.openai.sample_rows,
                    max_tokens: config.openai.max_tokens,
                };
                narrate(summarizer.as_ref(), &input).await
            }
            NarrativeStage::Skipped => {
                tracing::info!("Narrative analysis skipped");
                Narratives::skipped()
            }
            NarrativeStage::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "Narrative provider unavailable");
                Narratives::unavailable(reason)
            }
        };

        Ok(run)
    }
}

use crate::prompt::{
    build_dependencies_prompt, build_exceptions_prompt, build_performance_prompt,
    build_recommendations_prompt, SYSTEM_ROLE,
};
use crate::summarizer::{summarize_or_unavailable, NarrativeSummarizer, UNAVAILABLE_PREFIX};
use apmon_common::stats::MetricsSummary;
use apmon_common::types::TelemetrySnapshot;
use serde::{Deserialize, Serialize};

pub const SKIPPED_TEXT: &str = "AI analysis skipped for this run.";

/// Everything the narrative prompts are built from.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub application: &'a str,
    pub window_days: i64,
    pub snapshot: &'a TelemetrySnapshot,
    pub metrics: &'a MetricsSummary,
    /// Rows of each collection included in a prompt.
    pub sample_rows: usize,
    pub max_tokens: usize,
}

/// One markdown text block per report section. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narratives {
    pub performance: String,
    pub exceptions: String,
    pub dependencies: String,
    pub recommendations: String,
}

impl Narratives {
    pub fn skipped() -> Self {
        Self {
            performance: SKIPPED_TEXT.to_string(),
            exceptions: SKIPPED_TEXT.to_string(),
            dependencies: SKIPPED_TEXT.to_string(),
            recommendations: SKIPPED_TEXT.to_string(),
        }
    }

    /// Every section carries the unavailable placeholder with `reason`.
    pub fn unavailable(reason: &str) -> Self {
        let text = format!("{UNAVAILABLE_PREFIX}: {reason}");
        Self {
            performance: text.clone(),
            exceptions: text.clone(),
            dependencies: text.clone(),
            recommendations: text,
        }
    }

    /// `(title, markdown)` in report order.
    pub fn sections(&self) -> [(&'static str, &str); 4] {
        [
            ("Performance Analysis", self.performance.as_str()),
            ("Exception Analysis", self.exceptions.as_str()),
            ("Dependency Analysis", self.dependencies.as_str()),
            ("Recommendations", self.recommendations.as_str()),
        ]
    }
}

/// Issues the four summarization calls one after another.
pub async fn narrate(
    summarizer: &dyn NarrativeSummarizer,
    input: &NarrativeInput<'_>,
) -> Narratives {
    tracing::info!(
        provider = %summarizer.provider(),
        model = %summarizer.model_name(),
        sample_rows = input.sample_rows,
        "Generating narrative analysis"
    );

    let performance = build_performance_prompt(input);
    let performance = section(summarizer, "performance", &performance, input).await;
    let exceptions = build_exceptions_prompt(input);
    let exceptions = section(summarizer, "exceptions", &exceptions, input).await;
    let dependencies = build_dependencies_prompt(input);
    let dependencies = section(summarizer, "dependencies", &dependencies, input).await;
    let recommendations = build_recommendations_prompt(input);
    let recommendations = section(summarizer, "recommendations", &recommendations, input).await;

    Narratives {
        performance,
        exceptions,
        dependencies,
        recommendations,
    }
}

async fn section(
    summarizer: &dyn NarrativeSummarizer,
    name: &str,
    prompt: &str,
    input: &NarrativeInput<'_>,
) -> String {
    tracing::info!(section = name, prompt_length = prompt.len(), "Requesting narrative");
    let text = summarize_or_unavailable(summarizer, prompt, SYSTEM_ROLE, input.max_tokens).await;
    if text.trim().is_empty() {
        return format!("{UNAVAILABLE_PREFIX}: empty response");
    }
    text
}

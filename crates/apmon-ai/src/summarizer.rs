use crate::error::Result;
use async_trait::async_trait;

/// Prefix of the placeholder placed in the report when a call fails.
pub const UNAVAILABLE_PREFIX: &str = "AI analysis unavailable";

/// Text-generation backend: prompt in, prose out.
#[async_trait]
pub trait NarrativeSummarizer: Send + Sync {
    /// Provider name used in log fields.
    fn provider(&self) -> &str;

    fn model_name(&self) -> &str;

    async fn summarize(&self, prompt: &str, system_role: &str, max_tokens: usize)
        -> Result<String>;
}

/// Calls `summarizer` once; any error becomes `"AI analysis unavailable: <reason>"`.
pub async fn summarize_or_unavailable(
    summarizer: &dyn NarrativeSummarizer,
    prompt: &str,
    system_role: &str,
    max_tokens: usize,
) -> String {
    match summarizer.summarize(prompt, system_role, max_tokens).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                provider = %summarizer.provider(),
                model = %summarizer.model_name(),
                error = %e,
                "Narrative summarization failed"
            );
            format!("{UNAVAILABLE_PREFIX}: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummarizerError;

    struct Down;

    #[async_trait]
    impl NarrativeSummarizer for Down {
        fn provider(&self) -> &str {
            "down"
        }

        fn model_name(&self) -> &str {
            "none"
        }

        async fn summarize(&self, _: &str, _: &str, _: usize) -> Result<String> {
            Err(SummarizerError::Http {
                status: 503,
                body: "overloaded".into(),
            })
        }
    }

    #[tokio::test]
    async fn failure_becomes_placeholder_text() {
        let text = summarize_or_unavailable(&Down, "prompt", "role", 100).await;
        assert!(text.starts_with("AI analysis unavailable: "));
        assert!(text.contains("503"));
        assert!(text.contains("overloaded"));
    }
}

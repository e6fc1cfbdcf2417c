use crate::error::{Result, SummarizerError};
use crate::models::{ChatMessage, ChatRequest, ChatResponse};
use crate::summarizer::NarrativeSummarizer;
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Azure OpenAI chat completions, addressed by deployment name.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    api_key: String,
    deployment: String,
    url: String,
    client: Client,
    temperature: Option<f32>,
}

impl AzureOpenAiProvider {
    pub fn new(
        endpoint: &str,
        deployment: String,
        api_key: String,
        api_version: Option<String>,
        timeout_secs: Option<u64>,
        temperature: Option<f32>,
    ) -> Result<Self> {
        if endpoint.trim().is_empty() || deployment.trim().is_empty() {
            return Err(SummarizerError::Config(
                "endpoint and deployment are required".to_string(),
            ));
        }
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(timeout_secs.unwrap_or(120)))
            .build()?;
        let url = completions_url(
            endpoint,
            &deployment,
            api_version.as_deref().unwrap_or(DEFAULT_API_VERSION),
        );

        Ok(Self {
            api_key,
            deployment,
            url,
            client,
            temperature,
        })
    }
}

fn completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

#[async_trait]
impl NarrativeSummarizer for AzureOpenAiProvider {
    fn provider(&self) -> &str {
        "azure-openai"
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }

    async fn summarize(
        &self,
        prompt: &str,
        system_role: &str,
        max_tokens: usize,
    ) -> Result<String> {
        let req = ChatRequest {
            model: None,
            messages: vec![ChatMessage::system(system_role), ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: Some(max_tokens),
        };

        tracing::debug!(
            deployment = %self.deployment,
            prompt_length = prompt.len(),
            max_tokens,
            "Calling Azure OpenAI"
        );

        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Azure OpenAI request failed");
            return Err(SummarizerError::Http { status, body });
        }

        let chat_resp: ChatResponse = resp.json().await?;
        tracing::debug!(usage = ?chat_resp.usage, "Azure OpenAI response received");

        chat_resp
            .first_content()
            .ok_or(SummarizerError::EmptyResponse)
    }
}

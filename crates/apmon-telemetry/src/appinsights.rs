use crate::error::{Result, TelemetryError};
use crate::query::iso8601_timespan;
use crate::table::{QueryResponse, QueryTable};
use crate::TelemetrySource;
use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::Serialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.applicationinsights.io/v1";

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    timespan: String,
}

/// Application Insights query REST client.
pub struct AppInsightsClient {
    app_id: String,
    endpoint: String,
    token: String,
    client: Client,
}

impl AppInsightsClient {
    pub fn new(
        app_id: String,
        endpoint: Option<String>,
        token: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            app_id,
            endpoint: endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
            token,
            client,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/apps/{}/query", self.endpoint, self.app_id)
    }
}

#[async_trait]
impl TelemetrySource for AppInsightsClient {
    fn name(&self) -> &str {
        "appinsights"
    }

    async fn query(&self, query: &str, window: Duration) -> Result<QueryTable> {
        let body = QueryBody {
            query,
            timespan: iso8601_timespan(window),
        };

        tracing::debug!(
            app_id = %self.app_id,
            timespan = %body.timespan,
            query_length = query.len(),
            "Executing telemetry query"
        );

        let resp = self
            .client
            .post(self.query_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TelemetryError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelemetryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_primary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = AppInsightsClient::new(
            "app-123".into(),
            Some("https://example.test/v1/".into()),
            "token".into(),
            5,
        )
        .unwrap();
        assert_eq!(client.query_url(), "https://example.test/v1/apps/app-123/query");
    }

    #[test]
    fn default_endpoint_is_public_api() {
        let client = AppInsightsClient::new("abc".into(), None, "t".into(), 5).unwrap();
        assert!(client.query_url().starts_with(DEFAULT_ENDPOINT));
    }
}

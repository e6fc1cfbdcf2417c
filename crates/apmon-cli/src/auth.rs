//! Bearer tokens for the telemetry and management APIs.
//!
//! Uses the OAuth2 client-credentials grant against Microsoft Entra ID, unless
//! a token for the requested audience was supplied in the configuration.

use crate::config::AuthConfig;
use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Audiences the run needs a token for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Telemetry,
    Management,
}

impl TokenScope {
    pub fn scope(&self) -> &'static str {
        match self {
            Self::Telemetry => "https://api.applicationinsights.io/.default",
            Self::Management => "https://management.azure.com/.default",
        }
    }

    fn preissued<'a>(&self, config: &'a AuthConfig) -> Option<&'a str> {
        let token = match self {
            Self::Telemetry => config.telemetry_token.as_deref(),
            Self::Management => config.management_token.as_deref(),
        };
        token.filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub fn token_url(config: &AuthConfig) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        config
            .authority
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY)
            .trim_end_matches('/'),
        config.tenant_id
    )
}

/// Returns a bearer token for `scope`.
pub async fn acquire_token(config: &AuthConfig, scope: TokenScope) -> anyhow::Result<String> {
    if let Some(token) = scope.preissued(config) {
        tracing::debug!(scope = scope.scope(), "Using pre-issued token");
        return Ok(token.to_string());
    }

    let secret = config
        .client_secret
        .as_deref()
        .context("client secret is not configured")?;
    let url = token_url(config);
    tracing::info!(scope = scope.scope(), client_id = %config.client_id, "Requesting access token");

    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let resp = client
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", secret),
            ("scope", scope.scope()),
        ])
        .send()
        .await
        .with_context(|| format!("failed to reach token endpoint {url}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("token request for {} rejected ({status}): {body}", scope.scope());
    }

    let token: TokenResponse = resp
        .json()
        .await
        .context("failed to parse token response")?;
    Ok(token.access_token)
}

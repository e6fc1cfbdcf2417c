//! Azure Monitor scheduled query rules as an [`AlertBackend`].
//!
//! Uses the log-alert `scheduledQueryRules` resource (api-version 2018-04-16):
//! a `ResultCount` query over the application's telemetry, evaluated every
//! 1440 minutes over a 1440-minute window, firing when the result count is
//! greater than [`RULE_TRIGGER_THRESHOLD`].

use crate::error::{AlertBackendError, Result};
use crate::{AlertBackend, AlertSpec, RuleHandle, RULE_TRIGGER_THRESHOLD};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const API_VERSION: &str = "2018-04-16";

const ALERTING_ACTION_ODATA_TYPE: &str = "Microsoft.WindowsAzure.Management.Monitoring.Alerts.Models.Microsoft.AppInsights.Nexus.DataContracts.Resources.ScheduledQueryRules.AlertingAction";

/// Resource id of an Application Insights component.
pub fn app_insights_resource_id(subscription_id: &str, resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/microsoft.insights/components/{name}"
    )
}

#[derive(Debug, Deserialize)]
struct RuleResource {
    id: Option<String>,
    name: Option<String>,
}

pub struct ScheduledQueryRuleBackend {
    client: Client,
    endpoint: String,
    token: String,
    subscription_id: String,
    location: String,
    /// Telemetry resource the rule queries.
    data_source_id: String,
}

impl ScheduledQueryRuleBackend {
    pub fn new(
        endpoint: Option<String>,
        token: String,
        subscription_id: String,
        location: String,
        data_source_id: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string()),
            token,
            subscription_id,
            location,
            data_source_id,
        })
    }

    fn rule_url(&self, resource_group: &str, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| AlertBackendError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| AlertBackendError::InvalidUrl(self.endpoint.clone()))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Insights",
                "scheduledQueryRules",
                name,
            ]);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    fn fallback_id(&self, resource_group: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.Insights/scheduledQueryRules/{name}",
            self.subscription_id
        )
    }

    /// Request body for creating the rule behind `spec`.
    pub fn rule_body(&self, spec: &AlertSpec, action_group: &str) -> Value {
        // Links the rule to the component in the portal.
        let mut tags = Map::new();
        tags.insert(
            format!("hidden-link:{}", self.data_source_id),
            Value::from("Resource"),
        );

        json!({
            "location": self.location,
            "tags": tags,
            "properties": {
                "displayName": spec.display_name,
                "description": spec.description,
                "enabled": "true",
                "source": {
                    "query": spec.query,
                    "dataSourceId": self.data_source_id,
                    "queryType": "ResultCount"
                },
                "schedule": {
                    "frequencyInMinutes": spec.frequency_minutes,
                    "timeWindowInMinutes": spec.window_minutes
                },
                "action": {
                    "odata.type": ALERTING_ACTION_ODATA_TYPE,
                    "severity": spec.severity.level().to_string(),
                    "aznsAction": {
                        "actionGroup": [action_group],
                        "emailSubject": spec.display_name
                    },
                    "trigger": {
                        "thresholdOperator": "GreaterThan",
                        "threshold": RULE_TRIGGER_THRESHOLD
                    }
                }
            }
        })
    }

    async fn error_for(resp: reqwest::Response, name: &str) -> AlertBackendError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AlertBackendError::Unauthorized {
                status: status.as_u16(),
                body,
            },
            StatusCode::CONFLICT => AlertBackendError::Conflict(name.to_string()),
            _ => AlertBackendError::Http {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
impl AlertBackend for ScheduledQueryRuleBackend {
    fn name(&self) -> &str {
        "azure-monitor"
    }

    async fn find_rule(&self, name: &str, resource_group: &str) -> Result<Option<RuleHandle>> {
        let url = self.rule_url(resource_group, name)?;
        tracing::debug!(rule = name, resource_group, "Looking up alert rule");

        let resp = self.client.get(url).bearer_auth(&self.token).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::error_for(resp, name).await);
        }

        let resource: RuleResource = resp.json().await?;
        Ok(Some(RuleHandle {
            id: resource
                .id
                .unwrap_or_else(|| self.fallback_id(resource_group, name)),
            name: resource.name.unwrap_or_else(|| name.to_string()),
        }))
    }

    async fn create_rule(
        &self,
        spec: &AlertSpec,
        resource_group: &str,
        action_group: &str,
    ) -> Result<RuleHandle> {
        let url = self.rule_url(resource_group, &spec.name)?;
        let body = self.rule_body(spec, action_group);

        tracing::debug!(
            rule = %spec.name,
            resource_group,
            severity = spec.severity.level(),
            "Creating alert rule"
        );

        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp, &spec.name).await);
        }

        let text = resp.text().await?;
        let resource: RuleResource = if text.trim().is_empty() {
            RuleResource { id: None, name: None }
        } else {
            serde_json::from_str(&text)?
        };
        Ok(RuleHandle {
            id: resource
                .id
                .unwrap_or_else(|| self.fallback_id(resource_group, &spec.name)),
            name: resource.name.unwrap_or_else(|| spec.name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertCategory;
    use apmon_common::types::Severity;

    fn backend() -> ScheduledQueryRuleBackend {
        ScheduledQueryRuleBackend::new(
            None,
            "token".into(),
            "sub-1".into(),
            "westeurope".into(),
            app_insights_resource_id("sub-1", "rg-app", "shop-api"),
            5,
        )
        .unwrap()
    }

    fn spec() -> AlertSpec {
        AlertSpec::new(
            "shop api",
            AlertCategory::SlowRequests,
            Severity::Warning,
            "slow".into(),
            "requests | where duration > 8000".into(),
            10.0,
        )
    }

    #[test]
    fn rule_url_encodes_name_and_sets_api_version() {
        let url = backend().rule_url("rg-alerts", "shop api-slow-requests").unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg-alerts/providers/Microsoft.Insights/scheduledQueryRules/shop%20api-slow-requests?api-version=2018-04-16"
        );
    }

    #[test]
    fn rule_body_fires_on_any_row_every_24_hours() {
        let body = backend().rule_body(&spec(), "/subscriptions/sub-1/actionGroups/oncall");
        let props = &body["properties"];
        assert_eq!(props["schedule"]["frequencyInMinutes"], 1440);
        assert_eq!(props["schedule"]["timeWindowInMinutes"], 1440);
        assert_eq!(props["action"]["trigger"]["thresholdOperator"], "GreaterThan");
        assert_eq!(props["action"]["trigger"]["threshold"], 0.0);
        assert_eq!(props["action"]["severity"], "2");
        assert_eq!(props["source"]["queryType"], "ResultCount");
        assert_eq!(
            props["action"]["aznsAction"]["actionGroup"][0],
            "/subscriptions/sub-1/actionGroups/oncall"
        );
        assert_eq!(
            body["tags"]["hidden-link:/subscriptions/sub-1/resourceGroups/rg-app/providers/microsoft.insights/components/shop-api"],
            "Resource"
        );
    }
}

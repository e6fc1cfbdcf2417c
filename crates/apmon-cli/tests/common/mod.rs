#![allow(dead_code)]

use apmon_ai::error::{Result as SummarizerResult, SummarizerError};
use apmon_ai::NarrativeSummarizer;
use apmon_alert::error::Result as AlertResult;
use apmon_alert::{AlertBackend, AlertSpec, RuleHandle};
use apmon_cli::config::AppConfig;
use apmon_telemetry::error::{Result as TelemetryResult, TelemetryError};
use apmon_telemetry::{QueryTable, TelemetrySource};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CONFIG: &str = r#"
[telemetry]
app_id = "app-123"

[target]
application = "shop-api"
resource_group = "rg-shop"
subscription_id = "sub-1"

[alerting]
resource_group = "rg-alerts"
action_group_id = "/subscriptions/sub-1/resourceGroups/rg-ops/providers/microsoft.insights/actionGroups/oncall"

[openai]
endpoint = "https://shop-ai.openai.azure.com"
deployment = "gpt-4o"
api_key = "key"
max_tokens = 400

[auth]
telemetry_token = "tele"
management_token = "mgmt"
"#;

pub fn test_config() -> AppConfig {
    toml::from_str(CONFIG).expect("test config parses")
}

const TS: &str = "2026-10-10T09:00:00Z";

fn table(columns: &[&str], rows: Vec<Value>) -> QueryTable {
    let columns: Vec<Value> = columns.iter().map(|c| json!({ "name": c })).collect();
    serde_json::from_value(json!({ "name": "PrimaryResult", "columns": columns, "rows": rows }))
        .expect("valid table")
}

/// Rows per collection served by [`FakeTelemetry`].
#[derive(Clone, Default)]
pub struct TelemetryFixture {
    pub slow_successful_requests: usize,
    pub exception_types: Vec<&'static str>,
    pub dependencies: usize,
    pub failed_dependencies: usize,
    pub slow_requests: usize,
}

impl TelemetryFixture {
    /// Warrants response-time, critical-exception, dependency and slow-request rules.
    pub fn troubled() -> Self {
        Self {
            slow_successful_requests: 10,
            exception_types: vec!["System.TimeoutException", "System.ArgumentException"],
            dependencies: 100,
            failed_dependencies: 6,
            slow_requests: 21,
        }
    }
}

/// Serves fixture tables by query shape. Kinds listed in `failing` return
/// an HTTP error; `reject_all` answers every query with 401.
#[derive(Default)]
pub struct FakeTelemetry {
    pub fixture: TelemetryFixture,
    pub failing: Vec<&'static str>,
    pub reject_all: bool,
    pub queries: Mutex<Vec<String>>,
}

impl FakeTelemetry {
    pub fn new(fixture: TelemetryFixture) -> Self {
        Self {
            fixture,
            ..Default::default()
        }
    }

    fn shape(query: &str) -> &'static str {
        if query.starts_with("exceptions") {
            "exceptions"
        } else if query.starts_with("dependencies") {
            "dependencies"
        } else if query.contains("where duration") {
            "slow_requests"
        } else {
            "requests"
        }
    }
}

#[async_trait]
impl TelemetrySource for FakeTelemetry {
    fn name(&self) -> &str {
        "fake"
    }

    async fn query(&self, query: &str, _window: chrono::Duration) -> TelemetryResult<QueryTable> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.reject_all {
            return Err(TelemetryError::Unauthorized { status: 401 });
        }
        let shape = Self::shape(query);
        if self.failing.contains(&shape) {
            return Err(TelemetryError::Http {
                status: 502,
                body: format!("{shape} backend unavailable"),
            });
        }

        let f = &self.fixture;
        Ok(match shape {
            "requests" => table(
                &["timestamp", "name", "url", "duration", "success", "resultCode"],
                (0..f.slow_successful_requests)
                    .map(|i| json!([TS, format!("GET /report/{i}"), "https://shop/report", 6000.0, true, "200"]))
                    .collect(),
            ),
            "exceptions" => table(
                &["timestamp", "type", "outerMessage", "operation_Name"],
                f.exception_types
                    .iter()
                    .map(|t| json!([TS, t, "boom", "GET /report"]))
                    .collect(),
            ),
            "dependencies" => table(
                &["timestamp", "name", "target", "type", "duration", "success", "resultCode"],
                (0..f.dependencies)
                    .map(|i| {
                        let ok = i >= f.failed_dependencies;
                        let code = if ok { "200" } else { "503" };
                        json!([TS, "GET /stock", "inventory", "HTTP", 40.0, ok, code])
                    })
                    .collect(),
            ),
            _ => table(
                &["timestamp", "name", "url", "duration", "resultCode"],
                (0..f.slow_requests)
                    .map(|_| json!([TS, "GET /export", "https://shop/export", 9100.0, "200"]))
                    .collect(),
            ),
        })
    }
}

#[derive(Default)]
pub struct AlertState {
    pub rules: Mutex<HashMap<(String, String), RuleHandle>>,
    pub creates: Mutex<Vec<String>>,
}

/// Alert backend whose rules survive across pipelines sharing the same state.
#[derive(Clone, Default)]
pub struct MemoryAlerts {
    pub state: Arc<AlertState>,
}

impl MemoryAlerts {
    pub fn create_count(&self) -> usize {
        self.state.creates.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertBackend for MemoryAlerts {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_rule(&self, name: &str, resource_group: &str) -> AlertResult<Option<RuleHandle>> {
        let rules = self.state.rules.lock().unwrap();
        Ok(rules
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_rule(
        &self,
        spec: &AlertSpec,
        resource_group: &str,
        _action_group: &str,
    ) -> AlertResult<RuleHandle> {
        self.state.creates.lock().unwrap().push(spec.name.clone());
        let handle = RuleHandle {
            id: format!("/rg/{resource_group}/rules/{}", spec.name),
            name: spec.name.clone(),
        };
        self.state
            .rules
            .lock()
            .unwrap()
            .insert((resource_group.to_string(), spec.name.clone()), handle.clone());
        Ok(handle)
    }
}

/// Echoes a fixed answer, or fails every call when `down` is set.
#[derive(Default)]
pub struct FakeSummarizer {
    pub down: bool,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl NarrativeSummarizer for FakeSummarizer {
    fn provider(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }

    async fn summarize(&self, _prompt: &str, _role: &str, max_tokens: usize) -> SummarizerResult<String> {
        *self.calls.lock().unwrap() += 1;
        if self.down {
            return Err(SummarizerError::Http {
                status: 401,
                body: "invalid api key".into(),
            });
        }
        Ok(format!("**Stable** overall (max {max_tokens} tokens)."))
    }
}

use crate::error::AlertBackendError;
use crate::{AlertBackend, AlertSpec};
use serde::{Deserialize, Serialize};

/// Terminal state of one spec within a run.
///
/// `NotChecked -> Exists (AlreadyExists) | Absent -> Created | Failed`.
/// No state is ever retried within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Created,
    AlreadyExists,
    Failed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertOutcome {
    pub spec: AlertSpec,
    pub status: AlertStatus,
    /// Backend resource id when the rule exists after this run.
    pub rule_id: Option<String>,
    pub error: Option<String>,
}

/// Outcomes partitioned into three disjoint, ordered buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub created: Vec<AlertOutcome>,
    pub skipped: Vec<AlertOutcome>,
    pub failed: Vec<AlertOutcome>,
}

impl ProvisionReport {
    pub fn record(&mut self, outcome: AlertOutcome) {
        match outcome.status {
            AlertStatus::Created => self.created.push(outcome),
            AlertStatus::AlreadyExists => self.skipped.push(outcome),
            AlertStatus::Failed => self.failed.push(outcome),
        }
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Created, then skipped, then failed.
    pub fn outcomes(&self) -> impl Iterator<Item = &AlertOutcome> {
        self.created
            .iter()
            .chain(self.skipped.iter())
            .chain(self.failed.iter())
    }
}

/// Ensures each spec exists exactly once in the backend.
pub struct Provisioner<'a> {
    backend: &'a dyn AlertBackend,
    resource_group: String,
    action_group: String,
}

impl<'a> Provisioner<'a> {
    pub fn new(backend: &'a dyn AlertBackend, resource_group: &str, action_group: &str) -> Self {
        Self {
            backend,
            resource_group: resource_group.to_string(),
            action_group: action_group.to_string(),
        }
    }

    /// Provisions `specs` in order. Never fails: every error is captured in
    /// the corresponding outcome and the batch continues.
    pub async fn provision(&self, specs: &[AlertSpec]) -> ProvisionReport {
        let mut report = ProvisionReport::default();
        for spec in specs {
            let outcome = self.provision_one(spec).await;
            report.record(outcome);
        }

        tracing::info!(
            backend = %self.backend.name(),
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            total = report.total(),
            "Alert provisioning finished"
        );
        report
    }

    async fn provision_one(&self, spec: &AlertSpec) -> AlertOutcome {
        let existing = match self.backend.find_rule(&spec.name, &self.resource_group).await {
            Ok(existing) => existing,
            Err(e) => {
                // Creating without a successful check could duplicate the rule.
                tracing::error!(rule = %spec.name, error = %e, "Alert existence check failed");
                return failed(spec, format!("existence check failed: {e}"));
            }
        };

        if let Some(handle) = existing {
            tracing::info!(rule = %spec.name, rule_id = %handle.id, "Alert rule already exists, skipping");
            return AlertOutcome {
                spec: spec.clone(),
                status: AlertStatus::AlreadyExists,
                rule_id: Some(handle.id),
                error: None,
            };
        }

        match self
            .backend
            .create_rule(spec, &self.resource_group, &self.action_group)
            .await
        {
            Ok(handle) => {
                tracing::info!(rule = %spec.name, rule_id = %handle.id, "Alert rule created");
                AlertOutcome {
                    spec: spec.clone(),
                    status: AlertStatus::Created,
                    rule_id: Some(handle.id),
                    error: None,
                }
            }
            Err(e @ AlertBackendError::Conflict(_)) => {
                tracing::warn!(
                    rule = %spec.name,
                    error = %e,
                    "Alert rule was created concurrently by another writer"
                );
                failed(spec, e.to_string())
            }
            Err(e) => {
                tracing::error!(rule = %spec.name, error = %e, "Failed to create alert rule");
                failed(spec, e.to_string())
            }
        }
    }
}

fn failed(spec: &AlertSpec, error: String) -> AlertOutcome {
    AlertOutcome {
        spec: spec.clone(),
        status: AlertStatus::Failed,
        rule_id: None,
        error: Some(error),
    }
}

/// Errors returned by an [`crate::AlertBackend`].
///
/// # Examples
///
/// ```rust
/// use apmon_alert::error::AlertBackendError;
///
/// let err = AlertBackendError::Conflict("shop-api-slow-requests".to_string());
/// assert!(err.to_string().contains("already exists"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertBackendError {
    /// The backend rejected the credentials or the caller lacks permission.
    #[error("alerting backend denied access: status={status}, body={body}")]
    Unauthorized { status: u16, body: String },

    /// A concurrent writer created the rule between our check and create.
    #[error("alert rule '{0}' already exists (conflict)")]
    Conflict(String),

    /// Any other non-2xx response (validation, quota, throttling).
    #[error("alerting backend HTTP error: status={status}, body={body}")]
    Http { status: u16, body: String },

    #[error("alerting backend network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("alerting backend JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid alerting backend URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, AlertBackendError>;

/// Errors raised while querying the telemetry backend.
///
/// # Examples
///
/// ```rust
/// use apmon_telemetry::error::TelemetryError;
///
/// let err = TelemetryError::Decode("missing column 'timestamp'".to_string());
/// assert!(err.to_string().contains("timestamp"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The backend rejected the bearer token (401/403).
    #[error("telemetry backend rejected credentials: status={status}")]
    Unauthorized { status: u16 },

    /// Non-2xx response other than an auth failure.
    #[error("telemetry query HTTP error: status={status}, body={body}")]
    Http { status: u16, body: String },

    /// Transport-level failure from `reqwest`.
    #[error("telemetry network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("telemetry JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response parsed as JSON but did not have the expected table shape.
    #[error("telemetry decode error: {0}")]
    Decode(String),
}

impl TelemetryError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

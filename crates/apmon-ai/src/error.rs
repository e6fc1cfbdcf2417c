use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("chat completion API error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty response from chat completion API")]
    EmptyResponse,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SummarizerError>;

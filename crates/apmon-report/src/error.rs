use std::path::PathBuf;

/// Errors raised while rendering or persisting the report. All are fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The template references a placeholder the view does not provide.
    #[error("Report: unknown template placeholder '{0}'")]
    Template(String),

    #[error("Report: failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;

use crate::error::{ReportError, Result};
use std::path::Path;

/// Writes `html` to `path`, creating missing parent directories.
pub fn write_report(path: &Path, html: &str) -> Result<()> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, html).map_err(io_err)?;

    tracing::info!(path = %path.display(), bytes = html.len(), "Report written");
    Ok(())
}

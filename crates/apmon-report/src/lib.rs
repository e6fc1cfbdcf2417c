//! Static HTML report for one monitoring run.
//!
//! A [`RunResult`] is turned into a typed, pre-escaped [`ReportView`], which
//! [`ReportRenderer`] binds into the embedded template. The output is a single
//! self-contained document with inline styles.

pub mod error;
pub mod output;
pub mod renderer;
pub mod run;
pub mod view;


pub use output::write_report;
pub use renderer::ReportRenderer;
pub use run::{Provisioning, RunResult};
pub use view::ReportView;

/// Raw-data rows shown per table unless configured otherwise.
pub const DEFAULT_DISPLAY_ROWS: usize = 20;

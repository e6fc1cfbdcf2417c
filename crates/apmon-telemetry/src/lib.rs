//! Telemetry query client.
//!
//! A [`TelemetrySource`] executes one read query over a lookback window and
//! returns the primary result table. [`collector::TelemetryCollector`] runs the
//! four query shapes from [`query::QueryCatalog`] in sequence and decodes each
//! table into typed rows.

pub mod appinsights;
pub mod collector;
pub mod decode;
pub mod error;
pub mod query;
pub mod table;

use async_trait::async_trait;
use chrono::Duration;

pub use appinsights::AppInsightsClient;
pub use collector::{CollectionReport, TelemetryCollector};
pub use table::QueryTable;

/// A read-only telemetry store scoped to one application.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Backend name used in log fields (e.g. `"appinsights"`).
    fn name(&self) -> &str;

    /// Executes `query` over the trailing `window`.
    async fn query(&self, query: &str, window: Duration) -> error::Result<QueryTable>;
}

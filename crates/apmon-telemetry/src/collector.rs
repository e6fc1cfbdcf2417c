use crate::decode::{self, Decoded};
use crate::error::Result;
use crate::query::QueryCatalog;
use crate::{QueryTable, TelemetrySource};
use apmon_common::types::{
    DependencyRow, ExceptionRow, PerformanceRow, SlowRequestRow, TelemetryKind, TelemetryRow,
    TelemetrySnapshot,
};

/// Outcome of one collection pass: the snapshot plus per-kind failures.
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub snapshot: TelemetrySnapshot,
    /// Kinds whose query failed and were replaced by an empty collection.
    pub failures: Vec<(TelemetryKind, String)>,
    /// How many of `failures` were authentication or authorization rejections.
    pub unauthorized: usize,
}

impl CollectionReport {
    /// Every query was rejected by the backend's auth layer.
    pub fn is_unauthorized(&self) -> bool {
        self.unauthorized == TelemetryKind::ALL.len()
    }
}

/// Runs the catalog's queries one after another against a single source.
pub struct TelemetryCollector<'a> {
    source: &'a dyn TelemetrySource,
    catalog: QueryCatalog,
}

impl<'a> TelemetryCollector<'a> {
    pub fn new(source: &'a dyn TelemetrySource, catalog: QueryCatalog) -> Self {
        Self { source, catalog }
    }

    async fn fetch(&self, kind: TelemetryKind) -> Result<QueryTable> {
        let query = self.catalog.query(kind);
        self.source.query(&query, self.catalog.window).await
    }

    pub async fn requests(&self) -> Result<Decoded<PerformanceRow>> {
        decode::requests(&self.fetch(TelemetryKind::Requests).await?)
    }

    pub async fn exceptions(&self) -> Result<Decoded<ExceptionRow>> {
        decode::exceptions(&self.fetch(TelemetryKind::Exceptions).await?)
    }

    pub async fn dependencies(&self) -> Result<Decoded<DependencyRow>> {
        decode::dependencies(&self.fetch(TelemetryKind::Dependencies).await?)
    }

    pub async fn slow_requests(&self) -> Result<Decoded<SlowRequestRow>> {
        decode::slow_requests(&self.fetch(TelemetryKind::SlowRequests).await?)
    }

    /// One collection, decoded into tagged rows.
    pub async fn rows(&self, kind: TelemetryKind) -> Result<Decoded<TelemetryRow>> {
        Ok(match kind {
            TelemetryKind::Requests => self.requests().await?.map(TelemetryRow::Performance),
            TelemetryKind::Exceptions => self.exceptions().await?.map(TelemetryRow::Exception),
            TelemetryKind::Dependencies => {
                self.dependencies().await?.map(TelemetryRow::Dependency)
            }
            TelemetryKind::SlowRequests => {
                self.slow_requests().await?.map(TelemetryRow::SlowRequest)
            }
        })
    }

    /// Fetches all four collections in [`TelemetryKind::ALL`] order. A failing
    /// kind degrades to an empty collection and is recorded in
    /// [`CollectionReport::failures`].
    pub async fn collect(&self) -> CollectionReport {
        let mut report = CollectionReport::default();
        for kind in TelemetryKind::ALL {
            let result = self.rows(kind).await;
            for row in settle(kind, result, &mut report) {
                report.snapshot.push(row);
            }
        }
        report
    }
}

fn settle(
    kind: TelemetryKind,
    result: Result<Decoded<TelemetryRow>>,
    report: &mut CollectionReport,
) -> Vec<TelemetryRow> {
    match result {
        Ok(decoded) => {
            tracing::info!(
                kind = %kind,
                rows = decoded.rows.len(),
                skipped = decoded.skipped,
                "Telemetry collected"
            );
            decoded.rows
        }
        Err(e) => {
            tracing::warn!(kind = %kind, error = %e, "Telemetry query failed, continuing with no rows");
            if e.is_auth() {
                report.unauthorized += 1;
            }
            report.failures.push((kind, e.to_string()));
            Vec::new()
        }
    }
}

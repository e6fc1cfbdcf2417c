//! Typed decoding of query tables into telemetry rows.
//!
//! Columns are located by name once per table. A row whose required cells are
//! missing or mistyped is skipped and counted, never fatal.

use crate::error::Result;
use crate::table::{as_bool, as_f64, as_text, as_timestamp, cell, QueryTable};
use apmon_common::types::{DependencyRow, ExceptionRow, PerformanceRow, SlowRequestRow};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> Decoded<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Decoded<U> {
        Decoded {
            rows: self.rows.into_iter().map(f).collect(),
            skipped: self.skipped,
        }
    }
}

fn decode_rows<T, F>(table: &QueryTable, mut f: F) -> Decoded<T>
where
    F: FnMut(&[Value]) -> Option<T>,
{
    let mut rows = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for raw in &table.rows {
        match f(raw) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(table = %table.name, skipped, "Skipped undecodable telemetry rows");
    }
    Decoded { rows, skipped }
}

pub fn requests(table: &QueryTable) -> Result<Decoded<PerformanceRow>> {
    let [ts, name, url, duration, success, code] =
        table.require_columns(["timestamp", "name", "url", "duration", "success", "resultCode"])?;
    Ok(decode_rows(table, |r| {
        Some(PerformanceRow {
            timestamp: as_timestamp(cell(r, ts))?,
            name: as_text(cell(r, name)),
            url: as_text(cell(r, url)),
            duration_ms: as_f64(cell(r, duration))?,
            success: as_bool(cell(r, success))?,
            result_code: as_text(cell(r, code)),
        })
    }))
}

pub fn exceptions(table: &QueryTable) -> Result<Decoded<ExceptionRow>> {
    let [ts, ty, message, operation] =
        table.require_columns(["timestamp", "type", "outerMessage", "operation_Name"])?;
    Ok(decode_rows(table, |r| {
        let exception_type = as_text(cell(r, ty));
        if exception_type.is_empty() {
            return None;
        }
        Some(ExceptionRow {
            timestamp: as_timestamp(cell(r, ts))?,
            exception_type,
            message: as_text(cell(r, message)),
            operation_name: as_text(cell(r, operation)),
        })
    }))
}

pub fn dependencies(table: &QueryTable) -> Result<Decoded<DependencyRow>> {
    let [ts, name, target, ty, duration, success, code] = table.require_columns([
        "timestamp",
        "name",
        "target",
        "type",
        "duration",
        "success",
        "resultCode",
    ])?;
    Ok(decode_rows(table, |r| {
        Some(DependencyRow {
            timestamp: as_timestamp(cell(r, ts))?,
            name: as_text(cell(r, name)),
            target: as_text(cell(r, target)),
            dependency_type: as_text(cell(r, ty)),
            duration_ms: as_f64(cell(r, duration))?,
            success: as_bool(cell(r, success))?,
            result_code: as_text(cell(r, code)),
        })
    }))
}

pub fn slow_requests(table: &QueryTable) -> Result<Decoded<SlowRequestRow>> {
    let [ts, name, url, duration, code] =
        table.require_columns(["timestamp", "name", "url", "duration", "resultCode"])?;
    Ok(decode_rows(table, |r| {
        Some(SlowRequestRow {
            timestamp: as_timestamp(cell(r, ts))?,
            name: as_text(cell(r, name)),
            url: as_text(cell(r, url)),
            duration_ms: as_f64(cell(r, duration))?,
            result_code: as_text(cell(r, code)),
        })
    }))
}

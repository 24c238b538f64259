// SPDX-License-Identifier: Apache-2.0

//! Result export
//!
//! Exports work on a result already in memory: the rows the grid or the
//! SQL studio is showing.

pub mod csv;
pub mod json;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use vitalake_core::{Column, EngineError, EngineResult, QueryResult, Row};

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    #[serde(default = "default_true")]
    pub include_headers: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            include_headers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub rows_exported: u64,
    pub bytes_written: u64,
}

pub trait ExportWriter {
    fn write_header(&mut self, columns: &[Column]) -> EngineResult<()>;
    fn write_row(&mut self, columns: &[Column], row: &Row) -> EngineResult<()>;
    fn finish(self: Box<Self>) -> EngineResult<Vec<u8>>;
}

fn create_writer(options: &ExportOptions) -> Box<dyn ExportWriter> {
    match options.format {
        ExportFormat::Csv => Box::new(CsvWriter::new(options.include_headers)),
        ExportFormat::Json => Box::new(JsonWriter::new()),
    }
}

/// Renders `result` in the requested format.
pub fn export_bytes(result: &QueryResult, options: &ExportOptions) -> EngineResult<Vec<u8>> {
    let mut writer = create_writer(options);
    writer.write_header(&result.columns)?;
    for row in &result.rows {
        writer.write_row(&result.columns, row)?;
    }
    writer.finish()
}

pub fn export_string(result: &QueryResult, options: &ExportOptions) -> EngineResult<String> {
    String::from_utf8(export_bytes(result, options)?)
        .map_err(|e| EngineError::internal(format!("Export produced invalid UTF-8: {}", e)))
}

/// Writes `result` to `path`, replacing any existing file.
pub async fn export_to_file(
    result: &QueryResult,
    path: &Path,
    options: &ExportOptions,
) -> EngineResult<ExportSummary> {
    let bytes = export_bytes(result, options)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| EngineError::internal(format!("Failed to write export file: {}", e)))?;

    let summary = ExportSummary {
        rows_exported: result.rows.len() as u64,
        bytes_written: bytes.len() as u64,
    };
    info!(
        format = options.format.extension(),
        rows = summary.rows_exported,
        bytes = summary.bytes_written,
        "Export completed"
    );
    Ok(summary)
}

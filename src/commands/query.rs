// SPDX-License-Identifier: Apache-2.0

//! Query Commands
//!
//! Ad-hoc SQL from the SQL studio, its history, and export of results.

use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument, warn};
use vitalake_core::{EngineError, QueryResult};

use crate::commands::CommandResponse;
use crate::export::{export_string, export_to_file, ExportOptions, ExportSummary};
use crate::metrics::{self, QueryMetricsSnapshot};
use crate::AppState;

/// Runs `sql` on the connection's session. Successful statements are added
/// to the query history.
#[instrument(
    skip(state, sql),
    fields(connection_id = ?connection_id, query_len = sql.len())
)]
pub async fn execute_query(
    state: &AppState,
    connection_id: Option<&str>,
    sql: &str,
) -> CommandResponse<QueryResult> {
    if sql.trim().is_empty() {
        return CommandResponse::failed(&EngineError::validation("Invalid query parameter"));
    }

    let started = Instant::now();
    let outcome = match state.session_for(connection_id).await {
        Ok(session) => state.session_manager.execute(session, sql).await,
        Err(e) => Err(e),
    };
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::record_query(duration_ms, outcome.is_ok());

    match outcome {
        Ok(result) => {
            info!(duration_ms, rows = result.row_count(), "Query executed");
            if let Err(e) = state.preferences.push_history(sql) {
                warn!(error = %e, "Failed to record query history");
            }
            CommandResponse::ok(result.with_execution_time(duration_ms))
        }
        Err(e) => {
            warn!(duration_ms, error = %e, "Query failed");
            CommandResponse::failed(&e)
        }
    }
}

/// Recent queries, newest first
pub fn query_history(state: &AppState) -> CommandResponse<Vec<String>> {
    state.preferences.query_history().into()
}

/// Renders a result as CSV or JSON text
pub fn export_result(result: &QueryResult, options: &ExportOptions) -> CommandResponse<String> {
    export_string(result, options).into()
}

pub async fn export_result_to_file(
    result: &QueryResult,
    path: &Path,
    options: &ExportOptions,
) -> CommandResponse<ExportSummary> {
    export_to_file(result, path, options).await.into()
}

pub fn query_metrics() -> CommandResponse<QueryMetricsSnapshot> {
    CommandResponse::ok(metrics::snapshot())
}

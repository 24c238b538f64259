// SPDX-License-Identifier: Apache-2.0

//! Schema Commands
//!
//! Catalog browsing and the distinct-value lists behind the filter popover.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use vitalake_core::{EngineResult, QueryResult};
use vitalake_query::{
    build_distinct_query, build_null_count_query, QueryError, TableRef, MAX_DISTINCT_LIMIT,
};

use crate::commands::CommandResponse;
use crate::coordinator::parse_count_column;
use crate::debounce::Debouncer;
use crate::engine::{Column, TableInfo};
use crate::grid::DistinctValues;
use crate::AppState;

pub async fn list_databases(
    state: &AppState,
    connection_id: Option<&str>,
) -> CommandResponse<Vec<String>> {
    async {
        let session = state.session_for(connection_id).await?;
        state.session_manager.list_databases(session).await
    }
    .await
    .into()
}

pub async fn list_schemas(
    state: &AppState,
    connection_id: Option<&str>,
) -> CommandResponse<Vec<String>> {
    async {
        let session = state.session_for(connection_id).await?;
        state.session_manager.list_schemas(session).await
    }
    .await
    .into()
}

pub async fn list_tables(
    state: &AppState,
    connection_id: Option<&str>,
    schema: &str,
) -> CommandResponse<Vec<TableInfo>> {
    async {
        let session = state.session_for(connection_id).await?;
        state.session_manager.list_tables(session, schema).await
    }
    .await
    .into()
}

pub async fn list_columns(
    state: &AppState,
    connection_id: Option<&str>,
    schema: &str,
    table: &str,
) -> CommandResponse<Vec<Column>> {
    async {
        let table = TableRef::new(schema, table)?;
        let session = state.session_for(connection_id).await?;
        state.session_manager.list_columns(session, &table).await
    }
    .await
    .into()
}

/// Most frequent values of a column, plus a NULL entry when the column has
/// NULLs. Failures degrade to an empty list so the popover keeps working.
#[instrument(skip(state, search), fields(table = %table, column = %column))]
pub async fn distinct_values(
    state: &AppState,
    connection_id: Option<&str>,
    table: &TableRef,
    column: &str,
    limit: Option<u32>,
    search: Option<&str>,
) -> CommandResponse<DistinctValues> {
    let limit = limit
        .unwrap_or(state.config.distinct_limit)
        .clamp(1, MAX_DISTINCT_LIMIT);

    match fetch_distinct(state, connection_id, table, column, limit, search).await {
        Ok(values) => CommandResponse::ok(values),
        Err(e) => {
            warn!(error = %e, "Distinct values unavailable");
            CommandResponse::ok(DistinctValues::empty(column))
        }
    }
}

async fn fetch_distinct(
    state: &AppState,
    connection_id: Option<&str>,
    table: &TableRef,
    column: &str,
    limit: u32,
    search: Option<&str>,
) -> EngineResult<DistinctValues> {
    let session = state.session_for(connection_id).await?;
    let columns = state.session_manager.list_columns(session, table).await?;
    if !columns.iter().any(|c| c.name == column) {
        return Err(QueryError::UnknownColumn(column.to_string()).into());
    }
    let query = build_distinct_query(table, column, limit, search)?;
    let values: QueryResult = state.session_manager.execute_bound(session, &query).await?;

    let term = search.map(str::trim).filter(|s| !s.is_empty());
    let wants_null = term.map_or(true, |s| s.to_lowercase().contains("null"));
    let null_count = if wants_null {
        let query = build_null_count_query(table, column)?;
        let result = state.session_manager.execute_bound(session, &query).await?;
        Some(parse_count_column(&result, "count")?)
    } else {
        None
    };

    Ok(DistinctValues::from_rows(
        column, &values, null_count, limit, term,
    ))
}

/// Search-as-you-type over a column's distinct values.
///
/// Keystrokes are debounced; a response is published only if no newer
/// search was started while it was in flight.
pub struct DistinctSearch {
    debouncer: Debouncer<(u64, String)>,
    sequence: Arc<AtomicU64>,
    results: watch::Receiver<Option<DistinctValues>>,
}

impl DistinctSearch {
    pub fn new(
        state: Arc<AppState>,
        connection_id: Option<String>,
        table: TableRef,
        column: String,
    ) -> Self {
        let (publish, results) = watch::channel(None);
        let publish = Arc::new(publish);
        let sequence = Arc::new(AtomicU64::new(0));
        let delay = state.config.search_debounce;

        let latest = Arc::clone(&sequence);
        let debouncer = Debouncer::new(delay, move |(seq, term): (u64, String)| {
            let state = Arc::clone(&state);
            let connection_id = connection_id.clone();
            let table = table.clone();
            let column = column.clone();
            let latest = Arc::clone(&latest);
            let publish = Arc::clone(&publish);
            async move {
                let search = Some(term.as_str()).filter(|t| !t.trim().is_empty());
                let response = distinct_values(
                    &state,
                    connection_id.as_deref(),
                    &table,
                    &column,
                    None,
                    search,
                )
                .await;

                if latest.load(Ordering::SeqCst) != seq {
                    debug!(seq, "Discarding superseded distinct-value search");
                    return;
                }
                let values = response
                    .into_result()
                    .unwrap_or_else(|| DistinctValues::empty(column.as_str()));
                let _ = publish.send(Some(values));
            }
        });

        Self {
            debouncer,
            sequence,
            results,
        }
    }

    /// Records a keystroke; the search runs once typing pauses.
    pub fn input(&self, term: impl Into<String>) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.debouncer.trigger((seq, term.into()));
    }

    pub fn results(&self) -> watch::Receiver<Option<DistinctValues>> {
        self.results.clone()
    }

    pub fn latest(&self) -> Option<DistinctValues> {
        self.results.borrow().clone()
    }
}

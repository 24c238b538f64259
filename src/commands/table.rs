// SPDX-License-Identifier: Apache-2.0

//! Table Commands
//!
//! Opening a table view, rendering its current page as a grid, and the
//! per-table column widths the grid remembers.

use tracing::{instrument, warn};
use vitalake_core::{CellValue, EngineResult};
use vitalake_query::TableRef;

use crate::commands::CommandResponse;
use crate::grid::{CellClickTracker, GridModel, SavedWidths, WidthMode};
use crate::table_session::TableSession;
use crate::AppState;

/// Widths are stored per connection; the fallback connection uses this key.
const FALLBACK_WIDTHS_KEY: &str = "__env__";

fn widths_owner(connection_id: Option<&str>) -> &str {
    connection_id
        .filter(|id| !id.is_empty())
        .unwrap_or(FALLBACK_WIDTHS_KEY)
}

/// Starts a table view on the connection's session and waits for its first
/// page and count requests to be issued.
#[instrument(skip(state), fields(connection_id = ?connection_id))]
pub async fn open_table(
    state: &AppState,
    connection_id: Option<&str>,
    schema: &str,
    table: &str,
) -> EngineResult<TableSession> {
    let table = TableRef::new(schema, table)?;
    let session = state.session_for(connection_id).await?;
    TableSession::open(
        std::sync::Arc::clone(&state.session_manager),
        session,
        table,
        state.config.default_page_size,
        state.config.max_page_size,
    )
    .await
}

/// Grid for the page a table view currently shows, using the widths saved
/// for that table when there are any.
pub fn table_grid(
    state: &AppState,
    connection_id: Option<&str>,
    session: &TableSession,
    mode: WidthMode,
) -> CommandResponse<Option<GridModel>> {
    let snapshot = session.snapshot();
    let saved = match state.preferences.table_widths(
        widths_owner(connection_id),
        &snapshot.table.schema,
        &snapshot.table.table,
    ) {
        Ok(saved) => saved,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable column widths");
            None
        }
    };
    CommandResponse::ok(GridModel::from_snapshot(&snapshot, mode, saved.as_ref()))
}

pub fn save_column_widths(
    state: &AppState,
    connection_id: Option<&str>,
    table: &TableRef,
    widths: &SavedWidths,
) -> CommandResponse<()> {
    state
        .preferences
        .save_table_widths(
            widths_owner(connection_id),
            &table.schema,
            &table.table,
            widths,
        )
        .into()
}

/// Toggles the equality filter for a clicked cell inside the table view,
/// then moves the highlight to match the filters it applied.
pub async fn click_cell(
    session: &TableSession,
    tracker: &mut CellClickTracker,
    column: &str,
    value: &CellValue,
) -> CommandResponse<()> {
    let outcome = session.toggle_cell(column, value.clone()).await;
    if outcome.is_ok() {
        tracker.sync(column, value, &session.snapshot().filters);
    }
    outcome.into()
}

// SPDX-License-Identifier: Apache-2.0

//! Chart Commands
//!
//! Axis detection for a query result and the saved chart and dashboard
//! collections.

use tracing::{info, instrument};
use vitalake_core::{classify_all, select_axes, AxisDetection, QueryResult};

use crate::chart::{self as charts, Dashboard, SavedChart};
use crate::commands::CommandResponse;
use crate::AppState;

/// Classifies the result's columns and picks default chart axes.
pub fn detect_axes(result: &QueryResult) -> CommandResponse<AxisDetection> {
    let classified = classify_all(&result.columns, &result.rows);
    CommandResponse::ok(select_axes(&classified))
}

pub fn list_charts(state: &AppState) -> CommandResponse<Vec<SavedChart>> {
    charts::list_charts(&state.preferences).into()
}

#[instrument(skip(state, chart), fields(chart_id = %chart.id))]
pub fn save_chart(state: &AppState, chart: SavedChart) -> CommandResponse<SavedChart> {
    let saved = chart.clone();
    let outcome = charts::save_chart(&state.preferences, chart).map(|()| saved);
    if outcome.is_ok() {
        info!("Chart saved");
    }
    outcome.into()
}

pub fn list_dashboards(state: &AppState) -> CommandResponse<Vec<Dashboard>> {
    charts::list_dashboards(&state.preferences).into()
}

#[instrument(skip(state, dashboard), fields(dashboard_id = %dashboard.id))]
pub fn save_dashboard(state: &AppState, dashboard: Dashboard) -> CommandResponse<Dashboard> {
    let saved = dashboard.clone();
    charts::save_dashboard(&state.preferences, dashboard)
        .map(|()| saved)
        .into()
}

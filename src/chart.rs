// SPDX-License-Identifier: Apache-2.0

//! Chart builder state
//!
//! Axes are derived from each new result until the user picks them by hand.
//! From then on the pick is a plain preference and new results leave it
//! alone, unless it names columns the new result no longer has.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vitalake_core::axes::MAX_Y_AXES;
use vitalake_core::{
    classify_all, select_axes, AxisDetection, ChartAxisSelection, ClassifiedColumn, EngineError,
    EngineResult, QueryResult, Row,
};

use crate::storage::{PreferencesStore, DASHBOARDS_KEY, SAVED_CHARTS_KEY};

#[derive(Debug, Clone, Default)]
pub struct ChartAxesState {
    columns: Vec<ClassifiedColumn>,
    detection: Option<AxisDetection>,
    user_selection: Option<ChartAxisSelection>,
}

impl ChartAxesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-classifies the columns of a new result and re-derives the axes
    /// unless the user has chosen them.
    pub fn on_result(&mut self, result: &QueryResult) -> &ChartAxisSelection {
        self.columns = classify_all(&result.columns, &result.rows);
        let detection = select_axes(&self.columns);

        if let Some(user) = &self.user_selection {
            if !self.covers(user) {
                tracing::debug!("Dropping axis override that no longer matches the result");
                self.user_selection = None;
            }
        }
        self.detection = Some(detection);
        self.selection()
    }

    fn covers(&self, selection: &ChartAxisSelection) -> bool {
        let known = |name: &str| self.columns.iter().any(|c| c.name() == name);
        (selection.x_axis.is_empty() || known(&selection.x_axis))
            && selection.y_axis.iter().all(|y| known(y))
    }

    /// Pins the axes to a user choice.
    pub fn override_axes(&mut self, selection: ChartAxisSelection) -> EngineResult<()> {
        if selection.y_axis.len() > MAX_Y_AXES {
            return Err(EngineError::validation(format!(
                "At most {} Y-axis columns can be selected",
                MAX_Y_AXES
            )));
        }
        if !self.covers(&selection) {
            return Err(EngineError::validation(
                "Axis selection references an unknown column",
            ));
        }
        self.user_selection = Some(selection);
        Ok(())
    }

    /// Adds a Y column to the current selection, pinning it.
    pub fn add_y_axis(&mut self, column: &str) -> EngineResult<()> {
        let mut selection = self.selection().clone();
        if !selection.y_axis.iter().any(|y| y == column) {
            selection.y_axis.push(column.to_string());
        }
        self.override_axes(selection)
    }

    pub fn remove_y_axis(&mut self, column: &str) -> EngineResult<()> {
        let mut selection = self.selection().clone();
        selection.y_axis.retain(|y| y != column);
        self.override_axes(selection)
    }

    /// Returns to automatic selection.
    pub fn reset_to_auto(&mut self) -> &ChartAxisSelection {
        self.user_selection = None;
        self.selection()
    }

    pub fn is_overridden(&self) -> bool {
        self.user_selection.is_some()
    }

    pub fn selection(&self) -> &ChartAxisSelection {
        static EMPTY: ChartAxisSelection = ChartAxisSelection {
            x_axis: String::new(),
            y_axis: Vec::new(),
        };
        self.user_selection
            .as_ref()
            .or(self.detection.as_ref().map(|d| &d.selection))
            .unwrap_or(&EMPTY)
    }

    pub fn detection(&self) -> Option<&AxisDetection> {
        self.detection.as_ref()
    }

    pub fn columns(&self) -> &[ClassifiedColumn] {
        &self.columns
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    #[default]
    Bar,
    Area,
    Pie,
    Donut,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChart {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    pub data: Vec<Row>,
    pub config: ChartAxisSelection,
    pub created_at: DateTime<Utc>,
}

impl SavedChart {
    pub fn new(
        name: impl Into<String>,
        chart_type: ChartType,
        data: Vec<Row>,
        config: ChartAxisSelection,
    ) -> EngineResult<Self> {
        if data.is_empty() {
            return Err(EngineError::validation("No data to save"));
        }
        Ok(Self {
            id: format!("chart-{}", Uuid::new_v4().simple()),
            name: name.into(),
            chart_type,
            query_id: None,
            data,
            config,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardItem {
    pub id: String,
    pub chart_id: String,
    pub position: GridPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<DashboardItem>,
}

pub fn list_charts(prefs: &PreferencesStore) -> EngineResult<Vec<SavedChart>> {
    Ok(prefs.get(SAVED_CHARTS_KEY)?.unwrap_or_default())
}

/// Appends a chart, or replaces the one with the same id.
pub fn save_chart(prefs: &PreferencesStore, chart: SavedChart) -> EngineResult<()> {
    let mut charts = list_charts(prefs)?;
    charts.retain(|c| c.id != chart.id);
    charts.push(chart);
    prefs.set(SAVED_CHARTS_KEY, &charts)
}

pub fn list_dashboards(prefs: &PreferencesStore) -> EngineResult<Vec<Dashboard>> {
    Ok(prefs.get(DASHBOARDS_KEY)?.unwrap_or_default())
}

/// Saves a dashboard. Every item must point at a saved chart.
pub fn save_dashboard(prefs: &PreferencesStore, dashboard: Dashboard) -> EngineResult<()> {
    if dashboard.name.trim().is_empty() {
        return Err(EngineError::validation("Dashboard name is required"));
    }
    let charts = list_charts(prefs)?;
    if let Some(missing) = dashboard
        .items
        .iter()
        .find(|item| !charts.iter().any(|c| c.id == item.chart_id))
    {
        return Err(EngineError::validation(format!(
            "Dashboard references unknown chart {}",
            missing.chart_id
        )));
    }

    let mut dashboards = list_dashboards(prefs)?;
    dashboards.retain(|d| d.id != dashboard.id);
    dashboards.push(dashboard);
    prefs.set(DASHBOARDS_KEY, &dashboards)
}

// SPDX-License-Identifier: Apache-2.0

//! Axis Auto-Selector
//!
//! Picks an X axis and up to four Y axes for charting from a set of
//! classified columns.

use serde::{Deserialize, Serialize};

use crate::types::{ClassifiedColumn, ColumnRole};

/// Maximum number of Y axis series picked automatically
pub const MAX_Y_AXES: usize = 4;

/// Maximum number of Y axis series picked by the name-based fallback
pub const MAX_FALLBACK_Y_AXES: usize = 2;

const NUMERIC_NAME_HINTS: &[&str] = &[
    "count", "sum", "total", "amount", "value", "price", "cost", "revenue", "profit", "score",
    "rating", "number", "qty", "quantity", "age", "year", "month", "day", "hour", "minute",
    "second",
];

/// Chart axis selection: an X column name (or empty) and ordered Y columns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAxisSelection {
    pub x_axis: String,
    pub y_axis: Vec<String>,
}

/// Outcome of automatic axis selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisDetection {
    pub selection: ChartAxisSelection,
    /// True iff at least one column was classified numeric. The name-based
    /// fallback does not affect it.
    pub has_numeric_data: bool,
    pub x_reason: String,
    pub y_reason: String,
}

impl AxisDetection {
    pub fn message(&self) -> String {
        format!("{}. {}.", self.x_reason, self.y_reason)
    }
}

pub fn select_axes(columns: &[ClassifiedColumn]) -> AxisDetection {
    let first_with = |role: ColumnRole| columns.iter().find(|c| c.role == role);

    let (x_axis, x_reason) = if let Some(col) = first_with(ColumnRole::Date) {
        (col.name().to_string(), "Auto-selected date column for X-axis")
    } else if let Some(col) = first_with(ColumnRole::Categorical) {
        (col.name().to_string(), "Auto-selected categorical column for X-axis")
    } else if let Some(col) = columns.first() {
        (
            col.name().to_string(),
            "Using first column as X-axis (no categorical data found)",
        )
    } else {
        (String::new(), "No columns available for X-axis")
    };

    let numeric: Vec<&ClassifiedColumn> = columns
        .iter()
        .filter(|c| c.role == ColumnRole::Numeric)
        .collect();
    let has_numeric_data = !numeric.is_empty();

    let mut y_axis: Vec<String> = numeric
        .iter()
        .take(MAX_Y_AXES)
        .map(|c| c.name().to_string())
        .collect();

    if y_axis.is_empty() {
        y_axis = columns
            .iter()
            .filter(|c| c.name() != x_axis)
            .filter(|c| has_numeric_name(c.name()))
            .take(MAX_FALLBACK_Y_AXES)
            .map(|c| c.name().to_string())
            .collect();
    }

    let y_reason = if y_axis.is_empty() {
        "No suitable numeric columns found for Y-axis".to_string()
    } else {
        format!(
            "Auto-selected {} column(s) for Y-axis: {}",
            y_axis.len(),
            y_axis.join(", ")
        )
    };

    AxisDetection {
        selection: ChartAxisSelection { x_axis, y_axis },
        has_numeric_data,
        x_reason: x_reason.to_string(),
        y_reason,
    }
}

fn has_numeric_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    NUMERIC_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

// SPDX-License-Identifier: Apache-2.0

//! Column width heuristics and manual resizing

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vitalake_core::{CellValue, Column, Row};

/// Width used for a column with no usable saved width
pub const FALLBACK_WIDTH: u32 = 120;

/// Narrowest width a manual resize can produce
pub const MIN_RESIZE_WIDTH: u32 = 50;

const CONTENT_SAMPLE_ROWS: usize = 3;

/// Saved widths keyed by column name
pub type SavedWidths = HashMap<String, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WidthMode {
    /// Header length plus a bonus that depends on the declared type
    #[default]
    Auto,
    /// Same width for every column, spread over roughly 800px
    Uniform,
    /// Fits the header and the first few rows
    ContentFit,
}

/// Widths for a freshly rendered grid.
///
/// Saved widths only apply in `Auto` mode and only when they cover exactly
/// as many columns as the grid has; otherwise they are ignored.
pub fn initial_widths(
    columns: &[Column],
    rows: &[Row],
    mode: WidthMode,
    saved: Option<&SavedWidths>,
) -> Vec<u32> {
    if mode == WidthMode::Auto {
        if let Some(saved) = saved.filter(|s| s.len() == columns.len()) {
            return columns
                .iter()
                .map(|c| match saved.get(&c.name) {
                    Some(&w) if w > 0 => w,
                    _ => FALLBACK_WIDTH,
                })
                .collect();
        }
    }

    columns
        .iter()
        .map(|column| match mode {
            WidthMode::Uniform => uniform_width(columns.len()),
            WidthMode::ContentFit => content_fit_width(column, rows),
            WidthMode::Auto => auto_width(column),
        })
        .collect()
}

fn uniform_width(column_count: usize) -> u32 {
    let share = 800 / column_count.max(1) as u32;
    share.clamp(150, 250)
}

fn content_fit_width(column: &Column, rows: &[Row]) -> u32 {
    let longest_value = rows
        .iter()
        .take(CONTENT_SAMPLE_ROWS)
        .map(|row| match row.get(&column.name) {
            None | Some(CellValue::Null) => "NULL".len(),
            Some(value) => value
                .to_filter_value()
                .map(|s| s.chars().count())
                .unwrap_or(0),
        })
        .max()
        .unwrap_or(0);
    let longest = longest_value.max(column.name.chars().count()) as u32;
    (longest.saturating_mul(8) + 60).clamp(120, 350)
}

fn auto_width(column: &Column) -> u32 {
    let base = (column.name.chars().count() as u32 * 7).max(80);
    let bonus = if column.declared_type.is_numeric() { 20 } else { 40 };
    (base + bonus).clamp(120, 280)
}

/// Current widths of a rendered grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnWidths {
    names: Vec<String>,
    widths: Vec<u32>,
}

impl ColumnWidths {
    pub fn new(columns: &[Column], rows: &[Row], mode: WidthMode, saved: Option<&SavedWidths>) -> Self {
        Self {
            names: columns.iter().map(|c| c.name.clone()).collect(),
            widths: initial_widths(columns, rows, mode, saved),
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        self.widths.get(index).copied().unwrap_or(FALLBACK_WIDTH)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.widths
    }

    /// Grid width, never narrower than the 800px viewport minimum
    pub fn total(&self) -> u32 {
        self.widths.iter().sum::<u32>().max(800)
    }

    /// Sets a column's width, clamped to `MIN_RESIZE_WIDTH`. Returns the
    /// width applied, or `None` for an index outside the grid.
    pub fn resize(&mut self, index: usize, width: u32) -> Option<u32> {
        let slot = self.widths.get_mut(index)?;
        *slot = width.max(MIN_RESIZE_WIDTH);
        Some(*slot)
    }

    /// Applies a drag that started at `start_width` and moved `delta_px`.
    pub fn drag(&mut self, index: usize, start_width: u32, delta_px: i64) -> Option<u32> {
        let width = (i64::from(start_width) + delta_px).max(0);
        self.resize(index, u32::try_from(width).unwrap_or(u32::MAX))
    }

    pub fn to_saved(&self) -> SavedWidths {
        self.names
            .iter()
            .cloned()
            .zip(self.widths.iter().copied())
            .collect()
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Result Grid
//!
//! Turns a page of rows into what the grid displays and turns grid gestures
//! (cell clicks, filter popovers) into filter set changes. Nothing here
//! talks to a database; callers hand the resulting filters back to the
//! table view.

mod format;
mod widths;

pub use format::{format_cell, format_cell_in, format_number, Align, CellDisplay, NULL_TOKEN};
pub use widths::{
    initial_widths, ColumnWidths, SavedWidths, WidthMode, FALLBACK_WIDTH, MIN_RESIZE_WIDTH,
};

use serde::{Deserialize, Serialize};
use vitalake_core::{classify_all, CellValue, ClassifiedColumn, QueryResult};
use vitalake_query::{ColumnFilter, FilterOperator, FilterSet, PageRequest};

use crate::coordinator::TableViewSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridColumn {
    #[serde(flatten)]
    pub column: ClassifiedColumn,
    pub align: Align,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// 1-based position of the row in the whole filtered table
    pub row_number: u64,
    pub cells: Vec<CellDisplay>,
}

/// Render-ready grid for one page of a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridModel {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub page: u64,
    pub page_size: u32,
    pub total_rows: Option<u64>,
}

impl GridModel {
    /// Builds the grid for `result`, displayed as page `page` of `page_size`.
    pub fn build(
        result: &QueryResult,
        page: PageRequest,
        mode: WidthMode,
        saved_widths: Option<&SavedWidths>,
    ) -> Self {
        let classified = classify_all(&result.columns, &result.rows);
        let widths = initial_widths(&result.columns, &result.rows, mode, saved_widths);

        let columns: Vec<GridColumn> = classified
            .into_iter()
            .zip(widths)
            .map(|(column, width)| GridColumn {
                align: Align::for_column(&column),
                column,
                width,
            })
            .collect();

        let rows = result
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| GridRow {
                row_number: page.row_number(i),
                cells: columns
                    .iter()
                    .map(|c| {
                        let value = row.get(c.column.name()).unwrap_or(&CellValue::Null);
                        format_cell_in(&c.column, value)
                    })
                    .collect(),
            })
            .collect();

        Self {
            columns,
            rows,
            page: page.page(),
            page_size: page.page_size(),
            total_rows: None,
        }
    }

    /// Builds the grid for the rows a table view currently displays. Returns
    /// `None` before the first page has arrived.
    pub fn from_snapshot(
        snapshot: &TableViewSnapshot,
        mode: WidthMode,
        saved_widths: Option<&SavedWidths>,
    ) -> Option<Self> {
        let result = snapshot.rows.as_ref()?;
        let page = PageRequest::new(
            snapshot.rows_page.unwrap_or(snapshot.current_page),
            snapshot.rows_page_size.unwrap_or(snapshot.page_size),
        )
        .ok()?;

        let mut grid = Self::build(result, page, mode, saved_widths);
        grid.total_rows = snapshot.total_rows;
        Some(grid)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.column.name() == name)
    }

    /// Footer line, e.g. "2 rows × 3 columns on this page (Total: 1,204 rows)"
    pub fn summary(&self) -> String {
        let rows = self.rows.len();
        let cols = self.columns.len();
        let mut text = format!(
            "{} row{} \u{d7} {} column{} on this page",
            format_number(rows as f64),
            if rows == 1 { "" } else { "s" },
            cols,
            if cols == 1 { "" } else { "s" },
        );
        if let Some(total) = self.total_rows {
            text.push_str(&format!(" (Total: {} rows)", format_number(total as f64)));
        }
        text
    }
}

/// Filter for a clicked cell: `is_null` for NULL or empty text, `equals`
/// with the raw value otherwise.
pub fn cell_filter(column: &str, value: &CellValue) -> ColumnFilter {
    match value.to_filter_value().filter(|v| !v.is_empty()) {
        Some(raw) => ColumnFilter::equals(column, raw),
        None => ColumnFilter::is_null(column),
    }
}

/// Filter set after clicking a cell: the cell's filter is removed when that
/// exact filter is already applied to the column, and set otherwise.
pub fn toggle_cell_filter(filters: &FilterSet, column: &str, value: &CellValue) -> FilterSet {
    let filter = cell_filter(column, value);
    let applied = filters.get(column).map(|f| (f.operator, &f.value))
        == Some((filter.operator, &filter.value));
    if applied {
        filters.clone().without(column)
    } else {
        filters.clone().with_filter(filter)
    }
}

/// Tracks which cell is highlighted as the active click filter.
#[derive(Debug, Clone, Default)]
pub struct CellClickTracker {
    selected: Option<(String, String)>,
}

impl CellClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the filter set after clicking `value` in `column`.
    pub fn click(&mut self, column: &str, value: &CellValue, filters: &FilterSet) -> FilterSet {
        let next = toggle_cell_filter(filters, column, value);
        self.sync(column, value, &next);
        next
    }

    /// Highlights the clicked cell if its filter is among `filters`, which
    /// are the filters the table view applied after the click.
    pub fn sync(&mut self, column: &str, value: &CellValue, filters: &FilterSet) {
        let filter = cell_filter(column, value);
        let active = filters.get(column).map(|f| (f.operator, &f.value))
            == Some((filter.operator, &filter.value));
        self.selected = active.then(|| (column.to_string(), filter.value));
    }

    pub fn selected(&self) -> Option<(&str, &str)> {
        self.selected
            .as_ref()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    pub fn reset(&mut self) {
        self.selected = None;
    }
}

/// One entry of a column's distinct-value list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinctValue {
    /// `None` is the NULL entry
    pub value: Option<String>,
    pub count: u64,
    pub display_value: String,
}

impl DistinctValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        let value = value.into();
        Self {
            display_value: value.clone(),
            value: Some(value),
            count,
        }
    }

    pub fn null(count: u64) -> Self {
        Self {
            value: None,
            count,
            display_value: NULL_TOKEN.to_string(),
        }
    }
}

/// Distinct values of a column, most frequent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DistinctValues {
    pub column: String,
    pub values: Vec<DistinctValue>,
    pub total_distinct: usize,
    pub has_more: bool,
    pub search_term: Option<String>,
}

impl DistinctValues {
    /// Empty list; the popover still works, just without quick picks.
    pub fn empty(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ..Self::default()
        }
    }

    /// Assembles the list from the rows of a distinct query (`value`,
    /// `count`) and an optional NULL count.
    ///
    /// The NULL entry is added last, and only when there is no search term
    /// or the term mentions "null".
    pub fn from_rows(
        column: impl Into<String>,
        result: &QueryResult,
        null_count: Option<u64>,
        limit: u32,
        search: Option<&str>,
    ) -> Self {
        let mut values: Vec<DistinctValue> = result
            .rows
            .iter()
            .filter_map(|row| {
                let value = row.get("value")?.to_filter_value()?;
                let count = match row.get("count")? {
                    CellValue::Number(n) if *n >= 0.0 => *n as u64,
                    CellValue::Text(s) => s.parse().ok()?,
                    _ => return None,
                };
                Some(DistinctValue::new(value, count))
            })
            .collect();

        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let wants_null = search.map_or(true, |s| s.to_lowercase().contains("null"));
        if let Some(nulls) = null_count.filter(|&n| n > 0 && wants_null) {
            values.push(DistinctValue::null(nulls));
        }

        Self {
            column: column.into(),
            total_distinct: values.len(),
            has_more: result.rows.len() >= limit as usize,
            values,
            search_term: search.map(str::to_string),
        }
    }
}

/// Filter for a quick pick from the distinct-value list
pub fn quick_filter(column: &str, pick: &DistinctValue) -> ColumnFilter {
    match &pick.value {
        Some(value) => {
            ColumnFilter::equals(column, value.clone()).with_display_value(&pick.display_value)
        }
        None => ColumnFilter::is_null(column),
    }
}

/// Filter from the popover's operator + value form. `None` when the
/// operator needs a value and none was typed.
pub fn advanced_filter(
    column: &str,
    operator: FilterOperator,
    value: &str,
) -> Option<ColumnFilter> {
    if operator.requires_value() && value.trim().is_empty() {
        return None;
    }
    Some(ColumnFilter::new(column, operator, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalake_core::{Column, DeclaredType, Row};

    fn sample_result() -> QueryResult {
        let columns = vec![
            Column::new("id", DeclaredType::Integer),
            Column::new("name", DeclaredType::Varchar),
            Column::new("active", DeclaredType::Boolean),
        ];
        let rows = vec![
            Row::new()
                .with("id", CellValue::Number(1.0))
                .with("name", CellValue::text("Ada"))
                .with("active", CellValue::Bool(true)),
            Row::new()
                .with("id", CellValue::Number(2.0))
                .with("name", CellValue::Null)
                .with("active", CellValue::Bool(false)),
        ];
        QueryResult::new(columns, rows).unwrap()
    }

    #[test]
    fn grid_rows_carry_absolute_numbers() {
        let page = PageRequest::new(3, 100).unwrap();
        let grid = GridModel::build(&sample_result(), page, WidthMode::Auto, None);

        assert_eq!(grid.rows[0].row_number, 201);
        assert_eq!(grid.rows[1].row_number, 202);
        assert_eq!(grid.rows[1].cells[1].text, "NULL");
        assert_eq!(grid.columns[0].align, Align::Right);
        assert_eq!(grid.columns[2].align, Align::Center);
        assert_eq!(grid.column_index("name"), Some(1));
    }

    #[test]
    fn summary_mentions_total_when_known() {
        let page = PageRequest::first(500).unwrap();
        let mut grid = GridModel::build(&sample_result(), page, WidthMode::Auto, None);
        assert_eq!(grid.summary(), "2 rows × 3 columns on this page");

        grid.total_rows = Some(1204);
        assert_eq!(
            grid.summary(),
            "2 rows × 3 columns on this page (Total: 1,204 rows)"
        );
    }

    #[test]
    fn clicking_a_cell_adds_then_removes_filter() {
        let mut tracker = CellClickTracker::new();
        let filters = FilterSet::new();

        let added = tracker.click("name", &CellValue::text("Ada"), &filters);
        let filter = added.get("name").unwrap();
        assert_eq!(filter.operator, FilterOperator::Equals);
        assert_eq!(filter.value, "Ada");
        assert_eq!(tracker.selected(), Some(("name", "Ada")));

        let removed = tracker.click("name", &CellValue::text("Ada"), &added);
        assert!(removed.is_empty());
        assert_eq!(tracker.selected(), None);
    }

    #[test]
    fn clicking_another_value_replaces_column_filter() {
        let mut tracker = CellClickTracker::new();
        let first = tracker.click("id", &CellValue::Number(1.0), &FilterSet::new());
        let second = tracker.click("id", &CellValue::Number(2.0), &first);

        assert_eq!(second.len(), 1);
        assert_eq!(second.get("id").unwrap().value, "2");
    }

    #[test]
    fn clicking_null_filters_is_null() {
        let mut tracker = CellClickTracker::new();
        let filters = tracker.click("name", &CellValue::Null, &FilterSet::new());
        let filter = filters.get("name").unwrap();
        assert_eq!(filter.operator, FilterOperator::IsNull);
        assert_eq!(filter.display_value, "NULL");
    }

    #[test]
    fn second_click_after_filter_was_replaced_adds_again() {
        let mut tracker = CellClickTracker::new();
        tracker.click("name", &CellValue::text("Ada"), &FilterSet::new());

        // The filter was changed elsewhere, so the click is a fresh one
        let elsewhere = FilterSet::new().with_filter(ColumnFilter::contains("name", "A"));
        let filters = tracker.click("name", &CellValue::text("Ada"), &elsewhere);
        assert_eq!(filters.get("name").unwrap().operator, FilterOperator::Equals);
    }

    #[test]
    fn toggle_keeps_filters_on_other_columns() {
        let filters = FilterSet::new().with_filter(ColumnFilter::contains("city", "os"));
        let added = toggle_cell_filter(&filters, "id", &CellValue::Number(7.0));
        assert_eq!(added.len(), 2);

        let removed = toggle_cell_filter(&added, "id", &CellValue::Number(7.0));
        assert_eq!(removed, filters);
    }

    #[test]
    fn sync_clears_highlight_when_filter_is_gone() {
        let mut tracker = CellClickTracker::new();
        let ada = CellValue::text("Ada");
        let applied = FilterSet::new().with_filter(cell_filter("name", &ada));

        tracker.sync("name", &ada, &applied);
        assert_eq!(tracker.selected(), Some(("name", "Ada")));
        tracker.sync("name", &ada, &FilterSet::new());
        assert_eq!(tracker.selected(), None);
    }

    #[test]
    fn quick_and_advanced_filters() {
        let pick = DistinctValue::new("books", 12);
        let filter = quick_filter("category", &pick);
        assert_eq!(filter.operator, FilterOperator::Equals);
        assert_eq!(filter.display_value, "books");

        let null_pick = DistinctValue::null(3);
        assert_eq!(quick_filter("category", &null_pick).operator, FilterOperator::IsNull);

        assert!(advanced_filter("name", FilterOperator::Contains, "  ").is_none());
        let filter = advanced_filter("name", FilterOperator::IsNotNull, "").unwrap();
        assert_eq!(filter.display_value, "NOT NULL");
    }

    #[test]
    fn distinct_values_from_query_rows() {
        let result = QueryResult::new(
            vec![
                Column::new("value", DeclaredType::Varchar),
                Column::new("count", DeclaredType::Integer),
            ],
            vec![
                Row::new()
                    .with("value", CellValue::text("a"))
                    .with("count", CellValue::Number(5.0)),
                Row::new()
                    .with("value", CellValue::text("b"))
                    .with("count", CellValue::text("2")),
            ],
        )
        .unwrap();

        let list = DistinctValues::from_rows("c", &result, Some(4), 2, None);
        assert_eq!(list.values.len(), 3);
        assert_eq!(list.values[2], DistinctValue::null(4));
        assert_eq!(list.total_distinct, 3);
        assert!(list.has_more);

        let searched = DistinctValues::from_rows("c", &result, Some(4), 100, Some("a"));
        assert_eq!(searched.values.len(), 2);
        assert!(!searched.has_more);
        assert_eq!(searched.search_term.as_deref(), Some("a"));
    }
}

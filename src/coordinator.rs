// SPDX-License-Identifier: Apache-2.0

//! Pagination & count coordinator
//!
//! A synchronous state machine over page, page size, filters and the
//! separately fetched row count. Every user action returns a `FetchPlan`
//! naming the statements to run; results are fed back with the token they
//! were issued under. Only the most recent token per slot (data, count) is
//! applied, so a slow response can never overwrite a newer one.
//!
//! The row count is tagged with the filter generation it was computed for.
//! Any filter mutation bumps the generation, which makes the previous count
//! untrusted until a count for the new generation arrives.

use serde::{Deserialize, Serialize};
use vitalake_core::{CellValue, Column, EngineError, EngineResult, QueryResult};
use vitalake_query::{
    build_count_query, build_page_query, check_page_in_range, total_pages, validate_page_size,
    BoundQuery, ColumnFilter, FilterSet, PageRequest, QueryError, TableRef,
};

use crate::grid::toggle_cell_filter;

/// Monotonic request sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum CountStatus {
    #[default]
    Idle,
    Refreshing,
    Failed(String),
}

/// Total row count as last computed, plus the filter generation it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowCount {
    pub last_known: Option<u64>,
    pub computed_for: Option<u64>,
    pub status: CountStatus,
}

impl RowCount {
    /// The count, only if it was computed for `generation`
    pub fn trusted(&self, generation: u64) -> Option<u64> {
        match self.computed_for {
            Some(g) if g == generation => self.last_known,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub page_size: u32,
    pub current_page: u64,
    pub total: RowCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub token: RequestToken,
    pub query: BoundQuery,
    pub page: u64,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    pub token: RequestToken,
    pub query: BoundQuery,
    pub generation: u64,
}

/// Statements to run as the consequence of one action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchPlan {
    pub data: Option<DataRequest>,
    pub count: Option<CountRequest>,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.count.is_none()
    }
}

/// What the last completed data fetch produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DataOutcome {
    Rows(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    Stale,
}

/// User actions on a table view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewAction {
    Load,
    GoToPage { page: u64 },
    NextPage,
    PreviousPage,
    SetPageSize { page_size: u32 },
    AddFilter { filter: ColumnFilter },
    RemoveFilter { column: String },
    SetFilters { filters: FilterSet },
    ClearFilters,
    /// Adds the clicked cell's filter, or removes it when already applied
    ToggleCell { column: String, value: CellValue },
    Refresh,
}

/// Rows currently on screen and the window they were fetched for
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedPage {
    pub result: QueryResult,
    pub page: u64,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableViewSnapshot {
    pub table: TableRef,
    pub columns: Vec<Column>,
    pub filters: FilterSet,
    pub current_page: u64,
    pub page_size: u32,
    /// Last known total, possibly computed for an older filter set
    pub total_rows: Option<u64>,
    /// True when `total_rows` matches the filters currently applied
    pub total_trusted: bool,
    pub count_status: CountStatus,
    pub total_pages: Option<u64>,
    pub rows: Option<QueryResult>,
    pub rows_page: Option<u64>,
    pub rows_page_size: Option<u32>,
    pub loading: bool,
    pub last_outcome: Option<DataOutcome>,
    pub error: Option<String>,
}

impl TableViewSnapshot {
    /// No data fetch and no count fetch outstanding
    pub fn is_settled(&self) -> bool {
        !self.loading && self.count_status != CountStatus::Refreshing
    }
}

pub struct TableViewCoordinator {
    table: TableRef,
    columns: Vec<Column>,
    filters: FilterSet,
    filter_generation: u64,
    page: PageState,
    max_page_size: u32,
    next_token: u64,
    latest_data: Option<RequestToken>,
    latest_count: Option<(RequestToken, u64)>,
    displayed: Option<DisplayedPage>,
    last_outcome: Option<DataOutcome>,
    data_error: Option<String>,
}

impl TableViewCoordinator {
    pub fn new(
        table: TableRef,
        columns: Vec<Column>,
        page_size: u32,
        max_page_size: u32,
    ) -> EngineResult<Self> {
        validate_page_size(page_size, max_page_size)?;
        if columns.is_empty() {
            return Err(EngineError::validation(format!("Table {table} has no columns")));
        }
        Ok(Self {
            table,
            columns,
            filters: FilterSet::new(),
            filter_generation: 0,
            page: PageState {
                page_size,
                current_page: 1,
                total: RowCount::default(),
            },
            max_page_size,
            next_token: 0,
            latest_data: None,
            latest_count: None,
            displayed: None,
            last_outcome: None,
            data_error: None,
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filter_generation(&self) -> u64 {
        self.filter_generation
    }

    pub fn page_state(&self) -> &PageState {
        &self.page
    }

    pub fn displayed(&self) -> Option<&DisplayedPage> {
        self.displayed.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.latest_data.is_some()
    }

    /// Count for the filters currently applied, if known
    pub fn trusted_total(&self) -> Option<u64> {
        self.page.total.trusted(self.filter_generation)
    }

    pub fn total_pages(&self) -> Option<u64> {
        self.trusted_total()
            .map(|total| total_pages(total, self.page.page_size))
    }

    pub fn can_go_next(&self) -> bool {
        match self.total_pages() {
            Some(pages) => self.page.current_page < pages,
            None => true,
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.page.current_page > 1
    }

    pub fn apply_action(&mut self, action: ViewAction) -> EngineResult<FetchPlan> {
        match action {
            ViewAction::Load | ViewAction::Refresh => self.refresh(),
            ViewAction::GoToPage { page } => self.go_to_page(page),
            ViewAction::NextPage => self.next_page(),
            ViewAction::PreviousPage => self.previous_page(),
            ViewAction::SetPageSize { page_size } => self.set_page_size(page_size),
            ViewAction::AddFilter { filter } => self.add_filter(filter),
            ViewAction::RemoveFilter { column } => self.remove_filter(&column),
            ViewAction::SetFilters { filters } => self.set_filters(filters),
            ViewAction::ClearFilters => self.clear_filters(),
            ViewAction::ToggleCell { column, value } => self.toggle_cell(&column, &value),
        }
    }

    /// Fetches the requested page. The count is not refetched since the
    /// filters are unchanged.
    pub fn go_to_page(&mut self, page: u64) -> EngineResult<FetchPlan> {
        if page == 0 {
            return Err(QueryError::InvalidPage.into());
        }
        if let Some(pages) = self.total_pages() {
            check_page_in_range(page, pages)?;
        }
        let data = self.data_request(page, self.page.page_size)?;
        self.page.current_page = page;
        Ok(FetchPlan {
            data: Some(data),
            count: None,
        })
    }

    pub fn next_page(&mut self) -> EngineResult<FetchPlan> {
        if !self.can_go_next() {
            let max = self.total_pages().unwrap_or(1).max(1);
            return Err(QueryError::PageOutOfRange { max }.into());
        }
        self.go_to_page(self.page.current_page + 1)
    }

    pub fn previous_page(&mut self) -> EngineResult<FetchPlan> {
        if !self.can_go_previous() {
            let max = self.total_pages().unwrap_or(1).max(1);
            return Err(QueryError::PageOutOfRange { max }.into());
        }
        self.go_to_page(self.page.current_page - 1)
    }

    /// Back to page 1 with a new size. The count is refetched and the last
    /// known value stays visible, flagged as refreshing.
    pub fn set_page_size(&mut self, page_size: u32) -> EngineResult<FetchPlan> {
        validate_page_size(page_size, self.max_page_size)?;
        let data = self.data_request(1, page_size)?;
        let count = self.count_request(&self.filters.clone(), self.filter_generation)?;

        self.page.page_size = page_size;
        self.page.current_page = 1;
        self.commit_count_request(&count);
        Ok(FetchPlan {
            data: Some(data),
            count: Some(count),
        })
    }

    pub fn add_filter(&mut self, filter: ColumnFilter) -> EngineResult<FetchPlan> {
        let filters = self.filters.clone().with_filter(filter);
        self.replace_filters(filters)
    }

    pub fn remove_filter(&mut self, column: &str) -> EngineResult<FetchPlan> {
        if !self.filters.contains_column(column) {
            return Ok(FetchPlan::default());
        }
        let filters = self.filters.clone().without(column);
        self.replace_filters(filters)
    }

    pub fn set_filters(&mut self, filters: FilterSet) -> EngineResult<FetchPlan> {
        self.replace_filters(filters)
    }

    pub fn clear_filters(&mut self) -> EngineResult<FetchPlan> {
        self.replace_filters(FilterSet::new())
    }

    /// Toggles against the filters held here, so concurrent clicks and
    /// filter edits compose instead of overwriting each other.
    pub fn toggle_cell(&mut self, column: &str, value: &CellValue) -> EngineResult<FetchPlan> {
        let filters = toggle_cell_filter(&self.filters, column, value);
        self.replace_filters(filters)
    }

    /// Data for the current page and the count, unconditionally
    pub fn refresh(&mut self) -> EngineResult<FetchPlan> {
        let data = self.data_request(self.page.current_page, self.page.page_size)?;
        let count = self.count_request(&self.filters.clone(), self.filter_generation)?;
        self.commit_count_request(&count);
        Ok(FetchPlan {
            data: Some(data),
            count: Some(count),
        })
    }

    /// Both statements are built before anything is mutated, so a filter on
    /// an unknown column leaves the view untouched.
    fn replace_filters(&mut self, filters: FilterSet) -> EngineResult<FetchPlan> {
        filters.validate(&self.columns)?;
        let generation = self.filter_generation + 1;
        let request = PageRequest::with_max(1, self.page.page_size, self.max_page_size)?;
        let data_query = build_page_query(&self.table, &filters, &self.columns, &request)?;
        let count = self.count_request(&filters, generation)?;

        tracing::debug!(
            filters = filters.len(),
            generation,
            "Filter set changed"
        );

        self.filters = filters;
        self.filter_generation = generation;
        self.page.current_page = 1;
        let data = DataRequest {
            token: self.issue_token(),
            query: data_query,
            page: 1,
            page_size: self.page.page_size,
        };
        self.latest_data = Some(data.token);
        self.commit_count_request(&count);

        Ok(FetchPlan {
            data: Some(data),
            count: Some(count),
        })
    }

    fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }

    fn data_request(&mut self, page: u64, page_size: u32) -> EngineResult<DataRequest> {
        let request = PageRequest::with_max(page, page_size, self.max_page_size)?;
        let query = build_page_query(&self.table, &self.filters, &self.columns, &request)?;
        let token = self.issue_token();
        self.latest_data = Some(token);
        Ok(DataRequest {
            token,
            query,
            page,
            page_size,
        })
    }

    /// Builds a count statement without touching the count slot.
    fn count_request(&mut self, filters: &FilterSet, generation: u64) -> EngineResult<CountRequest> {
        let query = build_count_query(&self.table, filters, &self.columns)?;
        Ok(CountRequest {
            token: self.issue_token(),
            query,
            generation,
        })
    }

    fn commit_count_request(&mut self, count: &CountRequest) {
        self.latest_count = Some((count.token, count.generation));
        self.page.total.status = CountStatus::Refreshing;
    }

    /// Applies a page result. Anything but the latest data token is stale.
    pub fn apply_data(
        &mut self,
        token: RequestToken,
        page: u64,
        page_size: u32,
        outcome: EngineResult<QueryResult>,
    ) -> Applied {
        if self.latest_data != Some(token) {
            return Applied::Stale;
        }
        self.latest_data = None;

        match outcome {
            Ok(result) => {
                let outcome = if result.is_empty() {
                    DataOutcome::Empty
                } else {
                    DataOutcome::Rows(result.row_count())
                };
                self.last_outcome = Some(outcome);
                self.data_error = None;
                self.displayed = Some(DisplayedPage {
                    result,
                    page,
                    page_size,
                });
            }
            Err(e) => {
                let message = e.to_string();
                self.last_outcome = Some(DataOutcome::Failed(message.clone()));
                self.data_error = Some(message);
            }
        }
        Applied::Accepted
    }

    /// Applies a count result. Failure keeps the last known count.
    pub fn apply_count(&mut self, token: RequestToken, outcome: EngineResult<u64>) -> Applied {
        let generation = match self.latest_count {
            Some((latest, generation)) if latest == token => generation,
            _ => return Applied::Stale,
        };
        self.latest_count = None;

        match outcome {
            Ok(total) => {
                self.page.total = RowCount {
                    last_known: Some(total),
                    computed_for: Some(generation),
                    status: CountStatus::Idle,
                };
            }
            Err(e) => {
                self.page.total.status = CountStatus::Failed(e.to_string());
            }
        }
        Applied::Accepted
    }

    pub fn snapshot(&self) -> TableViewSnapshot {
        TableViewSnapshot {
            table: self.table.clone(),
            columns: self.columns.clone(),
            filters: self.filters.clone(),
            current_page: self.page.current_page,
            page_size: self.page.page_size,
            total_rows: self.page.total.last_known,
            total_trusted: self.trusted_total().is_some(),
            count_status: self.page.total.status.clone(),
            total_pages: self.total_pages(),
            rows: self.displayed.as_ref().map(|d| d.result.clone()),
            rows_page: self.displayed.as_ref().map(|d| d.page),
            rows_page_size: self.displayed.as_ref().map(|d| d.page_size),
            loading: self.is_loading(),
            last_outcome: self.last_outcome.clone(),
            error: self.data_error.clone(),
        }
    }
}

/// Reads the `total` column of a count statement's single row.
pub fn parse_count(result: &QueryResult) -> EngineResult<u64> {
    parse_count_column(result, "total")
}

/// Reads a non-negative count from `column` of the first row.
pub fn parse_count_column(result: &QueryResult, column: &str) -> EngineResult<u64> {
    let value = result
        .rows
        .first()
        .and_then(|row| row.get(column))
        .ok_or_else(|| EngineError::internal("Count query returned no rows"))?;

    match value {
        CellValue::Number(n) if n.is_finite() && *n >= 0.0 => Ok(*n as u64),
        CellValue::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| EngineError::internal(format!("Invalid count value: {s}"))),
        other => Err(EngineError::internal(format!(
            "Invalid count value: {other:?}"
        ))),
    }
}

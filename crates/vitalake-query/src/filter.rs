// SPDX-License-Identifier: Apache-2.0

//! Column filter model
//!
//! An ordered set of per-column filters. There is at most one filter per
//! column: adding a filter for a column that already has one replaces it and
//! moves it to the end. Filters are ANDed together when compiled.

use serde::{Deserialize, Serialize};
use vitalake_core::Column;

use crate::error::{BuildResult, QueryError};

/// Filter operator for WHERE clauses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// Whether the operator needs a user-supplied value
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not equals",
            Self::Contains => "contains",
            Self::NotContains => "does not contain",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }
}

/// Column filter for WHERE clauses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub display_value: String,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        let value = value.into();
        let display_value = match operator {
            FilterOperator::IsNull => "NULL".to_string(),
            FilterOperator::IsNotNull => "NOT NULL".to_string(),
            _ => value.clone(),
        };
        Self {
            column: column.into(),
            operator,
            value,
            display_value,
        }
    }

    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::Equals, value)
    }

    pub fn not_equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::NotEquals, value)
    }

    pub fn contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::Contains, value)
    }

    pub fn not_contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::NotContains, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::IsNull, "")
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(column, FilterOperator::IsNotNull, "")
    }

    pub fn with_display_value(mut self, display: impl Into<String>) -> Self {
        self.display_value = display.into();
        self
    }
}

/// Ordered set of column filters, at most one per column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: Vec<ColumnFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a list, applying the replace-on-add rule in order.
    pub fn from_filters(filters: impl IntoIterator<Item = ColumnFilter>) -> Self {
        let mut set = Self::new();
        for filter in filters {
            set.add(filter);
        }
        set
    }

    /// Adds a filter, replacing any existing filter on the same column.
    /// The new filter is always placed last.
    pub fn add(&mut self, filter: ColumnFilter) {
        self.filters.retain(|f| f.column != filter.column);
        self.filters.push(filter);
    }

    /// Removes the filter on `column`. Returns whether one was present.
    pub fn remove(&mut self, column: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.column != column);
        self.filters.len() != before
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.add(filter);
        self
    }

    pub fn without(mut self, column: &str) -> Self {
        self.remove(column);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.iter().find(|f| f.column == column)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn as_slice(&self) -> &[ColumnFilter] {
        &self.filters
    }

    /// Checks that every filter references a known column
    pub fn validate(&self, columns: &[Column]) -> BuildResult<()> {
        self.filters
            .iter()
            .try_for_each(|f| validate_filter(f, columns))
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a ColumnFilter;
    type IntoIter = std::slice::Iter<'a, ColumnFilter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

/// Rejects filters whose column is not part of the current column set
pub fn validate_filter(filter: &ColumnFilter, columns: &[Column]) -> BuildResult<()> {
    if columns.iter().any(|c| c.name == filter.column) {
        Ok(())
    } else {
        Err(QueryError::UnknownColumn(filter.column.clone()))
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Filter model, parameterized predicate compiler, pagination window and
//! statement builder for the table view.

pub mod builder;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod predicate;

pub use builder::{
    build_count_query, build_distinct_query, build_null_count_query, build_page_query, BoundQuery,
    TableRef, MAX_DISTINCT_LIMIT,
};
pub use error::{BuildResult, QueryError};
pub use filter::{ColumnFilter, FilterOperator, FilterSet};
pub use pagination::{
    check_page_in_range, parse_page_input, total_pages, validate_page_size, PageRequest, PageWindow,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PAGE_SIZE_OPTIONS,
};
pub use predicate::{compile_predicate, compile_where, BindValue, Predicate, SqlDialect, WhereClause};

// SPDX-License-Identifier: Apache-2.0

//! Statement assembly
//!
//! Data window, row count and distinct-value statements for a single table.
//! The page and count statements share one WHERE compiler so that a count
//! always describes the same rows the grid pages through.

use serde::{Deserialize, Serialize};
use vitalake_core::Column;

use crate::error::{BuildResult, QueryError};
use crate::filter::FilterSet;
use crate::pagination::PageRequest;
use crate::predicate::{compile_where, contains_pattern, BindValue, SqlDialect, SqlWriter};

/// Upper bound on distinct values returned for a filter popover
pub const MAX_DISTINCT_LIMIT: u32 = 1000;

/// A fully qualified table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> BuildResult<Self> {
        let schema = schema.into();
        let table = table.into();
        if schema.trim().is_empty() || table.trim().is_empty() {
            return Err(QueryError::EmptyIdentifier);
        }
        Ok(Self { schema, table })
    }

    pub fn qualified(&self, dialect: SqlDialect) -> String {
        format!(
            "{}.{}",
            dialect.quote_ident(&self.schema),
            dialect.quote_ident(&self.table)
        )
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl BoundQuery {
    pub fn new(sql: impl Into<String>, params: Vec<BindValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement without parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// `SELECT * FROM t [WHERE ..] ORDER BY 1 LIMIT $n OFFSET $m`
pub fn build_page_query(
    table: &TableRef,
    filters: &FilterSet,
    columns: &[Column],
    request: &PageRequest,
) -> BuildResult<BoundQuery> {
    let dialect = SqlDialect::Postgres;
    let clause = compile_where(filters, dialect, columns)?;
    let window = request.window();

    let mut writer = SqlWriter::new(dialect);
    writer.push_sql(&format!("SELECT * FROM {}", table.qualified(dialect)));
    writer.push_where(&clause);
    writer.push_sql(" ORDER BY 1 LIMIT ");
    writer.push_param(BindValue::Int(window.limit as i64));
    writer.push_sql(" OFFSET ");
    writer.push_param(BindValue::Int(window.offset as i64));

    let (sql, params) = writer.finish();
    Ok(BoundQuery { sql, params })
}

/// `SELECT COUNT(*) AS total FROM t [WHERE ..]`
pub fn build_count_query(
    table: &TableRef,
    filters: &FilterSet,
    columns: &[Column],
) -> BuildResult<BoundQuery> {
    let dialect = SqlDialect::Postgres;
    let clause = compile_where(filters, dialect, columns)?;

    let mut writer = SqlWriter::new(dialect);
    writer.push_sql(&format!(
        "SELECT COUNT(*) AS total FROM {}",
        table.qualified(dialect)
    ));
    writer.push_where(&clause);

    let (sql, params) = writer.finish();
    Ok(BoundQuery { sql, params })
}

/// Distinct non-null values of `column` with their frequency, most frequent
/// first. `search` narrows values by case-insensitive substring.
pub fn build_distinct_query(
    table: &TableRef,
    column: &str,
    limit: u32,
    search: Option<&str>,
) -> BuildResult<BoundQuery> {
    if column.trim().is_empty() {
        return Err(QueryError::EmptyIdentifier);
    }
    if limit == 0 {
        return Err(QueryError::InvalidLimit);
    }
    let dialect = SqlDialect::Postgres;
    let ident = dialect.quote_ident(column);

    let mut writer = SqlWriter::new(dialect);
    writer.push_sql(&format!(
        "SELECT {ident}::text AS value, COUNT(*) AS count FROM {} WHERE {ident} IS NOT NULL",
        table.qualified(dialect)
    ));
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        writer.push_sql(&format!(" AND {ident}::text ILIKE "));
        writer.push_param(BindValue::Text(contains_pattern(term)));
    }
    writer.push_sql(&format!(
        " GROUP BY {ident} ORDER BY count DESC, value ASC LIMIT "
    ));
    writer.push_param(BindValue::Int(limit.min(MAX_DISTINCT_LIMIT) as i64));

    let (sql, params) = writer.finish();
    Ok(BoundQuery { sql, params })
}

/// Number of NULLs in `column`, shown as the popover's NULL entry
pub fn build_null_count_query(table: &TableRef, column: &str) -> BuildResult<BoundQuery> {
    if column.trim().is_empty() {
        return Err(QueryError::EmptyIdentifier);
    }
    let dialect = SqlDialect::Postgres;
    Ok(BoundQuery::raw(format!(
        "SELECT COUNT(*) AS count FROM {} WHERE {} IS NULL",
        table.qualified(dialect),
        dialect.quote_ident(column)
    )))
}

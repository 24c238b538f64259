// SPDX-License-Identifier: Apache-2.0

//! Predicate compiler
//!
//! Turns `ColumnFilter`s into WHERE fragments. A compiled predicate is a
//! list of SQL parts where user values only ever appear as bound parameters;
//! placeholders are numbered when the final statement is assembled.

use serde::{Deserialize, Serialize};
use vitalake_core::{Column, DeclaredType};

use crate::error::{BuildResult, QueryError};
use crate::filter::{ColumnFilter, FilterOperator, FilterSet};

/// SQL dialect. Only PostgreSQL is supported; other engines are stubbed at
/// the driver layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Postgres,
}

impl SqlDialect {
    pub fn from_driver_id(driver_id: &str) -> Option<Self> {
        match driver_id.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(SqlDialect::Postgres),
            _ => None,
        }
    }

    /// Quote an identifier according to the dialect
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            SqlDialect::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Positional placeholder for the `index`-th (1-based) parameter
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::Postgres => format!("${index}"),
        }
    }
}

/// A value bound to a statement parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlPart {
    Sql(String),
    Param(BindValue),
}

/// A compiled WHERE fragment for one filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    parts: Vec<SqlPart>,
}

impl Predicate {
    fn sql(sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Sql(sql.into())],
        }
    }

    fn with_param(lhs: String, value: BindValue, rhs: &str) -> Self {
        let mut parts = vec![SqlPart::Sql(lhs), SqlPart::Param(value)];
        if !rhs.is_empty() {
            parts.push(SqlPart::Sql(rhs.to_string()));
        }
        Self { parts }
    }

    pub fn parts(&self) -> &[SqlPart] {
        &self.parts
    }

    pub fn params(&self) -> impl Iterator<Item = &BindValue> {
        self.parts.iter().filter_map(|p| match p {
            SqlPart::Param(v) => Some(v),
            SqlPart::Sql(_) => None,
        })
    }
}

/// Accumulates SQL text and parameters, numbering placeholders in order
#[derive(Debug)]
pub struct SqlWriter {
    dialect: SqlDialect,
    sql: String,
    params: Vec<BindValue>,
}

impl SqlWriter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn push_param(&mut self, value: BindValue) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    pub fn push_predicate(&mut self, predicate: &Predicate) {
        for part in &predicate.parts {
            match part {
                SqlPart::Sql(sql) => self.push_sql(sql),
                SqlPart::Param(value) => self.push_param(value.clone()),
            }
        }
    }

    /// Appends ` WHERE p1 AND p2 ...`, or nothing for an empty clause
    pub fn push_where(&mut self, clause: &WhereClause) {
        for (i, predicate) in clause.predicates.iter().enumerate() {
            self.push_sql(if i == 0 { " WHERE " } else { " AND " });
            self.push_predicate(predicate);
        }
    }

    pub fn finish(self) -> (String, Vec<BindValue>) {
        (self.sql, self.params)
    }
}

/// Compiles a single filter against the known column set.
pub fn compile_predicate(
    filter: &ColumnFilter,
    dialect: SqlDialect,
    columns: &[Column],
) -> BuildResult<Predicate> {
    let column = columns
        .iter()
        .find(|c| c.name == filter.column)
        .ok_or_else(|| QueryError::UnknownColumn(filter.column.clone()))?;
    let ident = dialect.quote_ident(&column.name);

    let predicate = match filter.operator {
        FilterOperator::IsNull => Predicate::sql(format!("{ident} IS NULL")),
        FilterOperator::IsNotNull => Predicate::sql(format!("{ident} IS NOT NULL")),
        FilterOperator::Equals if filter.value.is_empty() => {
            Predicate::sql(format!("{ident} IS NULL"))
        }
        FilterOperator::NotEquals if filter.value.is_empty() => {
            Predicate::sql(format!("{ident} IS NOT NULL"))
        }
        FilterOperator::Equals => comparison(column, &ident, "=", &filter.value)?,
        FilterOperator::NotEquals => comparison(column, &ident, "!=", &filter.value)?,
        FilterOperator::Contains => Predicate::with_param(
            format!("{ident}::text ILIKE "),
            BindValue::Text(contains_pattern(&filter.value)),
            "",
        ),
        FilterOperator::NotContains => Predicate::with_param(
            format!("{ident}::text NOT ILIKE "),
            BindValue::Text(contains_pattern(&filter.value)),
            "",
        ),
    };

    Ok(predicate)
}

/// Conjunction of compiled predicates. Empty means no WHERE at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    predicates: Vec<Predicate>,
}

impl WhereClause {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn param_count(&self) -> usize {
        self.predicates.iter().map(|p| p.params().count()).sum()
    }
}

/// Compiles every filter of the set, in order. A single unknown column
/// fails the whole clause.
pub fn compile_where(
    filters: &FilterSet,
    dialect: SqlDialect,
    columns: &[Column],
) -> BuildResult<WhereClause> {
    let predicates = filters
        .iter()
        .map(|f| compile_predicate(f, dialect, columns))
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(WhereClause { predicates })
}

fn comparison(column: &Column, ident: &str, op: &str, value: &str) -> BuildResult<Predicate> {
    let value = value.to_string();
    let predicate = match column.declared_type {
        DeclaredType::Integer | DeclaredType::Float => {
            let parsed = value.trim().parse::<f64>().ok().filter(|n| n.is_finite());
            if parsed.is_none() {
                return Err(QueryError::InvalidValue {
                    column: column.name.clone(),
                    message: format!("'{value}' is not a number"),
                });
            }
            Predicate::with_param(
                format!("{ident} {op} "),
                BindValue::Text(value.trim().to_string()),
                "::numeric",
            )
        }
        DeclaredType::Boolean => {
            if !is_boolean_literal(&value) {
                return Err(QueryError::InvalidValue {
                    column: column.name.clone(),
                    message: format!("'{value}' is not a boolean"),
                });
            }
            Predicate::with_param(format!("{ident} {op} "), BindValue::Text(value), "::boolean")
        }
        DeclaredType::Date => {
            Predicate::with_param(format!("{ident} {op} "), BindValue::Text(value), "::date")
        }
        DeclaredType::Timestamp => {
            Predicate::with_param(format!("{ident} {op} "), BindValue::Text(value), "::timestamp")
        }
        DeclaredType::Timestamptz => Predicate::with_param(
            format!("{ident} {op} "),
            BindValue::Text(value),
            "::timestamptz",
        ),
        DeclaredType::Varchar => {
            Predicate::with_param(format!("{ident}::text {op} "), BindValue::Text(value), "")
        }
    };
    Ok(predicate)
}

fn is_boolean_literal(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n" | "on" | "off" | "1" | "0"
    )
}

/// `%value%` with LIKE metacharacters escaped so the match is a literal
/// substring. Backslash is PostgreSQL's default LIKE escape.
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("age", DeclaredType::Integer),
            Column::new("name", DeclaredType::Varchar),
            Column::new("active", DeclaredType::Boolean),
            Column::new("born", DeclaredType::Date),
        ]
    }

    fn render(predicate: &Predicate) -> (String, Vec<BindValue>) {
        let mut writer = SqlWriter::new(SqlDialect::Postgres);
        writer.push_predicate(predicate);
        writer.finish()
    }

    fn compile(filter: ColumnFilter) -> BuildResult<(String, Vec<BindValue>)> {
        compile_predicate(&filter, SqlDialect::Postgres, &columns()).map(|p| render(&p))
    }

    #[test]
    fn empty_equals_is_null() {
        let (sql, params) = compile(ColumnFilter::equals("age", "")).unwrap();
        assert_eq!(sql, "\"age\" IS NULL");
        assert!(params.is_empty());

        let (sql, _) = compile(ColumnFilter::not_equals("age", "")).unwrap();
        assert_eq!(sql, "\"age\" IS NOT NULL");
    }

    #[test]
    fn equality_binds_value_with_type_cast() {
        let (sql, params) = compile(ColumnFilter::equals("age", "42")).unwrap();
        assert_eq!(sql, "\"age\" = $1::numeric");
        assert_eq!(params, vec![BindValue::Text("42".into())]);

        let (sql, _) = compile(ColumnFilter::not_equals("name", "Ada")).unwrap();
        assert_eq!(sql, "\"name\"::text != $1");

        let (sql, _) = compile(ColumnFilter::equals("born", "2020-02-29")).unwrap();
        assert_eq!(sql, "\"born\" = $1::date");

        let (sql, _) = compile(ColumnFilter::equals("active", "true")).unwrap();
        assert_eq!(sql, "\"active\" = $1::boolean");
    }

    #[test]
    fn contains_with_quote_is_bound_not_interpolated() {
        let (sql, params) = compile(ColumnFilter::contains("name", "o'brien")).unwrap();
        assert_eq!(sql, "\"name\"::text ILIKE $1");
        assert!(!sql.contains("brien"));
        assert_eq!(params, vec![BindValue::Text("%o'brien%".into())]);

        let (sql, _) = compile(ColumnFilter::not_contains("age", "4")).unwrap();
        assert_eq!(sql, "\"age\"::text NOT ILIKE $1");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn null_operators_ignore_value() {
        let (sql, params) = compile(ColumnFilter::is_null("name")).unwrap();
        assert_eq!(sql, "\"name\" IS NULL");
        assert!(params.is_empty());

        let (sql, _) = compile(ColumnFilter::is_not_null("name")).unwrap();
        assert_eq!(sql, "\"name\" IS NOT NULL");
    }

    #[test]
    fn rejects_unknown_column_and_bad_values() {
        assert_eq!(
            compile(ColumnFilter::equals("ghost", "1")),
            Err(QueryError::UnknownColumn("ghost".into()))
        );
        assert!(matches!(
            compile(ColumnFilter::equals("age", "ten")),
            Err(QueryError::InvalidValue { .. })
        ));
        assert!(matches!(
            compile(ColumnFilter::equals("active", "maybe")),
            Err(QueryError::InvalidValue { .. })
        ));
    }

    #[test]
    fn identifiers_are_quoted() {
        let cols = vec![Column::new("we\"ird", DeclaredType::Varchar)];
        let predicate =
            compile_predicate(&ColumnFilter::is_null("we\"ird"), SqlDialect::Postgres, &cols)
                .unwrap();
        assert_eq!(render(&predicate).0, "\"we\"\"ird\" IS NULL");
    }

    #[test]
    fn where_clause_numbers_placeholders_in_order() {
        let filters = FilterSet::from_filters([
            ColumnFilter::equals("age", "5"),
            ColumnFilter::is_null("born"),
            ColumnFilter::contains("name", "a"),
        ]);
        let clause = compile_where(&filters, SqlDialect::Postgres, &columns()).unwrap();
        assert_eq!(clause.param_count(), 2);

        let mut writer = SqlWriter::new(SqlDialect::Postgres);
        writer.push_where(&clause);
        let (sql, params) = writer.finish();

        assert_eq!(
            sql,
            " WHERE \"age\" = $1::numeric AND \"born\" IS NULL AND \"name\"::text ILIKE $2"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_filter_set_has_no_where() {
        let clause = compile_where(&FilterSet::new(), SqlDialect::Postgres, &columns()).unwrap();
        assert!(clause.is_empty());

        let mut writer = SqlWriter::new(SqlDialect::Postgres);
        writer.push_where(&clause);
        assert_eq!(writer.finish().0, "");
    }

    proptest! {
        #[test]
        fn values_never_reach_sql_text(value in "[a-zA-Z0-9 ';\\-%_]{1,24}") {
            let filter = ColumnFilter::contains("name", value.clone());
            let predicate = compile_predicate(&filter, SqlDialect::Postgres, &columns()).unwrap();
            let (sql, params) = render(&predicate);

            prop_assert_eq!(sql, "\"name\"::text ILIKE $1".to_string());
            prop_assert_eq!(params.len(), 1);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Result-set types shared by the engine, the classifier and the query builder
//!
//! A `QueryResult` is produced once per query execution and replaced
//! wholesale on the next one; nothing here is patched in place.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Declared column type, as reported by the driver's field metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    #[default]
    Varchar,
    Integer,
    Float,
    Timestamp,
    Date,
    Timestamptz,
    Boolean,
}

impl DeclaredType {
    /// Maps a PostgreSQL type name (as reported by the wire protocol) to a
    /// declared type. Anything without a dedicated mapping is `Varchar`.
    /// Accepts the driver's short names (`TIMESTAMPTZ`, `INT8`) as well as
    /// `format_type` output (`timestamp(3) with time zone`,
    /// `character varying(40)`).
    pub fn from_pg_type_name(name: &str) -> Self {
        let mut base = name.trim().to_ascii_lowercase();
        while let (Some(open), Some(close)) = (base.find('('), base.find(')')) {
            if close < open {
                break;
            }
            base.replace_range(open..=close, " ");
        }
        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
        match base.as_str() {
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "serial"
            | "bigserial" | "smallserial" => Self::Integer,
            "float4" | "float8" | "numeric" | "real" | "double precision" | "decimal" => {
                Self::Float
            }
            "date" => Self::Date,
            "timestamp" | "timestamp without time zone" => Self::Timestamp,
            "timestamptz" | "timestamp with time zone" => Self::Timestamptz,
            "bool" | "boolean" => Self::Boolean,
            _ => Self::Varchar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Varchar => "varchar",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Timestamptz => "timestamptz",
            Self::Boolean => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp | Self::Timestamptz)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column metadata for a result set. Names are unique within a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: DeclaredType,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null or empty text. Blank values are ignored when sampling a column.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Raw textual form of the value, suitable as a filter value.
    ///
    /// Returns `None` for `Null`; integral numbers drop the fractional part.
    pub fn to_filter_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_raw_number(*n)),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

fn format_raw_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A result row: column name -> value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(HashMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.0.insert(column.into(), value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.0.insert(column.into(), value);
    }

    /// Missing keys read as `None`, distinct from an explicit `Null`.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Query execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryResult {
    /// Ordered column list
    pub columns: Vec<Column>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Execution time in milliseconds
    #[serde(default)]
    pub execution_time_ms: f64,
}

impl QueryResult {
    /// Builds a result, rejecting duplicate column names.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> EngineResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(EngineError::validation(format!(
                    "Duplicate column name in result: {}",
                    column.name
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
            execution_time_ms: 0.0,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_execution_time(mut self, time_ms: f64) -> Self {
        self.execution_time_ms = time_ms;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Semantic role of a column, distinct from its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Numeric,
    Date,
    Categorical,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A column together with its inferred role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedColumn {
    #[serde(flatten)]
    pub column: Column,
    pub role: ColumnRole,
    pub confidence: Confidence,
    pub reason: String,
}

impl ClassifiedColumn {
    pub fn name(&self) -> &str {
        &self.column.name
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Column Type Classifier
//!
//! Infers a semantic role (numeric / date / categorical / unknown) for each
//! column of a result set. Sampled content wins over the declared type: a
//! numeric id stored as text is still numeric. The declared type is only
//! consulted when the sample carries no numeric or date signal at all.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::types::{CellValue, ClassifiedColumn, Column, ColumnRole, Confidence, Row};

/// Number of leading rows inspected per column
pub const SAMPLE_SIZE: usize = 10;

/// Minimum share of valid values that must agree for a content-based role
pub const ROLE_THRESHOLD: f64 = 0.6;

/// Share of valid values above which a content-based role is high confidence
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.9;

const CATEGORICAL_TYPES: &[&str] = &[
    "varchar",
    "text",
    "string",
    "date",
    "timestamp",
    "timestamptz",
    "char",
];

const NUMERIC_TYPES: &[&str] = &[
    "integer", "float", "decimal", "bigint", "real", "double", "numeric", "int", "smallint",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%d %B %Y", "%B %d %Y", "%B %d, %Y", "%d-%m-%Y"];

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}|^\d{1,2}/\d{1,2}/\d{4}|^\w{3}\s+\d{1,2},?\s+\d{4}")
            .expect("date pattern is a valid regex")
    })
}

/// Classifies every column of a result set in declared order.
pub fn classify_all(columns: &[Column], rows: &[Row]) -> Vec<ClassifiedColumn> {
    columns.iter().map(|column| classify(column, rows)).collect()
}

/// Classifies a single column from (at most) the first `SAMPLE_SIZE` rows.
pub fn classify(column: &Column, sample_rows: &[Row]) -> ClassifiedColumn {
    let valid: Vec<&CellValue> = sample_rows
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(|row| row.get(&column.name))
        .filter(|value| !value.is_blank())
        .collect();

    let (role, confidence, reason) = decide(column, &valid);

    ClassifiedColumn {
        column: column.clone(),
        role,
        confidence,
        reason,
    }
}

fn decide(column: &Column, valid: &[&CellValue]) -> (ColumnRole, Confidence, String) {
    if valid.is_empty() {
        return (
            ColumnRole::Unknown,
            Confidence::Low,
            "No valid values found".to_string(),
        );
    }

    let total = valid.len() as f64;
    let numeric_count = valid.iter().filter(|v| is_numeric_value(v)).count();
    let date_count = valid.iter().filter(|v| is_date_value(v)).count();
    let numeric_ratio = numeric_count as f64 / total;
    let date_ratio = date_count as f64 / total;

    if numeric_ratio >= ROLE_THRESHOLD {
        return (
            ColumnRole::Numeric,
            ratio_confidence(numeric_ratio),
            format!("{}% numeric values (data analysis)", percent(numeric_ratio)),
        );
    }

    if date_ratio >= ROLE_THRESHOLD {
        return (
            ColumnRole::Date,
            ratio_confidence(date_ratio),
            format!("{}% date-like values (data analysis)", percent(date_ratio)),
        );
    }

    if numeric_count > 0 {
        return (
            ColumnRole::Numeric,
            Confidence::Low,
            format!(
                "{} numeric values found ({}%) (data analysis)",
                numeric_count,
                percent(numeric_ratio)
            ),
        );
    }

    let declared = column.declared_type.as_str();
    if CATEGORICAL_TYPES.iter().any(|t| declared.contains(t)) {
        return (
            ColumnRole::Categorical,
            Confidence::Medium,
            format!("Database type: {declared}"),
        );
    }
    if NUMERIC_TYPES.iter().any(|t| declared.contains(t)) {
        return (
            ColumnRole::Numeric,
            Confidence::High,
            format!("Database type: {declared}"),
        );
    }

    (
        ColumnRole::Categorical,
        Confidence::Low,
        "mixed or text values".to_string(),
    )
}

fn ratio_confidence(ratio: f64) -> Confidence {
    if ratio >= HIGH_CONFIDENCE_THRESHOLD {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

/// Native finite numbers, or text that parses to a finite number once trimmed
pub fn is_numeric_value(value: &CellValue) -> bool {
    match value {
        CellValue::Number(n) => n.is_finite(),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false)
        }
        _ => false,
    }
}

/// Text matching one of the date-like prefixes, or parseable as a date
pub fn is_date_value(value: &CellValue) -> bool {
    match value {
        CellValue::Text(s) => date_pattern().is_match(s) || parses_as_date(s.trim()),
        _ => false,
    }
}

fn parses_as_date(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(s).is_ok() || DateTime::parse_from_rfc2822(s).is_ok() {
        return true;
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || NAIVE_DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclaredType;

    fn rows_for(column: &str, values: Vec<CellValue>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| Row::new().with(column, v))
            .collect()
    }

    fn texts(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::text(*v)).collect()
    }

    #[test]
    fn six_of_ten_numeric_is_medium() {
        let column = Column::new("mixed", DeclaredType::Varchar);
        let rows = rows_for(
            "mixed",
            texts(&["1", "2", "3", "4", "5", "6", "a", "b", "c", "d"]),
        );

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Numeric);
        assert_eq!(classified.confidence, Confidence::Medium);
        assert_eq!(classified.reason, "60% numeric values (data analysis)");
    }

    #[test]
    fn nine_of_ten_numeric_is_high() {
        let column = Column::new("mixed", DeclaredType::Varchar);
        let rows = rows_for(
            "mixed",
            texts(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "n/a"]),
        );

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Numeric);
        assert_eq!(classified.confidence, Confidence::High);
    }

    #[test]
    fn content_overrides_declared_type() {
        let column = Column::new("code", DeclaredType::Varchar);
        let values: Vec<String> = (1..=10).map(|i| i.to_string()).collect();
        let rows = rows_for("code", values.into_iter().map(CellValue::Text).collect());

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Numeric);
        assert_eq!(classified.confidence, Confidence::High);
    }

    #[test]
    fn empty_sample_is_unknown_regardless_of_type() {
        for declared in [DeclaredType::Integer, DeclaredType::Varchar, DeclaredType::Date] {
            let column = Column::new("empty", declared);
            let rows = rows_for("empty", vec![CellValue::Null, CellValue::text(""), CellValue::Null]);

            let classified = classify(&column, &rows);
            assert_eq!(classified.role, ColumnRole::Unknown);
            assert_eq!(classified.confidence, Confidence::Low);
        }

        let classified = classify(&Column::new("nothing", DeclaredType::Integer), &[]);
        assert_eq!(classified.role, ColumnRole::Unknown);
    }

    #[test]
    fn only_first_ten_rows_are_sampled() {
        let column = Column::new("v", DeclaredType::Varchar);
        let mut values = texts(&["x"; 10]);
        values.extend((0..50).map(|i| CellValue::Number(i as f64)));
        let rows = rows_for("v", values);

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Categorical);
        assert_eq!(classified.confidence, Confidence::Medium);
    }

    #[test]
    fn date_like_strings_are_dates() {
        let column = Column::new("day", DeclaredType::Varchar);
        let rows = rows_for(
            "day",
            texts(&["2023-01-01", "1/2/2023", "Jan 3, 2023", "2023-01-04T10:00:00Z"]),
        );

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Date);
        assert_eq!(classified.confidence, Confidence::High);
    }

    #[test]
    fn some_numeric_content_is_low_confidence_numeric() {
        let column = Column::new("notes", DeclaredType::Varchar);
        let rows = rows_for("notes", texts(&["12", "apple", "pear", "plum"]));

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Numeric);
        assert_eq!(classified.confidence, Confidence::Low);
        assert_eq!(classified.reason, "1 numeric values found (25%) (data analysis)");
    }

    #[test]
    fn declared_type_breaks_ties_without_numeric_signal() {
        let column = Column::new("name", DeclaredType::Varchar);
        let rows = rows_for("name", texts(&["John", "Jane", "Bob"]));

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Categorical);
        assert_eq!(classified.confidence, Confidence::Medium);
        assert_eq!(classified.reason, "Database type: varchar");
    }

    #[test]
    fn booleans_fall_through_to_low_categorical() {
        let column = Column::new("active", DeclaredType::Boolean);
        let rows = rows_for("active", vec![CellValue::Bool(true), CellValue::Bool(false)]);

        let classified = classify(&column, &rows);
        assert_eq!(classified.role, ColumnRole::Categorical);
        assert_eq!(classified.confidence, Confidence::Low);
        assert_eq!(classified.reason, "mixed or text values");
    }

    #[test]
    fn numeric_parsing_edges() {
        assert!(is_numeric_value(&CellValue::text(" 12.5 ")));
        assert!(is_numeric_value(&CellValue::text("-3e2")));
        assert!(!is_numeric_value(&CellValue::text("   ")));
        assert!(!is_numeric_value(&CellValue::text("inf")));
        assert!(!is_numeric_value(&CellValue::text("NaN")));
        assert!(!is_numeric_value(&CellValue::Number(f64::INFINITY)));
        assert!(!is_numeric_value(&CellValue::Bool(true)));
    }

    #[test]
    fn classification_is_deterministic() {
        let column = Column::new("v", DeclaredType::Varchar);
        let rows = rows_for("v", texts(&["1", "x", "2023-01-01", ""]));

        let first = classify(&column, &rows);
        for _ in 0..5 {
            assert_eq!(classify(&column, &rows), first);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Cell formatting for the result grid

use serde::Serialize;
use vitalake_core::{CellValue, ClassifiedColumn, ColumnRole, DeclaredType};

/// Display token for SQL NULL
pub const NULL_TOKEN: &str = "NULL";

/// Strings longer than this are truncated in the grid
pub const MAX_CELL_CHARS: usize = 100;

const TRUNCATED_CHARS: usize = MAX_CELL_CHARS - 3;
const FRACTION_DIGITS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

impl Align {
    /// Alignment for a column: numbers right, booleans centered.
    pub fn for_column(column: &ClassifiedColumn) -> Self {
        match column.column.declared_type {
            DeclaredType::Integer | DeclaredType::Float => Self::Right,
            DeclaredType::Boolean => Self::Center,
            _ if column.role == ColumnRole::Numeric => Self::Right,
            _ => Self::Left,
        }
    }

    fn for_value(value: &CellValue) -> Self {
        match value {
            CellValue::Number(_) => Self::Right,
            CellValue::Bool(_) => Self::Center,
            _ => Self::Left,
        }
    }
}

/// What a single grid cell shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDisplay {
    pub text: String,
    /// Full value when `text` was truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub align: Align,
}

/// Formats a value on its own, aligning by the value's kind.
pub fn format_cell(value: &CellValue) -> CellDisplay {
    let (text, title) = match value {
        CellValue::Null => (NULL_TOKEN.to_string(), None),
        CellValue::Bool(true) => ("\u{2713}".to_string(), None),
        CellValue::Bool(false) => ("\u{2717}".to_string(), None),
        CellValue::Number(n) => (format_number(*n), None),
        CellValue::Text(s) => truncate(s),
    };
    CellDisplay {
        text,
        title,
        align: Align::for_value(value),
    }
}

/// Formats a value inside a known column; alignment follows the column.
pub fn format_cell_in(column: &ClassifiedColumn, value: &CellValue) -> CellDisplay {
    CellDisplay {
        align: Align::for_column(column),
        ..format_cell(value)
    }
}

/// Integers get thousands separators; anything else is rounded to four
/// decimals with trailing zeros dropped.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 {
        return group_thousands(&format!("{n:.0}"));
    }

    let fixed = format!("{n:.prec$}", prec = FRACTION_DIGITS);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) if rest != "0" => ("-", rest),
        Some(rest) => ("", rest),
        None => ("", digits),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(value: &str) -> (String, Option<String>) {
    if value.chars().count() <= MAX_CELL_CHARS {
        return (value.to_string(), None);
    }
    let mut text: String = value.chars().take(TRUNCATED_CHARS).collect();
    text.push_str("...");
    (text, Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalake_core::{Column, Confidence};

    fn classified(declared_type: DeclaredType, role: ColumnRole) -> ClassifiedColumn {
        ClassifiedColumn {
            column: Column::new("c", declared_type),
            role,
            confidence: Confidence::High,
            reason: String::new(),
        }
    }

    #[test]
    fn null_and_booleans() {
        assert_eq!(format_cell(&CellValue::Null).text, "NULL");
        assert_eq!(format_cell(&CellValue::Bool(true)).text, "✓");
        assert_eq!(format_cell(&CellValue::Bool(false)).text, "✗");
        assert_eq!(format_cell(&CellValue::Bool(false)).align, Align::Center);
    }

    #[test]
    fn integers_are_grouped() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1234.0), "1,234");
        assert_eq!(format_number(-1234567.0), "-1,234,567");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn fractions_are_rounded_and_trimmed() {
        assert_eq!(format_number(3.14159265), "3.1416");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.00001), "1");
        assert_eq!(format_number(-0.00001), "0");
        assert_eq!(format_number(1234.5), "1234.5");
    }

    #[test]
    fn long_strings_are_truncated_with_title() {
        let long = "x".repeat(150);
        let display = format_cell(&CellValue::text(long.clone()));
        assert_eq!(display.text.chars().count(), 100);
        assert!(display.text.ends_with("..."));
        assert_eq!(display.title, Some(long));

        let exact = "y".repeat(100);
        let display = format_cell(&CellValue::text(exact.clone()));
        assert_eq!(display.text, exact);
        assert_eq!(display.title, None);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(120);
        let display = format_cell(&CellValue::text(long));
        assert_eq!(display.text.chars().count(), 100);
    }

    #[test]
    fn column_alignment() {
        assert_eq!(
            Align::for_column(&classified(DeclaredType::Float, ColumnRole::Numeric)),
            Align::Right
        );
        assert_eq!(
            Align::for_column(&classified(DeclaredType::Boolean, ColumnRole::Categorical)),
            Align::Center
        );
        assert_eq!(
            Align::for_column(&classified(DeclaredType::Varchar, ColumnRole::Numeric)),
            Align::Right
        );
        assert_eq!(
            Align::for_column(&classified(DeclaredType::Date, ColumnRole::Date)),
            Align::Left
        );

        // Text that happens to be numeric still aligns with its column
        let column = classified(DeclaredType::Varchar, ColumnRole::Categorical);
        assert_eq!(format_cell_in(&column, &CellValue::Number(5.0)).align, Align::Left);
    }
}

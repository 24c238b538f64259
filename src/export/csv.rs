// SPDX-License-Identifier: Apache-2.0

use ::csv::{Writer, WriterBuilder};
use vitalake_core::{CellValue, Column, EngineError, EngineResult, Row};

use crate::export::ExportWriter;

/// RFC 4180 CSV. NULL is written as an empty field.
pub struct CsvWriter {
    writer: Writer<Vec<u8>>,
    include_headers: bool,
}

impl CsvWriter {
    pub fn new(include_headers: bool) -> Self {
        Self {
            writer: WriterBuilder::new().from_writer(Vec::new()),
            include_headers,
        }
    }

    fn format_value(value: Option<&CellValue>) -> String {
        match value {
            None | Some(CellValue::Null) => String::new(),
            Some(value) => value.to_filter_value().unwrap_or_default(),
        }
    }
}

fn csv_error(e: ::csv::Error) -> EngineError {
    EngineError::internal(format!("CSV export failed: {}", e))
}

impl ExportWriter for CsvWriter {
    fn write_header(&mut self, columns: &[Column]) -> EngineResult<()> {
        if !self.include_headers || columns.is_empty() {
            return Ok(());
        }
        self.writer
            .write_record(columns.iter().map(|c| c.name.as_str()))
            .map_err(csv_error)
    }

    fn write_row(&mut self, columns: &[Column], row: &Row) -> EngineResult<()> {
        self.writer
            .write_record(columns.iter().map(|c| Self::format_value(row.get(&c.name))))
            .map_err(csv_error)
    }

    fn finish(self: Box<Self>) -> EngineResult<Vec<u8>> {
        self.writer
            .into_inner()
            .map_err(|e| EngineError::internal(format!("CSV export failed: {}", e.error())))
    }
}

#[cfg(test)]
mod tests {
    use crate::export::tests::sample;
    use crate::export::{export_string, ExportFormat, ExportOptions};

    #[test]
    fn quotes_fields_that_need_it() {
        let csv = export_string(&sample(), &ExportOptions::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,note");
        assert_eq!(lines[1], "1,plain");
        assert_eq!(lines[2], r#"2,"has, comma ""and quotes""""#);
        assert_eq!(lines[3], "3,");
    }

    #[test]
    fn headers_can_be_skipped() {
        let options = ExportOptions {
            format: ExportFormat::Csv,
            include_headers: false,
        };
        let csv = export_string(&sample(), &options).unwrap();
        assert!(csv.starts_with("1,plain"));
    }
}

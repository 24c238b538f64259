// SPDX-License-Identifier: Apache-2.0

use vitalake_core::{CellValue, Column, EngineError, EngineResult, Row};

use crate::export::ExportWriter;

/// JSON array of row objects, keys in column order
pub struct JsonWriter {
    buffer: Vec<u8>,
    rows: u64,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            rows: 0,
        }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn json_error(e: serde_json::Error) -> EngineError {
    EngineError::internal(format!("JSON export failed: {}", e))
}

impl ExportWriter for JsonWriter {
    fn write_header(&mut self, _columns: &[Column]) -> EngineResult<()> {
        self.buffer.push(b'[');
        Ok(())
    }

    fn write_row(&mut self, columns: &[Column], row: &Row) -> EngineResult<()> {
        if self.rows > 0 {
            self.buffer.push(b',');
        }
        self.buffer.push(b'{');
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.buffer.push(b',');
            }
            serde_json::to_writer(&mut self.buffer, &column.name).map_err(json_error)?;
            self.buffer.push(b':');
            let value = row.get(&column.name).unwrap_or(&CellValue::Null);
            serde_json::to_writer(&mut self.buffer, value).map_err(json_error)?;
        }
        self.buffer.push(b'}');
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> EngineResult<Vec<u8>> {
        self.buffer.push(b']');
        Ok(self.buffer)
    }
}

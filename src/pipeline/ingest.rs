use std::collections::HashMap;
use csv::{ReaderBuilder, Trim};
use crate::pipeline::error::PipelineError;

/// One data row: column name to cell value
pub type Row = HashMap<String, String>;

/// A parsed upload: header names in file order plus the data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl CsvUpload {
    /// Parse comma-separated content with a header row.
    ///
    /// Records may be shorter or longer than the header: missing trailing cells
    /// are simply absent from the row and extra cells are dropped. Header names
    /// are trimmed, cell values are kept as written.
    pub fn parse(content: &[u8]) -> Result<Self, PipelineError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(content);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| PipelineError::Parse(format!("could not read header row: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(PipelineError::Parse("file has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                PipelineError::Parse(format!("could not read row {}: {}", index + 1, e))
            })?;

            let mut row = Row::with_capacity(headers.len());
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header.clone(), value.to_string());
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(PipelineError::Parse("file has no data rows".to_string()));
        }

        log::debug!("Parsed CSV upload: {} columns, {} rows", headers.len(), rows.len());
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

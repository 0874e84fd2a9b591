use std::io::{Read, Write};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use crate::models::{Reason, ValidationResult};
use crate::pipeline::error::PipelineError;

/// Column names of an exported result file, in order
pub const EXPORT_HEADERS: [&str; 4] = ["Email", "Name", "Valid", "Reason"];

/// Which results to include in an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFilter {
    #[default]
    All,
    Valid,
    Invalid,
}

impl ResultFilter {
    pub fn matches(&self, result: &ValidationResult) -> bool {
        match self {
            ResultFilter::All => true,
            ResultFilter::Valid => result.is_valid,
            ResultFilter::Invalid => !result.is_valid,
        }
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Valid")]
    valid: &'static str,
    #[serde(rename = "Reason")]
    reason: &'static str,
}

#[derive(Deserialize)]
struct ImportRow {
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Valid")]
    valid: String,
    #[serde(rename = "Reason", default)]
    reason: String,
}

/// Write results as CSV with the columns `Email, Name, Valid, Reason`.
///
/// `Valid` is `Yes` or `No`; a missing name or reason is written as an empty
/// cell. Rows keep their input order. Fields are quoted only when needed.
pub fn write_results<W: Write>(
    results: &[ValidationResult],
    filter: ResultFilter,
    writer: W,
) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(writer);

    // Header is written explicitly so an empty export still has one
    csv_writer.write_record(EXPORT_HEADERS)?;
    for result in results.iter().filter(|r| filter.matches(r)) {
        csv_writer.serialize(ExportRow {
            email: &result.email,
            name: result.name.as_deref().unwrap_or(""),
            valid: if result.is_valid { "Yes" } else { "No" },
            reason: result.reason.map(|r| r.as_str()).unwrap_or(""),
        })?;
    }

    csv_writer.flush().context("Failed to write CSV export")?;
    Ok(())
}

/// Export to an in-memory string
pub fn to_csv_string(results: &[ValidationResult], filter: ResultFilter) -> Result<String> {
    let mut buffer = Vec::new();
    write_results(results, filter, &mut buffer)?;
    String::from_utf8(buffer).context("CSV export is not valid UTF-8")
}

/// Read a file produced by [`write_results`] back into results.
///
/// Empty `Name` and `Reason` cells come back as unset.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ValidationResult>, PipelineError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut results = Vec::new();
    for (index, row) in csv_reader.deserialize::<ImportRow>().enumerate() {
        let line = index + 2;
        let row = row.map_err(|e| PipelineError::Parse(format!("row {}: {}", line, e)))?;

        let is_valid = match row.valid.as_str() {
            "Yes" => true,
            "No" => false,
            other => {
                return Err(PipelineError::Parse(format!(
                    "row {}: Valid must be Yes or No, got '{}'",
                    line, other
                )))
            }
        };

        let reason = if row.reason.is_empty() {
            None
        } else {
            Some(Reason::from_str(&row.reason).ok_or_else(|| {
                PipelineError::Parse(format!("row {}: unknown reason '{}'", line, row.reason))
            })?)
        };

        results.push(ValidationResult {
            email: row.email,
            name: if row.name.is_empty() { None } else { Some(row.name) },
            is_valid,
            reason,
        });
    }

    Ok(results)
}

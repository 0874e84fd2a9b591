//! Email validation pipeline
//!
//! An upload flows through these stages:
//!
//! 1. [`ingest`] parses the CSV into headers and rows
//! 2. [`mapping`] picks the email (and optional name) column
//! 3. [`batch`] walks the rows in order, running each mapped email through the
//!    [`validator`] (syntax gate, then an MX lookup through [`dns`])
//! 4. [`export`] turns results back into CSV
//!
//! Rejections are ordinary [`ValidationResult`](crate::models::ValidationResult)
//! values. Only unreadable files, bad mappings and unexpected failures are
//! errors, see [`error`].

pub mod batch;
pub mod dns;
pub mod error;
pub mod export;
pub mod ingest;
pub mod mapping;
pub mod validator;

pub use batch::{BatchReport, BatchRun, NoProgress, Persist, Persistence, Progress, ProgressSink, RunState};
pub use dns::{DohResolver, MxLookup, MxRecord};
pub use error::{LookupError, PipelineError, RequiredField, ValidationConfigError};
pub use export::{read_results, to_csv_string, write_results, ResultFilter};
pub use ingest::{CsvUpload, Row};
pub use mapping::ColumnMapping;
pub use validator::EmailValidator;

use std::fmt;
use anyhow::Context;
use uuid::Uuid;
use crate::models::{EmailList, ListSummary, ValidationResult};
use crate::pipeline::dns::MxLookup;
use crate::pipeline::error::PipelineError;
use crate::pipeline::ingest::CsvUpload;
use crate::pipeline::mapping::ColumnMapping;
use crate::pipeline::validator::EmailValidator;
use crate::repo::ListStore;
use crate::session::Session;

/// Lifecycle of one batch run
///
/// `Idle -> MappingPending -> Processing -> Completed | Failed`. A completed or
/// failed run can be loaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    MappingPending,
    Processing,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::MappingPending => "waiting for a column mapping",
            RunState::Processing => "processing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows finished so far out of all rows in the upload, skipped rows included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

/// Receives a progress update after every row.
///
/// An error from the sink is unexpected and aborts the batch.
pub trait ProgressSink {
    fn publish(&mut self, progress: Progress) -> anyhow::Result<()>;
}

/// Records every update, in order
impl ProgressSink for Vec<Progress> {
    fn publish(&mut self, progress: Progress) -> anyhow::Result<()> {
        self.push(progress);
        Ok(())
    }
}

/// Discards updates
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn publish(&mut self, _progress: Progress) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Where a finished batch is saved, if a user is signed in
#[derive(Clone, Copy)]
pub struct Persist<'a> {
    pub store: &'a dyn ListStore,
    pub session: &'a Session,
}

/// What happened to the finished batch on the storage side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Saved { id: i64, created_ts: i64 },
    /// No signed-in user, nothing was written
    NoSession,
    /// The store rejected the write; the results are still valid
    Failed(String),
}

/// Outcome of a completed batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub list_name: String,
    pub results: Vec<ValidationResult>,
    pub summary: ListSummary,
    pub persistence: Persistence,
}

/// Handle for one upload-map-validate cycle.
///
/// The handle owns the parsed upload and the run state; callers pass it
/// around explicitly instead of sharing any global "processing" flag.
#[derive(Debug)]
pub struct BatchRun {
    run_id: Uuid,
    state: RunState,
    upload: Option<CsvUpload>,
}

impl Default for BatchRun {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
            upload: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Parsed upload while a mapping is pending
    pub fn upload(&self) -> Option<&CsvUpload> {
        self.upload.as_ref()
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.upload.as_ref().map(|u| u.headers.as_slice())
    }

    /// Parse an uploaded file and wait for a mapping.
    ///
    /// On a parse error the run goes back to `Idle` and nothing is kept.
    pub fn load(&mut self, content: &[u8]) -> Result<&CsvUpload, PipelineError> {
        if self.state == RunState::Processing {
            return Err(PipelineError::InvalidState {
                action: "load a new file",
                state: self.state,
            });
        }

        self.run_id = Uuid::new_v4();
        self.upload = None;
        self.state = RunState::Idle;

        let upload = CsvUpload::parse(content)?;
        log::debug!(
            "Run {}: loaded {} rows with columns [{}]",
            self.run_id,
            upload.len(),
            upload.headers.join(", ")
        );
        self.state = RunState::MappingPending;
        Ok(&*self.upload.insert(upload))
    }

    /// Validate every mapped row in order, one at a time.
    ///
    /// Rows with an empty email are skipped. Progress is published after each
    /// row. When `persist` is given the finished list is stored; a storage
    /// failure is reported in the returned [`Persistence`] and does not discard
    /// the results.
    pub async fn process<L: MxLookup>(
        &mut self,
        mapping: &ColumnMapping,
        list_name: &str,
        validator: &EmailValidator<L>,
        progress: &mut dyn ProgressSink,
        persist: Option<Persist<'_>>,
    ) -> Result<BatchReport, PipelineError> {
        if self.state != RunState::MappingPending {
            return Err(PipelineError::InvalidState {
                action: "start processing",
                state: self.state,
            });
        }

        let headers = self.headers().unwrap_or_default();
        mapping.resolve(headers, list_name)?;

        let Some(upload) = self.upload.take() else {
            return Err(PipelineError::InvalidState {
                action: "start processing",
                state: RunState::Idle,
            });
        };
        self.state = RunState::Processing;
        log::info!(
            "Run {}: validating {} rows for list '{}'",
            self.run_id,
            upload.len(),
            list_name
        );

        let results = match validate_rows(&upload, mapping, validator, progress).await {
            Ok(results) => results,
            Err(e) => {
                self.state = RunState::Failed;
                log::error!("Run {}: batch aborted: {:#}", self.run_id, e);
                return Err(PipelineError::Batch(format!("{:#}", e)));
            }
        };

        let summary = ListSummary::from_results(&results);
        log::info!(
            "Run {}: {} checked, {} valid, {} invalid",
            self.run_id,
            summary.total,
            summary.valid,
            summary.invalid
        );

        let persistence = match persist {
            Some(target) => save(target, list_name, &results, self.run_id),
            None => Persistence::NoSession,
        };

        self.state = RunState::Completed;
        Ok(BatchReport {
            run_id: self.run_id,
            list_name: list_name.to_string(),
            results,
            summary,
            persistence,
        })
    }
}

async fn validate_rows<L: MxLookup>(
    upload: &CsvUpload,
    mapping: &ColumnMapping,
    validator: &EmailValidator<L>,
    progress: &mut dyn ProgressSink,
) -> anyhow::Result<Vec<ValidationResult>> {
    let total = upload.len();
    let mut results = Vec::with_capacity(total);

    for (index, row) in upload.rows.iter().enumerate() {
        if let Some(email) = mapping.email_of(row) {
            let result = validator.validate(email).await.with_name(mapping.name_of(row));
            log::debug!(
                "Row {}: {} -> {}",
                index + 1,
                result.email,
                result.reason.map(|r| r.as_str()).unwrap_or("valid")
            );
            results.push(result);
        }

        progress
            .publish(Progress { completed: index + 1, total })
            .with_context(|| format!("Failed to publish progress after row {}", index + 1))?;
    }

    Ok(results)
}

fn save(target: Persist<'_>, list_name: &str, results: &[ValidationResult], run_id: Uuid) -> Persistence {
    let list = EmailList::new(
        list_name.to_string(),
        target.session.user_id.clone(),
        results.to_vec(),
    );

    match target.store.insert(list) {
        Ok(EmailList { id: Some(id), created_ts, .. }) => {
            log::info!("Run {}: saved list '{}' as id {}", run_id, list_name, id);
            Persistence::Saved { id, created_ts }
        }
        Ok(_) => {
            log::warn!("Run {}: store returned list '{}' without an id", run_id, list_name);
            Persistence::Failed("store did not assign an id".to_string())
        }
        Err(e) => {
            log::warn!("Run {}: failed to save list '{}': {:#}", run_id, list_name, e);
            Persistence::Failed(format!("{:#}", e))
        }
    }
}

use serde::{Deserialize, Serialize};
use crate::models::{ListSummary, ValidationResult};

/// A named, persisted batch of validation results.
///
/// Counts are derived from `results` at construction, so
/// `valid_emails + invalid_emails == total_emails == results.len()` holds for
/// every list built through [`EmailList::new`]. Lists are never updated after
/// insert, only deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailList {
    pub id: Option<i64>,
    pub name: String,
    pub user_id: String,
    pub total_emails: i64,
    pub valid_emails: i64,
    pub invalid_emails: i64,
    pub created_ts: i64,
    pub results: Vec<ValidationResult>,
}

impl EmailList {
    /// Create a new, not yet stored list
    pub fn new(name: String, user_id: String, results: Vec<ValidationResult>) -> Self {
        let summary = ListSummary::from_results(&results);
        Self {
            id: None,
            name,
            user_id,
            total_emails: summary.total as i64,
            valid_emails: summary.valid as i64,
            invalid_emails: summary.invalid as i64,
            created_ts: chrono::Utc::now().timestamp(),
            results,
        }
    }

    pub fn summary(&self) -> ListSummary {
        ListSummary {
            total: self.total_emails as usize,
            valid: self.valid_emails as usize,
            invalid: self.invalid_emails as usize,
        }
    }
}

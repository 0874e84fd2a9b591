use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{EmailList, ValidationResult};
use anyhow::{Context, Result};

/// Persistence contract for named validation lists.
///
/// Batch processing only talks to this trait; [`Connection`] implements it on
/// top of [`EmailListRepo`].
pub trait ListStore {
    /// Store a list, returning it with `id` and `created_ts` assigned
    fn insert(&self, list: EmailList) -> Result<EmailList>;

    /// All lists belonging to a user, newest first
    fn list_by_user(&self, user_id: &str) -> Result<Vec<EmailList>>;

    fn get_by_id(&self, id: i64) -> Result<Option<EmailList>>;

    /// Delete a list. Deleting an id that does not exist is not an error.
    fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// Email list repository for database operations
///
/// # Example
///
/// ```no_run
/// use mxsift::config::Config;
/// use mxsift::db::DbConnection;
/// use mxsift::models::{EmailList, ValidationResult};
/// use mxsift::repo::EmailListRepo;
///
/// let conn = DbConnection::connect(&Config::load().unwrap()).unwrap();
/// let list = EmailList::new(
///     "newsletter".to_string(),
///     "alice".to_string(),
///     vec![ValidationResult::valid("a@example.com")],
/// );
/// let saved = EmailListRepo::create(&conn, list).unwrap();
/// ```
pub struct EmailListRepo;

const SELECT_COLUMNS: &str =
    "SELECT id, name, user_id, total_emails, valid_emails, invalid_emails, results_json, created_ts
     FROM email_lists";

impl EmailListRepo {
    /// Insert a new list
    pub fn create(conn: &Connection, list: EmailList) -> Result<EmailList> {
        let now = chrono::Utc::now().timestamp();
        let results_json = serde_json::to_string(&list.results)
            .context("Failed to serialize validation results")?;

        conn.execute(
            "INSERT INTO email_lists (name, user_id, total_emails, valid_emails, invalid_emails, results_json, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                list.name,
                list.user_id,
                list.total_emails,
                list.valid_emails,
                list.invalid_emails,
                results_json,
                now,
            ],
        )
        .with_context(|| format!("Failed to create email list: {}", list.name))?;

        let id = conn.last_insert_rowid();
        Ok(EmailList {
            id: Some(id),
            created_ts: now,
            ..list
        })
    }

    /// Get list by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<EmailList>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;

        let raw = stmt.query_row([id], RawList::from_row).optional()?;

        raw.map(RawList::into_list).transpose()
    }

    /// List a user's lists, newest first
    pub fn list_by_user(conn: &Connection, user_id: &str) -> Result<Vec<EmailList>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_ts DESC, id DESC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([user_id], RawList::from_row)?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(row?.into_list()?);
        }

        Ok(lists)
    }

    /// Delete a list by ID, returning how many rows were removed
    pub fn delete(conn: &Connection, id: i64) -> Result<usize> {
        let deleted = conn
            .execute("DELETE FROM email_lists WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete email list {}", id))?;
        Ok(deleted)
    }
}

impl ListStore for Connection {
    fn insert(&self, list: EmailList) -> Result<EmailList> {
        EmailListRepo::create(self, list)
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<EmailList>> {
        EmailListRepo::list_by_user(self, user_id)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<EmailList>> {
        EmailListRepo::get_by_id(self, id)
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        let deleted = EmailListRepo::delete(self, id)?;
        if deleted == 0 {
            log::debug!("Delete of email list {} matched no rows", id);
        }
        Ok(())
    }
}

/// Row as stored, before the results JSON is decoded
struct RawList {
    id: i64,
    name: String,
    user_id: String,
    total_emails: i64,
    valid_emails: i64,
    invalid_emails: i64,
    results_json: String,
    created_ts: i64,
}

impl RawList {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawList {
            id: row.get(0)?,
            name: row.get(1)?,
            user_id: row.get(2)?,
            total_emails: row.get(3)?,
            valid_emails: row.get(4)?,
            invalid_emails: row.get(5)?,
            results_json: row.get(6)?,
            created_ts: row.get(7)?,
        })
    }

    fn into_list(self) -> Result<EmailList> {
        let results: Vec<ValidationResult> = serde_json::from_str(&self.results_json)
            .with_context(|| format!("Failed to decode results of email list {}", self.id))?;
        Ok(EmailList {
            id: Some(self.id),
            name: self.name,
            user_id: self.user_id,
            total_emails: self.total_emails,
            valid_emails: self.valid_emails,
            invalid_emails: self.invalid_emails,
            created_ts: self.created_ts,
            results,
        })
    }
}

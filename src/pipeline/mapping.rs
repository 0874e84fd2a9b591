use crate::pipeline::error::{RequiredField, ValidationConfigError};
use crate::pipeline::ingest::Row;

/// Which uploaded columns hold the email address and, optionally, a name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub email: String,
    pub name: Option<String>,
}

impl ColumnMapping {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name: name.filter(|n| !n.is_empty()),
        }
    }

    /// Check the mapping and list name against the uploaded headers.
    ///
    /// The email column and the list name must both be non-empty, and every
    /// mapped column must exist in `headers`.
    pub fn resolve(&self, headers: &[String], list_name: &str) -> Result<(), ValidationConfigError> {
        if self.email.is_empty() {
            return Err(ValidationConfigError::Missing(RequiredField::EmailColumn));
        }
        if list_name.trim().is_empty() {
            return Err(ValidationConfigError::Missing(RequiredField::ListName));
        }

        let columns = std::iter::once(&self.email).chain(self.name.as_ref());
        for column in columns {
            if !headers.iter().any(|h| h == column) {
                return Err(ValidationConfigError::UnknownColumn {
                    column: column.clone(),
                    available: headers.to_vec(),
                });
            }
        }

        Ok(())
    }

    /// The mapped email value of a row, or `None` when missing or empty
    pub fn email_of<'a>(&self, row: &'a Row) -> Option<&'a str> {
        row.get(&self.email)
            .map(String::as_str)
            .filter(|email| !email.is_empty())
    }

    /// The mapped name value of a row; unset when no name column is mapped
    pub fn name_of(&self, row: &Row) -> Option<String> {
        self.name
            .as_ref()
            .and_then(|column| row.get(column))
            .cloned()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an address was rejected.
///
/// Serialized as the literal strings shown to users, which are also the
/// strings that appear in the exported `Reason` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "Invalid format")]
    InvalidFormat,
    #[serde(rename = "Invalid domain")]
    InvalidDomain,
    #[serde(rename = "Domain verification failed")]
    DomainVerificationFailed,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::InvalidFormat => "Invalid format",
            Reason::InvalidDomain => "Invalid domain",
            Reason::DomainVerificationFailed => "Domain verification failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Invalid format" => Some(Reason::InvalidFormat),
            "Invalid domain" => Some(Reason::InvalidDomain),
            "Domain verification failed" => Some(Reason::DomainVerificationFailed),
            _ => None,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one address.
///
/// A rejected address is a normal value here, never an error. The JSON shape
/// (`email`, `name?`, `isValid`, `reason?`) is what gets stored with a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl ValidationResult {
    pub fn valid(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(email: impl Into<String>, reason: Reason) -> Self {
        Self {
            email: email.into(),
            name: None,
            is_valid: false,
            reason: Some(reason),
        }
    }

    pub fn with_name(self, name: Option<String>) -> Self {
        Self { name, ..self }
    }
}

/// Valid/invalid counts over a result sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl ListSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let valid = results.iter().filter(|r| r.is_valid).count();
        Self {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_round_trip() {
        for reason in [Reason::InvalidFormat, Reason::InvalidDomain, Reason::DomainVerificationFailed] {
            assert_eq!(Reason::from_str(reason.as_str()), Some(reason));
        }
        assert_eq!(Reason::from_str("Bounced"), None);
    }

    #[test]
    fn test_result_json_shape() {
        let result = ValidationResult::invalid("bad", Reason::InvalidFormat);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({
            "email": "bad",
            "isValid": false,
            "reason": "Invalid format",
        }));

        let named = ValidationResult::valid("a@example.com").with_name(Some("Ann".to_string()));
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(json, serde_json::json!({
            "email": "a@example.com",
            "name": "Ann",
            "isValid": true,
        }));
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            ValidationResult::valid("a@example.com"),
            ValidationResult::invalid("b", Reason::InvalidFormat),
            ValidationResult::invalid("c@nowhere.test", Reason::InvalidDomain),
        ];
        let summary = ListSummary::from_results(&results);
        assert_eq!(summary, ListSummary { total: 3, valid: 1, invalid: 2 });
        assert_eq!(ListSummary::from_results(&[]), ListSummary::default());
    }
}

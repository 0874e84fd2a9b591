use once_cell::sync::Lazy;
use regex::Regex;
use crate::models::{Reason, ValidationResult};
use crate::pipeline::dns::MxLookup;

/// `local@domain.tld` with no whitespace and exactly one `@`
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Syntax gate
pub fn is_well_formed(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Everything after the first `@`
pub fn domain_of(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, domain)| domain)
}

/// Validates single addresses: syntax first, then an MX lookup of the domain.
///
/// The first failing gate decides the outcome. Every call does its own lookup;
/// nothing is cached between addresses.
pub struct EmailValidator<L> {
    lookup: L,
}

impl<L: MxLookup> EmailValidator<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn validate(&self, email: &str) -> ValidationResult {
        if !is_well_formed(email) {
            return ValidationResult::invalid(email, Reason::InvalidFormat);
        }

        let Some(domain) = domain_of(email) else {
            return ValidationResult::invalid(email, Reason::InvalidFormat);
        };

        match self.lookup.lookup_mx(domain).await {
            Ok(records) if !records.is_empty() => ValidationResult::valid(email),
            Ok(_) => ValidationResult::invalid(email, Reason::InvalidDomain),
            Err(e) => {
                log::warn!("Domain verification failed for {}: {}", domain, e);
                ValidationResult::invalid(email, Reason::DomainVerificationFailed)
            }
        }
    }
}

use std::time::Duration;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use crate::pipeline::error::LookupError;

/// DNS record type number for MX
pub const MX_RECORD_TYPE: u16 = 15;

/// One mail-exchange answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub name: String,
    pub data: String,
}

/// Source of MX answers for a domain.
///
/// An `Ok` with an empty vector means the lookup worked and the domain has no
/// mail exchangers. `Err` means the lookup itself did not complete.
#[async_trait]
pub trait MxLookup: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError>;
}

/// JSON body of a DNS-over-HTTPS answer (`application/dns-json`)
#[derive(Debug, Deserialize)]
pub struct DohResponse {
    #[serde(rename = "Status", default)]
    pub status: Option<u32>,
    #[serde(rename = "Answer", default)]
    pub answer: Option<Vec<DohAnswer>>,
}

#[derive(Debug, Deserialize)]
pub struct DohAnswer {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: u16,
    #[serde(default)]
    pub data: String,
}

impl DohResponse {
    /// MX records in the answer section; other record types are ignored
    pub fn mx_records(self) -> Vec<MxRecord> {
        self.answer
            .unwrap_or_default()
            .into_iter()
            .filter(|a| a.record_type == MX_RECORD_TYPE)
            .map(|a| MxRecord { name: a.name, data: a.data })
            .collect()
    }
}

/// Resolver that asks a DNS-over-HTTPS JSON endpoint
/// (`GET <endpoint>?name=<domain>&type=MX`)
pub struct DohResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl DohResolver {
    /// Build a resolver. Without a timeout the HTTP client's default applies.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("mxsift/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MxLookup for DohResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError> {
        log::debug!("MX lookup for {} via {}", domain, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", domain), ("type", "MX")])
            .header("Accept", "application/dns-json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: DohResponse = serde_json::from_str(&body)
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        if let Some(code) = parsed.status {
            log::debug!("MX lookup for {} returned DNS status {}", domain, code);
        }

        Ok(parsed.mx_records())
    }
}

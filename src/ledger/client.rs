use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::Identifiable;

/// A customer that bills are raised against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// GSTIN or other tax registration number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Creates an unsaved client; the ledger assigns the identifier on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            company: None,
            contact: None,
            email: None,
            address: None,
            gst: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_gst(mut self, gst: impl Into<String>) -> Self {
        self.gst = Some(gst.into());
        self
    }

    /// Case-insensitive match against name, company, and tax id. `needle` must
    /// already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        [Some(&self.name), self.company.as_ref(), self.gst.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Identifiable for Client {
    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_name_company_and_gst() {
        let client = Client::new("Ravi Logistics")
            .with_company("Ravi & Sons")
            .with_gst("29ABCDE1234F1Z5");
        assert!(client.matches("logistics"));
        assert!(client.matches("sons"));
        assert!(client.matches("abcde"));
        assert!(!client.matches("acme"));
        assert!(client.matches(""));
    }
}

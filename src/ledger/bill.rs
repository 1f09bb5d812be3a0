//! Bills and their service line items.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Amount;
use crate::errors::BillingError;

use super::common::{Amounted, Identifiable};

/// A single transport job billed on a bill: vehicle, route, and charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub vehicle: String,
    #[serde(alias = "from")]
    pub origin: String,
    #[serde(alias = "to")]
    pub destination: String,
    pub amount: Amount,
}

impl Service {
    pub fn new(
        vehicle: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            vehicle: vehicle.into(),
            origin: origin.into(),
            destination: destination.into(),
            amount,
        }
    }

    pub fn route_label(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

impl Amounted for Service {
    fn amount(&self) -> Amount {
        self.amount
    }
}

/// Persisted payment state of a bill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Unpaid,
    Paid,
    Overdue,
}

impl BillStatus {
    pub const ALL: [BillStatus; 3] = [BillStatus::Unpaid, BillStatus::Paid, BillStatus::Overdue];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Paid => "paid",
            BillStatus::Overdue => "overdue",
        }
    }

    /// Unpaid and overdue bills both still await payment.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, BillStatus::Unpaid | BillStatus::Overdue)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unpaid" => Ok(BillStatus::Unpaid),
            "paid" => Ok(BillStatus::Paid),
            "overdue" => Ok(BillStatus::Overdue),
            other => Err(BillingError::InvalidInput(format!(
                "unknown bill status `{}` (expected unpaid, paid, or overdue)",
                other
            ))),
        }
    }
}

/// An invoice raised against a client.
///
/// `amount` is a snapshot of the service total taken when the bill was saved
/// and `client_name` is the client's display name at that moment; neither is
/// recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bill {
    pub id: u64,
    pub client_id: u64,
    #[serde(alias = "client")]
    pub client_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: BillStatus,
    pub amount: Amount,
    pub services: Vec<Service>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Builds an unsaved bill whose amount is the total of `services`.
    pub fn new(
        client_id: u64,
        client_name: impl Into<String>,
        date: NaiveDate,
        status: BillStatus,
        services: Vec<Service>,
    ) -> Self {
        let now = Utc::now();
        let amount = Self::total_of(&services);
        Self {
            id: 0,
            client_id,
            client_name: client_name.into(),
            date,
            status,
            amount,
            services,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_of(services: &[Service]) -> Amount {
        services.iter().map(|service| service.amount).sum()
    }

    /// Replaces the service list and re-snapshots the amount in the same step.
    pub fn replace_services(&mut self, services: Vec<Service>) {
        self.amount = Self::total_of(&services);
        self.services = services;
        self.touch();
    }

    pub fn mark_paid(&mut self) {
        self.status = BillStatus::Paid;
        self.touch();
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillStatus::Paid
    }

    /// Case-insensitive match on bill number or client name. `needle` must
    /// already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.id.to_string().contains(needle)
            || self.client_name.to_lowercase().contains(needle)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for Bill {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Amounted for Bill {
    fn amount(&self) -> Amount {
        self.amount
    }
}

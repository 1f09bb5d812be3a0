use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Amount;

use super::common::{Amounted, Identifiable};

/// Money received against exactly one bill. Payments are never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: u64,
    pub bill_id: u64,
    pub amount: Amount,
    #[serde(alias = "payment_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "payment_mode")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "transaction_id")]
    pub reference: Option<String>,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(bill_id: u64, amount: Amount, date: NaiveDate) -> Self {
        Self {
            id: 0,
            bill_id,
            amount,
            date,
            mode: None,
            reference: None,
            recorded_at: Utc::now(),
        }
    }
}

impl Identifiable for Payment {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Amounted for Payment {
    fn amount(&self) -> Amount {
        self.amount
    }
}

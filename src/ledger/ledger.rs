use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{find_by_id, find_by_id_mut, max_id, remove_by_id};
use super::{bill::Bill, client::Client, payment::Payment};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// The billing book: every client, bill, and payment of one business.
///
/// Identifiers are allocated by the ledger, start at 1, and are never reused
/// after a record is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    next_client_id: u64,
    #[serde(default)]
    next_bill_id: u64,
    #[serde(default)]
    next_payment_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            clients: Vec::new(),
            bills: Vec::new(),
            payments: Vec::new(),
            next_client_id: 1,
            next_bill_id: 1,
            next_payment_id: 1,
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_client(&mut self, mut client: Client) -> u64 {
        let existing = max_id(&self.clients);
        let id = allocate(&mut self.next_client_id, existing);
        client.id = id;
        self.clients.push(client);
        self.touch();
        id
    }

    pub fn client(&self, id: u64) -> Option<&Client> {
        find_by_id(&self.clients, id)
    }

    pub fn client_mut(&mut self, id: u64) -> Option<&mut Client> {
        find_by_id_mut(&mut self.clients, id)
    }

    pub fn remove_client(&mut self, id: u64) -> Option<Client> {
        let removed = remove_by_id(&mut self.clients, id)?;
        self.touch();
        Some(removed)
    }

    pub fn add_bill(&mut self, mut bill: Bill) -> u64 {
        let existing = max_id(&self.bills);
        let id = allocate(&mut self.next_bill_id, existing);
        bill.id = id;
        self.bills.push(bill);
        self.touch();
        id
    }

    pub fn bill(&self, id: u64) -> Option<&Bill> {
        find_by_id(&self.bills, id)
    }

    pub fn bill_mut(&mut self, id: u64) -> Option<&mut Bill> {
        find_by_id_mut(&mut self.bills, id)
    }

    pub fn remove_bill(&mut self, id: u64) -> Option<Bill> {
        let removed = remove_by_id(&mut self.bills, id)?;
        self.touch();
        Some(removed)
    }

    pub fn add_payment(&mut self, mut payment: Payment) -> u64 {
        let existing = max_id(&self.payments);
        let id = allocate(&mut self.next_payment_id, existing);
        payment.id = id;
        self.payments.push(payment);
        self.touch();
        id
    }

    pub fn payments_for_bill(&self, bill_id: u64) -> impl Iterator<Item = &Payment> + '_ {
        self.payments
            .iter()
            .filter(move |payment| payment.bill_id == bill_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Hands out the next identifier, skipping past any id already present so
/// documents written without counters still get fresh ids.
fn allocate(counter: &mut u64, existing_max: Option<u64>) -> u64 {
    let floor = existing_max.map_or(1, |max| max + 1);
    let id = (*counter).max(floor).max(1);
    *counter = id + 1;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Amount;
    use crate::ledger::{BillStatus, Service};
    use chrono::NaiveDate;

    fn sample_bill(client_id: u64) -> Bill {
        Bill::new(
            client_id,
            "Acme",
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            BillStatus::Unpaid,
            vec![Service::new("MH-12", "Pune", "Mumbai", Amount::from_major(900))],
        )
    }

    #[test]
    fn identifiers_are_sequential_and_not_reused() {
        let mut ledger = Ledger::new("Fleet");
        let first = ledger.add_bill(sample_bill(1));
        let second = ledger.add_bill(sample_bill(1));
        assert_eq!((first, second), (1, 2));

        ledger.remove_bill(second).unwrap();
        let third = ledger.add_bill(sample_bill(1));
        assert_eq!(third, 3);
    }

    #[test]
    fn removal_keeps_the_order_of_remaining_records() {
        let mut ledger = Ledger::new("Fleet");
        let ids: Vec<u64> = ["Acme", "Zen", "Ravi"]
            .into_iter()
            .map(|name| ledger.add_client(Client::new(name)))
            .collect();
        assert_eq!(ledger.remove_client(ids[1]).unwrap().name, "Zen");
        assert!(ledger.remove_client(ids[1]).is_none());
        let names: Vec<_> = ledger.clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Ravi"]);
        assert_eq!(max_id(&ledger.clients), Some(ids[2]));
    }

    #[test]
    fn allocation_skips_ids_present_without_counter() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "name": "Legacy",
            "clients": [{"id": 41, "name": "Old Client"}],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let mut ledger: Ledger = serde_json::from_str(json).unwrap();
        assert_eq!(ledger.schema_version, CURRENT_SCHEMA_VERSION);
        let id = ledger.add_client(Client::new("New Client"));
        assert_eq!(id, 42);
    }

    #[test]
    fn payments_for_bill_filters_by_reference() {
        let mut ledger = Ledger::new("Fleet");
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        ledger.add_payment(Payment::new(1, Amount::from_major(10), date));
        ledger.add_payment(Payment::new(2, Amount::from_major(20), date));
        let matched: Vec<_> = ledger.payments_for_bill(2).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].amount, Amount::from_major(20));
    }
}

//! Creation, full-overwrite editing, and status transitions for bills.

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::currency::Amount;
use crate::errors::BillingError;
use crate::ledger::{Bill, BillStatus, Ledger, Service};

use super::{ServiceError, ServiceResult};

/// Form data for a bill. The amount and client name are derived on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    pub client_id: u64,
    pub date: NaiveDate,
    pub status: BillStatus,
    pub services: Vec<Service>,
}

impl BillDraft {
    pub fn new(client_id: u64, date: NaiveDate, services: Vec<Service>) -> Self {
        Self {
            client_id,
            date,
            status: BillStatus::Unpaid,
            services,
        }
    }

    pub fn with_status(mut self, status: BillStatus) -> Self {
        self.status = status;
        self
    }

    pub fn from_bill(bill: &Bill) -> Self {
        Self {
            client_id: bill.client_id,
            date: bill.date,
            status: bill.status,
            services: bill.services.clone(),
        }
    }

    pub fn total(&self) -> Amount {
        Bill::total_of(&self.services)
    }

    /// Checks the draft against the ledger and returns the client name to
    /// snapshot onto the bill.
    fn validate(&mut self, ledger: &Ledger) -> ServiceResult<String> {
        if self.services.is_empty() {
            return Err(ServiceError::Invalid(
                "A bill needs at least one service".into(),
            ));
        }
        for (index, service) in self.services.iter_mut().enumerate() {
            let line = index + 1;
            for (label, field) in [
                ("vehicle", &mut service.vehicle),
                ("from", &mut service.origin),
                ("to", &mut service.destination),
            ] {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    return Err(ServiceError::Invalid(format!(
                        "Service {} is missing `{}`",
                        line, label
                    )));
                }
                *field = trimmed.to_string();
            }
            if service.amount.is_negative() {
                return Err(ServiceError::Invalid(format!(
                    "Service {} has a negative amount",
                    line
                )));
            }
        }
        let client = ledger
            .client(self.client_id)
            .ok_or(BillingError::ClientNotFound(self.client_id))?;
        Ok(client.name.clone())
    }
}

pub struct BillService;

impl BillService {
    pub fn create(ledger: &mut Ledger, mut draft: BillDraft) -> ServiceResult<u64> {
        let client_name = draft.validate(ledger)?;
        let bill = Bill::new(
            draft.client_id,
            client_name,
            draft.date,
            draft.status,
            draft.services,
        );
        let amount = bill.amount;
        let id = ledger.add_bill(bill);
        info!(bill_id = id, amount = %amount, "bill created");
        Ok(id)
    }

    /// Overwrites the bill with the draft, recomputing the amount and
    /// re-capturing the client name in the same step.
    pub fn update(ledger: &mut Ledger, id: u64, mut draft: BillDraft) -> ServiceResult<()> {
        if ledger.bill(id).is_none() {
            return Err(BillingError::BillNotFound(id).into());
        }
        let client_name = draft.validate(ledger)?;
        let bill = ledger.bill_mut(id).ok_or(BillingError::BillNotFound(id))?;
        bill.client_id = draft.client_id;
        bill.client_name = client_name;
        bill.date = draft.date;
        bill.status = draft.status;
        bill.replace_services(draft.services);
        let amount = bill.amount;
        ledger.touch();
        info!(bill_id = id, amount = %amount, "bill updated");
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: u64) -> ServiceResult<Bill> {
        let removed = ledger
            .remove_bill(id)
            .ok_or(BillingError::BillNotFound(id))?;
        info!(bill_id = id, "bill removed");
        Ok(removed)
    }

    pub fn get(ledger: &Ledger, id: u64) -> ServiceResult<&Bill> {
        ledger
            .bill(id)
            .ok_or_else(|| BillingError::BillNotFound(id).into())
    }

    pub fn list(ledger: &Ledger) -> Vec<&Bill> {
        ledger.bills.iter().collect()
    }

    /// Unpaid bills whose `terms_days` have elapsed after the bill date as
    /// of `as_of`. Nothing is changed.
    pub fn overdue_candidates(ledger: &Ledger, as_of: NaiveDate, terms_days: u32) -> Vec<u64> {
        ledger
            .bills
            .iter()
            .filter(|bill| is_past_terms(bill, as_of, terms_days))
            .map(|bill| bill.id)
            .collect()
    }

    /// Marks unpaid bills as overdue once `terms_days` have elapsed after the
    /// bill date as of `as_of`. Returns the ids that changed.
    pub fn sweep_overdue(ledger: &mut Ledger, as_of: NaiveDate, terms_days: u32) -> Vec<u64> {
        let mut changed = Vec::new();
        for bill in ledger
            .bills
            .iter_mut()
            .filter(|bill| is_past_terms(bill, as_of, terms_days))
        {
            bill.status = BillStatus::Overdue;
            bill.touch();
            changed.push(bill.id);
        }
        if !changed.is_empty() {
            ledger.touch();
            info!(count = changed.len(), %as_of, "bills marked overdue");
        }
        changed
    }
}

fn is_past_terms(bill: &Bill, as_of: NaiveDate, terms_days: u32) -> bool {
    // A due date past the calendar's end is never reached.
    bill.status == BillStatus::Unpaid
        && bill
            .date
            .checked_add_days(Days::new(terms_days.into()))
            .is_some_and(|due| due < as_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Client;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(amount: i64) -> Service {
        Service::new("MH-12-AB-1234", "Pune", "Nashik", Amount::from_major(amount))
    }

    fn ledger_with_client() -> (Ledger, u64) {
        let mut ledger = Ledger::new("Bills");
        let id = ledger.add_client(Client::new("Acme Transport"));
        (ledger, id)
    }

    #[test]
    fn create_snapshots_total_and_client_name() {
        let (mut ledger, client) = ledger_with_client();
        let draft = BillDraft::new(client, date(2024, 4, 1), vec![service(100), service(250)]);
        let id = BillService::create(&mut ledger, draft).unwrap();
        let bill = BillService::get(&ledger, id).unwrap();
        assert_eq!(bill.amount, Amount::from_major(350));
        assert_eq!(bill.client_name, "Acme Transport");
        assert_eq!(bill.status, BillStatus::Unpaid);
    }

    #[test]
    fn update_recomputes_amount_and_name() {
        let (mut ledger, client) = ledger_with_client();
        let draft = BillDraft::new(client, date(2024, 4, 1), vec![service(100), service(250)]);
        let id = BillService::create(&mut ledger, draft.clone()).unwrap();

        ledger.client_mut(client).unwrap().name = "Acme Freight".into();
        let edited = BillDraft {
            services: vec![service(400)],
            ..draft
        };
        BillService::update(&mut ledger, id, edited).unwrap();

        let bill = BillService::get(&ledger, id).unwrap();
        assert_eq!(bill.amount, Amount::from_major(400));
        assert_eq!(bill.services.len(), 1);
        assert_eq!(bill.client_name, "Acme Freight");
    }

    #[test]
    fn client_rename_does_not_touch_saved_bills() {
        let (mut ledger, client) = ledger_with_client();
        let id = BillService::create(
            &mut ledger,
            BillDraft::new(client, date(2024, 4, 1), vec![service(10)]),
        )
        .unwrap();
        ledger.client_mut(client).unwrap().name = "Renamed".into();
        assert_eq!(ledger.bill(id).unwrap().client_name, "Acme Transport");
    }

    #[test]
    fn invalid_drafts_leave_ledger_untouched() {
        let (mut ledger, client) = ledger_with_client();
        let empty = BillDraft::new(client, date(2024, 4, 1), Vec::new());
        assert!(BillService::create(&mut ledger, empty).is_err());

        let blank_vehicle = BillDraft::new(
            client,
            date(2024, 4, 1),
            vec![Service::new(" ", "Pune", "Nashik", Amount::from_major(5))],
        );
        let err = BillService::create(&mut ledger, blank_vehicle).unwrap_err();
        assert!(err.to_string().contains("vehicle"));

        let negative = BillDraft::new(
            client,
            date(2024, 4, 1),
            vec![Service::new("V", "A", "B", Amount::from_minor(-1))],
        );
        assert!(BillService::create(&mut ledger, negative).is_err());

        let unknown = BillDraft::new(99, date(2024, 4, 1), vec![service(5)]);
        let err = BillService::create(&mut ledger, unknown).unwrap_err();
        assert!(matches!(err, ServiceError::Core(BillingError::ClientNotFound(99))));

        assert!(ledger.bills.is_empty());
    }

    #[test]
    fn sweep_marks_only_unpaid_bills_past_terms() {
        let (mut ledger, client) = ledger_with_client();
        let old = BillService::create(
            &mut ledger,
            BillDraft::new(client, date(2024, 3, 1), vec![service(10)]),
        )
        .unwrap();
        let recent = BillService::create(
            &mut ledger,
            BillDraft::new(client, date(2024, 3, 25), vec![service(10)]),
        )
        .unwrap();
        let paid = BillService::create(
            &mut ledger,
            BillDraft::new(client, date(2024, 1, 1), vec![service(10)])
                .with_status(BillStatus::Paid),
        )
        .unwrap();

        assert_eq!(
            BillService::overdue_candidates(&ledger, date(2024, 4, 1), 15),
            vec![old]
        );
        let changed = BillService::sweep_overdue(&mut ledger, date(2024, 4, 1), 15);
        assert_eq!(changed, vec![old]);
        assert_eq!(ledger.bill(recent).unwrap().status, BillStatus::Unpaid);
        assert_eq!(ledger.bill(paid).unwrap().status, BillStatus::Paid);

        let changed = BillService::sweep_overdue(&mut ledger, date(2024, 4, 1), 0);
        assert_eq!(changed, vec![recent]);
    }

    #[test]
    fn sweep_tolerates_terms_beyond_the_calendar() {
        let (mut ledger, client) = ledger_with_client();
        let id = BillService::create(
            &mut ledger,
            BillDraft::new(client, date(2024, 1, 1), vec![service(10)]),
        )
        .unwrap();

        let changed = BillService::sweep_overdue(&mut ledger, date(2024, 6, 1), u32::MAX);
        assert!(changed.is_empty());
        assert_eq!(ledger.bill(id).unwrap().status, BillStatus::Unpaid);

        assert!(BillService::overdue_candidates(&ledger, NaiveDate::MAX, u32::MAX).is_empty());
    }
}

use chrono::NaiveDate;
use tracing::info;

use crate::errors::BillingError;
use crate::ledger::{Bill, Ledger, Payment};

use super::{ServiceError, ServiceResult};

/// Optional details captured when a payment is received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub date: NaiveDate,
    pub mode: Option<String>,
    pub reference: Option<String>,
}

impl PaymentDetails {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            mode: None,
            reference: None,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Records full payment of a bill: inserts a payment for the bill amount
    /// and marks the bill paid. Every check runs before the ledger is
    /// touched, so a rejected call leaves it unchanged; callers persist the
    /// result with a single save.
    pub fn record(
        ledger: &mut Ledger,
        bill_id: u64,
        details: PaymentDetails,
    ) -> ServiceResult<u64> {
        let bill = ledger
            .bill(bill_id)
            .ok_or(BillingError::BillNotFound(bill_id))?;
        if bill.is_paid() {
            return Err(ServiceError::Invalid(format!(
                "Bill #{} is already paid",
                bill_id
            )));
        }
        let mut payment = Payment::new(bill_id, bill.amount, details.date);
        payment.mode = clean(details.mode);
        payment.reference = clean(details.reference);
        let amount = payment.amount;

        let payment_id = ledger.add_payment(payment);
        if let Some(bill) = ledger.bill_mut(bill_id) {
            bill.mark_paid();
        }
        info!(bill_id, payment_id, amount = %amount, "payment recorded");
        Ok(payment_id)
    }

    pub fn list(ledger: &Ledger) -> Vec<&Payment> {
        ledger.payments.iter().collect()
    }

    pub fn for_bill(ledger: &Ledger, bill_id: u64) -> Vec<&Payment> {
        ledger.payments_for_bill(bill_id).collect()
    }

    /// The payment that settled `bill`, if any was recorded.
    pub fn settlement<'a>(ledger: &'a Ledger, bill: &Bill) -> Option<&'a Payment> {
        ledger.payments_for_bill(bill.id).last()
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub mod json_backend;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{errors::BillingError, ledger::Ledger};

pub type Result<T> = std::result::Result<T, BillingError>;

/// Abstraction over persistence backends capable of storing ledgers and snapshots.
pub trait StorageBackend: Send + Sync {
    /// Writes the whole ledger under `name`, replacing any previous version.
    fn save(&self, ledger: &Ledger, name: &str) -> Result<PathBuf>;
    fn load(&self, name: &str) -> Result<Ledger>;
    fn list_ledgers(&self) -> Result<Vec<String>>;
    fn delete(&self, name: &str) -> Result<()>;
    fn ledger_path(&self, name: &str) -> PathBuf;
    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<PathBuf>;
    /// Backup file names, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<Ledger>;

    fn save_to_path(&self, ledger: &Ledger, path: &Path) -> Result<()> {
        json_backend::save_ledger_to_path(ledger, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<Ledger> {
        json_backend::load_ledger_from_path(path)
    }
}

pub use json_backend::JsonStorage;

/// Reports references and payment records that do not line up. Nothing is
/// repaired; the caller decides what to surface.
pub fn integrity_warnings(ledger: &Ledger) -> Vec<String> {
    let client_ids: HashSet<u64> = ledger.clients.iter().map(|c| c.id).collect();
    let bill_ids: HashSet<u64> = ledger.bills.iter().map(|b| b.id).collect();
    let mut warnings = Vec::new();

    for bill in &ledger.bills {
        if !client_ids.contains(&bill.client_id) {
            warnings.push(format!(
                "bill {} references unknown client {} ({})",
                bill.id, bill.client_id, bill.client_name
            ));
        }
        let mut payments = ledger.payments_for_bill(bill.id).peekable();
        if bill.is_paid() && payments.peek().is_none() {
            warnings.push(format!("bill {} is paid but has no payment", bill.id));
        }
        for payment in payments {
            if payment.amount != bill.amount {
                warnings.push(format!(
                    "payment {} amount {} differs from bill {} amount {}",
                    payment.id, payment.amount, bill.id, bill.amount
                ));
            }
        }
    }
    for payment in &ledger.payments {
        if !bill_ids.contains(&payment.bill_id) {
            warnings.push(format!(
                "payment {} references unknown bill {}",
                payment.id, payment.bill_id
            ));
        }
    }
    warnings
}

#![allow(dead_code)]

use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;
use transport_billing::{
    config::ConfigManager,
    core::ledger_manager::LedgerManager,
    currency::Amount,
    ledger::{Bill, BillStatus, Client, Ledger, Service},
    storage::JsonStorage,
};

/// Keeps TempDir guards alive until the test binary exits.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a fresh data directory that outlives the calling test.
pub fn temp_base() -> std::path::PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Managers backed by their own directory, keeping three backups per ledger.
pub fn setup_test_env() -> (LedgerManager, ConfigManager) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage");
    let ledger_manager = LedgerManager::new(Box::new(storage));
    let config_manager = ConfigManager::with_base_dir(base).expect("create config manager");
    (ledger_manager, config_manager)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn service(amount: i64) -> Service {
    Service::new("KA-25-AB-1234", "Hubli", "Goa", Amount::from_major(amount))
}

/// Adds a bill directly to `ledger`, bypassing validation.
pub fn push_bill(
    ledger: &mut Ledger,
    client_id: u64,
    amount: i64,
    status: BillStatus,
    on: NaiveDate,
) -> u64 {
    let name = ledger
        .client(client_id)
        .map(|client| client.name.clone())
        .unwrap_or_else(|| "Unknown".into());
    ledger.add_bill(Bill::new(client_id, name, on, status, vec![service(amount)]))
}

/// A ledger with one client, a paid bill of 5000 and an unpaid bill of 3000,
/// both dated June 2024.
pub fn june_ledger() -> Ledger {
    let mut ledger = Ledger::new("June");
    let acme = ledger.add_client(Client::new("Acme Transport"));
    push_bill(&mut ledger, acme, 5000, BillStatus::Paid, date(2024, 6, 3));
    push_bill(&mut ledger, acme, 3000, BillStatus::Unpaid, date(2024, 6, 10));
    ledger
}

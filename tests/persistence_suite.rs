mod common;

use std::{fs, path::Path};

use common::{june_ledger, setup_test_env, temp_base};
use transport_billing::{
    errors::BillingError,
    ledger::{Client, Ledger, CURRENT_SCHEMA_VERSION},
    storage::{JsonStorage, StorageBackend},
};

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    tmp
}

#[test]
fn failed_write_keeps_the_previous_file() {
    let store = JsonStorage::new(Some(temp_base()), Some(2)).unwrap();
    let mut ledger = june_ledger();
    let path = store.save(&ledger, "reliable").expect("initial save");
    let original = fs::read_to_string(&path).unwrap();

    // A directory squatting on the temp file name makes the write fail.
    fs::create_dir_all(tmp_path_for(&path)).unwrap();
    ledger.add_client(Client::new("Never Written"));
    assert!(store.save(&ledger, "reliable").is_err());

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    let reloaded = store.load("reliable").unwrap();
    assert_eq!(reloaded.clients.len(), 1);
}

#[test]
fn saves_rotate_backups_within_retention() {
    let store = JsonStorage::new(Some(temp_base()), Some(2)).unwrap();
    let ledger = june_ledger();
    for _ in 0..5 {
        store.save(&ledger, "Rotating Fleet").unwrap();
    }
    let backups = store.list_backups("Rotating Fleet").unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|name| name.starts_with("rotating_fleet_")));
}

#[test]
fn restore_brings_back_an_earlier_version() {
    let (mut manager, _config) = setup_test_env();
    manager.set_current(june_ledger(), None, Some("June".into()));
    manager.save().unwrap();
    let backup = manager.backup(Some("before cleanup")).unwrap();
    let backup_name = backup.file_name().unwrap().to_str().unwrap().to_string();
    assert!(backup_name.contains("before-cleanup"));

    manager
        .with_current_mut(|ledger| {
            ledger.bills.clear();
        })
        .unwrap();
    manager.save().unwrap();

    let report = manager.restore_backup(&backup_name).unwrap();
    assert_eq!(report.name.as_deref(), Some("June"));
    manager
        .with_current(|ledger| assert_eq!(ledger.bills.len(), 2))
        .unwrap();
    // The emptied version was itself backed up before the restore.
    assert!(manager.list_backups().unwrap().len() >= 2);
}

#[test]
fn load_reports_integrity_warnings() {
    let (mut manager, _config) = setup_test_env();
    manager.set_current(june_ledger(), None, Some("June".into()));
    manager.save().unwrap();

    let report = manager.load("June").unwrap();
    assert_eq!(report.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("is paid but has no payment"));
}

#[test]
fn newer_schema_is_rejected() {
    let (mut manager, _config) = setup_test_env();
    let mut ledger = Ledger::new("Future");
    ledger.schema_version = CURRENT_SCHEMA_VERSION + 1;
    let path = temp_base().join("future.json");
    manager.storage().save_to_path(&ledger, &path).unwrap();

    let err = manager.load_from_path(&path).unwrap_err();
    assert!(matches!(err, BillingError::StorageError(message) if message.contains("newer")));
    assert!(manager.current().is_none());
}

#[test]
fn legacy_documents_load_with_defaults() {
    let path = temp_base().join("legacy.json");
    fs::write(
        &path,
        r#"{
            "id": "6f1c1c8e-3f3b-4d8e-9b2a-1d6c1f0e2a11",
            "name": "Legacy",
            "bills": [{
                "id": 3,
                "client_id": 1,
                "client": "Old Name",
                "date": "2023-12-01",
                "amount": 150000,
                "services": [{"vehicle": "KA-01", "from": "Hubli", "to": "Goa", "amount": 150000}]
            }],
            "created_at": "2023-12-01T00:00:00Z",
            "updated_at": "2023-12-01T00:00:00Z"
        }"#,
    )
    .unwrap();

    let (mut manager, _config) = setup_test_env();
    let report = manager.load_from_path(&path).unwrap();
    assert!(report.name.is_none());
    manager
        .with_current(|ledger| {
            let bill = ledger.bill(3).unwrap();
            assert_eq!(bill.client_name, "Old Name");
            assert_eq!(bill.status.as_str(), "unpaid");
        })
        .unwrap();
}

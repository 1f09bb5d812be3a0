use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::BillingError;
use crate::ledger::{Ledger, CURRENT_SCHEMA_VERSION};
use crate::storage::{integrity_warnings, StorageBackend};

/// Metadata describing the outcome of a load operation.
#[derive(Debug, Clone)]
pub struct LoadMetadata {
    pub warnings: Vec<String>,
    pub path: PathBuf,
    pub name: Option<String>,
    pub schema_version: u8,
}

/// Facade that coordinates the open ledger, persistence, and backups.
pub struct LedgerManager {
    current: Option<Ledger>,
    current_name: Option<String>,
    current_path: Option<PathBuf>,
    storage: Box<dyn StorageBackend>,
}

impl LedgerManager {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            current: None,
            current_name: None,
            current_path: None,
            storage,
        }
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// Starts a fresh, unsaved ledger named `name`.
    pub fn create(&mut self, name: &str) {
        let ledger = Ledger::new(name);
        let path = self.storage.ledger_path(name);
        self.set_current(ledger, Some(path), Some(name.to_string()));
        info!(ledger = name, "ledger created");
    }

    pub fn load(&mut self, name: &str) -> Result<LoadMetadata, BillingError> {
        let ledger = self.storage.load(name)?;
        let path = self.storage.ledger_path(name);
        self.apply_load(ledger, path, Some(name.to_string()))
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<LoadMetadata, BillingError> {
        let ledger = self.storage.load_from_path(path)?;
        self.apply_load(ledger, path.to_path_buf(), None)
    }

    /// Writes the open ledger back to where it came from.
    pub fn save(&mut self) -> Result<PathBuf, BillingError> {
        let ledger = self.current.as_ref().ok_or(BillingError::LedgerNotLoaded)?;
        if let Some(name) = self.current_name.as_deref() {
            let path = self.storage.save(ledger, name)?;
            self.current_path = Some(path.clone());
            Ok(path)
        } else if let Some(path) = self.current_path.clone() {
            self.storage.save_to_path(ledger, &path)?;
            Ok(path)
        } else {
            Err(BillingError::StorageError(
                "unable to determine save target for current ledger".into(),
            ))
        }
    }

    pub fn save_as(&mut self, name: &str) -> Result<PathBuf, BillingError> {
        let ledger = self.current.as_ref().ok_or(BillingError::LedgerNotLoaded)?;
        let path = self.storage.save(ledger, name)?;
        self.current_name = Some(name.to_string());
        self.current_path = Some(path.clone());
        Ok(path)
    }

    pub fn save_to_path(&mut self, path: &Path) -> Result<(), BillingError> {
        let ledger = self.current.as_ref().ok_or(BillingError::LedgerNotLoaded)?;
        self.storage.save_to_path(ledger, path)?;
        self.current_path = Some(path.to_path_buf());
        self.current_name = None;
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> Result<PathBuf, BillingError> {
        let ledger = self.current.as_ref().ok_or(BillingError::LedgerNotLoaded)?;
        let name = self.require_name()?;
        self.storage.backup(ledger, name, note)
    }

    pub fn list_backups(&self) -> Result<Vec<String>, BillingError> {
        let name = self.require_name()?;
        self.storage.list_backups(name)
    }

    /// Restores a backup of the open ledger and makes it current.
    pub fn restore_backup(&mut self, backup_name: &str) -> Result<LoadMetadata, BillingError> {
        let name = self.require_name()?.to_string();
        let ledger = self.storage.restore(&name, backup_name)?;
        let path = self.storage.ledger_path(&name);
        self.apply_load(ledger, path, Some(name))
    }

    pub fn list_ledgers(&self) -> Result<Vec<String>, BillingError> {
        self.storage.list_ledgers()
    }

    pub fn current(&self) -> Option<&Ledger> {
        self.current.as_ref()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn with_current<T, F>(&self, f: F) -> Result<T, BillingError>
    where
        F: FnOnce(&Ledger) -> T,
    {
        self.current
            .as_ref()
            .map(f)
            .ok_or(BillingError::LedgerNotLoaded)
    }

    pub fn with_current_mut<T, F>(&mut self, f: F) -> Result<T, BillingError>
    where
        F: FnOnce(&mut Ledger) -> T,
    {
        self.current
            .as_mut()
            .map(f)
            .ok_or(BillingError::LedgerNotLoaded)
    }

    /// Swaps the contents of the open ledger, keeping its name and path.
    pub fn replace_current(&mut self, ledger: Ledger) {
        if let Some(current) = self.current.as_mut() {
            *current = ledger;
        }
    }

    pub fn set_current(&mut self, ledger: Ledger, path: Option<PathBuf>, name: Option<String>) {
        self.current = Some(ledger);
        self.current_path = path;
        self.current_name = name;
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.current_name = None;
        self.current_path = None;
    }

    fn require_name(&self) -> Result<&str, BillingError> {
        if self.current.is_none() {
            return Err(BillingError::LedgerNotLoaded);
        }
        self.current_name.as_deref().ok_or_else(|| {
            BillingError::StorageError(
                "current ledger is unnamed; use `ledger save-as` first".into(),
            )
        })
    }

    fn apply_load(
        &mut self,
        ledger: Ledger,
        path: PathBuf,
        name: Option<String>,
    ) -> Result<LoadMetadata, BillingError> {
        if ledger.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(BillingError::StorageError(format!(
                "ledger schema v{} is newer than supported v{}",
                ledger.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        let warnings = integrity_warnings(&ledger);
        for warning in &warnings {
            warn!(%warning, "ledger integrity");
        }
        let schema_version = ledger.schema_version;
        info!(path = %path.display(), bills = ledger.bills.len(), "ledger loaded");
        self.set_current(ledger, Some(path.clone()), name.clone());
        Ok(LoadMetadata {
            warnings,
            path,
            name,
            schema_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStorage;
    use std::fs;
    use tempfile::tempdir;

    fn manager_in(dir: &Path) -> LedgerManager {
        let store = JsonStorage::new(Some(dir.to_path_buf()), Some(3)).unwrap();
        LedgerManager::new(Box::new(store))
    }

    #[test]
    fn save_and_load_named_roundtrip() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());

        manager.create("Demo Fleet");
        let path = manager.save().expect("save ledger");
        assert!(path.exists());

        manager.clear();
        let metadata = manager.load("Demo Fleet").expect("load ledger");
        assert_eq!(metadata.name.as_deref(), Some("Demo Fleet"));
        assert!(metadata.warnings.is_empty());
        assert_eq!(manager.with_current(|l| l.name.clone()).unwrap(), "Demo Fleet");
    }

    #[test]
    fn operations_without_ledger_fail() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());
        assert!(matches!(manager.save(), Err(BillingError::LedgerNotLoaded)));
        assert!(matches!(
            manager.with_current_mut(|_| ()),
            Err(BillingError::LedgerNotLoaded)
        ));
        assert!(matches!(manager.backup(None), Err(BillingError::LedgerNotLoaded)));
    }

    #[test]
    fn backup_and_restore_current_ledger() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());
        manager.create("fleet");
        manager.save().unwrap();
        let backup = manager.backup(Some("clean")).unwrap();
        let backup_name = backup.file_name().and_then(|n| n.to_str()).unwrap().to_string();

        manager.with_current_mut(|l| l.name = "Renamed".into()).unwrap();
        manager.save().unwrap();

        manager.restore_backup(&backup_name).unwrap();
        assert_eq!(manager.with_current(|l| l.name.clone()).unwrap(), "fleet");
        assert!(manager.list_backups().unwrap().len() <= 3);
    }

    #[test]
    fn rejects_future_schema_versions() {
        let temp = tempdir().unwrap();
        let mut manager = manager_in(temp.path());

        let path = temp.path().join("future.json");
        let mut ledger = Ledger::new("Future");
        ledger.schema_version = CURRENT_SCHEMA_VERSION + 5;
        fs::write(&path, serde_json::to_string(&ledger).unwrap()).unwrap();

        let err = manager
            .load_from_path(&path)
            .expect_err("load future schema should fail");
        match err {
            BillingError::StorageError(message) => {
                assert!(message.contains("newer"), "unexpected error: {message}");
            }
            other => panic!("expected storage error, got {other:?}"),
        }
        assert!(manager.current().is_none());
    }
}

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::core::utils::{ensure_dir, PathResolver};
use crate::currency::InrFormatter;
use crate::errors::BillingError;
use crate::storage::json_backend::{sanitize_backup_note, write_json_replacing, DEFAULT_RETENTION};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_FRACTION_DIGITS: u8 = 2;

/// User preferences persisted as `config/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Fraction digits shown when rendering amounts.
    pub fraction_digits: u8,
    /// Days after the bill date before the overdue sweep flags a bill.
    pub payment_terms_days: u32,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_ledger: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-IN".into(),
            currency: "INR".into(),
            fraction_digits: 0,
            payment_terms_days: 0,
            backup_retention: DEFAULT_RETENTION,
            last_opened_ledger: None,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 6] = [
        "locale",
        "currency",
        "fraction_digits",
        "payment_terms_days",
        "backup_retention",
        "last_opened_ledger",
    ];

    pub fn formatter(&self) -> InrFormatter {
        InrFormatter::new(&self.currency, &self.locale, self.fraction_digits)
    }

    /// Key/value pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("fraction_digits", self.fraction_digits.to_string()),
            ("payment_terms_days", self.payment_terms_days.to_string()),
            ("backup_retention", self.backup_retention.to_string()),
            (
                "last_opened_ledger",
                self.last_opened_ledger.clone().unwrap_or_else(|| "-".into()),
            ),
        ]
    }

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), BillingError> {
        let value = value.trim();
        match key {
            "locale" => self.locale = non_empty(key, value)?,
            "currency" => self.currency = non_empty(key, value)?.to_ascii_uppercase(),
            "fraction_digits" => {
                let digits: u8 = parse_number(key, value)?;
                if digits > MAX_FRACTION_DIGITS {
                    return Err(BillingError::ConfigError(format!(
                        "fraction_digits must be between 0 and {}",
                        MAX_FRACTION_DIGITS
                    )));
                }
                self.fraction_digits = digits;
            }
            "payment_terms_days" => self.payment_terms_days = parse_number(key, value)?,
            "backup_retention" => {
                let retention: usize = parse_number(key, value)?;
                if retention == 0 {
                    return Err(BillingError::ConfigError(
                        "backup_retention must be at least 1".into(),
                    ));
                }
                self.backup_retention = retention;
            }
            "last_opened_ledger" => {
                self.last_opened_ledger = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            other => {
                return Err(BillingError::ConfigError(format!(
                    "unknown setting `{}` (expected one of: {})",
                    other,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, BillingError> {
    if value.is_empty() {
        Err(BillingError::ConfigError(format!("{} cannot be empty", key)))
    } else {
        Ok(value.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, BillingError> {
    value.parse().map_err(|_| {
        BillingError::ConfigError(format!("{} expects a whole number, got `{}`", key, value))
    })
}

pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, BillingError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, BillingError> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    /// Reads the saved configuration, or defaults when none was written yet.
    pub fn load(&self) -> Result<Config, BillingError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            BillingError::ConfigError(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, config: &Config) -> Result<(), BillingError> {
        write_json_replacing(&self.path, config)?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, BillingError> {
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut name = format!("config_{}", timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push_str(&format!(".{}", BACKUP_EXTENSION));
        write_json_replacing(&self.backups_dir.join(&name), config)?;
        Ok(name)
    }

    /// Loads a backup and makes it the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, BillingError> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(BillingError::ConfigError(format!(
                "configuration backup `{}` not found",
                backup_name
            )));
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, BillingError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        // `config_<YYYYMMDD>_<HHMMSS>` sorts chronologically as text.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.locale, "en-IN");
        assert_eq!(config.fraction_digits, 0);
    }

    #[test]
    fn save_backup_and_restore() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("payment_terms_days", "30").unwrap();
        manager.save(&config).unwrap();
        let backup = manager.backup(&config, Some("net 30")).unwrap();
        assert!(backup.ends_with("_net-30.json"));

        config.set("payment_terms_days", "7").unwrap();
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap().payment_terms_days, 7);

        let restored = manager.restore(&backup).unwrap();
        assert_eq!(restored.payment_terms_days, 30);
        assert_eq!(manager.load().unwrap().payment_terms_days, 30);
        assert_eq!(manager.list_backups().unwrap(), vec![backup]);
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();
        assert!(config.set("fraction_digits", "3").is_err());
        assert!(config.set("backup_retention", "0").is_err());
        assert!(config.set("payment_terms_days", "soon").is_err());
        assert!(config.set("theme", "dark").is_err());
        config.set("currency", "usd").unwrap();
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: Config = serde_json::from_str(r#"{"payment_terms_days": 15}"#).unwrap();
        assert_eq!(config.payment_terms_days, 15);
        assert_eq!(config.currency, "INR");
    }
}

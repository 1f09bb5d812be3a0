use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    core::utils::{ensure_dir, PathResolver},
    errors::BillingError,
    ledger::Ledger,
};

use super::{Result, StorageBackend};

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const SEQUENCE_MARK: char = '~';
pub const DEFAULT_RETENTION: usize = 5;

/// File-per-ledger JSON store with rolling backups.
///
/// Layout under the root directory:
/// `ledgers/<slug>.json` and `backups/<slug>/<slug>_<YYYYMMDD>_<HHMMSS>[_<note>].json`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let ledgers_dir = PathResolver::ledger_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&ledgers_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Picks a fresh backup path, adding a `~N` sequence when a backup with
    /// the same timestamp and note already exists.
    fn next_backup_path(&self, name: &str, note: Option<&str>) -> Result<PathBuf> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut path = dir.join(format!("{}.{}", stem, LEDGER_EXTENSION));
        let mut sequence = 2;
        while path.exists() {
            path = dir.join(format!(
                "{}{}{}.{}",
                stem, SEQUENCE_MARK, sequence, LEDGER_EXTENSION
            ));
            sequence += 1;
        }
        Ok(path)
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }
        let backup_path = self.next_backup_path(name, None)?;
        fs::copy(path, &backup_path)?;
        self.prune_backups(name)?;
        Ok(Some(backup_path))
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            let path = self.backup_path(name, entry);
            debug!(backup = %path.display(), "pruning backup");
            if let Err(err) = fs::remove_file(&path) {
                warn!(backup = %path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, ledger: &Ledger, name: &str) -> Result<PathBuf> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path)?;
        save_ledger_to_path(ledger, &path)?;
        info!(ledger = name, path = %path.display(), "ledger saved");
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<Ledger> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(BillingError::StorageError(format!(
                "ledger `{}` not found",
                name
            )));
        }
        load_ledger_from_path(&path)
    }

    fn list_ledgers(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.ledgers_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(BillingError::StorageError(format!(
                "ledger `{}` not found",
                name
            )));
        }
        fs::remove_file(&path)?;
        info!(ledger = name, "ledger deleted");
        Ok(())
    }

    fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir
            .join(format!("{}.{}", canonical_name(name), LEDGER_EXTENSION))
    }

    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<PathBuf> {
        let path = self.next_backup_path(name, note)?;
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&path, &json)?;
        self.prune_backups(name)?;
        info!(ledger = name, backup = %path.display(), "backup created");
        Ok(path)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            match path.file_name().and_then(|file| file.to_str()) {
                Some(file_name) => entries.push(file_name.to_string()),
                None => continue,
            }
        }
        entries.sort_by(|a, b| backup_sort_key(b).cmp(&backup_sort_key(a)));
        Ok(entries)
    }

    /// Replaces the named ledger with a backup. The current file is itself
    /// backed up first, so a restore can be undone.
    fn restore(&self, name: &str, backup_name: &str) -> Result<Ledger> {
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(BillingError::StorageError(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let ledger = load_ledger_from_path(&backup_path)?;
        let target = self.ledger_path(name);
        self.backup_existing_file(name, &target)?;
        save_ledger_to_path(&ledger, &target)?;
        info!(ledger = name, backup = backup_name, "backup restored");
        Ok(ledger)
    }
}

/// Readers of `path` see either the previous document or the new one.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    write_json_replacing(path, ledger)
}

/// Pretty-prints `value` to a temp file beside `path`, then renames it over `path`.
pub(crate) fn write_json_replacing<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    debug!(path = %path.display(), bills = ledger.bills.len(), "ledger read");
    Ok(ledger)
}

pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

pub(crate) fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Orders backups by embedded timestamp, then by collision sequence.
fn backup_sort_key(file_name: &str) -> (Option<NaiveDateTime>, u32, String) {
    let stem = file_name
        .strip_suffix(&format!(".{}", LEDGER_EXTENSION))
        .unwrap_or(file_name);
    let (stem, sequence) = match stem.rsplit_once(SEQUENCE_MARK) {
        Some((base, seq)) => (base, seq.parse().unwrap_or(0)),
        None => (stem, 0),
    };
    (parse_backup_timestamp(stem), sequence, file_name.to_string())
}

fn parse_backup_timestamp(stem: &str) -> Option<NaiveDateTime> {
    let parts: Vec<&str> = stem.split('_').collect();
    // The timestamp is either the last two segments or sits just before a note.
    for offset in [2, 3] {
        if parts.len() < offset + 1 {
            continue;
        }
        let date_part = parts[parts.len() - offset];
        let time_part = parts[parts.len() - offset + 1];
        if is_digits(date_part, 8) && is_digits(time_part, 6) {
            let raw = format!("{}{}", date_part, time_part);
            return NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S").ok();
        }
    }
    None
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

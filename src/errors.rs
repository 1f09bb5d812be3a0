use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for the domain, storage, and configuration layers.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Ledger not loaded")]
    LedgerNotLoaded,
    #[error("Client not found: {0}")]
    ClientNotFound(u64),
    #[error("Bill not found: {0}")]
    BillNotFound(u64),
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

pub type Result<T> = StdResult<T, BillingError>;

/// Failures that stop the shell itself rather than a single command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] BillingError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for BillingError {
    fn from(err: std::io::Error) -> Self {
        BillingError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        BillingError::StorageError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_surface_as_storage_errors() {
        let err: BillingError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, BillingError::StorageError(ref message) if message.contains("gone")));
    }

    #[test]
    fn display_includes_identifier() {
        assert_eq!(BillingError::BillNotFound(7).to_string(), "Bill not found: 7");
    }
}

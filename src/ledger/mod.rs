//! Billing domain models and the ledger aggregate that owns them.

pub mod bill;
pub mod client;
pub mod common;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod payment;

pub use bill::{Bill, BillStatus, Service};
pub use client::Client;
pub use common::{Amounted, Identifiable};
pub use ledger::{Ledger, CURRENT_SCHEMA_VERSION};
pub use payment::Payment;

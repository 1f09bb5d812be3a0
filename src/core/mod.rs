//! Business logic: the pure ledger calculator, validated services, and the
//! ledger manager facade over storage.

pub mod calculator;
pub mod ledger_manager;
pub mod services;
pub mod time;
pub mod utils;

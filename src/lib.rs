#![doc(test(attr(deny(warnings))))]

//! Transport Billing keeps the books of a small transport business: clients,
//! bills made of vehicle/route services, payments against those bills, and the
//! revenue and outstanding figures derived from them.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Transport Billing tracing initialized.");
    });
}

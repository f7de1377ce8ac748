#![doc(test(attr(deny(warnings))))]

//! Saldo keeps a per-user ledger of income and expense entries in sync with a
//! remote document store and projects balances and recent-activity summaries
//! from it.

pub mod errors;
pub mod session;
pub mod utils;

pub use saldo_config as config;
pub use saldo_core as core;
pub use saldo_domain as domain;
pub use saldo_store_memory as store_memory;

pub use errors::SaldoError;
pub use session::Session;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Saldo tracing initialized.");
    });
}

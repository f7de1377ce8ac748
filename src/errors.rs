use thiserror::Error;

use saldo_config::ConfigError;
use saldo_core::CoreError;
use saldo_store_memory::StoreError;

/// Top-level error for applications embedding Saldo.
#[derive(Debug, Error)]
pub enum SaldoError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

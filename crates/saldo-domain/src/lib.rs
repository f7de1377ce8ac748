//! saldo-domain
//!
//! Pure ledger models (Transaction, TransactionKind, identifiers, record dates).
//! No I/O, no storage, no async. Only data types and core enums.

pub mod common;
pub mod transaction;

pub use common::*;
pub use transaction::*;

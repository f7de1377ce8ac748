//! saldo-core
//!
//! Ledger synchronization and balance projection for Saldo.
//! Depends on saldo-domain. Talks to persistence only through the
//! collaborator traits in [`remote`]; no concrete backend lives here.

pub mod amount;
pub mod balance_cache;
pub mod draft;
pub mod error;
pub mod format;
pub mod ledger_store;
pub mod profile_service;
pub mod projector;
pub mod record;
pub mod remote;
pub mod report_service;
pub mod time;

pub use amount::*;
pub use balance_cache::*;
pub use draft::{TransactionDraft, ValidDraft};
pub use error::{CoreError, RemoteError};
pub use format::MoneyFormat;
pub use ledger_store::*;
pub use profile_service::*;
pub use projector::*;
pub use remote::*;
pub use report_service::*;
pub use time::*;

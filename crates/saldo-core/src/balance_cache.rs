//! Denormalized balance stored on the user document.
//!
//! The fold over the synchronized ledger is the source of truth. The cached
//! value only exists for consumers that read the user document directly and
//! is rewritten whenever it drifts from the fold.

use std::{str::FromStr, sync::Arc};

use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::{json, Value};
use tracing::{debug, info};

use saldo_domain::UserId;

use crate::{CoreError, Document, DocumentStore, Fields, RemoteError, SnapshotStream};

pub const BALANCE_FIELD: &str = "balance";
const LEGACY_BALANCE_FIELD: &str = "saldo";
/// Field naming the user on the user document; live balance queries match on it.
pub const USER_FIELD: &str = "uid";

/// Outcome of comparing the cached balance against the ledger fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub cached: Option<Decimal>,
    pub authoritative: Decimal,
    pub rewritten: bool,
}

#[derive(Clone)]
pub struct BalanceCache {
    documents: Arc<dyn DocumentStore>,
    collection: String,
}

impl BalanceCache {
    pub fn new(documents: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            documents,
            collection: collection.into(),
        }
    }

    /// Reads the cached balance. `None` when the user has no document; a
    /// document without a balance field reads as zero.
    pub async fn cached(&self, user: &UserId) -> Result<Option<Decimal>, CoreError> {
        match self.documents.get(&self.collection, user.as_str()).await? {
            Some(document) => balance_of(&document).map(Some),
            None => Ok(None),
        }
    }

    /// Follows the cached balance of `user`. The current value arrives first,
    /// then one value per change to the user document.
    pub async fn watch(&self, user: &UserId) -> Result<BalanceWatch, CoreError> {
        let stream = self
            .documents
            .listen(&self.collection, USER_FIELD, &json!(user.as_str()))
            .await
            .map_err(CoreError::Sync)?;
        debug!(user = %user, "watching cached balance");
        Ok(BalanceWatch {
            stream,
            user: user.clone(),
        })
    }

    pub async fn store(&self, user: &UserId, balance: Decimal) -> Result<(), CoreError> {
        let mut fields = Fields::new();
        fields.insert(BALANCE_FIELD.into(), json!(balance.to_string()));
        fields.insert(USER_FIELD.into(), json!(user.as_str()));
        self.documents
            .merge(&self.collection, user.as_str(), fields)
            .await?;
        debug!(user = %user, %balance, "cached balance updated");
        Ok(())
    }

    /// Rewrites the cached balance when it differs from `authoritative`.
    pub async fn reconcile(
        &self,
        user: &UserId,
        authoritative: Decimal,
    ) -> Result<Reconciliation, CoreError> {
        let cached = self.cached(user).await?;
        let rewritten = cached != Some(authoritative);
        if rewritten {
            info!(
                user = %user,
                cached = ?cached,
                %authoritative,
                "cached balance drifted from ledger, rewriting"
            );
            self.store(user, authoritative).await?;
        }
        Ok(Reconciliation {
            cached,
            authoritative,
            rewritten,
        })
    }
}

/// Live view of one user's cached balance.
#[derive(Debug)]
pub struct BalanceWatch {
    stream: SnapshotStream,
    user: UserId,
}

impl BalanceWatch {
    /// Next cached balance; `Ok(None)` while the user has no document.
    /// Returns `None` once the remote closes the query.
    pub async fn next(&mut self) -> Option<Result<Option<Decimal>, CoreError>> {
        let documents = match self.stream.next().await? {
            Ok(documents) => documents,
            Err(err) => return Some(Err(CoreError::Sync(err))),
        };
        let balance = documents
            .iter()
            .find(|document| document.id == self.user.as_str())
            .map(balance_of)
            .transpose();
        Some(balance)
    }
}

fn balance_of(document: &Document) -> Result<Decimal, CoreError> {
    let raw = document
        .get(BALANCE_FIELD)
        .or_else(|| document.get(LEGACY_BALANCE_FIELD));
    match raw {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(value) => decode_balance(value),
    }
}

fn decode_balance(value: &Value) -> Result<Decimal, CoreError> {
    let decoded = match value {
        Value::String(text) => Decimal::from_str(text).ok(),
        Value::Number(number) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        _ => None,
    };
    decoded.ok_or_else(|| {
        RemoteError::Malformed(format!("cached balance `{value}` is not a number")).into()
    })
}

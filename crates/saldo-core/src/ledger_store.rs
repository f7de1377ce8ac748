//! Per-user transaction ledger kept in sync with the remote document store.
//!
//! The local view lives inside a [`watch`] channel: every mutation (optimistic
//! add, rollback, snapshot replacement, remove, clear) is published to all
//! receivers. A live subscription replaces the whole view with each remote
//! snapshot; there is no merge.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use saldo_domain::{sort_for_display, Transaction, TransactionId, TransactionKind, UserId};

use crate::{
    amount::ensure_positive,
    balance_cache::{BalanceCache, Reconciliation},
    draft::TransactionDraft,
    project,
    record::{decode_transaction, TransactionRecord, LEGACY_OWNER_FIELD, OWNER_FIELD},
    try_project, AuthProvider, Clock, Collections, CoreError, Document, DocumentStore,
    Projection, RemoteError, SnapshotStream,
};

/// Sticky problem reported to consumers until a fresh subscription starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerIssue {
    /// The live subscription failed to start or was dropped.
    Sync(RemoteError),
    /// A transaction write failed; its optimistic entry was rolled back.
    Write(RemoteError),
}

impl std::fmt::Display for LedgerIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerIssue::Sync(err) => write!(f, "sync error: {err}"),
            LedgerIssue::Write(err) => write!(f, "write error: {err}"),
        }
    }
}

/// Snapshot handed to consumers on every ledger change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    /// User whose ledger is shown, once a subscription has been requested.
    pub owner: Option<UserId>,
    pub transactions: Vec<Transaction>,
    pub loading: bool,
    pub error: Option<LedgerIssue>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            owner: None,
            transactions: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl LedgerState {
    pub fn projection(&self) -> Projection {
        project(&self.transactions)
    }
}

/// Handle for a standing ledger subscription.
///
/// Dropping the handle unsubscribes as well.
#[derive(Debug)]
pub struct Subscription {
    generation: u64,
    current: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        // Only retire the generation if no newer subscription replaced this one.
        let _ = self.current.compare_exchange(
            self.generation,
            self.generation + 1,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct LedgerStore {
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    collection: String,
    balance: BalanceCache,
    state: Arc<watch::Sender<LedgerState>>,
    generation: Arc<AtomicU64>,
}

impl LedgerStore {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
        collections: Collections,
    ) -> Self {
        let (state, _) = watch::channel(LedgerState::default());
        let balance = BalanceCache::new(documents.clone(), collections.users);
        Self {
            documents,
            auth,
            clock,
            collection: collections.transactions,
            balance,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current state of the local view.
    pub fn state(&self) -> LedgerState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every change to the local view.
    pub fn watch(&self) -> watch::Receiver<LedgerState> {
        self.state.subscribe()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    /// Projection of the current local view.
    pub fn projection(&self) -> Projection {
        self.state.borrow().projection()
    }

    pub fn balance_cache(&self) -> &BalanceCache {
        &self.balance
    }

    /// Subscribes to the signed-in user's ledger.
    ///
    /// Without a user the view is emptied and `Unauthenticated` is returned.
    pub async fn subscribe_current(&self) -> Result<Subscription, CoreError> {
        match self.auth.current_user() {
            Some(user) => self.start_subscription(&user).await,
            None => Err(self.reject_unauthenticated()),
        }
    }

    /// Starts a live subscription to `user`'s transactions, replacing any
    /// previous subscription. Each remote snapshot replaces the local view.
    ///
    /// `user` must be the signed-in user; otherwise the view is emptied and
    /// `Unauthenticated` is returned.
    pub async fn subscribe(&self, user: &UserId) -> Result<Subscription, CoreError> {
        if self.auth.current_user().as_ref() != Some(user) {
            warn!(user = %user, "refusing ledger subscription for a user who is not signed in");
            return Err(self.reject_unauthenticated());
        }
        self.start_subscription(user).await
    }

    fn reject_unauthenticated(&self) -> CoreError {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.owner = None;
            state.transactions.clear();
            state.loading = false;
        });
        CoreError::Unauthenticated
    }

    async fn start_subscription(&self, user: &UserId) -> Result<Subscription, CoreError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            if state.owner.as_ref() != Some(user) {
                state.transactions.clear();
            }
            state.owner = Some(user.clone());
            state.loading = true;
            state.error = None;
        });

        let streams = match self.open_streams(user).await {
            Ok(streams) => streams,
            Err(err) => {
                warn!(user = %user, error = %err, "failed to open ledger subscription");
                if self.generation.load(Ordering::SeqCst) == generation {
                    let issue = LedgerIssue::Sync(err.clone());
                    self.state.send_modify(|state| {
                        state.loading = false;
                        state.error = Some(issue);
                    });
                }
                return Err(CoreError::Sync(err));
            }
        };

        info!(user = %user, generation, "ledger subscription opened");
        let task = tokio::spawn(run_subscription(
            streams,
            user.clone(),
            generation,
            self.generation.clone(),
            self.state.clone(),
        ));
        Ok(Subscription {
            generation,
            current: self.generation.clone(),
            task: Some(task),
        })
    }

    /// Opens the owner query plus the query for documents written by older
    /// clients under the legacy owner field.
    async fn open_streams(&self, user: &UserId) -> Result<OwnerStreams, RemoteError> {
        let value = json!(user.as_str());
        let owned = self
            .documents
            .listen(&self.collection, OWNER_FIELD, &value)
            .await?;
        let legacy = self
            .documents
            .listen(&self.collection, LEGACY_OWNER_FIELD, &value)
            .await?;
        Ok(OwnerStreams { owned, legacy })
    }

    /// Validates `draft` and records it through [`LedgerStore::add`].
    pub async fn add_draft(&self, draft: &TransactionDraft) -> Result<Transaction, CoreError> {
        let valid = draft.validate()?;
        self.add(valid.kind, valid.amount, valid.date).await
    }

    /// Records a new transaction for the signed-in user.
    ///
    /// The entry is prepended to the local view before the remote write. If
    /// the write fails the entry is rolled back and a sticky write error is
    /// raised; on success the provisional id is swapped for the stored id and
    /// the cached balance is refreshed.
    ///
    /// Fails with `OwnerMismatch` when the view shows another user's ledger,
    /// and with `Validation` when the amount would overflow the view totals.
    pub async fn add(
        &self,
        kind: TransactionKind,
        amount: Decimal,
        date: Option<NaiveDate>,
    ) -> Result<Transaction, CoreError> {
        let owner = self.auth.current_user().ok_or(CoreError::Unauthenticated)?;
        let amount = ensure_positive(amount)?;
        let date = date.unwrap_or_else(|| self.clock.today());

        let provisional = Transaction::new(
            TransactionId::provisional(),
            kind,
            amount,
            date,
            owner.clone(),
            self.clock.now(),
        );
        let fields = TransactionRecord::from(&provisional).into_fields()?;
        {
            let state = self.state.borrow();
            if let Some(view) = state.owner.as_ref().filter(|view| **view != owner) {
                return Err(CoreError::OwnerMismatch {
                    view: view.clone(),
                    signed_in: owner,
                });
            }
            if try_project(state.transactions.iter().chain([&provisional])).is_none() {
                return Err(CoreError::Validation(format!(
                    "amount {amount} would overflow the ledger totals"
                )));
            }
        }
        let generation = self.generation.load(Ordering::SeqCst);

        self.state
            .send_modify(|state| state.transactions.insert(0, provisional.clone()));
        debug!(id = %provisional.id, %kind, %amount, "optimistic transaction added");

        let stored_id = match self.documents.create(&self.collection, fields).await {
            Ok(id) => TransactionId::from(id),
            Err(err) => {
                warn!(id = %provisional.id, error = %err, "transaction write failed, rolling back");
                let issue = LedgerIssue::Write(err.clone());
                self.state.send_modify(|state| {
                    state.transactions.retain(|txn| txn.id != provisional.id);
                    state.error = Some(issue);
                });
                return Err(CoreError::Write(err));
            }
        };

        let confirmed = Transaction {
            id: stored_id.clone(),
            ..provisional.clone()
        };
        if self.generation.load(Ordering::SeqCst) == generation {
            self.state.send_if_modified(|state| {
                match state
                    .transactions
                    .iter_mut()
                    .find(|txn| txn.id == provisional.id)
                {
                    Some(entry) => {
                        entry.id = stored_id.clone();
                        true
                    }
                    None => false,
                }
            });
        } else {
            debug!(id = %stored_id, "subscription changed during write, skipping reconciliation");
        }

        let previous = {
            let state = self.state.borrow();
            project(
                state
                    .transactions
                    .iter()
                    .filter(|txn| txn.id != provisional.id && txn.id != stored_id),
            )
            .net
        };
        match previous.checked_add(confirmed.signed_amount()) {
            Some(balance) => {
                if let Err(err) = self.balance.store(&owner, balance).await {
                    warn!(user = %owner, error = %err, "failed to update cached balance");
                }
            }
            None => warn!(user = %owner, "cached balance out of range, not updated"),
        }

        info!(id = %confirmed.id, %kind, %amount, %date, "transaction recorded");
        Ok(confirmed)
    }

    /// Removes a transaction from the local view only. Unknown ids are ignored.
    pub fn remove(&self, id: &TransactionId) {
        self.state.send_if_modified(|state| {
            let before = state.transactions.len();
            state.transactions.retain(|txn| &txn.id != id);
            state.transactions.len() != before
        });
    }

    /// Empties the local view only.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if state.transactions.is_empty() {
                return false;
            }
            state.transactions.clear();
            true
        });
    }

    /// Brings the cached balance in line with the fold over the local view.
    pub async fn reconcile_balance(&self) -> Result<Reconciliation, CoreError> {
        let user = self.auth.current_user().ok_or(CoreError::Unauthenticated)?;
        let net = self.projection().net;
        self.balance.reconcile(&user, net).await
    }
}

struct OwnerStreams {
    owned: SnapshotStream,
    legacy: SnapshotStream,
}

async fn run_subscription(
    mut streams: OwnerStreams,
    user: UserId,
    generation: u64,
    current: Arc<AtomicU64>,
    state: Arc<watch::Sender<LedgerState>>,
) {
    let is_current = || current.load(Ordering::SeqCst) == generation;
    let mut owned: Option<Vec<Document>> = None;
    let mut legacy: Option<Vec<Document>> = None;

    loop {
        let (from_legacy, event) = tokio::select! {
            event = streams.owned.next() => (false, event),
            event = streams.legacy.next() => (true, event),
        };
        if !is_current() {
            debug!(user = %user, generation, "stale subscription stopped");
            return;
        }
        match event {
            Some(Ok(documents)) => {
                if from_legacy {
                    legacy = Some(documents);
                } else {
                    owned = Some(documents);
                }
                // Publish only once both queries have reported.
                if let (Some(owned), Some(legacy)) = (&owned, &legacy) {
                    let transactions = decode_snapshot(owned, legacy, &user);
                    debug!(user = %user, count = transactions.len(), "ledger snapshot received");
                    state.send_modify(|state| {
                        state.transactions = transactions;
                        state.loading = false;
                    });
                }
            }
            Some(Err(err)) => {
                warn!(user = %user, error = %err, "ledger subscription dropped");
                fail_subscription(&state, err);
                return;
            }
            None => {
                warn!(user = %user, "ledger subscription closed by remote");
                fail_subscription(&state, RemoteError::Closed);
                return;
            }
        }
    }
}

fn fail_subscription(state: &watch::Sender<LedgerState>, err: RemoteError) {
    state.send_modify(|state| {
        state.loading = false;
        state.error = Some(LedgerIssue::Sync(err));
    });
}

/// Merges both owner queries into display order. Documents arrive oldest
/// write first, so they are walked newest first to let the stable sort break
/// remaining ties by most recent write.
fn decode_snapshot(owned: &[Document], legacy: &[Document], user: &UserId) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let documents: Vec<&Document> = owned
        .iter()
        .chain(legacy)
        .filter(|document| seen.insert(document.id.as_str()))
        .collect();
    let mut transactions: Vec<Transaction> = documents
        .into_iter()
        .rev()
        .filter_map(|document| match decode_transaction(document, user) {
            Ok(Some(txn)) => Some(txn),
            Ok(None) => {
                debug!(id = %document.id, "dropping document owned by another user");
                None
            }
            Err(err) => {
                warn!(id = %document.id, error = %err, "skipping undecodable transaction");
                None
            }
        })
        .collect();
    sort_for_display(&mut transactions);
    transactions
}

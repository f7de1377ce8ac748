#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Map, Value};

use saldo::{
    config::Config,
    core::{Fields, FixedClock, LedgerState, LedgerStore},
    store_memory::{MemoryAuth, MemoryDocumentStore},
    Session,
};

pub const TRANSACTIONS: &str = "transactions";
pub const USERS: &str = "users";

/// Session wired to in-memory collaborators, plus handles to drive them.
pub struct TestEnv {
    pub store: MemoryDocumentStore,
    pub auth: MemoryAuth,
    pub session: Session,
}

impl TestEnv {
    pub fn ledger(&self) -> &LedgerStore {
        self.session.ledger()
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock::new(now())
}

pub fn setup_test_env(user: Option<&str>) -> TestEnv {
    saldo::init();
    let store = MemoryDocumentStore::new();
    let auth = match user {
        Some(user) => MemoryAuth::signed_in(user),
        None => MemoryAuth::new(),
    };
    let session = Session::new(
        Config::default(),
        Arc::new(store.clone()),
        Arc::new(auth.clone()),
        Arc::new(clock()),
    )
    .expect("create session");
    TestEnv {
        store,
        auth,
        session,
    }
}

pub fn date(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Transaction document as another device would write it.
pub fn record(owner: &str, kind: &str, amount: &str, date: &str) -> Fields {
    fields(json!({
        "type": kind,
        "amount": amount,
        "date": date,
        "userId": owner,
        "createdAt": "2024-01-01T00:00:00Z",
    }))
}

/// Waits until the ledger view satisfies `predicate` and returns a copy of it.
pub async fn wait_until<F>(ledger: &LedgerStore, mut predicate: F) -> LedgerState
where
    F: FnMut(&LedgerState) -> bool,
{
    let mut receiver = ledger.watch();
    let state = tokio::time::timeout(Duration::from_secs(2), receiver.wait_for(|s| predicate(s)))
        .await
        .expect("ledger reached expected state in time")
        .expect("ledger still alive")
        .clone();
    state
}

/// Waits for the first authoritative snapshot after subscribing.
pub async fn wait_loaded(ledger: &LedgerStore) -> LedgerState {
    wait_until(ledger, |state| !state.loading).await
}

/// Waits until every entry in the view carries a store-assigned id.
pub async fn wait_settled(ledger: &LedgerStore, count: usize) -> LedgerState {
    wait_until(ledger, |state| {
        state.transactions.len() == count
            && state.transactions.iter().all(|txn| !txn.id.is_provisional())
    })
    .await
}

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use saldo_core::{AuthProvider, RemoteError};
use saldo_domain::UserId;

/// Authentication provider holding accounts and the signed-in user in memory.
#[derive(Clone, Default)]
pub struct MemoryAuth {
    state: Arc<Mutex<AuthState>>,
}

#[derive(Default)]
struct AuthState {
    user: Option<UserId>,
    accounts: HashMap<String, Account>,
    sign_in_failure: Option<RemoteError>,
}

struct Account {
    password: String,
    uid: UserId,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: impl Into<UserId>) -> Self {
        let auth = Self::new();
        auth.sign_in(user);
        auth
    }

    /// Switches the current user without credentials.
    pub fn sign_in(&self, user: impl Into<UserId>) {
        self.lock().user = Some(user.into());
    }

    /// Makes the next sign-in or account creation fail with `err`.
    pub fn fail_next_sign_in(&self, err: RemoteError) {
        self.lock().sign_in_failure = Some(err);
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn current_user(&self) -> Option<UserId> {
        self.lock().user.clone()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.sign_in_failure.take() {
            return Err(err);
        }
        let uid = match state.accounts.get(&account_key(email)) {
            Some(account) if account.password == password => account.uid.clone(),
            _ => return Err(RemoteError::InvalidCredentials),
        };
        state.user = Some(uid.clone());
        info!(user = %uid, "signed in with password");
        Ok(uid)
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.sign_in_failure.take() {
            return Err(err);
        }
        let key = account_key(email);
        if state.accounts.contains_key(&key) {
            return Err(RemoteError::AlreadyExists(key));
        }
        let uid = UserId::new(Uuid::new_v4().simple().to_string());
        state.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                uid: uid.clone(),
            },
        );
        state.user = Some(uid.clone());
        info!(user = %uid, "account created");
        Ok(uid)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.lock().user = None;
        Ok(())
    }
}

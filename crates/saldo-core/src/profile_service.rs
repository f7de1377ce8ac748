//! User profile registration and lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use saldo_domain::UserId;

use crate::{AuthProvider, Clock, CoreError, DocumentStore, RemoteError};

/// Profile stored on the user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProfileService {
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    collection: String,
}

impl ProfileService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            auth,
            clock,
            collection: collection.into(),
        }
    }

    /// Creates an account, signs it in and stores the profile on the new
    /// user's document.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Profile, CoreError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() || confirmation.is_empty() {
            return Err(CoreError::Validation("all fields are required".into()));
        }
        if !email.contains('@') {
            return Err(CoreError::Validation(format!("`{email}` is not a valid email")));
        }
        if password != confirmation {
            return Err(CoreError::Validation("passwords do not match".into()));
        }

        let uid = self.auth.create_user_with_password(email, password).await?;
        let profile = Profile {
            uid: uid.clone(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: self.clock.now(),
        };
        let fields = match serde_json::to_value(&profile)? {
            Value::Object(fields) => fields,
            other => {
                return Err(RemoteError::Malformed(format!("profile serialized to {other}")).into())
            }
        };
        self.documents
            .merge(&self.collection, uid.as_str(), fields)
            .await?;
        info!(user = %uid, "registered user profile");
        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, CoreError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::Validation("email and password are required".into()));
        }
        let user = self.auth.sign_in_with_password(email, password).await?;
        info!(user = %user, "signed in");
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), CoreError> {
        self.auth.sign_out().await?;
        info!("signed out");
        Ok(())
    }

    /// Name of the signed-in user, if a profile exists.
    ///
    /// Lookup failures are logged and reported as "no name".
    pub async fn display_name(&self) -> Option<String> {
        let user = self.auth.current_user()?;
        match self
            .documents
            .query(&self.collection, "uid", &json!(user.as_str()))
            .await
        {
            Ok(documents) => documents.into_iter().find_map(|document| {
                document
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            }),
            Err(err) => {
                warn!(user = %user, error = %err, "profile lookup failed");
                None
            }
        }
    }
}

//! Authentication: session token store, login/register wire types, user profile.
//!
//! ## Session Model
//!
//! The exchange issues an opaque JWT on login. The SDK keeps it in a
//! [`TokenStore`]: an in-memory copy that every authenticated request reads,
//! mirrored to persisted key-value storage under [`TOKEN_KEY`] so a restarted
//! client (or a reloaded page) resumes the session.
//!
//! - There is no expiry tracking and no refresh. The token lives until
//!   `logout()` or until any authenticated request answers HTTP 401.
//! - The token is never validated or decoded client-side.

#[cfg(feature = "http")]
pub mod client;

use crate::shared::serde_util;
use crate::storage::{SharedStore, TOKEN_KEY};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Token store
// ============================================================================

/// The bearer token, in memory and mirrored to storage.
///
/// Cheap to clone: clones share the same token.
#[derive(Clone)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
    store: SharedStore,
}

impl TokenStore {
    /// Create a token store, restoring any token persisted in `store`.
    pub fn new(store: SharedStore) -> Self {
        let restored = store.get(TOKEN_KEY).filter(|t| !t.is_empty());
        if restored.is_some() {
            tracing::info!("Token restored from storage");
        }
        Self {
            token: Arc::new(RwLock::new(restored)),
            store,
        }
    }

    /// Replace the token. `None` deletes the persisted entry.
    ///
    /// The in-memory token is always updated; a storage failure is logged.
    pub fn set(&self, token: Option<String>) {
        let persisted = match &token {
            Some(t) => self.store.set(TOKEN_KEY, t),
            None => self.store.remove(TOKEN_KEY),
        };
        if let Err(e) = persisted {
            tracing::warn!("Failed to persist auth token: {}", e);
        }
        *self.token.write() = token;
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

// ============================================================================
// User profile
// ============================================================================

/// Exchange user, as returned alongside the token on login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default, deserialize_with = "serde_util::lenient_datetime::deserialize")]
    pub created_at: Option<chrono::NaiveDateTime>,
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `data` of a successful login envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

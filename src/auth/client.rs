//! Auth sub-client: login, register, logout, session state.

use crate::auth::{Credentials, LoginResponse};
use crate::client::CexClient;
use crate::error::SdkError;

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a CexClient,
}

impl<'a> Auth<'a> {
    /// Login with username and password.
    ///
    /// On success the token is stored (and persisted), so every later
    /// authenticated call carries it. The returned profile is whatever the
    /// server sent alongside the token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, SdkError> {
        self.client
            .http
            .login(&Credentials::new(username, password))
            .await
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, SdkError> {
        Ok(self
            .client
            .http
            .register(&Credentials::new(username, password))
            .await?)
    }

    /// Forget the session token, in memory and in storage.
    pub fn logout(&self) {
        self.client.http.logout();
    }

    /// Whether a token is currently held. Not validated against the server.
    pub fn is_authenticated(&self) -> bool {
        self.client.tokens.is_authenticated()
    }

    /// The raw bearer token, e.g. for `RealtimeClient::authenticate`.
    pub fn token(&self) -> Option<String> {
        self.client.tokens.get()
    }
}

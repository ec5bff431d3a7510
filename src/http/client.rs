//! Low-level HTTP client: `CexHttp`.
//!
//! One method per API endpoint. Every response is unwrapped from the
//! `{code, message, data}` envelope here, so callers only see payloads and
//! [`HttpError`]s. Layer 5 sub-clients wrap this.

use crate::auth::{Credentials, LoginResponse, TokenStore};
use crate::domain::order::{Order, PlaceOrderRequest};
use crate::domain::wallet::{Asset, DepositRequest, WalletBalance};
use crate::error::{AuthError, HttpError, SdkError};
use crate::http::envelope::{Envelope, FailureFallback};
use crate::http::retry::RetryPolicy;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default per-request timeout on native targets.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Low-level HTTP client for the CEX REST API.
#[derive(Clone)]
pub struct CexHttp {
    base_url: String,
    client: Client,
    tokens: TokenStore,
    /// Applied to GET endpoints only.
    read_retry: RetryPolicy,
}

impl CexHttp {
    /// Client with the default timeout and no retries.
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, HttpError> {
        Self::with_options(
            base_url,
            tokens,
            Some(DEFAULT_REQUEST_TIMEOUT),
            RetryPolicy::None,
        )
    }

    /// `timeout` is ignored on wasm, where the browser owns request lifetimes.
    pub fn with_options(
        base_url: &str,
        tokens: TokenStore,
        timeout: Option<Duration>,
        read_retry: RetryPolicy,
    ) -> Result<Self, HttpError> {
        #[allow(unused_mut)]
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(t) = timeout {
                builder = builder.timeout(t);
            }
            builder = builder.pool_max_idle_per_host(10);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
            tokens,
            read_retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    /// `POST /auth/login`. Stores the returned token.
    ///
    /// A failed login never touches the stored token.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SdkError> {
        let url = format!("{}/auth/login", self.base_url);
        let envelope: Envelope<LoginResponse> = self
            .do_request(&Method::POST, &url, Some(credentials), None, FailureFallback::Login)
            .await?;

        if !envelope.is_success() {
            let message = envelope
                .message
                .unwrap_or_else(|| crate::http::envelope::LOGIN_FAILED_MESSAGE.to_string());
            return Err(AuthError::LoginFailed(message).into());
        }
        let login = envelope.data.ok_or(AuthError::MissingToken)?;
        let token = login
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.tokens.set(Some(token));
        tracing::info!(
            user = login.user.as_ref().map(|u| u.username.as_str()).unwrap_or(""),
            "Logged in"
        );
        Ok(login)
    }

    /// `POST /auth/register`. Returns the server's confirmation text.
    ///
    /// Some deployments answer with the created user instead of a string;
    /// the envelope message is returned then.
    pub async fn register(&self, credentials: &Credentials) -> Result<String, HttpError> {
        let url = format!("{}/auth/register", self.base_url);
        let envelope: Envelope<serde_json::Value> = self
            .do_request(&Method::POST, &url, Some(credentials), None, FailureFallback::Api)
            .await?;
        let message = envelope.message.clone();
        match envelope.into_result()? {
            Some(serde_json::Value::String(text)) => Ok(text),
            _ => Ok(message.unwrap_or_default()),
        }
    }

    /// Drop the session locally. The server keeps no session state.
    pub fn logout(&self) {
        self.tokens.clear();
        tracing::info!("User logged out, token cleared");
    }

    // ── Orders ───────────────────────────────────────────────────────────

    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<Order, HttpError> {
        self.call(Method::POST, "/api/order/place", Some(request))
            .await?
            .ok_or_else(|| HttpError::Decode("place order response has no data".to_string()))
    }

    pub async fn get_my_orders(&self) -> Result<Vec<Order>, HttpError> {
        Ok(self
            .call::<Vec<Order>, ()>(Method::GET, "/api/order/my-orders", None)
            .await?
            .unwrap_or_default())
    }

    pub async fn cancel_order(&self, order_id: i64) -> Result<(), HttpError> {
        let path = format!("/api/order/cancel/{}", order_id);
        self.call::<serde_json::Value, ()>(Method::POST, &path, None)
            .await?;
        Ok(())
    }

    // ── Wallet ───────────────────────────────────────────────────────────

    pub async fn get_balances(&self) -> Result<Vec<WalletBalance>, HttpError> {
        Ok(self
            .call::<Vec<WalletBalance>, ()>(Method::GET, "/api/wallet/balances", None)
            .await?
            .unwrap_or_default())
    }

    /// `POST /api/wallet/deposit`: credits the current user directly.
    /// Only enabled on test deployments.
    pub async fn deposit(&self, request: &DepositRequest) -> Result<(), HttpError> {
        self.call::<serde_json::Value, _>(Method::POST, "/api/wallet/deposit", Some(request))
            .await?;
        Ok(())
    }

    pub async fn get_assets(&self) -> Result<Vec<Asset>, HttpError> {
        Ok(self
            .call::<Vec<Asset>, ()>(Method::GET, "/api/assets", None)
            .await?
            .unwrap_or_default())
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    /// Authenticated request. Fails before any I/O when no token is stored;
    /// a 401 answer clears the session.
    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, HttpError> {
        let token = self.tokens.get().ok_or(HttpError::AuthenticationRequired)?;
        let url = format!("{}{}", self.base_url, path);
        let retry = self.read_retry.for_method(&method);

        match self
            .request_with_retry::<T, B>(method, &url, body, &token, retry)
            .await
        {
            Ok(envelope) => envelope.into_result(),
            Err(e) => {
                if e.is_unauthorized() {
                    tracing::warn!("{} answered 401, clearing session", path);
                    self.tokens.clear();
                }
                Err(e)
            }
        }
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        token: &str,
        retry: RetryPolicy,
    ) -> Result<Envelope<T>, HttpError> {
        let config = match retry {
            RetryPolicy::None => {
                return self
                    .do_request(&method, url, body, Some(token), FailureFallback::Api)
                    .await;
            }
            RetryPolicy::Reads(c) => c,
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self
                .do_request::<T, B>(&method, url, body, Some(token), FailureFallback::Api)
                .await
            {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::HttpFailure { status, .. } => config.retries_status(*status),
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            #[cfg(not(target_arch = "wasm32"))]
                            let retryable = re.is_connect() || re.is_request();
                            #[cfg(target_arch = "wasm32")]
                            let retryable = re.is_request();
                            retryable
                        }
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else if last_error.is_some() && should_retry {
                        return Err(HttpError::MaxRetriesExceeded {
                            attempts: config.max_retries + 1,
                            last_error: e.to_string(),
                        });
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        token: Option<&str>,
        fallback: FailureFallback,
    ) -> Result<Envelope<T>, HttpError> {
        let mut req = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        tracing::debug!("{} {}", method, url);
        let resp = req.send().await.map_err(map_transport)?;
        let status = resp.status();
        let body_text = resp.text().await.map_err(map_transport)?;

        if !status.is_success() {
            return Err(HttpError::HttpFailure {
                status: status.as_u16(),
                message: fallback.message(&body_text),
            });
        }

        serde_json::from_str(&body_text).map_err(|e| {
            tracing::warn!("Undecodable response from {}: {}", url, e);
            HttpError::Decode(e.to_string())
        })
    }
}

fn map_transport(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(e)
    }
}

impl std::fmt::Debug for CexHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CexHttp")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .field("read_retry", &self.read_retry)
            .finish()
    }
}

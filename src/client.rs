//! High-level client: `CexClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared session state and the
//! factories for realtime connections.

use crate::auth::client::Auth;
use crate::auth::TokenStore;
use crate::domain::order::client::Orders;
use crate::domain::wallet::client::Wallet;
use crate::error::SdkError;
use crate::http::retry::RetryPolicy;
use crate::http::{CexHttp, DEFAULT_REQUEST_TIMEOUT};
use crate::notification::Notifier;
use crate::storage::{MemoryStore, SharedStore};
use crate::ws::{MarketFeed, WsConfig};

use std::sync::Arc;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::order::client::Orders as OrdersClient;
pub use crate::domain::wallet::client::Wallet as WalletClient;

/// The primary entry point for the CEX SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.auth()`, `client.orders()`, `client.wallet()`.
#[derive(Clone)]
pub struct CexClient {
    pub(crate) http: CexHttp,
    pub(crate) tokens: TokenStore,
    storage: SharedStore,
    ws_config: WsConfig,
    persist_ticker: bool,
}

impl CexClient {
    pub fn builder() -> CexClientBuilder {
        CexClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    pub fn wallet(&self) -> Wallet<'_> {
        Wallet { client: self }
    }

    // ── Shared state ─────────────────────────────────────────────────────

    pub fn http(&self) -> &CexHttp {
        &self.http
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn storage(&self) -> &SharedStore {
        &self.storage
    }

    /// Get a WS config for creating a WebSocket connection.
    ///
    /// Realtime connections are not embedded in `CexClient`; their lifetime
    /// belongs to whatever view is showing the market.
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// A fresh market feed, restoring the last ticker price from storage
    /// unless ticker persistence was disabled on the builder.
    pub fn market_feed(&self, notifier: Arc<dyn Notifier>) -> MarketFeed {
        let feed = MarketFeed::new(notifier);
        if self.persist_ticker {
            feed.with_ticker_storage(Arc::clone(&self.storage))
        } else {
            feed
        }
    }

    /// A realtime client over a new market feed. Does not connect yet.
    #[cfg(any(feature = "ws-native", feature = "ws-wasm"))]
    pub fn realtime(&self, notifier: Arc<dyn Notifier>) -> crate::ws::RealtimeClient {
        crate::ws::RealtimeClient::new(
            self.ws_config.clone(),
            Arc::new(self.market_feed(notifier)),
        )
    }
}

impl std::fmt::Debug for CexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CexClient")
            .field("http", &self.http)
            .field("ws_url", &self.ws_config.url)
            .field("authenticated", &self.tokens.is_authenticated())
            .finish()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct CexClientBuilder {
    base_url: String,
    ws_url: String,
    storage: Option<SharedStore>,
    request_timeout: Option<Duration>,
    read_retry: RetryPolicy,
    persist_ticker: bool,
    connect_timeout: Duration,
    event_buffer: usize,
}

impl Default for CexClientBuilder {
    fn default() -> Self {
        let ws = WsConfig::default();
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            ws_url: ws.url,
            storage: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            read_retry: RetryPolicy::None,
            persist_ticker: true,
            connect_timeout: Duration::from_millis(ws.connect_timeout_ms),
            event_buffer: ws.event_buffer,
        }
    }
}

impl CexClientBuilder {
    /// Builder seeded from `CEX_API_URL` / `CEX_WS_URL`, falling back to the
    /// local defaults for whichever is unset.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Ok(url) = std::env::var(crate::network::API_URL_ENV) {
            builder.base_url = url;
        }
        if let Ok(url) = std::env::var(crate::network::WS_URL_ENV) {
            builder.ws_url = url;
        }
        builder
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    /// Where the token and last ticker price persist. Defaults to memory.
    pub fn storage(mut self, storage: SharedStore) -> Self {
        self.storage = Some(storage);
        self
    }

    /// `None` disables the client-side timeout.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Retry policy for idempotent (GET) endpoints. Writes are never retried.
    pub fn read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    pub fn persist_ticker(mut self, enabled: bool) -> Self {
        self.persist_ticker = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn build(self) -> Result<CexClient, SdkError> {
        if self.base_url.trim().is_empty() {
            return Err(SdkError::Validation("base_url must not be empty".into()));
        }
        if self.ws_url.trim().is_empty() {
            return Err(SdkError::Validation("ws_url must not be empty".into()));
        }

        let storage = self.storage.unwrap_or_else(MemoryStore::shared);
        let tokens = TokenStore::new(Arc::clone(&storage));
        let http = CexHttp::with_options(
            &self.base_url,
            tokens.clone(),
            self.request_timeout,
            self.read_retry,
        )?;

        tracing::debug!(base_url = %http.base_url(), ws_url = %self.ws_url, "CexClient built");

        Ok(CexClient {
            http,
            tokens,
            storage,
            ws_config: WsConfig {
                url: self.ws_url,
                connect_timeout_ms: u64::try_from(self.connect_timeout.as_millis())
                    .unwrap_or(u64::MAX),
                event_buffer: self.event_buffer,
            },
            persist_ticker: self.persist_ticker,
        })
    }
}

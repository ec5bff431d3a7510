//! # dwanj CEX SDK
//!
//! Rust client for the dwanj centralized exchange, for native and WASM targets.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Shared newtypes, domain models, order book and ticker state (always available)
//! 2. **Auth**: Token store persisted through a key-value [`storage`] backend
//! 3. **HTTP API**: `CexHttp`: envelope unwrapping, bearer auth, opt-in read retries
//! 4. **WebSocket**: Compile-time dispatch: `tokio-tungstenite` (native) / `web-sys` (WASM),
//!    driving a [`ws::MarketFeed`] and order-update toasts
//! 5. **High-Level Client**: `CexClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dwanj_cex_sdk::prelude::*;
//!
//! let client = CexClient::builder()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! client.auth().login("alice", "secret").await?;
//! let order = client
//!     .orders()
//!     .place(&PlaceOrderRequest::limit("BTCUSDT", Side::Buy, price, amount))
//!     .await?;
//!
//! let mut rt = client.realtime(Arc::new(ToastBoard::new()));
//! rt.connect("BTCUSDT")?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and serde helpers.
pub mod shared;

/// Domain modules (vertical slices): orders, wallet, order book.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

/// Persisted key-value storage backends.
pub mod storage;

/// Transient order notifications.
pub mod notification;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: token store, credentials, login/logout.
pub mod auth;

// ── Layer 3: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with envelope handling and retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// WebSocket client: frames, subscriptions, events, market feed.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `CexClient`: the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::Symbol;

    // Domain types: order
    pub use crate::domain::order::{Order, OrderStatus, OrderType, PlaceOrderRequest, Side};

    // Domain types: wallet
    pub use crate::domain::wallet::{Asset, WalletBalance};

    // Domain types: order book + ticker
    pub use crate::domain::orderbook::{
        BookLevel, OrderBookData, OrderBookState, PriceDirection, TickerState,
    };

    // Errors
    pub use crate::error::{AuthError, HttpError, SdkError, StorageError, WsError};

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    // Auth + User types
    pub use crate::auth::{Credentials, LoginResponse, TokenStore, User};

    // Storage
    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::storage::FileStore;
    #[cfg(feature = "ws-wasm")]
    pub use crate::storage::LocalStorage;
    pub use crate::storage::{KeyValueStore, MemoryStore, SharedStore};

    // Notifications
    #[cfg(feature = "ws-wasm")]
    pub use crate::notification::DomToaster;
    pub use crate::notification::{
        LogNotifier, Notifier, OrderNotification, ToastKind, ToastOptions,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::notification::{Toast, ToastBoard};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{AuthClient, CexClient, CexClientBuilder, OrdersClient, WalletClient};
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // WebSocket types
    #[cfg(any(feature = "ws-native", feature = "ws-wasm"))]
    pub use crate::ws::RealtimeClient;
    pub use crate::ws::{
        Kind, MarketFeed, MessageOut, ReadyState, SubscriptionSet, Topic, WsConfig, WsEvent,
        WsHandler,
    };
}

//! `MarketFeed`: realtime state for one connection.
//!
//! Holds the order book, the ticker and the subscription set, and routes
//! private order updates to a [`Notifier`]. The transport drives it through
//! [`WsHandler`]; readers take cloned snapshots.

use crate::domain::orderbook::state::CONNECTION_FAILED_MESSAGE;
use crate::domain::orderbook::{parse_stored_price, OrderBookState, TickerState};
use crate::notification::Notifier;
use crate::shared::Symbol;
use crate::storage::{SharedStore, TICKER_PRICE_KEY};
use crate::ws::subscriptions::SubscriptionSet;
use crate::ws::{Kind, MessageOut, WsEvent, WsHandler};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Connection-scoped bookkeeping, updated under one lock so a symbol switch
/// and a socket open cannot interleave.
#[derive(Debug, Default)]
struct Session {
    watched: Option<Symbol>,
    subscriptions: SubscriptionSet,
    open: bool,
}

pub struct MarketFeed {
    orderbook: RwLock<OrderBookState>,
    ticker: RwLock<TickerState>,
    session: Mutex<Session>,
    notifier: Arc<dyn Notifier>,
    ticker_store: Option<SharedStore>,
}

impl MarketFeed {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            orderbook: RwLock::new(OrderBookState::new()),
            ticker: RwLock::new(TickerState::new()),
            session: Mutex::new(Session::default()),
            notifier,
            ticker_store: None,
        }
    }

    /// Mirror ticker prices to `store`, seeding the ticker from the last
    /// persisted value.
    pub fn with_ticker_storage(mut self, store: SharedStore) -> Self {
        if let Some(raw) = store.get(TICKER_PRICE_KEY) {
            match parse_stored_price(&raw) {
                Some(price) => {
                    self.ticker.get_mut().restore(price);
                    tracing::debug!("Ticker restored from storage: {}", price);
                }
                None => tracing::warn!("Ignoring unparseable stored price {:?}", raw),
            }
        }
        self.ticker_store = Some(store);
        self
    }

    /// Make `symbol` the watched market.
    ///
    /// While the socket is open this returns the frames that move the
    /// subscription over; otherwise the symbol is subscribed on the next open.
    pub fn watch(&self, symbol: impl Into<Symbol>) -> Vec<MessageOut> {
        let symbol = symbol.into();
        let mut session = self.session.lock();
        let frames = if session.open {
            session.subscriptions.switch_to(&symbol)
        } else {
            Vec::new()
        };
        session.watched = Some(symbol);
        frames
    }

    pub fn watched(&self) -> Option<Symbol> {
        self.session.lock().watched.clone()
    }

    pub fn orderbook(&self) -> OrderBookState {
        self.orderbook.read().clone()
    }

    pub fn ticker(&self) -> TickerState {
        *self.ticker.read()
    }

    pub fn subscriptions(&self) -> SubscriptionSet {
        self.session.lock().subscriptions.clone()
    }

    /// Apply one inbound message.
    pub fn dispatch(&self, kind: &Kind) {
        match kind {
            Kind::OrderBook { book, .. } => {
                self.orderbook.write().apply(book);
            }
            Kind::Ticker { price, .. } => {
                self.ticker.write().apply(*price);
                if let Some(store) = &self.ticker_store {
                    if let Err(e) = store.set(TICKER_PRICE_KEY, &price.to_string()) {
                        tracing::warn!("Failed to persist ticker price: {}", e);
                    }
                }
            }
            Kind::Private { update, .. } => {
                tracing::info!(order_id = %update.order_id, status = %update.status, "Order update");
                self.notifier.show(&update.message(), update.toast_options());
            }
            Kind::Auth { status, message } => {
                tracing::info!(
                    "WebSocket authentication status: {}{}",
                    status,
                    message.as_deref().map(|m| format!(" ({})", m)).unwrap_or_default()
                );
            }
            Kind::ServerError(message) => {
                tracing::warn!("Server rejected a frame: {}", message);
            }
            Kind::Unknown(raw) => {
                tracing::debug!("Unhandled WS message: {}", raw);
            }
        }
    }
}

impl WsHandler for MarketFeed {
    fn on_event(&self, event: &WsEvent) -> Vec<MessageOut> {
        match event {
            WsEvent::Connected => {
                let mut session = self.session.lock();
                session.open = true;
                self.orderbook.write().mark_open();
                tracing::info!("WebSocket connected");
                match session.watched.clone() {
                    Some(symbol) => session.subscriptions.switch_to(&symbol),
                    None => Vec::new(),
                }
            }
            WsEvent::Message(kind) => {
                self.dispatch(kind);
                Vec::new()
            }
            WsEvent::Disconnected { code, reason } => {
                let mut session = self.session.lock();
                session.open = false;
                session.subscriptions.clear();
                self.orderbook.write().mark_closed();
                tracing::info!(code = ?code, "WebSocket disconnected: {}", reason);
                Vec::new()
            }
            WsEvent::ConnectionFailed(reason) => {
                let mut session = self.session.lock();
                session.open = false;
                session.subscriptions.clear();
                self.orderbook.write().record_error(CONNECTION_FAILED_MESSAGE);
                tracing::error!("WebSocket error: {}", reason);
                Vec::new()
            }
            WsEvent::Error(message) => {
                tracing::warn!("Dropped WS frame: {}", message);
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for MarketFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketFeed")
            .field("watched", &self.watched())
            .field("orderbook", &*self.orderbook.read())
            .field("ticker", &*self.ticker.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orderbook::{BookLevel, OrderBookData, PriceDirection};
    use crate::notification::{OrderNotification, ToastKind, ToastOptions};
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::ws::Op;
    use rust_decimal::Decimal;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, ToastOptions)>>);

    impl Notifier for Recorder {
        fn show(&self, message: &str, options: ToastOptions) {
            self.0.lock().push((message.to_string(), options));
        }
    }

    fn feed() -> (MarketFeed, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (MarketFeed::new(recorder.clone()), recorder)
    }

    #[test]
    fn test_open_subscribes_watched_symbol_once() {
        let (feed, _) = feed();
        assert!(feed.watch("BTCUSDT").is_empty());

        let frames = feed.on_event(&WsEvent::Connected);
        assert_eq!(frames, vec![MessageOut::subscribe(["orderbook:BTCUSDT", "ticker:BTCUSDT"])]);
        assert!(feed.orderbook().is_connected);
        assert_eq!(feed.subscriptions().len(), 2);
    }

    #[test]
    fn test_watch_while_open_switches() {
        let (feed, _) = feed();
        feed.watch("BTCUSDT");
        feed.on_event(&WsEvent::Connected);

        let frames = feed.watch("ETHUSDT");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].op, Op::Unsubscribe);
        assert_eq!(frames[1].args, vec!["orderbook:ETHUSDT", "ticker:ETHUSDT"]);
        assert!(feed.watch("ETHUSDT").is_empty());
    }

    #[test]
    fn test_symbol_changed_before_open_wins() {
        let (feed, _) = feed();
        feed.watch("BTCUSDT");
        feed.watch("SOLUSDT");
        let frames = feed.on_event(&WsEvent::Connected);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].args, vec!["orderbook:SOLUSDT", "ticker:SOLUSDT"]);
    }

    #[test]
    fn test_close_clears_subscriptions_and_error_is_recorded() {
        let (feed, _) = feed();
        feed.watch("BTCUSDT");
        feed.on_event(&WsEvent::Connected);
        feed.on_event(&WsEvent::Disconnected {
            code: Some(1000),
            reason: "bye".into(),
        });
        assert!(feed.subscriptions().is_empty());
        assert!(!feed.orderbook().is_connected);
        assert!(feed.watch("ETHUSDT").is_empty());

        feed.on_event(&WsEvent::ConnectionFailed("refused".into()));
        assert_eq!(
            feed.orderbook().error.as_deref(),
            Some("WebSocket connection failed.")
        );

        feed.on_event(&WsEvent::Connected);
        assert!(feed.orderbook().error.is_none());
    }

    #[test]
    fn test_dispatch_updates_state_and_notifies() {
        let (feed, recorder) = feed();
        feed.dispatch(&Kind::OrderBook {
            symbol: "BTCUSDT".into(),
            book: OrderBookData {
                bids: vec![BookLevel::new(Decimal::from(100), Decimal::ONE)],
                asks: vec![],
            },
        });
        assert_eq!(feed.orderbook().bids.len(), 1);

        feed.dispatch(&Kind::Ticker {
            symbol: "BTCUSDT".into(),
            price: Decimal::from(100),
        });
        feed.dispatch(&Kind::Ticker {
            symbol: "BTCUSDT".into(),
            price: Decimal::from(99),
        });
        let ticker = feed.ticker();
        assert_eq!(ticker.last_price, Decimal::from(100));
        assert_eq!(ticker.direction(), PriceDirection::Down);

        feed.dispatch(&Kind::Private {
            user_id: "7".into(),
            update: OrderNotification {
                kind: Some("orderUpdate".into()),
                order_id: "42".into(),
                status: "FILLED".into(),
                reason: None,
            },
        });
        let shown = recorder.0.lock();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].0.contains("42"));
        assert_eq!(shown[0].1.kind, ToastKind::Success);
    }

    #[cfg(feature = "ws-native")]
    #[tokio::test(start_paused = true)]
    async fn test_private_push_shows_one_toast_until_expiry() {
        use crate::notification::ToastBoard;
        use crate::ws::parse_message;

        let board = ToastBoard::new();
        let feed = MarketFeed::new(Arc::new(board.clone()));
        let kind = parse_message(
            r#"{"topic":"private:7","data":{"orderId":"X","status":"FILLED","reason":"ok"}}"#,
        )
        .unwrap();
        feed.on_event(&WsEvent::Message(kind));

        let visible = board.visible();
        assert_eq!(visible.len(), 1);
        let text = &visible[0].message;
        assert!(text.contains('X'));
        assert!(text.contains("FILLED"));
        assert!(text.contains("ok"));
        assert_eq!(text, "Order X FILLED: ok");

        let lifetime = visible[0].duration + crate::notification::DISMISS_GRACE;
        tokio::time::sleep(lifetime - std::time::Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(board.len(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(board.is_empty());
    }

    #[test]
    fn test_ticker_persisted_and_restored() {
        let store = Arc::new(MemoryStore::new());
        let (feed, _) = feed();
        let feed = feed.with_ticker_storage(store.clone());
        feed.dispatch(&Kind::Ticker {
            symbol: "BTCUSDT".into(),
            price: "65000.5".parse().unwrap(),
        });
        assert_eq!(store.get(TICKER_PRICE_KEY).as_deref(), Some("65000.5"));

        let restored = MarketFeed::new(Arc::new(Recorder::default())).with_ticker_storage(store);
        let ticker = restored.ticker();
        assert_eq!(ticker.price, "65000.5".parse::<Decimal>().unwrap());
        assert_eq!(ticker.price, ticker.last_price);
        assert_eq!(ticker.direction(), PriceDirection::Flat);
    }
}

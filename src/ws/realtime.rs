//! `RealtimeClient`: one socket plus the [`MarketFeed`] it drives.

use std::sync::Arc;

use crate::domain::orderbook::{OrderBookState, TickerState};
use crate::error::WsError;
use crate::shared::Symbol;
use crate::ws::feed::MarketFeed;
use crate::ws::subscriptions::SubscriptionSet;
use crate::ws::{MessageOut, ReadyState, WsConfig, WsHandler};

#[cfg(feature = "ws-native")]
use crate::ws::native::WsClient;
#[cfg(all(feature = "ws-wasm", not(feature = "ws-native")))]
use crate::ws::wasm::WsClient;

/// Realtime market data for one symbol at a time.
///
/// ```ignore
/// let mut rt = client.realtime(Arc::new(LogNotifier));
/// rt.connect("BTCUSDT")?;
/// // later
/// rt.connect("ETHUSDT")?; // unsubscribes BTCUSDT, subscribes ETHUSDT
/// let book = rt.orderbook();
/// ```
pub struct RealtimeClient {
    ws: WsClient,
    feed: Arc<MarketFeed>,
}

impl RealtimeClient {
    pub fn new(config: WsConfig, feed: Arc<MarketFeed>) -> Self {
        let handler: Arc<dyn WsHandler> = feed.clone();
        Self {
            ws: WsClient::with_handler(config, handler),
            feed,
        }
    }

    /// Watch `symbol`, opening the socket if needed.
    ///
    /// - Open: moves the subscription to `symbol` (nothing if unchanged)
    /// - Connecting: `symbol` is subscribed once the socket opens
    /// - Closed: opens a new socket
    ///
    /// A socket that closes while the switch is being sent is reopened; the
    /// new socket subscribes `symbol` once open.
    pub fn connect(&mut self, symbol: impl Into<Symbol>) -> Result<(), WsError> {
        let frames = self.feed.watch(symbol);
        if !frames.is_empty() {
            match frames.into_iter().try_for_each(|f| self.ws.send(f)) {
                Err(WsError::NotConnected) => {
                    tracing::debug!("Socket closed during symbol switch, reconnecting");
                }
                other => return other,
            }
        }
        match self.ws.ready_state() {
            ReadyState::Open | ReadyState::Connecting => Ok(()),
            ReadyState::Closing | ReadyState::Closed => self.ws.connect(),
        }
    }

    /// Send an auth frame so the server starts pushing `private:<userId>`.
    pub fn authenticate(&self, token: impl Into<String>) -> Result<(), WsError> {
        if !self.ws.is_connected() {
            return Err(WsError::NotConnected);
        }
        self.ws.send(MessageOut::auth(token))
    }

    #[cfg(feature = "ws-native")]
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        self.ws.disconnect().await
    }

    #[cfg(all(feature = "ws-wasm", not(feature = "ws-native")))]
    pub fn disconnect(&mut self) -> Result<(), WsError> {
        self.ws.disconnect();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.ws.is_connected()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ws.ready_state()
    }

    pub fn orderbook(&self) -> OrderBookState {
        self.feed.orderbook()
    }

    pub fn ticker(&self) -> TickerState {
        self.feed.ticker()
    }

    pub fn subscriptions(&self) -> SubscriptionSet {
        self.feed.subscriptions()
    }

    pub fn feed(&self) -> &Arc<MarketFeed> {
        &self.feed
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }

    /// Stream of transport events, after the feed has applied them.
    #[cfg(feature = "ws-native")]
    pub fn events(
        &self,
    ) -> std::pin::Pin<Box<dyn futures_util::Stream<Item = crate::ws::WsEvent> + Send + '_>> {
        self.ws.events()
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("ready_state", &self.ws.ready_state())
            .field("feed", &self.feed)
            .finish()
    }
}

#[cfg(all(test, feature = "ws-native"))]
mod tests {
    use super::*;
    use crate::notification::LogNotifier;

    fn client(url: &str) -> RealtimeClient {
        let config = WsConfig {
            url: url.into(),
            ..WsConfig::default()
        };
        RealtimeClient::new(config, Arc::new(MarketFeed::new(Arc::new(LogNotifier))))
    }

    #[test]
    fn test_authenticate_requires_open_socket() {
        let rt = client("ws://127.0.0.1:1/ws/v1");
        assert!(matches!(rt.authenticate("jwt"), Err(WsError::NotConnected)));
    }

    #[tokio::test]
    async fn test_switch_on_closed_socket_reconnects() {
        let mut rt = client("ws://127.0.0.1:1/ws/v1");
        rt.feed().watch("BTCUSDT");
        // Feed still believes the socket is open; the transport is closed.
        rt.feed().on_event(&crate::ws::WsEvent::Connected);
        assert_eq!(rt.ready_state(), ReadyState::Closed);

        rt.connect("ETHUSDT").unwrap();
        assert_eq!(rt.ready_state(), ReadyState::Connecting);
        assert_eq!(rt.feed().watched(), Some(Symbol::from("ETHUSDT")));
        rt.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_records_watched_symbol() {
        let mut rt = client("ws://127.0.0.1:1/ws/v1");
        rt.connect("BTCUSDT").unwrap();
        assert_eq!(rt.feed().watched(), Some(Symbol::from("BTCUSDT")));
        rt.connect("ETHUSDT").unwrap();
        assert_eq!(rt.feed().watched(), Some(Symbol::from("ETHUSDT")));
        rt.disconnect().await.unwrap();
        assert!(!rt.is_connected());
    }
}

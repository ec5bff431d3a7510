//! WebSocket layer: frames, topics, events, the market feed.
//!
//! The actual WS transport is compile-time dispatched:
//! - `ws-native` feature → `tokio-tungstenite` (native.rs)
//! - `ws-wasm` feature → `web-sys::WebSocket` (wasm.rs)
//!
//! Both export a `WsClient` with the same surface, and both drive a
//! [`WsHandler`] from the socket's own callbacks: the handler sees every
//! event first and may answer with frames to send. [`MarketFeed`] is the
//! handler that keeps order book, ticker and subscription state;
//! [`RealtimeClient`] pairs it with a transport.

pub mod feed;
pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

#[cfg(feature = "ws-wasm")]
pub mod wasm;

#[cfg(any(feature = "ws-native", feature = "ws-wasm"))]
mod realtime;

use crate::domain::orderbook::OrderBookData;
use crate::error::WsError;
use crate::notification::OrderNotification;
use crate::shared::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use feed::MarketFeed;
#[cfg(any(feature = "ws-native", feature = "ws-wasm"))]
pub use realtime::RealtimeClient;
pub use subscriptions::{SubscriptionSet, Topic};

// ─── Outbound messages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Subscribe,
    Unsubscribe,
    Auth,
}

/// Client → server frame: `{"op": "...", "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOut {
    pub op: Op,
    pub args: Vec<String>,
}

impl MessageOut {
    pub fn subscribe<I, T>(topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            op: Op::Subscribe,
            args: topics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unsubscribe<I, T>(topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            op: Op::Unsubscribe,
            args: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// Associate the connection with a user so `private:<userId>` frames arrive.
    pub fn auth(token: impl Into<String>) -> Self {
        Self {
            op: Op::Auth,
            args: vec![token.into()],
        }
    }

    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::SendFailed(e.to_string()))
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// A parsed server → client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// `orderbook:<symbol>`: full snapshot.
    OrderBook { symbol: Symbol, book: OrderBookData },
    /// `ticker:<symbol>`: last trade price.
    Ticker { symbol: Symbol, price: Decimal },
    /// `private:<userId>`: one of the user's orders changed.
    Private {
        user_id: String,
        update: OrderNotification,
    },
    /// `{"event": "auth", "status": ...}`: reply to an auth frame.
    Auth {
        status: String,
        message: Option<String>,
    },
    /// `{"error": ...}`: the server rejected a frame.
    ServerError(String),
    /// Anything else, kept raw.
    Unknown(String),
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Parse one text frame. Topics are matched by prefix only.
pub fn parse_message(text: &str) -> Result<Kind, WsError> {
    let raw: RawMessage = serde_json::from_str(text)
        .map_err(|e| WsError::DeserializationError(e.to_string()))?;

    if let Some(topic) = raw.topic.as_deref() {
        let Some((channel, key)) = topic.split_once(':') else {
            return Ok(Kind::Unknown(text.to_string()));
        };
        return match channel {
            subscriptions::ORDERBOOK_CHANNEL => Ok(Kind::OrderBook {
                symbol: Symbol::from(key),
                book: decode(raw.data)?,
            }),
            subscriptions::TICKER_CHANNEL => {
                let price = crate::domain::orderbook::parse_ticker_price(&raw.data)
                    .ok_or_else(|| {
                        WsError::DeserializationError(format!(
                            "unparseable ticker price: {}",
                            raw.data
                        ))
                    })?;
                Ok(Kind::Ticker {
                    symbol: Symbol::from(key),
                    price,
                })
            }
            subscriptions::PRIVATE_CHANNEL => Ok(Kind::Private {
                user_id: key.to_string(),
                update: decode(raw.data)?,
            }),
            _ => Ok(Kind::Unknown(text.to_string())),
        };
    }

    if raw.event.as_deref() == Some("auth") {
        return Ok(Kind::Auth {
            status: raw.status.unwrap_or_default(),
            message: raw.message,
        });
    }

    if let Some(error) = raw.error {
        let text = match error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Ok(Kind::ServerError(text));
    }

    Ok(Kind::Unknown(text.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, WsError> {
    serde_json::from_value(data).map_err(|e| WsError::DeserializationError(e.to_string()))
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted by the WS client to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// Socket open.
    Connected,
    /// A parsed message from the server.
    Message(Kind),
    /// Socket closed. Not reopened automatically.
    Disconnected { code: Option<u16>, reason: String },
    /// The socket failed, while connecting or after. A `Disconnected`
    /// follows if it had been open.
    ConnectionFailed(String),
    /// A frame could not be parsed.
    Error(String),
}

/// Reacts to transport events from inside the socket's callback context.
///
/// Returned frames are sent on the same socket before the next event is read.
pub trait WsHandler: Send + Sync + 'static {
    fn on_event(&self, event: &WsEvent) -> Vec<MessageOut>;
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the WS client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Native only: give up opening the socket after this long.
    pub connect_timeout_ms: u64,
    /// Events buffered for the event stream before new ones are dropped.
    pub event_buffer: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            connect_timeout_ms: 30_000,
            event_buffer: 256,
        }
    }
}

/// Connection state, numbered as the browser's `WebSocket.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_out_wire_format() {
        let sub = MessageOut::subscribe(["orderbook:BTCUSDT", "ticker:BTCUSDT"]);
        assert_eq!(
            sub.to_json().unwrap(),
            r#"{"op":"subscribe","args":["orderbook:BTCUSDT","ticker:BTCUSDT"]}"#
        );
        let auth = MessageOut::auth("jwt");
        assert_eq!(auth.to_json().unwrap(), r#"{"op":"auth","args":["jwt"]}"#);
    }

    #[test]
    fn test_parse_orderbook_frame() {
        let kind = parse_message(
            r#"{"topic":"orderbook:BTCUSDT","data":{"bids":[[100,1]],"asks":[{"price":101,"quantity":2}]}}"#,
        )
        .unwrap();
        match kind {
            Kind::OrderBook { symbol, book } => {
                assert_eq!(symbol.as_str(), "BTCUSDT");
                assert_eq!(book.bids.len(), 1);
                assert_eq!(book.asks[0].quantity, Decimal::from(2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ticker_frame() {
        let kind = parse_message(r#"{"topic":"ticker:ETHUSDT","data":3150.5}"#).unwrap();
        assert_eq!(
            kind,
            Kind::Ticker {
                symbol: Symbol::from("ETHUSDT"),
                price: "3150.5".parse().unwrap(),
            }
        );
        assert!(matches!(
            parse_message(r#"{"topic":"ticker:ETHUSDT","data":"n/a"}"#),
            Err(WsError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_parse_private_frame() {
        let kind = parse_message(
            r#"{"topic":"private:7","data":{"type":"orderUpdate","orderId":55,"status":"CANCELED","reason":"IOC"}}"#,
        )
        .unwrap();
        match kind {
            Kind::Private { user_id, update } => {
                assert_eq!(user_id, "7");
                assert_eq!(update.order_id, "55");
                assert_eq!(update.reason.as_deref(), Some("IOC"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_control_frames() {
        assert_eq!(
            parse_message(r#"{"event":"auth","status":"success"}"#).unwrap(),
            Kind::Auth {
                status: "success".into(),
                message: None
            }
        );
        assert_eq!(
            parse_message(r#"{"error":"Invalid token"}"#).unwrap(),
            Kind::ServerError("Invalid token".into())
        );
        assert!(matches!(
            parse_message(r#"{"topic":"trades:BTCUSDT","data":[]}"#).unwrap(),
            Kind::Unknown(_)
        ));
        assert!(matches!(parse_message(r#"{"hello":1}"#).unwrap(), Kind::Unknown(_)));
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_ready_state_roundtrip() {
        for state in [
            ReadyState::Connecting,
            ReadyState::Open,
            ReadyState::Closing,
            ReadyState::Closed,
        ] {
            assert_eq!(ReadyState::from(state as u16), state);
        }
        assert_eq!(ReadyState::from(99), ReadyState::Closed);
    }
}

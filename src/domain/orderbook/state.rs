//! Live order book state, fed by the realtime connection.

use crate::domain::orderbook::{BookLevel, OrderBookData};
use rust_decimal::Decimal;

/// Text recorded when the socket reports an error.
pub const CONNECTION_FAILED_MESSAGE: &str = "WebSocket connection failed.";

/// Latest order book for the watched symbol plus connection status.
///
/// Every push replaces both sides wholesale; nothing is merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBookState {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub is_connected: bool,
    pub error: Option<String>,
}

impl OrderBookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both sides with a pushed snapshot.
    pub fn apply(&mut self, data: &OrderBookData) {
        self.bids = data.bids.clone();
        self.asks = data.asks.clone();
    }

    pub fn mark_open(&mut self) {
        self.is_connected = true;
        self.error = None;
    }

    /// Socket closed. Levels are kept so a UI can show the last book.
    pub fn mark_closed(&mut self) {
        self.is_connected = false;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.is_connected = false;
        self.error = Some(message.into());
    }

    /// Highest bid price, wherever the server placed it.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.price).min()
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> OrderBookData {
        let levels = |side: &[(i64, i64)]| -> Vec<BookLevel> {
            side.iter()
                .map(|&(p, q)| BookLevel::new(Decimal::from(p), Decimal::from(q)))
                .collect()
        };
        OrderBookData {
            bids: levels(bids),
            asks: levels(asks),
        }
    }

    #[test]
    fn test_push_replaces_state() {
        let mut state = OrderBookState::new();
        state.apply(&book(&[(50, 10), (49, 1)], &[(51, 5)]));
        assert_eq!(state.bids.len(), 2);

        state.apply(&book(&[(48, 20)], &[]));
        assert_eq!(state.bids, vec![BookLevel::new(Decimal::from(48), Decimal::from(20))]);
        assert!(state.asks.is_empty());
    }

    #[test]
    fn test_best_prices_ignore_level_order() {
        let mut state = OrderBookState::new();
        state.apply(&book(&[(49, 1), (50, 10)], &[(53, 1), (52, 5)]));
        assert_eq!(state.best_bid(), Some(Decimal::from(50)));
        assert_eq!(state.best_ask(), Some(Decimal::from(52)));
        assert_eq!(state.mid_price(), Some(Decimal::from(51)));
        assert_eq!(state.spread(), Some(Decimal::from(2)));
    }

    #[test]
    fn test_connection_status_transitions() {
        let mut state = OrderBookState::new();
        state.record_error(CONNECTION_FAILED_MESSAGE);
        assert!(!state.is_connected);
        assert_eq!(state.error.as_deref(), Some(CONNECTION_FAILED_MESSAGE));

        state.mark_open();
        assert!(state.is_connected);
        assert!(state.error.is_none());

        state.apply(&book(&[(1, 1)], &[]));
        state.mark_closed();
        assert!(!state.is_connected);
        assert!(!state.is_empty());
        state.clear();
        assert!(state.is_empty());
    }
}

//! Last-trade ticker: current and previous price for up/down coloring.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Movement of the latest price relative to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    Up,
    Down,
    Flat,
}

/// `last_price` always holds the `price` that preceded the latest update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerState {
    pub price: Decimal,
    pub last_price: Decimal,
}

impl TickerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the current price into `last_price`, then take `price`.
    pub fn apply(&mut self, price: Decimal) {
        self.last_price = self.price;
        self.price = price;
    }

    /// Seed from a persisted value. Both fields take it, so no direction shows.
    pub fn restore(&mut self, price: Decimal) {
        self.price = price;
        self.last_price = price;
    }

    pub fn direction(&self) -> PriceDirection {
        match self.price.cmp(&self.last_price) {
            std::cmp::Ordering::Greater => PriceDirection::Up,
            std::cmp::Ordering::Less => PriceDirection::Down,
            std::cmp::Ordering::Equal => PriceDirection::Flat,
        }
    }
}

/// Read a ticker price from a JSON number or numeric string.
pub fn parse_ticker_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => parse_stored_price(s),
        _ => None,
    }
}

/// Parse a price as persisted in storage.
pub fn parse_stored_price(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_shifts_previous_price() {
        let mut ticker = TickerState::new();
        ticker.apply(Decimal::from(100));
        assert_eq!(ticker.last_price, Decimal::ZERO);
        assert_eq!(ticker.direction(), PriceDirection::Up);

        ticker.apply(Decimal::from(95));
        assert_eq!(ticker.last_price, Decimal::from(100));
        assert_eq!(ticker.price, Decimal::from(95));
        assert_eq!(ticker.direction(), PriceDirection::Down);
    }

    #[test]
    fn test_restore_is_flat() {
        let mut ticker = TickerState::new();
        ticker.restore(Decimal::from(42));
        assert_eq!(ticker.price, ticker.last_price);
        assert_eq!(ticker.direction(), PriceDirection::Flat);
    }

    #[test]
    fn test_parse_ticker_price_forms() {
        assert_eq!(
            parse_ticker_price(&json!(65000.25)),
            Decimal::from_str("65000.25").ok()
        );
        assert_eq!(parse_ticker_price(&json!(12)), Some(Decimal::from(12)));
        assert_eq!(
            parse_ticker_price(&json!(" 0.0001 ")),
            Decimal::from_str("0.0001").ok()
        );
        assert_eq!(
            parse_ticker_price(&json!("1e3")),
            Some(Decimal::from(1000))
        );
        assert_eq!(parse_ticker_price(&json!("abc")), None);
        assert_eq!(parse_ticker_price(&json!(null)), None);
        assert_eq!(parse_ticker_price(&json!({"price": 1})), None);
    }
}

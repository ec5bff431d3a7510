//! Order domain: placement requests, server-side orders, validation.

#[cfg(feature = "http")]
pub mod client;

use crate::error::SdkError;
use crate::shared::{serde_util, Symbol};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Side ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

// ─── OrderType ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

// ─── OrderStatus ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Partial,
    Filled,
    Canceled,
}

impl OrderStatus {
    /// Still resting on the book.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::Partial)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Partial => write!(f, "PARTIAL"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

// ─── PlaceOrderRequest ───────────────────────────────────────────────────────

/// Body of `POST /api/order/place`.
///
/// Which amount fields are required depends on the order kind:
///
/// | kind        | price | amount | quoteAmount |
/// |-------------|-------|--------|-------------|
/// | limit       | yes   | yes    | —           |
/// | market buy  | —     | —      | yes         |
/// | market sell | —     | yes    | —           |
///
/// The server assigns the user id from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub symbol: Symbol,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub quote_amount: Option<Decimal>,
}

impl PlaceOrderRequest {
    pub fn limit(symbol: impl Into<Symbol>, side: Side, price: Decimal, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            price: Some(price),
            amount: Some(amount),
            quote_amount: None,
        }
    }

    /// Market buy spending `quote_amount` of the quote asset.
    pub fn market_buy(symbol: impl Into<Symbol>, quote_amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            side: Side::Buy,
            price: None,
            amount: None,
            quote_amount: Some(quote_amount),
        }
    }

    /// Market sell of `amount` of the base asset.
    pub fn market_sell(symbol: impl Into<Symbol>, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            side: Side::Sell,
            price: None,
            amount: Some(amount),
            quote_amount: None,
        }
    }

    /// Check the request shape before it is sent.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.symbol.as_str().trim().is_empty() {
            return Err(SdkError::Validation("symbol must not be empty".into()));
        }
        match (self.order_type, self.side) {
            (OrderType::Limit, _) => {
                require_positive("price", self.price)?;
                require_positive("amount", self.amount)?;
            }
            (OrderType::Market, Side::Buy) => {
                require_positive("quoteAmount", self.quote_amount)?;
            }
            (OrderType::Market, Side::Sell) => {
                require_positive("amount", self.amount)?;
            }
        }
        Ok(())
    }
}

fn require_positive(field: &str, value: Option<Decimal>) -> Result<(), SdkError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(()),
        Some(v) => Err(SdkError::Validation(format!(
            "{} must be positive, got {}",
            field, v
        ))),
        None => Err(SdkError::Validation(format!("{} is required", field))),
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

/// An order as the server stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub symbol: Symbol,
    /// Absent for market orders.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub filled: Decimal,
    pub side: Side,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "serde_util::lenient_datetime::deserialize")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "serde_util::lenient_datetime::deserialize")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Order {
    /// Quantity still unfilled.
    pub fn remaining(&self) -> Decimal {
        self.amount - self.filled
    }

    pub fn is_fully_filled(&self) -> bool {
        self.filled >= self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_limit_request_wire_shape() {
        let req = PlaceOrderRequest::limit("BTCUSDT", Side::Buy, d("65000.5"), d("0.25"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["type"], "LIMIT");
        assert_eq!(json["side"], "BUY");
        assert_eq!(json["price"], 65000.5);
        assert_eq!(json["amount"], 0.25);
        assert!(json.get("quoteAmount").is_none());
    }

    #[test]
    fn test_market_buy_sends_quote_amount() {
        let req = PlaceOrderRequest::market_buy("BTCUSDT", d("100"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "MARKET");
        assert_eq!(json["quoteAmount"], 100.0);
        assert!(json.get("price").is_none());
        assert!(json.get("amount").is_none());
    }

    #[test]
    fn test_validation_rules() {
        assert!(PlaceOrderRequest::limit("BTCUSDT", Side::Sell, d("1"), d("2"))
            .validate()
            .is_ok());
        assert!(PlaceOrderRequest::market_buy("BTCUSDT", d("10")).validate().is_ok());
        assert!(PlaceOrderRequest::market_sell("BTCUSDT", d("0.1")).validate().is_ok());

        let zero_price = PlaceOrderRequest::limit("BTCUSDT", Side::Buy, d("0"), d("1"));
        assert!(matches!(zero_price.validate(), Err(SdkError::Validation(_))));

        let mut missing = PlaceOrderRequest::market_buy("BTCUSDT", d("10"));
        missing.quote_amount = None;
        let err = missing.validate().unwrap_err();
        assert!(err.to_string().contains("quoteAmount is required"));

        let blank = PlaceOrderRequest::market_sell(" ", d("1"));
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_order_parses_server_entity() {
        let json = r#"{
            "id": 1024, "userId": 7, "symbol": "BTCUSDT",
            "price": 65000.00, "amount": 0.5, "filled": 0.2,
            "side": "SELL", "status": "PARTIAL",
            "createdAt": "2024-07-18T20:30:00.123", "updatedAt": null, "version": 3
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, 1024);
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.status, OrderStatus::Partial);
        assert!(order.status.is_open());
        assert_eq!(order.remaining(), d("0.3"));
        assert!(!order.is_fully_filled());
        assert!(order.created_at.is_some());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn test_market_order_without_price_or_filled() {
        let json = r#"{"id": 1, "symbol": "ETHUSDT", "price": null, "amount": 2,
                       "filled": null, "side": "BUY", "status": "NEW"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.price, None);
        assert_eq!(order.filled, Decimal::ZERO);
        assert_eq!(order.remaining(), d("2"));
    }
}

//! Order book domain: levels as pushed on `orderbook:<symbol>`, live book
//! state, and the last-trade ticker.

pub mod state;
pub mod ticker;

use crate::shared::serde_util;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use state::OrderBookState;
pub use ticker::{parse_stored_price, parse_ticker_price, PriceDirection, TickerState};

// ─── BookLevel ───────────────────────────────────────────────────────────────

/// One aggregated price level.
///
/// Accepted on the wire either as `[price, quantity]` or as
/// `{"price": .., "quantity": ..}`; always serialized as the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl BookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    /// `price * quantity`, in quote units.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Pair(Decimal, Decimal),
    Object {
        price: Decimal,
        #[serde(alias = "amount", alias = "size")]
        quantity: Decimal,
    },
}

impl<'de> Deserialize<'de> for BookLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Pair(price, quantity) => BookLevel { price, quantity },
            LevelRepr::Object { price, quantity } => BookLevel { price, quantity },
        })
    }
}

impl Serialize for BookLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.price, self.quantity).serialize(serializer)
    }
}

// ─── OrderBookData ───────────────────────────────────────────────────────────

/// Payload of an `orderbook:<symbol>` push. A full snapshot, never a delta.
///
/// Levels keep server order: bids best-first (descending), asks best-first
/// (ascending). Missing or `null` sides are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookData {
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub bids: Vec<BookLevel>,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub asks: Vec<BookLevel>,
}

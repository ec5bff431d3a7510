//! Wallet domain: per-asset balances and the exchange's asset list.

#[cfg(feature = "http")]
pub mod client;

use crate::shared::{serde_util, Symbol};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset balance of the current user.
///
/// `total = available + frozen`; frozen funds back open orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub asset_symbol: String,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub available: Decimal,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub frozen: Decimal,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub total: Decimal,
    #[serde(default, deserialize_with = "serde_util::lenient_datetime::deserialize")]
    pub updated_at: Option<NaiveDateTime>,
}

/// A tradable asset listed by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: Symbol,
    #[serde(default)]
    pub name: Option<String>,
    /// Decimal places the exchange keeps for amounts of this asset.
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default, deserialize_with = "serde_util::null_as_default::deserialize")]
    pub is_enabled: bool,
}

/// Body of `POST /api/wallet/deposit`, the exchange's test-funding endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepositRequest {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_balance_parses_server_entity() {
        let json = r#"{
            "id": 3, "userId": 7, "assetSymbol": "USDT", "chain": null,
            "available": 950.5, "frozen": 49.5, "total": 1000, "version": 12,
            "createdAt": [2024, 7, 1, 9, 0, 0], "updatedAt": "2024-07-18T20:30:00"
        }"#;
        let balance: WalletBalance = serde_json::from_str(json).unwrap();
        assert_eq!(balance.asset_symbol, "USDT");
        assert_eq!(balance.available + balance.frozen, balance.total);
        assert_eq!(balance.total, Decimal::from(1000));
        assert!(balance.updated_at.is_some());
    }

    #[test]
    fn test_asset_tolerates_nulls() {
        let json = r#"{"symbol":"BTC","name":"Bitcoin","scale":8,"isEnabled":null}"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.symbol.as_str(), "BTC");
        assert_eq!(asset.scale, Some(8));
        assert!(!asset.is_enabled);
    }

    #[test]
    fn test_deposit_amount_is_a_json_number() {
        let req = DepositRequest {
            asset: "USDT".into(),
            amount: Decimal::from_str("250.75").unwrap(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["amount"], 250.75);
    }
}
